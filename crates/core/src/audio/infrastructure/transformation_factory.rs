use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use super::gain::Gain;
use super::noise_injection::{NoiseInjection, DEFAULT_MAX_AMPLITUDE, DEFAULT_MIN_AMPLITUDE};
use super::pitch_shift::{PitchShift, DEFAULT_SEMITONES};
use super::resample::Resample;
use super::time_stretch::TimeStretch;
use crate::audio::domain::transformation::Transformation;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("empty transformation spec")]
    Empty,
    #[error("unknown transformation `{kind}` (expected one of: {available})")]
    UnknownKind { kind: String, available: String },
    #[error("`{kind}` has no parameter `{key}`")]
    UnknownParameter { kind: &'static str, key: String },
    #[error("`{kind}` takes at most {max} positional value(s)")]
    TooManyValues { kind: &'static str, max: usize },
    #[error("parameter `{key}` given more than once")]
    Duplicate { key: String },
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("`{kind}` requires parameter `{key}`")]
    Missing { kind: &'static str, key: &'static str },
}

/// A transformation kind: canonical name, accepted aliases, and parameter
/// names in positional order. Each parameter may have short aliases.
#[derive(Clone, Copy)]
enum KindId {
    Gain,
    NoiseInjection,
    PitchShift,
    TimeStretch,
    Resample,
}

struct Kind {
    id: KindId,
    name: &'static str,
    aliases: &'static [&'static str],
    params: &'static [(&'static str, &'static [&'static str])],
}

const KINDS: &[Kind] = &[
    Kind {
        id: KindId::Gain,
        name: "gain",
        aliases: &[],
        params: &[("gain_db", &["db"])],
    },
    Kind {
        id: KindId::NoiseInjection,
        name: "noise_injection",
        aliases: &["noise"],
        params: &[
            ("min_amplitude", &["min"]),
            ("max_amplitude", &["max"]),
            ("seed", &[]),
            ("amplitude", &["amp"]),
        ],
    },
    Kind {
        id: KindId::PitchShift,
        name: "pitch_shift",
        aliases: &["pitch"],
        params: &[("semitones", &["st"])],
    },
    Kind {
        id: KindId::TimeStretch,
        name: "time_stretch",
        aliases: &["stretch"],
        params: &[("rate", &[])],
    },
    Kind {
        id: KindId::Resample,
        name: "resample",
        aliases: &[],
        params: &[("target_rate", &["rate", "hz"])],
    },
];

/// Positional values a kind accepts; trailing params are keyword-only.
fn positional_limit(kind: &Kind) -> usize {
    match kind.id {
        KindId::NoiseInjection => 3,
        _ => kind.params.len(),
    }
}

/// Builds a transformation from a short textual spec.
///
/// The form is `kind[:arg,arg,...]`, where each arg is either `key=value` or
/// a bare value filling the next positional parameter. Kind names ignore
/// case, `-` and `_`, so `gain:6`, `noise:seed=42`, `PitchShift:-2` and
/// `time-stretch:rate=1.25` all parse.
pub fn parse_transformation(spec: &str) -> Result<Box<dyn Transformation>, SpecError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(SpecError::Empty);
    }
    let (kind_text, args) = match spec.split_once(':') {
        Some((kind, args)) => (kind.trim(), args),
        None => (spec, ""),
    };
    let kind = find_kind(kind_text)?;
    let params = collect_params(kind, args)?;

    let transformation: Box<dyn Transformation> = match kind.id {
        KindId::Gain => Box::new(Gain::new(params.required(kind, "gain_db")?)),
        KindId::NoiseInjection => {
            let amplitude: Option<f32> = params.optional("amplitude")?;
            let min = params
                .optional("min_amplitude")?
                .or(amplitude)
                .unwrap_or(DEFAULT_MIN_AMPLITUDE);
            let max = params
                .optional("max_amplitude")?
                .or(amplitude)
                .unwrap_or(DEFAULT_MAX_AMPLITUDE.max(min));
            if min < 0.0 || min > max {
                return Err(SpecError::InvalidValue {
                    key: "min_amplitude".to_string(),
                    value: min.to_string(),
                    reason: format!("must be in [0, max_amplitude = {max}]"),
                });
            }
            let seed = params.optional("seed")?.unwrap_or(0);
            Box::new(NoiseInjection::new(min, max, seed))
        }
        KindId::PitchShift => Box::new(PitchShift::new(
            params.optional("semitones")?.unwrap_or(DEFAULT_SEMITONES),
        )),
        KindId::TimeStretch => {
            let rate: f32 = params.required(kind, "rate")?;
            if !(rate.is_finite() && rate > 0.0) {
                return Err(SpecError::InvalidValue {
                    key: "rate".to_string(),
                    value: rate.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            Box::new(TimeStretch::new(rate))
        }
        KindId::Resample => {
            let rate: u32 = params.required(kind, "target_rate")?;
            if rate == 0 {
                return Err(SpecError::InvalidValue {
                    key: "target_rate".to_string(),
                    value: "0".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            Box::new(Resample::new(rate))
        }
    };
    Ok(transformation)
}

/// Canonical names of every kind `parse_transformation` understands.
pub fn available_kinds() -> Vec<&'static str> {
    KINDS.iter().map(|k| k.name).collect()
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_kind(text: &str) -> Result<&'static Kind, SpecError> {
    let wanted = normalize(text);
    KINDS
        .iter()
        .find(|k| normalize(k.name) == wanted || k.aliases.iter().any(|a| normalize(a) == wanted))
        .ok_or_else(|| SpecError::UnknownKind {
            kind: text.to_string(),
            available: available_kinds().join(", "),
        })
}

struct Params(HashMap<&'static str, String>);

impl Params {
    fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, SpecError>
    where
        T::Err: std::fmt::Display,
    {
        self.0
            .get(key)
            .map(|value| {
                value.parse::<T>().map_err(|e| SpecError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn required<T: FromStr>(&self, kind: &Kind, key: &'static str) -> Result<T, SpecError>
    where
        T::Err: std::fmt::Display,
    {
        self.optional(key)?
            .ok_or(SpecError::Missing { kind: kind.name, key })
    }
}

fn collect_params(kind: &Kind, args: &str) -> Result<Params, SpecError> {
    let mut params = HashMap::new();
    let mut positional = 0;
    for arg in args.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let (key, value) = match arg.split_once('=') {
            Some((key, value)) => (resolve_key(kind, key.trim())?, value.trim()),
            None => {
                if positional >= positional_limit(kind) {
                    return Err(SpecError::TooManyValues {
                        kind: kind.name,
                        max: positional_limit(kind),
                    });
                }
                positional += 1;
                (kind.params[positional - 1].0, arg)
            }
        };
        if params.insert(key, value.to_string()).is_some() {
            return Err(SpecError::Duplicate {
                key: key.to_string(),
            });
        }
    }
    Ok(Params(params))
}

fn resolve_key(kind: &Kind, key: &str) -> Result<&'static str, SpecError> {
    let wanted = key.to_lowercase();
    kind.params
        .iter()
        .find(|(name, aliases)| *name == wanted || aliases.contains(&wanted.as_str()))
        .map(|(name, _)| *name)
        .ok_or_else(|| SpecError::UnknownParameter {
            kind: kind.name,
            key: key.to_string(),
        })
}
