use std::path::{Path, PathBuf};

use crate::audio::domain::audio_decoder::DecodeError;
use crate::audio::domain::audio_source::AudioSource;
use crate::shared::constants::DEFAULT_SAMPLE_RATE;

/// Bundled example recordings: display name and file name.
pub const BUILTIN_SAMPLES: &[(&str, &str)] = &[
    ("Dog", "dog.wav"),
    ("Cow", "cow.wav"),
    ("Thunder", "thunder.wav"),
];

/// Named example recordings stored under a samples directory.
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    root: PathBuf,
}

impl SampleLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn names(&self) -> Vec<&'static str> {
        BUILTIN_SAMPLES.iter().map(|(name, _)| *name).collect()
    }

    /// Bundled samples are shown at a fixed rate regardless of how they
    /// were recorded, unlike uploads which keep their native rate.
    pub fn preferred_sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }

    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        BUILTIN_SAMPLES
            .iter()
            .find(|(sample, _)| sample.eq_ignore_ascii_case(name))
            .map(|(_, file)| self.root.join(file))
    }

    /// Reads the named sample (case-insensitive) into an [`AudioSource`].
    pub fn open(&self, name: &str) -> Result<AudioSource, DecodeError> {
        let path = self.path_of(name).ok_or_else(|| DecodeError::UnknownSample {
            name: name.to_string(),
            available: self.names().join(", "),
        })?;
        AudioSource::open(&path)
    }
}
