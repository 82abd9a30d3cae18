//! Audio decoder using Symphonia.
//!
//! Decodes any container/codec Symphonia supports (WAV, FLAC, MP3, AAC,
//! Vorbis) into the first channel as normalized `f32`.

use std::io::Cursor;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{self, CodecType, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::{i24, u24, Sample};

use crate::audio::domain::audio_decoder::{AudioDecoder, DecodeError};
use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::waveform::Waveform;
use crate::audio::infrastructure::resampler::resample;

/// Codecs whose frame count in the container header is exact, so a short
/// decode can only mean a truncated stream.
const EXACT_LENGTH_CODECS: &[CodecType] = &[
    codecs::CODEC_TYPE_PCM_U8,
    codecs::CODEC_TYPE_PCM_S8,
    codecs::CODEC_TYPE_PCM_S16LE,
    codecs::CODEC_TYPE_PCM_S16BE,
    codecs::CODEC_TYPE_PCM_S24LE,
    codecs::CODEC_TYPE_PCM_S24BE,
    codecs::CODEC_TYPE_PCM_S32LE,
    codecs::CODEC_TYPE_PCM_S32BE,
    codecs::CODEC_TYPE_PCM_F32LE,
    codecs::CODEC_TYPE_PCM_F32BE,
    codecs::CODEC_TYPE_PCM_F64LE,
    codecs::CODEC_TYPE_PCM_F64BE,
];

/// Decodes the first channel of an encoded stream.
///
/// Integer PCM is divided by the largest magnitude its sample width can
/// hold (`i16::MAX` for 16-bit, and so on); unsigned formats are re-centred
/// first. Everything is clamped to [-1.0, 1.0]. The first channel is used
/// rather than a downmix, so the output for a given file is exact and
/// independent of channel count.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(
        &self,
        source: &AudioSource,
        target_sample_rate: Option<u32>,
    ) -> Result<Waveform, DecodeError> {
        let (samples, native_rate) = decode_first_channel(source)?;

        let (samples, rate) = match target_sample_rate {
            Some(rate) if rate != native_rate => {
                let resampled =
                    resample(&samples, native_rate, rate).map_err(|e| DecodeError::Resample {
                        origin: source.origin().to_string(),
                        target_rate: rate,
                        reason: e.to_string(),
                    })?;
                (resampled, rate)
            }
            _ => (samples, native_rate),
        };

        let waveform = Waveform::new(samples, rate).map_err(|e| DecodeError::InvalidWaveform {
            origin: source.origin().to_string(),
            source: e,
        })?;
        log::debug!(
            "Decoded {} ({} samples at {} Hz, {:.2}s)",
            source.origin(),
            waveform.len(),
            waveform.sample_rate(),
            waveform.duration()
        );
        Ok(waveform)
    }
}

fn decode_first_channel(source: &AudioSource) -> Result<(Vec<f32>, u32), DecodeError> {
    let origin = source.origin();
    let cursor = Cursor::new(source.shared_bytes());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = source.extension() {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack {
            origin: origin.to_string(),
        })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| corrupt(origin, "sample rate unknown"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(corrupt(origin, &e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(buffer) => append_first_channel(&buffer, &mut samples),
            Err(SymphoniaError::DecodeError(reason)) => {
                log::warn!("Skipping undecodable packet in {origin}: {reason}");
            }
            Err(e) => return Err(corrupt(origin, &e.to_string())),
        }
    }

    check_length(origin, codec_params.codec, codec_params.n_frames, samples.len() as u64)?;

    Ok((samples, sample_rate))
}

/// Fails when an exact-length codec decoded fewer frames than the header
/// declares. Other codecs only estimate their length, so a shortfall there
/// is logged and the decoded audio is kept.
fn check_length(
    origin: &str,
    codec: CodecType,
    expected: Option<u64>,
    decoded: u64,
) -> Result<(), DecodeError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if decoded >= expected {
        return Ok(());
    }
    if EXACT_LENGTH_CODECS.contains(&codec) {
        return Err(DecodeError::Truncated {
            origin: origin.to_string(),
            expected,
            decoded,
        });
    }
    log::warn!(
        "{origin} decoded {decoded} of {expected} frames declared by the container; \
         the stream may be truncated"
    );
    Ok(())
}

fn append_first_channel(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::U8(buf) => push_first(&**buf, out, |s: u8| (s as f32 - 128.0) / 127.0),
        AudioBufferRef::U16(buf) => {
            push_first(&**buf, out, |s: u16| (s as f32 - 32_768.0) / i16::MAX as f32)
        }
        AudioBufferRef::U24(buf) => push_first(&**buf, out, |s: u24| {
            ((s.inner() as f64 - 8_388_608.0) / 8_388_607.0) as f32
        }),
        AudioBufferRef::U32(buf) => push_first(&**buf, out, |s: u32| {
            ((s as f64 - 2_147_483_648.0) / i32::MAX as f64) as f32
        }),
        AudioBufferRef::S8(buf) => push_first(&**buf, out, |s: i8| s as f32 / i8::MAX as f32),
        AudioBufferRef::S16(buf) => push_first(&**buf, out, |s: i16| s as f32 / i16::MAX as f32),
        AudioBufferRef::S24(buf) => {
            push_first(&**buf, out, |s: i24| (s.inner() as f64 / 8_388_607.0) as f32)
        }
        AudioBufferRef::S32(buf) => {
            push_first(&**buf, out, |s: i32| (s as f64 / i32::MAX as f64) as f32)
        }
        AudioBufferRef::F32(buf) => push_first(&**buf, out, |s: f32| s),
        AudioBufferRef::F64(buf) => push_first(&**buf, out, |s: f64| s as f32),
    }
}

fn push_first<S: Sample>(buffer: &AudioBuffer<S>, out: &mut Vec<f32>, convert: impl Fn(S) -> f32) {
    if buffer.spec().channels.count() == 0 {
        return;
    }
    out.extend(
        buffer
            .chan(0)
            .iter()
            .map(|&s| convert(s).clamp(-1.0, 1.0)),
    );
}

fn corrupt(origin: &str, reason: &str) -> DecodeError {
    DecodeError::Corrupt {
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}
