use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rendering::infrastructure::wav_encoder::WavFormat;
use crate::shared::constants::{
    DEFAULT_DECODE_CACHE_CAPACITY, DEFAULT_FIGURE_HEIGHT, DEFAULT_FIGURE_WIDTH,
    DEFAULT_HOP_LENGTH, DEFAULT_N_FFT, DEFAULT_RENDER_CACHE_CAPACITY, DEFAULT_TOP_DB,
};

/// Smallest figure the plotters can lay out axes, labels and a colour bar in.
pub const MIN_FIGURE_WIDTH: u32 = 320;
pub const MIN_FIGURE_HEIGHT: u32 = 200;
/// Widest dynamic range the spectrogram colour scale accepts.
pub const MAX_TOP_DB: f32 = 200.0;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for decoding and per-stage rendering.
///
/// Stored as JSON; any missing field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub n_fft: usize,
    pub hop_length: usize,
    pub top_db: f32,
    pub figure_width: u32,
    pub figure_height: u32,
    pub wav_format: WavFormat,
    /// Resample decoded input to this rate; `None` keeps the native rate.
    pub target_sample_rate: Option<u32>,
    pub decode_cache_capacity: usize,
    pub render_cache_capacity: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            n_fft: DEFAULT_N_FFT,
            hop_length: DEFAULT_HOP_LENGTH,
            top_db: DEFAULT_TOP_DB,
            figure_width: DEFAULT_FIGURE_WIDTH,
            figure_height: DEFAULT_FIGURE_HEIGHT,
            wav_format: WavFormat::default(),
            target_sample_rate: None,
            decode_cache_capacity: DEFAULT_DECODE_CACHE_CAPACITY,
            render_cache_capacity: DEFAULT_RENDER_CACHE_CAPACITY,
        }
    }
}

impl RenderSettings {
    /// Platform config location, e.g. `~/.config/augscope/settings.json`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("augscope").join("settings.json"))
    }

    /// Loads settings from the platform config location, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring settings file: {e}");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Strict load: any read, parse or validation problem is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_stft(self.n_fft, self.hop_length, self.top_db)?;
        if self.figure_width < MIN_FIGURE_WIDTH {
            return Err(invalid(
                "figure_width",
                format!("must be at least {MIN_FIGURE_WIDTH}, got {}", self.figure_width),
            ));
        }
        if self.figure_height < MIN_FIGURE_HEIGHT {
            return Err(invalid(
                "figure_height",
                format!("must be at least {MIN_FIGURE_HEIGHT}, got {}", self.figure_height),
            ));
        }
        if self.target_sample_rate == Some(0) {
            return Err(invalid("target_sample_rate", "must be positive".to_string()));
        }
        Ok(())
    }
}

/// Checks the STFT parameters a spectrogram is computed with.
pub fn validate_stft(n_fft: usize, hop_length: usize, top_db: f32) -> Result<(), SettingsError> {
    if n_fft < 16 {
        return Err(invalid("n_fft", format!("must be at least 16, got {n_fft}")));
    }
    if hop_length == 0 || hop_length > n_fft {
        return Err(invalid(
            "hop_length",
            format!("must be between 1 and n_fft ({n_fft}), got {hop_length}"),
        ));
    }
    if !(top_db > 0.0 && top_db <= MAX_TOP_DB) {
        return Err(invalid(
            "top_db",
            format!("must be in (0, {MAX_TOP_DB}], got {top_db}"),
        ));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { field, reason }
}
