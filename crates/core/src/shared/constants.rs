/// Label of stage 0, the untransformed input.
pub const ORIGINAL_STAGE_NAME: &str = "Original";

/// Rate the bundled samples are loaded at.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "m4a", "aac", "mp4"];

pub const DEFAULT_N_FFT: usize = 2048;
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Dynamic range shown below each stage's own peak.
pub const DEFAULT_TOP_DB: f32 = 80.0;

/// Magnitude floor applied before taking the logarithm.
pub const AMPLITUDE_FLOOR: f32 = 1e-5;

/// 10x7 inch figure at 100 dpi.
pub const DEFAULT_FIGURE_WIDTH: u32 = 1000;
pub const DEFAULT_FIGURE_HEIGHT: u32 = 700;

pub const DEFAULT_DECODE_CACHE_CAPACITY: usize = 8;
pub const DEFAULT_RENDER_CACHE_CAPACITY: usize = 32;
