pub mod audio_decoder;
pub mod audio_source;
pub mod transformation;
pub mod waveform;
