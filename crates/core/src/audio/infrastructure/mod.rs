pub mod cached_decoder;
pub mod gain;
pub mod noise_injection;
pub mod phase_vocoder;
pub mod pitch_shift;
pub mod resample;
pub mod resampler;
pub mod sample_library;
pub mod symphonia_decoder;
pub mod time_stretch;
pub mod transformation_factory;
