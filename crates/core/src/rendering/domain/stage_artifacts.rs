use image::RgbImage;

/// Everything rendered for one pipeline stage.
#[derive(Clone, Debug)]
pub struct StageArtifacts {
    pub spectrogram: RgbImage,
    pub waveform: RgbImage,
    /// Playable audio as a complete WAV file.
    pub audio: Vec<u8>,
}
