pub mod bitmap_font;
pub mod cached_stage_renderer;
pub mod colormap;
pub mod directory_sink;
pub mod plot_canvas;
pub mod plot_stage_renderer;
pub mod spectrogram;
pub mod spectrogram_plotter;
pub mod wav_encoder;
pub mod waveform_plotter;
