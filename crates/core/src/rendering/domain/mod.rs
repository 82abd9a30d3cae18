pub mod render_sink;
pub mod stage_artifacts;
pub mod stage_renderer;
