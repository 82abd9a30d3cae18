pub mod pipeline_error;
pub mod pipeline_logger;
pub mod pipeline_runner;
pub mod render_pipeline_use_case;
pub mod stage_pipeline;
pub mod stage_result;
