use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Keeps the runner and use case free of any particular output mechanism
/// (log crate, GUI status line, test capture).
pub trait PipelineLogger: Send {
    /// Report stage-level progress: `current` of `total` stages emitted.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named step (e.g. "apply", "render") took for one stage.
    fn timing(&mut self, step: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. stage RMS level).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _step: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger that forwards messages to the `log` facade and accumulates
/// per-step timings and metrics for an end-of-run summary.
pub struct LogPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    stages_done: usize,
    total_stages: usize,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            stages_done: 0,
            total_stages: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Pipeline summary ({}/{} stages, {:.2}s total):",
            self.stages_done,
            self.total_stages,
            elapsed_ms / 1000.0
        )];

        let mut steps: Vec<_> = self.timings.keys().collect();
        steps.sort();
        for step in steps {
            let durations = &self.timings[step];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let max_ms = durations.iter().cloned().fold(0.0f64, f64::max);
            lines.push(format!(
                "  {step:10}: avg {avg_ms:7.1}ms  max {max_ms:7.1}ms  total {total_ms:8.0}ms"
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let values = &self.metrics[name];
            let rendered: Vec<String> = values.iter().map(|v| format!("{v:.1}")).collect();
            lines.push(format!("  {name}: [{}]", rendered.join(", ")));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, step: &str) -> Option<&[f64]> {
        self.timings.get(step).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.stages_done = current;
        self.total_stages = total;
        log::info!("Stage {current}/{total} ready");
    }

    fn timing(&mut self, step: &str, duration_ms: f64) {
        self.timings
            .entry(step.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 3);
        logger.timing("render", 5.0);
        logger.metric("rms_db", -12.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new();
        logger.timing("render", 20.0);
        logger.timing("render", 30.0);
        logger.timing("apply", 5.0);

        assert_eq!(logger.timings_for("render"), Some(&[20.0, 30.0][..]));
        assert_eq!(logger.timings_for("apply"), Some(&[5.0][..]));
        assert_eq!(logger.timings_for("decode"), None);
    }

    #[test]
    fn test_summary_lists_steps_and_metrics() {
        let mut logger = LogPipelineLogger::new();
        logger.progress(3, 3);
        logger.timing("render", 20.0);
        logger.timing("apply", 4.0);
        logger.metric("rms_db", -20.0);
        logger.metric("rms_db", -14.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary (3/3 stages"));
        assert!(summary.contains("render"));
        assert!(summary.contains("apply"));
        assert!(summary.contains("rms_db: [-20.0, -14.0]"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogPipelineLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = LogPipelineLogger::new();
        logger.info("decoded dog.wav");
        assert_eq!(logger.messages(), ["decoded dog.wav".to_string()]);
    }
}
