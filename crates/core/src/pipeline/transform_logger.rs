use std::collections::HashMap;
use std::time::Instant;

/// Final state of one planned encoder job, as seen by a logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobStatus {
    Encoded,
    DryRun,
    Skipped,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Encoded => "encoded",
            JobStatus::DryRun => "dry-run",
            JobStatus::Skipped => "skipped",
            JobStatus::Failed => "failed",
        }
    }
}

/// Cross-cutting logger for batch transform events.
///
/// Keeps the driver free of output concerns; the CLI prints, tests discard.
pub trait TransformLogger: Send {
    /// An input file is about to be processed.
    fn file_started(&mut self, current: usize, total: usize, path: &str);

    /// One job reached its final state.
    fn job_finished(&mut self, status: JobStatus, destination: &str);

    /// Record how long a named stage took for one file or job.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-batch summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullTransformLogger;

impl TransformLogger for NullTransformLogger {
    fn file_started(&mut self, _current: usize, _total: usize, _path: &str) {}
    fn job_finished(&mut self, _status: JobStatus, _destination: &str) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger that counts job outcomes and stage timings and prints a
/// summary once the batch is done.
pub struct StdoutTransformLogger {
    counts: HashMap<JobStatus, usize>,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_files: usize,
}

impl StdoutTransformLogger {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            timings: HashMap::new(),
            start_time: Instant::now(),
            total_files: 0,
        }
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Returns the formatted summary string, or `None` if no job finished.
    pub fn summary_string(&self) -> Option<String> {
        if self.counts.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Batch summary ({} files, {elapsed:.1}s total):",
            self.total_files
        )];

        let mut statuses: Vec<_> = self.counts.keys().copied().collect();
        statuses.sort();
        let outcomes: Vec<String> = statuses
            .iter()
            .map(|status| format!("{} {}", self.count(*status), status.as_str()))
            .collect();
        lines.push(format!("  jobs: {}", outcomes.join(", ")));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:8.1}ms  total {total_ms:9.0}ms"
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutTransformLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformLogger for StdoutTransformLogger {
    fn file_started(&mut self, current: usize, total: usize, path: &str) {
        self.total_files = total;
        log::info!("[{current}/{total}] {path}");
    }

    fn job_finished(&mut self, status: JobStatus, destination: &str) {
        *self.counts.entry(status).or_insert(0) += 1;
        match status {
            JobStatus::Encoded => log::info!("Wrote {destination}"),
            JobStatus::DryRun => log::debug!("Dry run, {destination} not written"),
            JobStatus::Skipped => log::debug!("Skipped {destination}"),
            JobStatus::Failed => log::debug!("Failed {destination}"),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(s) = self.summary_string() {
            log::info!("{s}");
        }
    }
}
