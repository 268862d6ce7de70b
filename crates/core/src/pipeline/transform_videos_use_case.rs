use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::filtering::domain::fade_window::{ClipSpan, FadeWindow};
use crate::filtering::domain::filter_composer::FilterComposer;
use crate::matching::domain::candidate_scanner::CandidateScanner;
use crate::matching::domain::timestamp_candidate::effective_capture_time;
use crate::matching::domain::timestamp_matcher::{MatchOutcome, TimestampMatcher};
use crate::media::domain::encoder::Encoder;
use crate::media::domain::metadata_store::MetadataStore;
use crate::pipeline::transform_logger::{JobStatus, TransformLogger};
use crate::planning::domain::output_planner::{EncodeJob, OutputPlanner, PlannedJob};
use crate::shared::constants::EXCLUDED_SYNC_TAGS;
use crate::shared::errors::JobError;
use crate::shared::transform_request::{RenamePolicy, TransformRequest};

/// Where processing of one input file stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStage {
    Pending,
    Matching,
    Planning,
    Encoding,
    MetadataSync,
    Done,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    Encoded { output: PathBuf },
    /// Command resolved and printed, nothing written.
    DryRun { command: String },
    Skipped(JobError),
    Failed(JobError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
    pub destination: PathBuf,
    pub outcome: JobOutcome,
    /// Non-fatal problems after a successful encode, e.g. a blocked relabel.
    pub warnings: Vec<JobError>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileReport {
    pub source: PathBuf,
    pub stage: FileStage,
    /// Set when the file itself failed before any job ran.
    pub error: Option<JobError>,
    /// Name of the matched photo under [`RenamePolicy::Suggest`].
    pub suggested_name: Option<String>,
    pub jobs: Vec<JobReport>,
}

impl FileReport {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            stage: FileStage::Pending,
            error: None,
            suggested_name: None,
            jobs: Vec::new(),
        }
    }

    fn fail(&mut self, error: JobError) {
        log::error!("{error}");
        self.stage = FileStage::Error;
        self.error = Some(error);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Whether any file or job ended in an error, collisions included.
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|file| {
            file.error.is_some()
                || file
                    .jobs
                    .iter()
                    .any(|job| matches!(job.outcome, JobOutcome::Skipped(_) | JobOutcome::Failed(_)))
        })
    }

    pub fn outputs(&self) -> Vec<&Path> {
        self.files
            .iter()
            .flat_map(|file| &file.jobs)
            .filter_map(|job| match &job.outcome {
                JobOutcome::Encoded { output } => Some(output.as_path()),
                _ => None,
            })
            .collect()
    }
}

/// Called with the matched reference photo of each video.
pub type MatchHook = Box<dyn FnMut(&Path) + Send>;

/// Batch pipeline: for every input file, match, plan, encode, then sync
/// metadata onto each output.
///
/// Files are processed one after the other and every encoder call runs to
/// completion before the next starts. A failure is recorded against its
/// file or job and the batch moves on.
pub struct TransformVideosUseCase {
    encoder: Box<dyn Encoder>,
    store: Box<dyn MetadataStore>,
    scanner: Option<Box<dyn CandidateScanner>>,
    logger: Box<dyn TransformLogger>,
    on_match: Option<MatchHook>,
}

impl TransformVideosUseCase {
    pub fn new(
        encoder: Box<dyn Encoder>,
        store: Box<dyn MetadataStore>,
        scanner: Option<Box<dyn CandidateScanner>>,
        logger: Box<dyn TransformLogger>,
    ) -> Self {
        Self {
            encoder,
            store,
            scanner,
            logger,
            on_match: None,
        }
    }

    pub fn with_match_hook(mut self, hook: MatchHook) -> Self {
        self.on_match = Some(hook);
        self
    }

    pub fn execute(&mut self, request: &TransformRequest, inputs: &[PathBuf]) -> BatchReport {
        let composer = FilterComposer::new(request);
        let planner = OutputPlanner::new(request);
        let mut matching_enabled = request.rename != RenamePolicy::Off;
        let mut report = BatchReport::default();

        for (i, source) in inputs.iter().enumerate() {
            self.logger
                .file_started(i + 1, inputs.len(), &source.display().to_string());
            let file_report = self.process_file(
                request,
                &composer,
                &planner,
                source,
                &mut matching_enabled,
            );
            report.files.push(file_report);
        }

        self.logger.summary();
        report
    }

    fn process_file(
        &mut self,
        request: &TransformRequest,
        composer: &FilterComposer,
        planner: &OutputPlanner,
        source: &Path,
        matching_enabled: &mut bool,
    ) -> FileReport {
        let mut report = FileReport::new(source);

        let duration = if request.needs_duration() {
            match self.encoder.probe(source) {
                Ok(meta) => Some(meta.duration),
                Err(e) => {
                    report.fail(JobError::Probe {
                        path: source.to_path_buf(),
                        reason: e.to_string(),
                    });
                    return report;
                }
            }
        } else {
            None
        };

        report.stage = FileStage::Matching;
        let mut prefix = None;
        if *matching_enabled {
            match self.match_reference(request, source, duration.unwrap_or(0.0)) {
                Ok(MatchOutcome::Matched(found)) => {
                    let name = found.candidate.base_name();
                    self.logger.info(&format!(
                        "{} matches {} ({:.0}s apart)",
                        source.display(),
                        found.candidate.path.display(),
                        found.difference
                    ));
                    if let Some(hook) = self.on_match.as_mut() {
                        hook(&found.candidate.path);
                    }
                    match request.rename {
                        RenamePolicy::Suggest => {
                            self.logger.info(&format!("Suggested name: {name}"));
                            report.suggested_name = Some(name);
                        }
                        RenamePolicy::Apply => prefix = Some(name),
                        RenamePolicy::Off => {}
                    }
                }
                Ok(MatchOutcome::Rejected(_)) => {}
                Ok(MatchOutcome::NoCandidates) => {
                    log::warn!("No usable reference photos, renaming disabled for this run");
                    *matching_enabled = false;
                }
                Err(e) => {
                    report.fail(e);
                    return report;
                }
            }
        }

        report.stage = FileStage::Planning;
        let cut = match request.cut() {
            None => None,
            Some(bounds) => match bounds.resolve(duration) {
                Some((start, end)) if start <= end => Some((start, end)),
                Some((start, end)) => {
                    report.fail(JobError::CutBeyondEnd {
                        path: source.to_path_buf(),
                        start,
                        duration: end,
                    });
                    return report;
                }
                None => {
                    report.fail(JobError::Probe {
                        path: source.to_path_buf(),
                        reason: "duration unknown".to_string(),
                    });
                    return report;
                }
            },
        };

        let fade = match request.fade() {
            None => None,
            Some(timing) => {
                let span = match cut {
                    Some((start, end)) => ClipSpan::Cut { start, end },
                    None => ClipSpan::Whole {
                        duration: duration.unwrap_or(0.0),
                    },
                };
                match FadeWindow::compute(timing, span) {
                    Ok(window) => Some(window),
                    Err(source_error) => {
                        report.fail(JobError::FadeWindow {
                            path: source.to_path_buf(),
                            source: source_error,
                        });
                        return report;
                    }
                }
            }
        };

        let filters = composer.compose(fade.as_ref());
        let planned = planner.plan(source, &filters, cut, prefix.as_deref(), |p| p.exists());

        report.stage = FileStage::Encoding;
        for job in planned {
            let job_report = match job {
                PlannedJob::Skipped { destination, error } => {
                    log::error!("{error}");
                    self.logger
                        .job_finished(JobStatus::Skipped, &destination.display().to_string());
                    JobReport {
                        destination,
                        outcome: JobOutcome::Skipped(error),
                        warnings: Vec::new(),
                    }
                }
                PlannedJob::Ready(job) => self.run_job(request, job, &mut report.stage),
            };
            report.jobs.push(job_report);
        }

        report.stage = FileStage::Done;
        report
    }

    fn match_reference(
        &mut self,
        request: &TransformRequest,
        source: &Path,
        duration: f64,
    ) -> Result<MatchOutcome, JobError> {
        let (Some(scanner), Some(dir)) = (self.scanner.as_deref(), request.rename_source.as_deref())
        else {
            return Ok(MatchOutcome::NoCandidates);
        };
        let start = Instant::now();
        let matcher =
            TimestampMatcher::new(scanner, self.store.as_ref(), request.match_tolerance_secs);
        let outcome = matcher.match_video(source, duration, dir);
        self.logger
            .timing("matching", start.elapsed().as_secs_f64() * 1000.0);
        outcome
    }

    fn run_job(
        &mut self,
        request: &TransformRequest,
        job: EncodeJob,
        stage: &mut FileStage,
    ) -> JobReport {
        *stage = FileStage::Encoding;
        let command = self
            .encoder
            .command_line(&job.source, &job.args, &job.destination);
        let destination_name = job.destination.display().to_string();

        if request.dry_run {
            self.logger.info(&command);
            self.logger.job_finished(JobStatus::DryRun, &destination_name);
            return JobReport {
                destination: job.destination,
                outcome: JobOutcome::DryRun { command },
                warnings: Vec::new(),
            };
        }

        log::debug!("{command}");
        let start = Instant::now();
        if let Err(e) = self.encoder.transcode(&job.source, &job.args, &job.destination) {
            let error = JobError::Encode {
                destination: job.destination.clone(),
                reason: e.to_string(),
            };
            log::error!("{error}");
            self.logger.job_finished(JobStatus::Failed, &destination_name);
            return JobReport {
                destination: job.destination,
                outcome: JobOutcome::Failed(error),
                warnings: Vec::new(),
            };
        }
        self.logger
            .timing("encode", start.elapsed().as_secs_f64() * 1000.0);

        *stage = FileStage::MetadataSync;
        let start = Instant::now();
        if let Err(error) = self.sync_metadata(request, &job.source, &job.destination) {
            log::error!("{error}");
            self.logger.job_finished(JobStatus::Failed, &destination_name);
            return JobReport {
                destination: job.destination,
                outcome: JobOutcome::Failed(error),
                warnings: Vec::new(),
            };
        }
        self.logger
            .timing("metadata", start.elapsed().as_secs_f64() * 1000.0);

        let mut warnings = Vec::new();
        let output = match self.relabel(request, &job) {
            Ok(path) => path,
            Err(error) => {
                log::error!("{error}");
                warnings.push(error);
                job.destination.clone()
            }
        };
        self.logger
            .job_finished(JobStatus::Encoded, &output.display().to_string());
        JobReport {
            destination: job.destination,
            outcome: JobOutcome::Encoded { output },
            warnings,
        }
    }

    /// Copy tags from source to output, shift the capture time, and stamp the
    /// output's modification time with the source's capture time.
    fn sync_metadata(
        &self,
        request: &TransformRequest,
        source: &Path,
        destination: &Path,
    ) -> Result<(), JobError> {
        let sync_error = |e: Box<dyn std::error::Error>| JobError::MetadataSync {
            destination: destination.to_path_buf(),
            reason: e.to_string(),
        };

        self.store
            .copy_tags(source, destination, EXCLUDED_SYNC_TAGS)
            .map_err(sync_error)?;
        self.store
            .shift_capture_time(destination, request.capture_time_shift_secs)
            .map_err(sync_error)?;
        match effective_capture_time(self.store.as_ref(), source) {
            Some(time) => self
                .store
                .set_modification_time(destination, time.timestamp)
                .map_err(sync_error),
            None => {
                log::warn!(
                    "No capture time for {}, leaving modification time of {} as is",
                    source.display(),
                    destination.display()
                );
                Ok(())
            }
        }
    }

    /// Rename the output so its label is the measured short edge.
    ///
    /// Returns the final output path. An occupied relabelled name leaves the
    /// output under its planned name and reports a collision.
    fn relabel(&self, request: &TransformRequest, job: &EncodeJob) -> Result<PathBuf, JobError> {
        if job.target.is_none() {
            return Ok(job.destination.clone());
        }
        let meta = self.encoder.probe(&job.destination).map_err(|e| JobError::Probe {
            path: job.destination.clone(),
            reason: e.to_string(),
        })?;
        let Some(renamed) = job.relabelled(meta.short_edge()) else {
            return Ok(job.destination.clone());
        };
        if renamed.exists() && !request.overwrite {
            return Err(JobError::Collision(renamed));
        }
        fs::rename(&job.destination, &renamed).map_err(|e| JobError::MetadataSync {
            destination: job.destination.clone(),
            reason: format!("renaming to {} failed: {e}", renamed.display()),
        })?;
        Ok(renamed)
    }
}
