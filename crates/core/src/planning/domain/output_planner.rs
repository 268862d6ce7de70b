use std::path::{Path, PathBuf};

use crate::filtering::domain::filter_composer::FilterPlan;
use crate::filtering::domain::resolution_target::ResolutionTarget;
use crate::shared::constants::{CUT_TIME_PRECISION, METADATA_PASSTHROUGH_ARGS, OUTPUT_EXTENSION};
use crate::shared::errors::JobError;
use crate::shared::time_math::to_time_string;
use crate::shared::transform_request::TransformRequest;

/// A fully resolved encoder invocation for one (input, resolution) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub args: Vec<String>,
    /// `None` for mp4 passthrough, which has no resolution fan-out.
    pub target: Option<ResolutionTarget>,
    /// Output file name up to, but excluding, the resolution label.
    name_base: String,
}

impl EncodeJob {
    /// Destination with the resolution label replaced by the measured short
    /// edge, or `None` when nothing would change.
    pub fn relabelled(&self, short_edge: u32) -> Option<PathBuf> {
        self.target?;
        let renamed = self
            .destination
            .with_file_name(labelled_name(&self.name_base, &short_edge.to_string()));
        (renamed != self.destination).then_some(renamed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlannedJob {
    Ready(EncodeJob),
    /// Destination exists and overwriting was not requested.
    Skipped { destination: PathBuf, error: JobError },
}

/// Turns filter plans into named encoder jobs for one input file at a time.
///
/// Output names are `<file name>[_cut][_<transpose>][_quick]_<label>.mp4`.
/// With a rename prefix, the prefix replaces the source file name.
pub struct OutputPlanner<'a> {
    request: &'a TransformRequest,
    markers: Vec<String>,
}

impl<'a> OutputPlanner<'a> {
    pub fn new(request: &'a TransformRequest) -> Self {
        let mut markers = Vec::new();
        if request.cut().is_some() {
            markers.push("cut".to_string());
        }
        if let Some(mode) = request.transpose() {
            markers.push(mode.as_str().to_string());
        }
        if request.quick && !request.mp4_passthrough {
            markers.push("quick".to_string());
        }
        Self { request, markers }
    }

    /// Plan every job for `source`.
    ///
    /// `cut` carries the cut bounds already resolved to seconds. `exists`
    /// reports whether a destination is already taken.
    pub fn plan(
        &self,
        source: &Path,
        filters: &[FilterPlan],
        cut: Option<(f64, f64)>,
        prefix: Option<&str>,
        exists: impl Fn(&Path) -> bool,
    ) -> Vec<PlannedJob> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = prefix.unwrap_or(&file_name);

        let jobs: Vec<EncodeJob> = if self.request.mp4_passthrough {
            vec![EncodeJob {
                source: source.to_path_buf(),
                destination: source.with_file_name(format!("{stem}.{OUTPUT_EXTENSION}")),
                args: self.args(None, None),
                target: None,
                name_base: stem.to_string(),
            }]
        } else {
            let name_base = self.name_base(stem);
            filters
                .iter()
                .map(|plan| EncodeJob {
                    source: source.to_path_buf(),
                    destination: source
                        .with_file_name(labelled_name(&name_base, &plan.target.label())),
                    args: self.args(cut, Some(plan)),
                    target: Some(plan.target),
                    name_base: name_base.clone(),
                })
                .collect()
        };

        jobs.into_iter()
            .map(|job| {
                if !self.request.overwrite && exists(&job.destination) {
                    PlannedJob::Skipped {
                        error: JobError::Collision(job.destination.clone()),
                        destination: job.destination,
                    }
                } else {
                    PlannedJob::Ready(job)
                }
            })
            .collect()
    }

    fn name_base(&self, stem: &str) -> String {
        std::iter::once(stem)
            .chain(self.markers.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Metadata passthrough, cut, filters, quality, overwrite; in that order.
    fn args(&self, cut: Option<(f64, f64)>, filters: Option<&FilterPlan>) -> Vec<String> {
        let mut args: Vec<String> = METADATA_PASSTHROUGH_ARGS
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        if let Some((start, end)) = cut {
            args.push("-ss".to_string());
            args.push(to_time_string(start, CUT_TIME_PRECISION));
            args.push("-to".to_string());
            args.push(to_time_string(end, CUT_TIME_PRECISION));
        }
        if let Some(plan) = filters {
            args.extend(plan.args());
        }
        args.extend(self.request.encoding.args(self.request.quick));
        if self.request.overwrite {
            args.push("-y".to_string());
        }
        args
    }
}

fn labelled_name(name_base: &str, label: &str) -> String {
    format!("{name_base}_{label}.{OUTPUT_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::domain::fade_window::FadeTiming;
    use crate::filtering::domain::filter_composer::FilterComposer;
    use crate::filtering::domain::resolution_target::ResolutionToken;
    use crate::filtering::domain::transpose_mode::TransposeMode;
    use crate::shared::transform_request::{CutBounds, CutEnd};

    fn nothing_exists(_: &Path) -> bool {
        false
    }

    fn ready(planned: Vec<PlannedJob>) -> Vec<EncodeJob> {
        planned
            .into_iter()
            .map(|p| match p {
                PlannedJob::Ready(job) => job,
                other => panic!("expected ready job, got {other:?}"),
            })
            .collect()
    }

    fn file_names(jobs: &[EncodeJob]) -> Vec<String> {
        jobs.iter()
            .map(|j| j.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plain_reencode_name_and_args() {
        let request = TransformRequest::new();
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/videos/clip.MOV"),
            &filters,
            None,
            None,
            nothing_exists,
        ));

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].destination, PathBuf::from("/videos/clip.MOV_100.mp4"));
        assert_eq!(
            jobs[0].args,
            vec![
                "-map_metadata",
                "0",
                "-movflags",
                "use_metadata_tags",
                "-c:a",
                "aac",
                "-crf",
                "19"
            ]
        );
    }

    #[test]
    fn test_all_markers_in_order() {
        let request = TransformRequest {
            cut: Some(CutBounds {
                start: 1.0,
                end: CutEnd::At(9.5),
            }),
            scale: Some(vec![ResolutionToken::Percent50, ResolutionToken::Percent33]),
            transpose: Some(TransposeMode::CounterClockwise),
            quick: true,
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/a.mov"),
            &filters,
            Some((1.0, 9.5)),
            None,
            nothing_exists,
        ));

        assert_eq!(
            file_names(&jobs),
            vec!["a.mov_cut_-90_quick_50.mp4", "a.mov_cut_-90_quick_33.mp4"]
        );
        assert_eq!(
            jobs[0].args,
            vec![
                "-map_metadata",
                "0",
                "-movflags",
                "use_metadata_tags",
                "-ss",
                "00:00:01.000",
                "-to",
                "00:00:09.500",
                "-filter:v",
                "transpose=2,scale=iw/2:ih/2",
                "-c:a",
                "aac",
                "-crf",
                "30"
            ]
        );
    }

    #[test]
    fn test_prefix_replaces_source_name() {
        let request = TransformRequest {
            transpose: Some(TransposeMode::Clockwise),
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/MVI_0001.MOV"),
            &filters,
            None,
            Some("IMG_0042"),
            nothing_exists,
        ));
        assert_eq!(file_names(&jobs), vec!["IMG_0042_90_100.mp4"]);
        assert_eq!(jobs[0].destination.parent(), Some(Path::new("/v")));
    }

    #[test]
    fn test_passthrough_single_job_per_input() {
        let request = TransformRequest {
            scale: Some(vec![ResolutionToken::Percent50, ResolutionToken::Percent33]),
            transpose: Some(TransposeMode::Clockwise),
            fade: Some(FadeTiming::default()),
            quick: true,
            mp4_passthrough: true,
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let planner = OutputPlanner::new(&request);

        let jobs = ready(planner.plan(Path::new("/v/a.avi"), &filters, None, None, nothing_exists));
        assert_eq!(file_names(&jobs), vec!["a.avi.mp4"]);
        assert_eq!(jobs[0].target, None);
        assert!(!jobs[0].args.iter().any(|a| a.starts_with("-filter")));

        let renamed = ready(planner.plan(
            Path::new("/v/a.avi"),
            &filters,
            None,
            Some("IMG_7"),
            nothing_exists,
        ));
        assert_eq!(file_names(&renamed), vec!["IMG_7.mp4"]);
    }

    #[test]
    fn test_collision_skips_only_that_job() {
        let request = TransformRequest {
            scale: Some(vec![ResolutionToken::Percent50, ResolutionToken::Percent33]),
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let taken = PathBuf::from("/v/a.mov_50.mp4");
        let planned = OutputPlanner::new(&request).plan(
            Path::new("/v/a.mov"),
            &filters,
            None,
            None,
            |p| p == taken,
        );

        assert_eq!(planned.len(), 2);
        assert_eq!(
            planned[0],
            PlannedJob::Skipped {
                destination: taken.clone(),
                error: JobError::Collision(taken.clone()),
            }
        );
        assert!(matches!(planned[1], PlannedJob::Ready(_)));
    }

    #[test]
    fn test_overwrite_ignores_existing_and_adds_flag() {
        let request = TransformRequest {
            overwrite: true,
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/a.mov"),
            &filters,
            None,
            None,
            |_| true,
        ));
        assert_eq!(jobs[0].args.last().map(String::as_str), Some("-y"));
    }

    #[test]
    fn test_relabel_replaces_label_only() {
        let request = TransformRequest {
            scale: Some(vec![ResolutionToken::Percent66]),
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/take_66.mov"),
            &filters,
            None,
            None,
            nothing_exists,
        ));

        assert_eq!(
            jobs[0].relabelled(720),
            Some(PathBuf::from("/v/take_66.mov_720.mp4"))
        );
    }

    #[test]
    fn test_relabel_noop_cases() {
        let request = TransformRequest {
            mp4_passthrough: true,
            ..TransformRequest::new()
        };
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/a.mov"),
            &[],
            None,
            None,
            nothing_exists,
        ));
        assert_eq!(jobs[0].relabelled(1080), None);

        let request = TransformRequest {
            scale: Some(vec![ResolutionToken::Pixels540]),
            ..TransformRequest::new()
        };
        let filters = FilterComposer::new(&request).compose(None);
        let jobs = ready(OutputPlanner::new(&request).plan(
            Path::new("/v/a.mov"),
            &filters,
            None,
            None,
            nothing_exists,
        ));
        assert_eq!(jobs[0].relabelled(540), None);
    }
}
