use std::path::Path;

use crate::media::domain::metadata_store::MetadataStore;
use crate::shared::errors::JobError;

use super::candidate_scanner::CandidateScanner;
use super::timestamp_candidate::{effective_capture_time, TimeSource, TimestampCandidate};

/// A video's recorded capture time and length.
///
/// Cameras usually stamp a video when recording stops, so `recorded_at` is
/// treated as the end of the recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoTiming {
    pub recorded_at: i64,
    pub duration: f64,
}

/// The nearest candidate and its (skew-corrected) gap in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub candidate: TimestampCandidate,
    pub difference: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// Nearest candidate within tolerance.
    Matched(MatchResult),
    /// Nearest candidate, but further away than the tolerance allows.
    Rejected(MatchResult),
    /// No usable candidate at all.
    NoCandidates,
}

impl MatchOutcome {
    pub fn matched(&self) -> Option<&MatchResult> {
        match self {
            MatchOutcome::Matched(result) => Some(result),
            _ => None,
        }
    }
}

/// Gap between a video and a photo taken at `candidate_time`.
///
/// Photos taken at or after the recorded time are compared directly. Photos
/// taken before it are compared against the estimated recording start
/// (`recorded_at - duration`), so a photo shot just before a long recording
/// began is not penalised by the recording's length.
pub fn corrected_difference(video: &VideoTiming, candidate_time: i64) -> f64 {
    if candidate_time >= video.recorded_at {
        (candidate_time - video.recorded_at) as f64
    } else {
        (video.recorded_at as f64 - video.duration - candidate_time as f64).abs()
    }
}

/// Pick the candidate with the smallest corrected gap.
///
/// Exact ties keep the earlier candidate.
pub fn find_nearest(
    video: &VideoTiming,
    candidates: &[TimestampCandidate],
    tolerance_secs: u64,
) -> MatchOutcome {
    let mut best: Option<(&TimestampCandidate, f64)> = None;
    for candidate in candidates {
        let difference = corrected_difference(video, candidate.capture_time);
        if best.map_or(true, |(_, d)| difference < d) {
            best = Some((candidate, difference));
        }
    }

    match best {
        None => MatchOutcome::NoCandidates,
        Some((candidate, difference)) => {
            let result = MatchResult {
                candidate: candidate.clone(),
                difference,
            };
            if difference > tolerance_secs as f64 {
                MatchOutcome::Rejected(result)
            } else {
                MatchOutcome::Matched(result)
            }
        }
    }
}

/// Finds the reference photo taken closest to a video.
///
/// Candidates are re-scanned for every video; nothing is cached between
/// input files.
pub struct TimestampMatcher<'a> {
    scanner: &'a dyn CandidateScanner,
    store: &'a dyn MetadataStore,
    tolerance_secs: u64,
}

impl<'a> TimestampMatcher<'a> {
    pub fn new(
        scanner: &'a dyn CandidateScanner,
        store: &'a dyn MetadataStore,
        tolerance_secs: u64,
    ) -> Self {
        Self {
            scanner,
            store,
            tolerance_secs,
        }
    }

    /// Image files under `dir` with a usable capture time, in scan order.
    pub fn collect_candidates(&self, dir: &Path) -> Vec<TimestampCandidate> {
        let paths = match self.scanner.scan(dir) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("Cannot scan reference directory {}: {e}", dir.display());
                return Vec::new();
            }
        };

        paths
            .into_iter()
            .filter_map(|path| match effective_capture_time(self.store, &path) {
                Some(time) => Some(TimestampCandidate {
                    path,
                    capture_time: time.timestamp,
                }),
                None => {
                    log::warn!("Skipping {}: no capture or modification time", path.display());
                    None
                }
            })
            .collect()
    }

    /// Match `video` (of length `duration`) against the photos under `dir`.
    ///
    /// Fails only when the video's own capture time cannot be determined.
    pub fn match_video(
        &self,
        video: &Path,
        duration: f64,
        dir: &Path,
    ) -> Result<MatchOutcome, JobError> {
        let time = effective_capture_time(self.store, video).ok_or_else(|| JobError::Metadata {
            path: video.to_path_buf(),
            reason: "neither a capture-time tag nor a modification time is available".to_string(),
        })?;
        if time.source == TimeSource::ModificationTime {
            log::info!(
                "{} has no capture-time tag, matching on its modification time",
                video.display()
            );
        }

        let timing = VideoTiming {
            recorded_at: time.timestamp,
            duration,
        };
        let candidates = self.collect_candidates(dir);
        let outcome = find_nearest(&timing, &candidates, self.tolerance_secs);

        if let MatchOutcome::Rejected(nearest) = &outcome {
            log::warn!(
                "No photo within {}s of {}; nearest is {} at {:.0}s",
                self.tolerance_secs,
                video.display(),
                nearest.candidate.path.display(),
                nearest.difference
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn candidate(name: &str, capture_time: i64) -> TimestampCandidate {
        TimestampCandidate {
            path: PathBuf::from(format!("/photos/{name}.jpg")),
            capture_time,
        }
    }

    fn video() -> VideoTiming {
        VideoTiming {
            recorded_at: 1000,
            duration: 50.0,
        }
    }

    fn scenario_candidates() -> Vec<TimestampCandidate> {
        vec![
            candidate("a", 900),
            candidate("b", 980),
            candidate("c", 1010),
            candidate("d", 1100),
        ]
    }

    #[rstest]
    #[case::before_start(900, 50.0)]
    #[case::during_recording(980, 30.0)]
    #[case::after_stop(1010, 10.0)]
    #[case::long_after(1100, 100.0)]
    #[case::exactly_at_stop(1000, 0.0)]
    #[case::exactly_at_start(950, 0.0)]
    fn test_corrected_difference(#[case] candidate_time: i64, #[case] expected: f64) {
        assert_relative_eq!(corrected_difference(&video(), candidate_time), expected);
    }

    #[test]
    fn test_scenario_picks_smallest_corrected_gap() {
        let outcome = find_nearest(&video(), &scenario_candidates(), 200);
        let result = outcome.matched().unwrap();
        assert_eq!(result.candidate.capture_time, 1010);
        assert_relative_eq!(result.difference, 10.0);
    }

    #[test]
    fn test_skew_correction_favours_photo_before_recording() {
        // Raw gaps would be 20 (photo 980) vs 25 (photo 1025); skew-corrected
        // the earlier photo is 30 away, so the later one wins.
        let candidates = vec![candidate("early", 980), candidate("late", 1025)];
        let result = find_nearest(&video(), &candidates, 300);
        assert_eq!(result.matched().unwrap().candidate.capture_time, 1025);

        // A photo from just before the recording started is a near-perfect fit.
        let candidates = vec![candidate("start", 948), candidate("late", 1025)];
        let result = find_nearest(&video(), &candidates, 300);
        let matched = result.matched().unwrap();
        assert_eq!(matched.candidate.capture_time, 948);
        assert_relative_eq!(matched.difference, 2.0);
    }

    #[test]
    fn test_photo_during_recording_within_tolerance() {
        let candidates = vec![candidate("a", 900), candidate("b", 980), candidate("d", 1100)];
        let outcome = find_nearest(&video(), &candidates, 60);
        let result = outcome.matched().unwrap();
        assert_eq!(result.candidate.capture_time, 980);
        assert_relative_eq!(result.difference, 30.0);
    }

    #[test]
    fn test_exceeding_tolerance_is_rejected() {
        let candidates = vec![candidate("a", 900), candidate("b", 980), candidate("d", 1100)];
        match find_nearest(&video(), &candidates, 20) {
            MatchOutcome::Rejected(nearest) => {
                assert_eq!(nearest.candidate.capture_time, 980);
                assert_relative_eq!(nearest.difference, 30.0);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_scenario_with_tight_tolerance_is_rejected() {
        assert!(matches!(
            find_nearest(&video(), &scenario_candidates(), 5),
            MatchOutcome::Rejected(_)
        ));
    }

    #[test]
    fn test_gap_equal_to_tolerance_matches() {
        let outcome = find_nearest(&video(), &[candidate("c", 1010)], 10);
        assert!(outcome.matched().is_some());
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(find_nearest(&video(), &[], 300), MatchOutcome::NoCandidates);
    }

    // --- TimestampMatcher ---

    struct StubScanner {
        paths: Vec<PathBuf>,
        fail: bool,
    }

    impl CandidateScanner for StubScanner {
        fn scan(&self, _dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("permission denied".into());
            }
            Ok(self.paths.clone())
        }
    }

    #[derive(Default)]
    struct StubStore {
        tags: HashMap<PathBuf, i64>,
        mtimes: HashMap<PathBuf, i64>,
    }

    impl MetadataStore for StubStore {
        fn read_capture_time(&self, path: &Path) -> Result<Option<i64>, Box<dyn std::error::Error>> {
            Ok(self.tags.get(path).copied())
        }

        fn read_modification_time(&self, path: &Path) -> Result<i64, Box<dyn std::error::Error>> {
            self.mtimes
                .get(path)
                .copied()
                .ok_or_else(|| "missing".into())
        }

        fn copy_tags(
            &self,
            _: &Path,
            _: &Path,
            _: &[&str],
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn shift_capture_time(&self, _: &Path, _: i64) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn set_modification_time(&self, _: &Path, _: i64) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    fn photo(name: &str) -> PathBuf {
        PathBuf::from(format!("/photos/{name}.jpg"))
    }

    #[test]
    fn test_match_video_uses_tags_and_mtime_fallback() {
        let video_path = PathBuf::from("/videos/clip.mov");
        let mut store = StubStore::default();
        store.tags.insert(video_path.clone(), 1000);
        store.tags.insert(photo("tagged"), 1100);
        store.mtimes.insert(photo("untagged"), 1005);
        let scanner = StubScanner {
            paths: vec![photo("tagged"), photo("untagged"), photo("unknown")],
            fail: false,
        };

        let matcher = TimestampMatcher::new(&scanner, &store, 300);
        let outcome = matcher
            .match_video(&video_path, 50.0, Path::new("/photos"))
            .unwrap();
        assert_eq!(outcome.matched().unwrap().candidate.path, photo("untagged"));
    }

    #[test]
    fn test_candidates_without_any_time_are_skipped() {
        let store = StubStore::default();
        let scanner = StubScanner {
            paths: vec![photo("a"), photo("b")],
            fail: false,
        };
        let matcher = TimestampMatcher::new(&scanner, &store, 300);
        assert!(matcher.collect_candidates(Path::new("/photos")).is_empty());
    }

    #[test]
    fn test_video_without_time_is_metadata_error() {
        let store = StubStore::default();
        let scanner = StubScanner {
            paths: vec![],
            fail: false,
        };
        let matcher = TimestampMatcher::new(&scanner, &store, 300);
        let err = matcher
            .match_video(Path::new("/videos/clip.mov"), 10.0, Path::new("/photos"))
            .unwrap_err();
        assert!(matches!(err, JobError::Metadata { .. }));
    }

    #[test]
    fn test_scan_failure_means_no_candidates() {
        let video_path = PathBuf::from("/videos/clip.mov");
        let mut store = StubStore::default();
        store.mtimes.insert(video_path.clone(), 1000);
        let scanner = StubScanner {
            paths: vec![],
            fail: true,
        };
        let matcher = TimestampMatcher::new(&scanner, &store, 300);
        assert_eq!(
            matcher
                .match_video(&video_path, 10.0, Path::new("/photos"))
                .unwrap(),
            MatchOutcome::NoCandidates
        );
    }
}
