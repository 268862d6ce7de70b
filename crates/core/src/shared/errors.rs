use std::path::PathBuf;

use thiserror::Error;

/// Malformed user-supplied option values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("invalid time '{0}': expected hh:mm:ss[.frac] or seconds")]
    Time(String),
    #[error("unknown resolution '{0}': expected one of 66, 50, 33, 720, 540, 320")]
    Resolution(String),
    #[error("unknown transpose mode '{0}': expected one of CCWFlip, 90, -90, 180, CWFlip")]
    Transpose(String),
    #[error("invalid time shift '{0}': expected [-]hh:mm")]
    TimeShift(String),
}

/// Fade window that would overlap itself or start at a negative offset.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "fade window too short: fade-in ends at {fade_in_end}s but fade-out starts at {fade_out_start}s \
     (need at least {required}s of footage, have {available}s)"
)]
pub struct FadeWindowError {
    pub fade_in_end: f64,
    pub fade_out_start: f64,
    pub required: f64,
    pub available: f64,
}

/// Failure local to one input file or one (file, resolution) job.
///
/// None of these abort the batch; the driver records them and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("cannot determine capture time of {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },
    #[error("probing {path} failed: {reason}")]
    Probe { path: PathBuf, reason: String },
    #[error("{path}: cut starts at {start}s but the source ends at {duration}s")]
    CutBeyondEnd {
        path: PathBuf,
        start: f64,
        duration: f64,
    },
    #[error("{path}: {source}")]
    FadeWindow {
        path: PathBuf,
        #[source]
        source: FadeWindowError,
    },
    #[error("encoding {destination} failed: {reason}")]
    Encode { destination: PathBuf, reason: String },
    #[error("{0} already exists (use --overwrite to replace it)")]
    Collision(PathBuf),
    #[error("syncing metadata to {destination} failed: {reason}")]
    MetadataSync { destination: PathBuf, reason: String },
}
