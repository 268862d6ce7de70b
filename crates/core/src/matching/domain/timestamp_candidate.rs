use std::path::{Path, PathBuf};

use crate::media::domain::metadata_store::MetadataStore;

/// Where a capture time came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSource {
    CaptureTag,
    ModificationTime,
}

/// A file's best-known capture time in seconds since the epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureTime {
    pub timestamp: i64,
    pub source: TimeSource,
}

/// A reference photo considered for matching.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampCandidate {
    pub path: PathBuf,
    pub capture_time: i64,
}

impl TimestampCandidate {
    /// File name without extension, used as the output name prefix.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Capture tag if present, else file modification time, else `None`.
///
/// An unreadable capture tag counts as absent.
pub fn effective_capture_time(store: &dyn MetadataStore, path: &Path) -> Option<CaptureTime> {
    match store.read_capture_time(path) {
        Ok(Some(timestamp)) => {
            return Some(CaptureTime {
                timestamp,
                source: TimeSource::CaptureTag,
            })
        }
        Ok(None) => {}
        Err(e) => log::debug!("Reading capture tag of {} failed: {e}", path.display()),
    }
    match store.read_modification_time(path) {
        Ok(timestamp) => Some(CaptureTime {
            timestamp,
            source: TimeSource::ModificationTime,
        }),
        Err(e) => {
            log::debug!("Reading modification time of {} failed: {e}", path.display());
            None
        }
    }
}
