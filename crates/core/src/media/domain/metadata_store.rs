use std::path::Path;

/// Domain interface for reading and writing file timestamps and tags.
///
/// Timestamps are seconds since the Unix epoch.
pub trait MetadataStore: Send {
    /// Capture-time tag, or `None` when the file carries none.
    fn read_capture_time(&self, path: &Path) -> Result<Option<i64>, Box<dyn std::error::Error>>;

    fn read_modification_time(&self, path: &Path) -> Result<i64, Box<dyn std::error::Error>>;

    /// Copy every tag from `source` onto `destination` except `excluded_tags`.
    fn copy_tags(
        &self,
        source: &Path,
        destination: &Path,
        excluded_tags: &[&str],
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Move the capture-time tag by `delta_secs` (may be negative).
    fn shift_capture_time(&self, path: &Path, delta_secs: i64)
        -> Result<(), Box<dyn std::error::Error>>;

    fn set_modification_time(
        &self,
        path: &Path,
        timestamp: i64,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
