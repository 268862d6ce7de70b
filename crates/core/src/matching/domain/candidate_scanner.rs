use std::path::{Path, PathBuf};

/// Domain interface for discovering reference photos.
///
/// Implementations return raster image files found under `dir`, recursively,
/// in a stable order. Matching ties resolve to the earliest entry.
pub trait CandidateScanner: Send {
    fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>;
}
