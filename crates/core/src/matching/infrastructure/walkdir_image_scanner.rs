use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::matching::domain::candidate_scanner::CandidateScanner;

/// Recursively lists raster images under a directory.
///
/// Images are recognised by extension through the `image` crate's format
/// table. Vector formats and `image/x-*` subtypes are left out. Entries are
/// returned sorted by path.
pub struct WalkDirImageScanner;

impl WalkDirImageScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WalkDirImageScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateScanner for WalkDirImageScanner {
    fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        if !dir.is_dir() {
            return Err(format!("{} is not a directory", dir.display()).into());
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(e) if e.file_type().is_file() && is_raster_image(e.path()) => {
                    images.push(e.into_path());
                }
                Ok(_) => {}
                Err(e) => log::warn!(
                    "Cannot read {}: {e}",
                    e.path().unwrap_or(dir).display()
                ),
            }
        }
        Ok(images)
    }
}

/// True when the extension maps to an `image/<subtype>` MIME type whose
/// subtype is not an `x-` extension.
pub fn is_raster_image(path: &Path) -> bool {
    let Ok(format) = image::ImageFormat::from_path(path) else {
        return false;
    };
    format
        .to_mime_type()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.starts_with("x-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    #[rstest]
    #[case("IMG_0001.jpg", true)]
    #[case("IMG_0001.JPEG", true)]
    #[case("scan.png", true)]
    #[case("photo.tiff", true)]
    #[case("drawing.svg", false)]
    #[case("clip.mp4", false)]
    #[case("notes.txt", false)]
    #[case("no_extension", false)]
    fn test_is_raster_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_raster_image(Path::new(name)), expected);
    }

    #[test]
    fn test_scan_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2020").join("april");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        fs::write(dir.path().join("clip.mov"), b"").unwrap();
        fs::write(nested.join("c.jpeg"), b"").unwrap();
        fs::write(nested.join("vector.svg"), b"").unwrap();

        let found = WalkDirImageScanner::new().scan(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["c.jpeg", "a.png", "b.jpg"]);
    }

    #[test]
    fn test_scan_missing_directory_errors() {
        assert!(WalkDirImageScanner::new()
            .scan(Path::new("/nonexistent/photos"))
            .is_err());
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WalkDirImageScanner::new().scan(dir.path()).unwrap().is_empty());
    }
}
