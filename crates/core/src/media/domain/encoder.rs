use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// Domain interface for the external transcoder.
///
/// Implementations block until the tool exits; no timeout is applied.
pub trait Encoder: Send {
    /// Duration and frame size of a media file.
    fn probe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Transcode `source` into `destination` with the given arguments.
    fn transcode(
        &self,
        source: &Path,
        args: &[String],
        destination: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Human-readable command line for dry runs and logs.
    fn command_line(&self, source: &Path, args: &[String], destination: &Path) -> String {
        format!(
            "ffmpeg -i {} {} {}",
            source.display(),
            args.join(" "),
            destination.display()
        )
    }
}
