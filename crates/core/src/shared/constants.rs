/// Container extension of every output file.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Arguments passed to every transcode so source metadata survives the re-encode.
pub const METADATA_PASSTHROUGH_ARGS: &[&str] =
    &["-map_metadata", "0", "-movflags", "use_metadata_tags"];

pub const DEFAULT_AUDIO_CODEC: &str = "aac";
pub const DEFAULT_CRF: u32 = 19;
/// CRF used by `--quick`: noticeably smaller and faster, visibly softer.
pub const QUICK_CRF: u32 = 30;

pub const DEFAULT_FADE_TIME: f64 = 0.3;
pub const DEFAULT_FADE_BLACK: f64 = 0.1;

/// Largest accepted gap between a video and its matched photo.
pub const DEFAULT_MATCH_TOLERANCE_SECS: u64 = 300;

/// Fractional digits kept when cut bounds are written as `hh:mm:ss`.
pub const CUT_TIME_PRECISION: usize = 3;

/// Tags that describe the source frame size and must not be copied onto a
/// rescaled output.
pub const EXCLUDED_SYNC_TAGS: &[&str] = &["ImageSize", "ImageWidth", "ImageHeight"];

/// Token used in output names when no scaling is requested.
pub const FULL_RESOLUTION_TOKEN: &str = "100";
