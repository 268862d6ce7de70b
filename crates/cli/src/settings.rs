use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use videdit_core::media::infrastructure::exiftool_metadata_store::DEFAULT_EXIFTOOL_BIN;
use videdit_core::media::infrastructure::ffmpeg_cli_encoder::{DEFAULT_FFMPEG_BIN, DEFAULT_FFPROBE_BIN};
use videdit_core::shared::constants::{
    DEFAULT_AUDIO_CODEC, DEFAULT_CRF, DEFAULT_MATCH_TOLERANCE_SECS, QUICK_CRF,
};

/// Persistent defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub exiftool: PathBuf,
    pub audio_codec: String,
    pub crf: u32,
    pub quick_crf: u32,
    pub match_tolerance_secs: u64,
    /// `[-]hh:mm` added to the capture time of every output.
    pub capture_time_shift: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG_BIN),
            ffprobe: PathBuf::from(DEFAULT_FFPROBE_BIN),
            exiftool: PathBuf::from(DEFAULT_EXIFTOOL_BIN),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            crf: DEFAULT_CRF,
            quick_crf: QUICK_CRF,
            match_tolerance_secs: DEFAULT_MATCH_TOLERANCE_SECS,
            capture_time_shift: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("videdit").join("settings.json"))
    }

    /// Load from `path`, or from the user config directory when `None`.
    ///
    /// A missing file silently yields defaults; an unreadable or malformed
    /// one yields defaults with a warning.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::config_path) else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::read(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
