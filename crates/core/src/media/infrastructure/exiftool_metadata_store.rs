use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::media::domain::metadata_store::MetadataStore;

pub const DEFAULT_EXIFTOOL_BIN: &str = "exiftool";

/// Tags read as capture time, most trusted first.
const CAPTURE_TAGS: &[&str] = &["DateTimeOriginal", "CreateDate"];

/// Reads and writes tags through the `exiftool` binary.
///
/// Modification times go through the filesystem directly.
pub struct ExiftoolMetadataStore {
    exiftool_bin: PathBuf,
}

impl ExiftoolMetadataStore {
    pub fn new() -> Self {
        Self {
            exiftool_bin: PathBuf::from(DEFAULT_EXIFTOOL_BIN),
        }
    }

    pub fn with_binary(exiftool_bin: impl Into<PathBuf>) -> Self {
        Self {
            exiftool_bin: exiftool_bin.into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let output = Command::new(&self.exiftool_bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.exiftool_bin.display()))?;
        if !output.status.success() {
            return Err(format!(
                "exiftool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        Ok(output.stdout)
    }
}

impl Default for ExiftoolMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for ExiftoolMetadataStore {
    fn read_capture_time(&self, path: &Path) -> Result<Option<i64>, Box<dyn std::error::Error>> {
        let mut args: Vec<String> = vec!["-j".into(), "-d".into(), "%s".into()];
        args.extend(CAPTURE_TAGS.iter().map(|tag| format!("-{tag}")));
        args.push(path.display().to_string());
        let stdout = self.run(&args)?;
        parse_capture_time(&stdout)
    }

    fn read_modification_time(&self, path: &Path) -> Result<i64, Box<dyn std::error::Error>> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(to_epoch_seconds(modified))
    }

    fn copy_tags(
        &self,
        source: &Path,
        destination: &Path,
        excluded_tags: &[&str],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut args: Vec<String> = vec![
            "-ee".into(),
            "-overwrite_original".into(),
            "-tagsFromFile".into(),
            source.display().to_string(),
        ];
        args.extend(excluded_tags.iter().map(|tag| format!("--{tag}")));
        args.push(destination.display().to_string());
        self.run(&args)?;
        Ok(())
    }

    fn shift_capture_time(
        &self,
        path: &Path,
        delta_secs: i64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if delta_secs == 0 {
            return Ok(());
        }
        let args = vec![
            "-overwrite_original".to_string(),
            shift_argument(CAPTURE_TAGS[0], delta_secs),
            path.display().to_string(),
        ];
        self.run(&args)?;
        Ok(())
    }

    fn set_modification_time(
        &self,
        path: &Path,
        timestamp: i64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let file = fs::File::options().write(true).open(path)?;
        file.set_modified(from_epoch_seconds(timestamp))?;
        Ok(())
    }
}

/// `-DateTimeOriginal+=2:00:00` style shift argument.
fn shift_argument(tag: &str, delta_secs: i64) -> String {
    let sign = if delta_secs < 0 { '-' } else { '+' };
    let abs = delta_secs.unsigned_abs();
    format!(
        "-{tag}{sign}={}:{:02}:{:02}",
        abs / 3600,
        (abs % 3600) / 60,
        abs % 60
    )
}

/// Pick the first capture tag that exiftool rendered as epoch seconds.
///
/// With `-d %s`, valid dates come back as numbers (or numeric strings);
/// zeroed dates such as `0000:00:00 00:00:00` stay unparsed and count as
/// absent.
fn parse_capture_time(json: &[u8]) -> Result<Option<i64>, Box<dyn std::error::Error>> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(json)?;
    let Some(record) = records.first() else {
        return Ok(None);
    };
    Ok(CAPTURE_TAGS
        .iter()
        .filter_map(|tag| record.get(*tag))
        .find_map(|value| match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }))
}

fn to_epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

fn from_epoch_seconds(timestamp: i64) -> SystemTime {
    if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(timestamp.unsigned_abs())
    }
}
