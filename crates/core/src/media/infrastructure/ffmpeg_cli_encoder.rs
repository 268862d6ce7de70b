use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::media::domain::encoder::Encoder;
use crate::shared::video_metadata::VideoMetadata;

pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";
pub const DEFAULT_FFPROBE_BIN: &str = "ffprobe";

/// Drives the `ffmpeg` binary for transcoding and `ffprobe` for probing.
///
/// With the `libav` feature, probing goes through libavformat instead and
/// `ffprobe` is never spawned.
pub struct FfmpegCliEncoder {
    ffmpeg_bin: PathBuf,
    ffprobe_bin: PathBuf,
}

impl FfmpegCliEncoder {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from(DEFAULT_FFMPEG_BIN),
            ffprobe_bin: PathBuf::from(DEFAULT_FFPROBE_BIN),
        }
    }

    pub fn with_binaries(ffmpeg_bin: impl Into<PathBuf>, ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    #[cfg_attr(feature = "libav", allow(dead_code))]
    fn probe_with_ffprobe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height:format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.ffprobe_bin.display()))?;
        if !output.status.success() {
            return Err(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        parse_probe_output(&output.stdout, path)
    }
}

impl Default for FfmpegCliEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for FfmpegCliEncoder {
    fn probe(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        #[cfg(feature = "libav")]
        {
            super::libav_probe::probe(path)
        }
        #[cfg(not(feature = "libav"))]
        {
            self.probe_with_ffprobe(path)
        }
    }

    fn transcode(
        &self,
        source: &Path,
        args: &[String],
        destination: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let status = Command::new(&self.ffmpeg_bin)
            .arg("-i")
            .arg(source)
            .args(args)
            .arg(destination)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| format!("failed to run {}: {e}", self.ffmpeg_bin.display()))?;
        if !status.success() {
            return Err(format!("ffmpeg exited with {status}").into());
        }
        Ok(())
    }

    fn command_line(&self, source: &Path, args: &[String], destination: &Path) -> String {
        format!(
            "{} -i {} {} {}",
            self.ffmpeg_bin.display(),
            source.display(),
            args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" "),
            destination.display()
        )
    }
}

/// Quote an argument for display if it contains shell-significant characters.
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "'\"$;&|".contains(c)) {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// Parse `ffprobe -of json` output with `stream=width,height:format=duration`.
pub fn parse_probe_output(
    json: &[u8],
    path: &Path,
) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    #[derive(Deserialize)]
    struct ProbeStream {
        width: u32,
        height: u32,
    }
    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOutput = serde_json::from_slice(json)?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| format!("no video stream in {}", path.display()))?;
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| format!("no duration reported for {}", path.display()))?
        .parse::<f64>()
        .map_err(|e| format!("invalid duration for {}: {e}", path.display()))?;

    Ok(VideoMetadata {
        duration,
        width: stream.width,
        height: stream.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "programs": [],
            "streams": [{ "width": 1920, "height": 1080 }],
            "format": { "duration": "12.480000" }
        }"#;
        let meta = parse_probe_output(json, Path::new("/tmp/clip.mov")).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_relative_eq!(meta.duration, 12.48);
    }

    #[test]
    fn test_parse_probe_output_without_stream_fails() {
        let json = br#"{ "streams": [], "format": { "duration": "3.0" } }"#;
        assert!(parse_probe_output(json, Path::new("/tmp/audio.m4a")).is_err());
    }

    #[test]
    fn test_parse_probe_output_without_duration_fails() {
        let json = br#"{ "streams": [{ "width": 10, "height": 10 }], "format": {} }"#;
        assert!(parse_probe_output(json, Path::new("/tmp/x.mov")).is_err());
    }

    #[test]
    fn test_parse_probe_output_garbage_fails() {
        assert!(parse_probe_output(b"not json", Path::new("/tmp/x.mov")).is_err());
    }

    #[test]
    fn test_command_line_quotes_filters() {
        let encoder = FfmpegCliEncoder::with_binaries("/usr/bin/ffmpeg", "/usr/bin/ffprobe");
        let line = encoder.command_line(
            Path::new("in.mov"),
            &["-filter:v".to_string(), "transpose=1".to_string(), "-y".to_string()],
            Path::new("out.mp4"),
        );
        assert_eq!(line, "/usr/bin/ffmpeg -i in.mov -filter:v transpose=1 -y out.mp4");
        assert_eq!(quote("a b"), "'a b'");
    }

    #[test]
    fn test_transcode_missing_binary_errors() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = FfmpegCliEncoder::with_binaries(
            dir.path().join("no-ffmpeg"),
            dir.path().join("no-ffprobe"),
        );
        let result = encoder.transcode(
            &dir.path().join("in.mov"),
            &[],
            &dir.path().join("out.mp4"),
        );
        assert!(result.is_err());
        assert!(!dir.path().join("out.mp4").exists());
    }
}
