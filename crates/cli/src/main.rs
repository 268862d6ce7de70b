mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::{CommandFactory, Parser};

use videdit_core::filtering::domain::fade_window::FadeTiming;
use videdit_core::filtering::domain::resolution_target::ResolutionToken;
use videdit_core::filtering::domain::transpose_mode::TransposeMode;
use videdit_core::matching::domain::candidate_scanner::CandidateScanner;
use videdit_core::matching::infrastructure::walkdir_image_scanner::WalkDirImageScanner;
use videdit_core::media::infrastructure::exiftool_metadata_store::ExiftoolMetadataStore;
use videdit_core::media::infrastructure::ffmpeg_cli_encoder::FfmpegCliEncoder;
use videdit_core::pipeline::transform_logger::StdoutTransformLogger;
use videdit_core::pipeline::transform_videos_use_case::TransformVideosUseCase;
use videdit_core::shared::constants::{DEFAULT_FADE_BLACK, DEFAULT_FADE_TIME};
use videdit_core::shared::time_math::{parse_time_arg, parse_time_shift};
use videdit_core::shared::transform_request::{
    CutBounds, CutEnd, EncodingOptions, RenamePolicy, TransformRequest,
};

use settings::Settings;

/// Exit code of a batch in which at least one file or job failed.
const EXIT_JOB_FAILURES: i32 = 2;

/// Cut, scale, rotate, fade and re-encode videos in batch.
///
/// Every input is processed on its own; a failing file never stops the rest.
#[derive(Parser)]
#[command(name = "videdit", version)]
struct Cli {
    /// Input video file (repeat for several files).
    #[arg(short = 'i', long = "inputfile", value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Cut the video to --ss/--to.
    #[arg(long, help_heading = "Actions")]
    cut: bool,

    /// Scale to the resolutions given with -s.
    #[arg(long, help_heading = "Actions")]
    scale: bool,

    /// Rotate or flip: CCWFlip, 90, -90, 180, CWFlip.
    #[arg(long, allow_hyphen_values = true, value_name = "MODE", help_heading = "Actions")]
    transpose: Option<String>,

    /// Fade video and audio in and out.
    #[arg(long, help_heading = "Actions")]
    fade: bool,

    /// Only re-encode into an mp4 container; overrides every other action.
    #[arg(long, help_heading = "Actions")]
    mp4: bool,

    /// Cut start, hh:mm:ss[.frac] or seconds.
    #[arg(long, default_value = "00:00:00", value_name = "TIME", help_heading = "Cut")]
    ss: String,

    /// Cut end, hh:mm:ss[.frac], seconds or "end".
    #[arg(long, value_name = "TIME", help_heading = "Cut")]
    to: Option<String>,

    /// Refuse --cut without an explicit --to.
    #[arg(long, help_heading = "Cut")]
    strict: bool,

    /// Target resolution: 66, 50, 33 (percent) or 720, 540, 320 (lines of 1080p).
    #[arg(short = 's', value_name = "RES", value_delimiter = ',', help_heading = "Scale")]
    resolutions: Vec<String>,

    /// Fade duration in seconds.
    #[arg(long, value_name = "SECS", help_heading = "Fade")]
    fadetime: Option<f64>,

    /// Black time before the fade-in and after the fade-out of a cut.
    #[arg(long, value_name = "SECS", help_heading = "Fade")]
    fadeblack: Option<f64>,

    /// Name outputs after reference photos found in this directory.
    #[arg(long, value_name = "DIR", help_heading = "Rename")]
    rename_from: Option<PathBuf>,

    /// Use the matched photo's name as output prefix instead of only suggesting it.
    #[arg(long, requires = "rename_from", help_heading = "Rename")]
    rename: bool,

    /// Do not print suggested names.
    #[arg(long, help_heading = "Rename")]
    no_suggest: bool,

    /// Open each matched photo in the system viewer.
    #[arg(long, requires = "rename_from", help_heading = "Rename")]
    show_image: bool,

    /// Largest accepted gap between video and photo, in seconds.
    #[arg(long, value_name = "SECS", help_heading = "Rename")]
    tolerance: Option<u64>,

    /// Shift applied to each output's capture time, [-]hh:mm.
    #[arg(long, allow_hyphen_values = true, value_name = "SHIFT")]
    timeshift: Option<String>,

    /// Lower quality for faster encodes.
    #[arg(long)]
    quick: bool,

    /// Print the encoder commands without running them.
    #[arg(long)]
    dry: bool,

    /// Replace existing output files.
    #[arg(long)]
    overwrite: bool,

    /// Settings file to use instead of the one in the user config directory.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => process::exit(EXIT_JOB_FAILURES),
        Ok(false) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether any job failed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        return Ok(false);
    }

    let cli = Cli::parse();
    validate(&cli)?;
    let settings = Settings::load(cli.settings.as_deref());
    let request = build_request(&cli, &settings)?;

    let scanner: Option<Box<dyn CandidateScanner>> = request
        .rename_source
        .as_ref()
        .map(|_| Box::new(WalkDirImageScanner::new()) as Box<dyn CandidateScanner>);
    let mut use_case = TransformVideosUseCase::new(
        Box::new(FfmpegCliEncoder::with_binaries(
            settings.ffmpeg.clone(),
            settings.ffprobe.clone(),
        )),
        Box::new(ExiftoolMetadataStore::with_binary(settings.exiftool.clone())),
        scanner,
        Box::new(StdoutTransformLogger::new()),
    );
    if cli.show_image {
        use_case = use_case.with_match_hook(Box::new(show_image));
    }

    let report = use_case.execute(&request, &cli.inputs);
    Ok(report.has_failures())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.strict && cli.cut && cli.to.is_none() {
        return Err("--cut requires --to in strict mode".into());
    }
    if let Some(dir) = &cli.rename_from {
        if !dir.is_dir() {
            return Err(format!("Reference directory {} does not exist", dir.display()).into());
        }
    }
    for (name, value) in [("Fade time", cli.fadetime), ("Fade black", cli.fadeblack)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {v}").into());
            }
        }
    }
    if cli.mp4 && (cli.cut || cli.scale || cli.transpose.is_some() || cli.fade) {
        log::warn!("--mp4 overrides --cut, --scale, --transpose and --fade");
    }
    Ok(())
}

/// Translate flags and settings into the immutable batch request.
fn build_request(cli: &Cli, settings: &Settings) -> Result<TransformRequest, Box<dyn std::error::Error>> {
    let cut = if cli.cut {
        let end = match cli.to.as_deref() {
            None | Some("end") => CutEnd::UntilEnd,
            Some(to) => CutEnd::At(parse_time_arg(to)?),
        };
        Some(CutBounds {
            start: parse_time_arg(&cli.ss)?,
            end,
        })
    } else {
        None
    };

    let scale = if cli.scale || !cli.resolutions.is_empty() {
        let tokens = cli
            .resolutions
            .iter()
            .map(|s| s.parse::<ResolutionToken>())
            .collect::<Result<Vec<_>, _>>()?;
        Some(tokens)
    } else {
        None
    };

    let transpose = cli
        .transpose
        .as_deref()
        .map(str::parse::<TransposeMode>)
        .transpose()?;

    let fade = cli.fade.then(|| FadeTiming {
        duration: cli.fadetime.unwrap_or(DEFAULT_FADE_TIME),
        black: cli.fadeblack.unwrap_or(DEFAULT_FADE_BLACK),
    });

    let rename = match (&cli.rename_from, cli.rename, cli.no_suggest) {
        (None, _, _) => RenamePolicy::Off,
        (Some(_), true, _) => RenamePolicy::Apply,
        (Some(_), false, false) => RenamePolicy::Suggest,
        (Some(_), false, true) => {
            log::warn!("--no-suggest without --rename leaves nothing to do with --rename-from");
            RenamePolicy::Off
        }
    };

    let shift = cli.timeshift.as_ref().or(settings.capture_time_shift.as_ref());
    let capture_time_shift_secs = match shift {
        Some(value) => parse_time_shift(value)?,
        None => 0,
    };

    let request = TransformRequest {
        cut,
        scale,
        transpose,
        fade,
        mp4_passthrough: cli.mp4,
        quick: cli.quick,
        encoding: EncodingOptions {
            audio_codec: settings.audio_codec.clone(),
            crf: settings.crf,
            quick_crf: settings.quick_crf,
        },
        rename,
        rename_source: cli.rename_from.clone(),
        match_tolerance_secs: cli.tolerance.unwrap_or(settings.match_tolerance_secs),
        capture_time_shift_secs,
        dry_run: cli.dry,
        overwrite: cli.overwrite,
    };
    request.validate()?;
    Ok(request)
}

fn show_image(path: &Path) {
    if let Err(e) = open::that(path) {
        log::warn!("Cannot open {}: {e}", path.display());
    }
}
