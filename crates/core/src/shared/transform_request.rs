use std::path::PathBuf;

use thiserror::Error;

use crate::filtering::domain::fade_window::FadeTiming;
use crate::filtering::domain::resolution_target::ResolutionToken;
use crate::filtering::domain::transpose_mode::TransposeMode;

use super::constants::{DEFAULT_AUDIO_CODEC, DEFAULT_CRF, DEFAULT_MATCH_TOLERANCE_SECS, QUICK_CRF};

/// End of a cut: an absolute source time, or wherever the source ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CutEnd {
    At(f64),
    UntilEnd,
}

/// Requested cut, in source seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutBounds {
    pub start: f64,
    pub end: CutEnd,
}

impl CutBounds {
    /// Resolve both bounds to seconds; `duration` is only consulted for
    /// [`CutEnd::UntilEnd`].
    pub fn resolve(&self, duration: Option<f64>) -> Option<(f64, f64)> {
        match self.end {
            CutEnd::At(end) => Some((self.start, end)),
            CutEnd::UntilEnd => duration.map(|d| (self.start, d)),
        }
    }
}

/// What happens with a matched reference photo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenamePolicy {
    #[default]
    Off,
    /// Report the suggested name, keep the generated one.
    Suggest,
    /// Prefix the output names with the matched photo's name.
    Apply,
}

/// Encoder quality options appended to every transcode.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingOptions {
    pub audio_codec: String,
    pub crf: u32,
    pub quick_crf: u32,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            crf: DEFAULT_CRF,
            quick_crf: QUICK_CRF,
        }
    }
}

impl EncodingOptions {
    pub fn args(&self, quick: bool) -> Vec<String> {
        let crf = if quick { self.quick_crf } else { self.crf };
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-crf".to_string(),
            crf.to_string(),
        ]
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("cut start {start}s lies after cut end {end}s")]
    CutOrder { start: f64, end: f64 },
    #[error("renaming requires a reference photo directory")]
    MissingRenameSource,
    #[error("fade time and black time must be non-negative")]
    NegativeFade,
}

/// One batch's worth of requested work, applied to every input file.
///
/// Built once by the caller and never mutated afterwards. An operation is
/// requested when its field is `Some`; `mp4_passthrough` overrides all of
/// them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformRequest {
    pub cut: Option<CutBounds>,
    /// `Some(vec![])` requests scaling with the default resolution.
    pub scale: Option<Vec<ResolutionToken>>,
    pub transpose: Option<TransposeMode>,
    pub fade: Option<FadeTiming>,
    pub mp4_passthrough: bool,
    pub quick: bool,
    pub encoding: EncodingOptions,
    pub rename: RenamePolicy,
    pub rename_source: Option<PathBuf>,
    pub match_tolerance_secs: u64,
    /// Added to the capture time of every output; zero leaves it untouched.
    pub capture_time_shift_secs: i64,
    pub dry_run: bool,
    pub overwrite: bool,
}

impl TransformRequest {
    /// A request with nothing selected and default tolerances.
    pub fn new() -> Self {
        Self {
            match_tolerance_secs: DEFAULT_MATCH_TOLERANCE_SECS,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(CutBounds {
            start,
            end: CutEnd::At(end),
        }) = self.cut
        {
            if start > end {
                return Err(RequestError::CutOrder { start, end });
            }
        }
        if self.rename != RenamePolicy::Off && self.rename_source.is_none() {
            return Err(RequestError::MissingRenameSource);
        }
        if let Some(fade) = self.fade {
            if fade.duration < 0.0 || fade.black < 0.0 {
                return Err(RequestError::NegativeFade);
            }
        }
        Ok(())
    }

    pub fn cut(&self) -> Option<&CutBounds> {
        self.active().and(self.cut.as_ref())
    }

    pub fn scale(&self) -> Option<&[ResolutionToken]> {
        self.active().and(self.scale.as_deref())
    }

    pub fn transpose(&self) -> Option<TransposeMode> {
        self.active().and(self.transpose)
    }

    pub fn fade(&self) -> Option<&FadeTiming> {
        self.active().and(self.fade.as_ref())
    }

    /// Whether the source duration must be probed before planning.
    ///
    /// An explicit cut end fixes the clip span, so a fade on it needs no duration.
    pub fn needs_duration(&self) -> bool {
        let open_ended = !matches!(self.cut(), Some(CutBounds { end: CutEnd::At(_), .. }));
        let cut_until_end = matches!(self.cut(), Some(CutBounds { end: CutEnd::UntilEnd, .. }));
        (self.fade().is_some() && open_ended)
            || cut_until_end
            || self.rename != RenamePolicy::Off
    }

    /// `None` when mp4 passthrough overrides every other operation.
    fn active(&self) -> Option<()> {
        (!self.mp4_passthrough).then_some(())
    }
}
