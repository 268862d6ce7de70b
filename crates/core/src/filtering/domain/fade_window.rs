use crate::shared::constants::{DEFAULT_FADE_BLACK, DEFAULT_FADE_TIME};
use crate::shared::errors::FadeWindowError;
use crate::shared::time_math::{format_offset, round_offset};

/// Requested fade parameters, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeTiming {
    /// Length of each fade.
    pub duration: f64,
    /// Black time kept before the fade-in and after the fade-out of a cut.
    pub black: f64,
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            duration: DEFAULT_FADE_TIME,
            black: DEFAULT_FADE_BLACK,
        }
    }
}

/// The stretch of the source the output covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipSpan {
    /// Resolved cut bounds in source seconds.
    Cut { start: f64, end: f64 },
    /// The whole source.
    Whole { duration: f64 },
}

/// Resolved fade-in/fade-out offsets, already rounded for the encoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeWindow {
    pub fade_in_start: f64,
    pub fade_out_start: f64,
    pub duration: f64,
}

impl FadeWindow {
    /// Place the fades inside `span`.
    ///
    /// With a cut, both fades sit `black` seconds inside the cut bounds;
    /// without one they touch the start and end of the source. A span too
    /// short for both fades is rejected instead of yielding overlapping or
    /// negative offsets.
    pub fn compute(timing: &FadeTiming, span: ClipSpan) -> Result<Self, FadeWindowError> {
        let duration = round_offset(timing.duration);
        let black = round_offset(timing.black);

        let (fade_in_start, fade_out_start, required, available) = match span {
            ClipSpan::Cut { start, end } => (
                round_offset(black + start),
                round_offset(end - duration - black),
                2.0 * (duration + black),
                end - start,
            ),
            ClipSpan::Whole { duration: total } => (
                0.0,
                round_offset(total - duration),
                2.0 * duration,
                total,
            ),
        };

        let fade_in_end = round_offset(fade_in_start + duration);
        if fade_out_start < 0.0 || fade_in_end > fade_out_start {
            return Err(FadeWindowError {
                fade_in_end,
                fade_out_start,
                required: round_offset(required),
                available: round_offset(available),
            });
        }

        Ok(Self {
            fade_in_start,
            fade_out_start,
            duration,
        })
    }

    pub fn video_filter(&self) -> String {
        self.render("fade")
    }

    pub fn audio_filter(&self) -> String {
        self.render("afade")
    }

    fn render(&self, name: &str) -> String {
        let d = format_offset(self.duration);
        format!(
            "{name}=in:st={}:d={d},{name}=out:st={}:d={d}",
            format_offset(self.fade_in_start),
            format_offset(self.fade_out_start),
        )
    }
}
