use std::fmt;
use std::str::FromStr;

use crate::shared::errors::FormatError;

/// Rotation applied before scaling. "No rotation" is the absence of a mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransposeMode {
    /// 90° counter-clockwise with a vertical flip.
    CcwFlip,
    /// 90° clockwise.
    Clockwise,
    /// 90° counter-clockwise.
    CounterClockwise,
    /// Two counter-clockwise quarter turns.
    HalfTurn,
    /// 90° clockwise with a vertical flip.
    CwFlip,
}

impl TransposeMode {
    pub const ALL: &[TransposeMode] = &[
        TransposeMode::CcwFlip,
        TransposeMode::Clockwise,
        TransposeMode::CounterClockwise,
        TransposeMode::HalfTurn,
        TransposeMode::CwFlip,
    ];

    /// Command-line token, also used as the output name marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransposeMode::CcwFlip => "CCWFlip",
            TransposeMode::Clockwise => "90",
            TransposeMode::CounterClockwise => "-90",
            TransposeMode::HalfTurn => "180",
            TransposeMode::CwFlip => "CWFlip",
        }
    }

    pub fn filter(&self) -> &'static str {
        match self {
            TransposeMode::CcwFlip => "transpose=0",
            TransposeMode::Clockwise => "transpose=1",
            TransposeMode::CounterClockwise => "transpose=2",
            TransposeMode::HalfTurn => "transpose=2,transpose=2",
            TransposeMode::CwFlip => "transpose=3",
        }
    }
}

impl FromStr for TransposeMode {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransposeMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FormatError::Transpose(s.to_string()))
    }
}

impl fmt::Display for TransposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
