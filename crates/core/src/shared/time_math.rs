//! Conversions between seconds and `hh:mm:ss` strings.
//!
//! Everything here is pure; the encoder only ever sees strings produced by
//! [`to_time_string`] and offsets produced by [`format_offset`].

use super::errors::FormatError;

/// Number of decimals kept in filter offsets handed to the encoder.
const OFFSET_DECIMALS: i32 = 2;

/// Parse `hh:mm:ss[.frac]` into seconds.
pub fn to_seconds(time: &str) -> Result<f64, FormatError> {
    let err = || FormatError::Time(time.to_string());
    let fields: Vec<&str> = time.trim().split(':').collect();
    let [h, m, s] = fields.as_slice() else {
        return Err(err());
    };
    let hours: u64 = h.parse().map_err(|_| err())?;
    let minutes: u64 = m.parse().map_err(|_| err())?;
    let seconds: f64 = s.parse().map_err(|_| err())?;
    if !seconds.is_finite() || seconds < 0.0 || s.starts_with('+') {
        return Err(err());
    }
    let whole = hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .ok_or_else(err)?;
    Ok(whole as f64 + seconds)
}

/// Format non-negative seconds as `hh:mm:ss`, keeping `precision` truncated
/// fractional digits.
///
/// Callers clamp negative values before formatting; a negative input is
/// treated as zero in release builds.
pub fn to_time_string(seconds: f64, precision: usize) -> String {
    debug_assert!(seconds >= 0.0, "to_time_string called with {seconds}");
    let scale = 10u64.pow(precision as u32);
    // The nudge keeps values like 0.29 from truncating to 0.28.
    let units = (seconds.max(0.0) * scale as f64 + 1e-6).floor() as u64;
    let whole = units / scale;
    let frac = units % scale;
    let (h, m, s) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if precision == 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}.{frac:0precision$}")
    }
}

/// Parse a command-line time value: either `hh:mm:ss[.frac]` or plain seconds.
pub fn parse_time_arg(value: &str) -> Result<f64, FormatError> {
    if value.contains(':') {
        return to_seconds(value);
    }
    match value.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(FormatError::Time(value.to_string())),
    }
}

/// Parse a capture-time shift written as `[-]hh:mm` into signed seconds.
pub fn parse_time_shift(value: &str) -> Result<i64, FormatError> {
    let err = || FormatError::TimeShift(value.to_string());
    let trimmed = value.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (h, m) = body.split_once(':').ok_or_else(err)?;
    let hours: i64 = h.parse().map_err(|_| err())?;
    let minutes: i64 = m.parse().map_err(|_| err())?;
    if !(0..60).contains(&minutes) || hours < 0 {
        return Err(err());
    }
    let total = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .ok_or_else(err)?;
    Ok(sign * total)
}

/// Round an offset to the precision the encoder accepts.
pub fn round_offset(seconds: f64) -> f64 {
    let factor = 10f64.powi(OFFSET_DECIMALS);
    (seconds * factor).round() / factor
}

/// Render a rounded offset for a filter expression (`9.6`, `10`, `0.35`).
pub fn format_offset(seconds: f64) -> String {
    format!("{}", round_offset(seconds))
}
