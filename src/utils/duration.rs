//! `HH:MM` duration strings used for `timerRemaining`

use thiserror::Error;

/// Canonical zero value of a timer display.
pub const ZERO_HHMM: &str = "00:00";

/// Largest second count that still renders as a valid `HH:MM` (23:59:59).
pub const MAX_SECONDS: i64 = 24 * 3600 - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid timer format: {0:?}, expected HH:MM")]
    InvalidFormat(String),

    #[error("{0} seconds cannot be rendered as HH:MM")]
    OutOfRange(i64),
}

/// Parse an `HH:MM` string (00-23 hours, 00-59 minutes) into whole seconds.
pub fn parse_hhmm(input: &str) -> Result<i64, DurationError> {
    let invalid = || DurationError::InvalidFormat(input.to_string());

    let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
    let hours = two_digits(hours).ok_or_else(invalid)?;
    let minutes = two_digits(minutes).ok_or_else(invalid)?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 3600 + minutes * 60)
}

/// Render a second count as `HH:MM`.
///
/// Negative input clamps to `"00:00"`. Seconds are truncated to whole
/// minutes, so `format_hhmm(59)` is `"00:00"` and `format_hhmm(61)` is `"00:01"`.
pub fn format_hhmm(seconds: i64) -> Result<String, DurationError> {
    if seconds <= 0 {
        return Ok(ZERO_HHMM.to_string());
    }
    if seconds > MAX_SECONDS {
        return Err(DurationError::OutOfRange(seconds));
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    Ok(format!("{:02}:{:02}", hours, minutes))
}

fn two_digits(part: &str) -> Option<i64> {
    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
