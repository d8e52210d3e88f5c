//! Human-readable rendering of durations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("cannot format negative duration: {0}s")]
    NegativeDuration(i64),
}

/// Render a whole number of seconds as `HH:MM:SS`.
///
/// Each field is zero-padded to two digits. Hours are not wrapped at 24 and
/// widen past two digits when needed.
pub fn elapsed_time(seconds: i64) -> Result<String, FormatError> {
    if seconds < 0 {
        return Err(FormatError::NegativeDuration(seconds));
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    Ok(format!("{hours:02}:{minutes:02}:{secs:02}"))
}
