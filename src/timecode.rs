/*!
 * Timecode conversion.
 *
 * Subtitle tracks and interval definitions use `HH:MM:SS` or `HH:MM:SS,mmm`
 * strings; everything downstream works in seconds rounded to one decimal.
 */

use crate::errors::SubtitleError;

/// Round a number of seconds to one decimal place
pub fn round_tenths(seconds: f64) -> f64 {
    (seconds * 10.0).round() / 10.0
}

/// Convert a timecode (`HH:MM:SS` or `HH:MM:SS,mmm`) to seconds
///
/// Example: `00:01:30,330` => `90.3`
pub fn to_seconds(timecode: &str) -> Result<f64, SubtitleError> {
    let parts: Vec<&str> = timecode.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(SubtitleError::timecode(
            timecode,
            format!("expected 3 colon-separated segments, found {}", parts.len()),
        ));
    }

    let hours: u64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| SubtitleError::timecode(timecode, "hours must be a non-negative integer"))?;
    let minutes: u64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| SubtitleError::timecode(timecode, "minutes must be a non-negative integer"))?;

    let seconds_part = parts[2].trim().replace(',', ".");
    // f64::from_str accepts "inf" and "nan"; only plain decimals are timecodes
    if seconds_part.is_empty() || !seconds_part.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(SubtitleError::timecode(timecode, "seconds must be a non-negative number"));
    }
    let seconds: f64 = seconds_part
        .parse()
        .map_err(|_| SubtitleError::timecode(timecode, "seconds must be a non-negative number"))?;

    Ok(round_tenths(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds))
}

/// Format seconds as an SRT-style timecode (HH:MM:SS,mmm)
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
