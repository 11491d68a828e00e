//! Countdown display formatting

/// Whole seconds to show for a timer's remaining time, never negative
pub fn display_seconds(remaining_seconds: f64) -> u64 {
    if remaining_seconds <= 0.0 || remaining_seconds.is_nan() {
        0
    } else {
        remaining_seconds.floor() as u64
    }
}

/// Format remaining whole seconds for the race list.
///
/// Once an hour or more remains only the hours are shown; above five minutes
/// only the minutes; from five minutes down, minutes and seconds.
pub fn format_countdown(remaining: u64) -> String {
    if remaining < 1 {
        return String::new();
    }

    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;

    if hours > 0 {
        format!("{}h", hours)
    } else if remaining > 300 {
        format!("{}m", minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
