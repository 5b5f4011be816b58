//! Display helpers shared by the engine and the mini-player.

/// `m:ss` below an hour, `h:mm:ss` above. NaN, infinite and negative inputs
/// render as `0:00`.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Whole percent of `position` through `duration`, clamped to `0..=100`.
/// An unknown or zero duration is 0%.
pub fn progress_percent(position: f64, duration: f64) -> u8 {
    if !(duration > 0.0) || !duration.is_finite() || !position.is_finite() {
        return 0;
    }

    ((position / duration) * 100.0).clamp(0.0, 100.0).floor() as u8
}

/// Scrolling title line: `"Title · byline"`, or just the title.
pub fn ticker_text(title: &str, byline: &str) -> String {
    let title = title.trim();
    let byline = byline.trim();

    match (title.is_empty(), byline.is_empty()) {
        (false, false) => format!("{} · {}", title, byline),
        (false, true) => title.to_string(),
        (true, false) => byline.to_string(),
        (true, true) => String::new(),
    }
}

/// Seconds to whole milliseconds, for event payloads.
pub(crate) fn secs_to_millis(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
