/// Rate per minute over `elapsed_secs`, rounded. Zero counts give zero.
pub fn per_minute(count: u32, elapsed_secs: u32) -> u32 {
    match (count, elapsed_secs) {
        (0, _) => 0,
        (count, secs) => {
            let minutes = secs.max(1) as f64 / 60.0;
            (count as f64 / minutes).round() as u32
        }
    }
}

/// Rounded percentage of `part` in `whole`, or `None` for an empty whole.
pub fn percentage(part: u32, whole: u32) -> Option<u32> {
    match whole {
        positive if positive > 0 => Some((part as f64 / whole as f64 * 100.0).round() as u32),
        _ => None,
    }
}

/// `mm:ss` for the countdown display.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
