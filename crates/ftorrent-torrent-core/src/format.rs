//! Display helpers for sizes, rates and durations.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count in base-1024 units with two decimals.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[expect(
        clippy::cast_precision_loss,
        reason = "display rounding to two decimals"
    )]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

/// Render a transfer rate in bytes per second.
#[must_use]
pub fn format_speed(bytes_per_second: u64) -> String {
    if bytes_per_second == 0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", format_size(bytes_per_second))
}

/// Render a duration as `1h 2m 3s`, `2m 3s` or `3s`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Render an ETA: infinity when unknown, `Done` when nothing remains.
#[must_use]
pub fn format_eta(eta: Option<u64>) -> String {
    match eta {
        None => "∞".to_string(),
        Some(0) => "Done".to_string(),
        Some(seconds) => format_duration(seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_scale_through_units() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024_u64.pow(5)), "3072.00 TB");
    }

    #[test]
    fn zero_speed_is_compact() {
        assert_eq!(format_speed(0), "0 B/s");
        assert_eq!(format_speed(2048), "2.00 KB/s");
    }

    #[test]
    fn durations_drop_leading_zero_units() {
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(123), "2m 3s");
        assert_eq!(format_duration(3), "3s");
        assert_eq!(format_eta(None), "∞");
        assert_eq!(format_eta(Some(0)), "Done");
        assert_eq!(format_eta(Some(61)), "1m 1s");
    }
}
