//! Shared utility functions.

use chrono::{DateTime, Utc};

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncates a string to at most `max_chars` characters, appending an ellipsis.
///
/// Counts characters, not bytes, so CJK text is never split mid-codepoint.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Masks all but the network part of an IP address for logs.
pub fn mask_ip(ip: &str) -> String {
    if let Some((network, _)) = ip.rsplit_once('.') {
        format!("{network}.x")
    } else if let Some((network, _)) = ip.rsplit_once(':') {
        format!("{network}:x")
    } else {
        "x".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(timestamp), "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Short", 20), "Short");
        assert_eq!(truncate_string("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_string("こんにちは世界", 4), "こんに…");
    }

    #[test]
    fn test_mask_ip() {
        assert_eq!(mask_ip("192.168.1.20"), "192.168.1.x");
        assert_eq!(mask_ip("2001:db8::1"), "2001:db8::x");
        assert_eq!(mask_ip("localhost"), "x");
    }
}
