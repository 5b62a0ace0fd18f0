/// Formats a playback position as `M:SS`.
///
/// Minutes are not rolled over into hours. NaN, negative and infinite
/// input all render as `0:00` so a half-loaded element never shows garbage.
pub fn format_time(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

/// Parses catalog duration labels such as `9:56` or `1:02:03`.
pub fn parse_duration_label(label: &str) -> Option<f64> {
    let parts: Vec<&str> = label.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let mut total = 0_u64;
    for (position, part) in parts.iter().enumerate() {
        let value: u64 = part.parse().ok()?;
        if position > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(3_600.0), "60:00");
    }

    #[test]
    fn degenerate_input_renders_zero() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn parses_catalog_labels() {
        assert_eq!(parse_duration_label("9:56"), Some(596.0));
        assert_eq!(parse_duration_label("0:12"), Some(12.0));
        assert_eq!(parse_duration_label("1:02:03"), Some(3_723.0));
        assert_eq!(parse_duration_label("1:75"), None);
        assert_eq!(parse_duration_label(""), None);
        assert_eq!(parse_duration_label("abc"), None);
    }

    proptest::proptest! {
        #[test]
        fn output_always_has_minutes_and_two_second_digits(seconds in 0.0f64..1.0e7) {
            let text = format_time(seconds);
            let (minutes, secs) = text.split_once(':').expect("separator");
            prop_assert!(!minutes.is_empty() && minutes.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(secs.len() == 2 && secs.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn whole_seconds_round_trip_through_label(seconds in 0u32..100_000) {
            let text = format_time(f64::from(seconds));
            let parsed = parse_duration_label(&text);
            if seconds < 3_600 {
                prop_assert!(parsed == Some(f64::from(seconds)));
            }
        }
    }
}
