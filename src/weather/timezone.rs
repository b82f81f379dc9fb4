use chrono::{DateTime, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Convert a provider epoch timestamp into the city's local (date, time).
///
/// The offset is the provider's stated offset from UTC in seconds; it is applied
/// as-is, no DST rules are consulted.
pub fn local_date_time(epoch_secs: i64, utc_offset_secs: i32) -> (String, String) {
    let shifted = epoch_secs.saturating_add(i64::from(utc_offset_secs));
    let local: DateTime<Utc> = DateTime::from_timestamp(shifted, 0).unwrap_or_default();
    (
        local.format(DATE_FORMAT).to_string(),
        local.format(TIME_FORMAT).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc() {
        // 2024-03-10 12:00:00 UTC
        assert_eq!(
            local_date_time(1710072000, 0),
            ("2024-03-10".to_string(), "12:00:00".to_string())
        );
    }

    #[test]
    fn test_positive_offset_crosses_midnight() {
        // 2024-03-10 21:00:00 UTC, IST +05:30
        assert_eq!(
            local_date_time(1710104400, 19800),
            ("2024-03-11".to_string(), "02:30:00".to_string())
        );
    }

    #[test]
    fn test_negative_offset_goes_back_a_day() {
        // 2024-03-10 03:00:00 UTC, -05:00
        assert_eq!(
            local_date_time(1710039600, -18000),
            ("2024-03-09".to_string(), "22:00:00".to_string())
        );
    }
}
