use chrono::{DateTime, Utc};

use crate::errors::DynamoError;

/// Current time as a sort key (epoch seconds).
pub fn now() -> String {
    from_utc_datetime(&Utc::now())
}

pub fn from_utc_datetime(dt: &DateTime<Utc>) -> String {
    dt.timestamp().to_string()
}

pub fn to_utc_datetime(timestamp: &str) -> Result<DateTime<Utc>, DynamoError> {
    timestamp
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| {
            DynamoError::ItemParsing(format!("'{timestamp}' is not an epoch seconds timestamp"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now() {
        let before = Utc::now().timestamp();
        let timestamp: i64 = now().parse().unwrap();
        let after = Utc::now().timestamp();

        assert!(before <= timestamp && timestamp <= after);
    }

    #[test]
    fn test_from_utc_datetime() {
        let dt = Utc.with_ymd_and_hms(2023, 10, 31, 16, 0, 0).unwrap();
        assert_eq!(from_utc_datetime(&dt), "1698768000");
    }

    #[test]
    fn test_to_utc_datetime() {
        let dt = to_utc_datetime("1698768000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 10, 31, 16, 0, 0).unwrap());

        assert!(matches!(
            to_utc_datetime("yesterday"),
            Err(DynamoError::ItemParsing(_))
        ));
    }
}
