//! Date handling for temporal layers.
//!
//! Temporal layers are addressed by calendar day. The day is rendered as an
//! ISO 8601 date (`YYYY-MM-DD`), which is both the cache key component and
//! the value of the `TIME` request parameter.

use chrono::NaiveDate;

const DATE_ID_FORMAT: &str = "%Y-%m-%d";

/// Render a date as its ISO 8601 date id.
pub fn date_id(date: NaiveDate) -> String {
    date.format(DATE_ID_FORMAT).to_string()
}

/// Parse an ISO 8601 date id. A trailing time component is accepted and
/// discarded, so "2014-03-01T12:00:00Z" resolves to 2014-03-01.
pub fn parse_date_id(s: &str) -> Result<NaiveDate, TimeParseError> {
    let day = s.split('T').next().unwrap_or(s).trim();
    NaiveDate::parse_from_str(day, DATE_ID_FORMAT)
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_id() {
        let d = NaiveDate::from_ymd_opt(2014, 3, 1).unwrap();
        assert_eq!(date_id(d), "2014-03-01");
    }

    #[test]
    fn test_parse_date_id() {
        let d = parse_date_id("2014-03-01T12:00:00Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2014, 3, 1).unwrap());
        assert!(parse_date_id("03/01/2014").is_err());
    }
}
