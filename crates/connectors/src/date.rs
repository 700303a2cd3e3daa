//! Calendar date handling for time windows

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::error::{ConnectorError, Result};

/// Resolve a `YYYY-MM-DD` date to midnight in `tz`, as seconds since epoch
///
/// The shape is checked strictly (four-digit year, two-digit month and
/// day) before calendar validation, so `2023-7-1` is rejected.
pub fn start_of_day(date: &str, tz: Tz) -> Result<i64> {
    let bytes = date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ConnectorError::invalid_date(date));
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ConnectorError::invalid_date(date))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ConnectorError::invalid_date(date))?;

    // An ambiguous midnight takes the earlier instant; one inside a DST gap does not exist
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| ConnectorError::invalid_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day_leap_day() {
        assert_eq!(start_of_day("2024-02-29", Tz::UTC).unwrap(), 1709164800);
    }

    #[test]
    fn test_start_of_day_ahead_of_utc() {
        // Tokyo is UTC+9 with no DST
        let ts = start_of_day("2023-07-01", chrono_tz::Asia::Tokyo).unwrap();
        assert_eq!(ts, 1688169600 - 9 * 3600);
    }
}
