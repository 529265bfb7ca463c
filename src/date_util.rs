use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Extract the `YYYY-MM-DD` portion of a date or ISO datetime string.
pub fn date_key(iso: &str) -> &str {
    let iso = iso.trim();
    iso.get(..10).unwrap_or(iso)
}

/// Parse the calendar date portion of a date or datetime string.
/// Any time component already embedded in the value is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_key(s), "%Y-%m-%d").ok()
}

/// Parse a wall-clock `HH:MM` or `HH:MM:SS[.fff]` value.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse a timestamp into naive local time.
///
/// Values carrying an offset (`2025-01-10T12:00:00Z`, `2025-01-10 12:00:00+00`)
/// are converted to the local timezone; naive values are taken as local wall
/// clock; a bare date means local midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Local calendar date of a timestamp, per [`parse_timestamp`]. Timestamp
/// shapes it does not recognize fall back to their leading `YYYY-MM-DD`.
pub fn local_date(s: &str) -> Option<NaiveDate> {
    parse_timestamp(s)
        .map(|dt| dt.date())
        .or_else(|| parse_date(s))
}

/// Last representable instant of a day at millisecond precision (23:59:59.999).
pub fn end_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1)
}

/// Local midnight of the most recent Sunday (today, if `now` is a Sunday).
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let back = today.weekday().num_days_from_sunday() as i64;
    (today - Duration::days(back)).and_time(NaiveTime::MIN)
}

/// Whole days between two timestamps' local calendar dates, if both parse.
pub fn days_between(start: &str, end: &str) -> Option<i32> {
    let start = local_date(start)?;
    let end = local_date(end)?;
    Some((end - start).num_days() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key() {
        assert_eq!(date_key("2025-01-15T10:30:00.000Z"), "2025-01-15");
        assert_eq!(date_key("2025-01-15"), "2025-01-15");
        assert_eq!(date_key(" 2025-01-15 "), "2025-01-15");
        assert_eq!(date_key("bad"), "bad");
    }

    #[test]
    fn test_parse_date_ignores_time_component() {
        assert_eq!(parse_date("2024-01-10T18:45:00+02:00"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("10/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("17:00"),
            NaiveTime::from_hms_opt(17, 0, 0)
        );
        assert_eq!(
            parse_time_of_day("09:15:30"),
            NaiveTime::from_hms_opt(9, 15, 30)
        );
        assert_eq!(parse_time_of_day("5pm"), None);
    }

    #[test]
    fn test_parse_timestamp_naive_forms() {
        let expected = ymd(2024, 1, 10).and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-10T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T12:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-10"),
            Some(ymd(2024, 1, 10).and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        assert!(parse_timestamp("2024-01-10T12:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-10T12:30:00.123+05:30").is_some());
        assert!(parse_timestamp("2024-01-10 12:30:00+00").is_some());
    }

    #[test]
    fn test_end_of_day() {
        let eod = end_of_day(ymd(2024, 1, 10));
        assert_eq!(
            eod,
            ymd(2024, 1, 10).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_week_start_is_sunday_midnight() {
        // 2024-01-10 is a Wednesday
        let now = ymd(2024, 1, 10).and_hms_opt(15, 0, 0).unwrap();
        assert_eq!(week_start(now), ymd(2024, 1, 7).and_time(NaiveTime::MIN));

        // A Sunday starts its own week
        let sunday = ymd(2024, 1, 7).and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(week_start(sunday), ymd(2024, 1, 7).and_time(NaiveTime::MIN));

        // Saturday belongs to the week that started six days earlier
        let saturday = ymd(2024, 1, 13).and_hms_opt(23, 0, 0).unwrap();
        assert_eq!(week_start(saturday), ymd(2024, 1, 7).and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_local_date() {
        assert_eq!(local_date("2024-01-10T23:30:00"), Some(ymd(2024, 1, 10)));
        assert_eq!(local_date("2024-01-10"), Some(ymd(2024, 1, 10)));
        assert_eq!(local_date("10/01/2024"), None);
        assert_eq!(local_date("2024-01-10T08:00:00 UTC"), Some(ymd(2024, 1, 10)));

        let offset = "2024-01-06T23:30:00-05:00";
        assert_eq!(
            local_date(offset),
            parse_timestamp(offset).map(|dt| dt.date())
        );
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between("2025-01-01", "2025-01-10T09:00:00"), Some(9));
        assert_eq!(days_between("2025-01-01", "not a date"), None);

        let late = "2025-01-06T23:30:00-05:00";
        let expected = (local_date(late).unwrap() - ymd(2025, 1, 1)).num_days() as i32;
        assert_eq!(days_between("2025-01-01", late), Some(expected));
    }
}
