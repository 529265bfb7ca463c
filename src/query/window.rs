use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{Error, Result};

static RE_DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)d$").unwrap());
static RE_WEEKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)w$").unwrap());

/// Longest trend window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// How far back a trend series reaches, always ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendWindow {
    Days(u32),
    WeekToDate,
    MonthToDate,
}

impl TrendWindow {
    /// Parse a window string.
    ///
    /// Supported formats:
    /// - `30d`: last N days
    /// - `4w`: last N weeks
    /// - `wtd`: since Sunday
    /// - `mtd`: since the first of the month
    pub fn parse(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();

        match lower.as_str() {
            "wtd" => return Ok(TrendWindow::WeekToDate),
            "mtd" => return Ok(TrendWindow::MonthToDate),
            _ => {}
        }

        let days = if let Some(caps) = RE_DAYS.captures(&lower) {
            parse_count(&caps[1], s)?
        } else if let Some(caps) = RE_WEEKS.captures(&lower) {
            parse_count(&caps[1], s)?.saturating_mul(7)
        } else {
            return Err(Error::WindowParse(format!(
                "unrecognized window: {s} (expected e.g. 7d, 4w, wtd, mtd)"
            )));
        };

        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(Error::WindowParse(format!(
                "window must cover 1 to {MAX_WINDOW_DAYS} days: {s}"
            )));
        }
        Ok(TrendWindow::Days(days))
    }

    /// Number of daily buckets this window spans when it ends on `today`.
    pub fn days(self, today: NaiveDate) -> u32 {
        match self {
            TrendWindow::Days(n) => n,
            TrendWindow::WeekToDate => today.weekday().num_days_from_sunday() + 1,
            TrendWindow::MonthToDate => today.day(),
        }
    }
}

fn parse_count(digits: &str, original: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| Error::WindowParse(format!("count out of range: {original}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days_and_weeks() {
        assert_eq!(TrendWindow::parse("7d").unwrap(), TrendWindow::Days(7));
        assert_eq!(TrendWindow::parse("30D").unwrap(), TrendWindow::Days(30));
        assert_eq!(TrendWindow::parse(" 4w ").unwrap(), TrendWindow::Days(28));
    }

    #[test]
    fn test_parse_to_date() {
        assert_eq!(TrendWindow::parse("wtd").unwrap(), TrendWindow::WeekToDate);
        assert_eq!(TrendWindow::parse("MTD").unwrap(), TrendWindow::MonthToDate);
    }

    #[test]
    fn test_parse_rejects() {
        for bad in ["", "0d", "d", "7", "2025-Q1", "400d", "99999999999d", "-3d"] {
            assert!(
                matches!(TrendWindow::parse(bad), Err(Error::WindowParse(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_days() {
        // Wednesday
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(TrendWindow::Days(14).days(today), 14);
        assert_eq!(TrendWindow::WeekToDate.days(today), 4);
        assert_eq!(TrendWindow::MonthToDate.days(today), 10);

        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(TrendWindow::WeekToDate.days(sunday), 1);
    }
}
