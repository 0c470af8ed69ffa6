use chrono::{DateTime, Days, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Symbolic length of an activity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum ActivityRange {
    #[default]
    #[strum(serialize = "7d")]
    #[serde(rename = "7d")]
    #[value(name = "7d")]
    Week,

    #[strum(serialize = "30d")]
    #[serde(rename = "30d")]
    #[value(name = "30d")]
    Month,

    #[strum(serialize = "90d")]
    #[serde(rename = "90d")]
    #[value(name = "90d")]
    Quarter,
}

impl ActivityRange {
    /// Number of calendar days covered by the range.
    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }
}

/// An inclusive span of UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Resolve `range` against `now`.
    ///
    /// `end` is `now` truncated to its UTC date and `start` lies `days - 1` dates before it,
    /// so the window always holds exactly `range.days()` dates.
    #[must_use]
    pub fn resolve(range: ActivityRange, now: DateTime<Utc>) -> Self {
        let end = now.date_naive();
        let start = end
            .checked_sub_days(Days::new(u64::from(range.days() - 1)))
            .unwrap_or(NaiveDate::MIN);

        Self { start, end }
    }

    /// Number of dates in the window, counting both ends.
    #[must_use]
    pub fn days(&self) -> u32 {
        u32::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Every date in the window, in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    /// First date after the window.
    #[must_use]
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn command_line_names_match_symbols() {
        for range in ActivityRange::iter() {
            let parsed = <ActivityRange as ValueEnum>::from_str(&range.to_string(), false).unwrap();
            assert_eq!(parsed, range);
        }

        let _ = <ActivityRange as ValueEnum>::from_str("14d", false).unwrap_err();
    }

    #[test]
    fn seven_days_ending_today() {
        let window = DateWindow::resolve(ActivityRange::Week, at("2024-03-10T15:30:00Z"));
        assert_eq!(window.start, date("2024-03-04"));
        assert_eq!(window.end, date("2024-03-10"));
    }

    #[test]
    fn window_length_matches_range() {
        for now in ["2024-03-10T00:00:00Z", "2024-03-10T23:59:59Z", "2024-01-01T12:00:00Z", "2024-02-29T06:00:00Z"] {
            for range in ActivityRange::iter() {
                let window = DateWindow::resolve(range, at(now));
                assert_eq!((window.end - window.start).num_days() + 1, i64::from(range.days()), "{range} at {now}");
                assert_eq!(window.days(), range.days());
                assert_eq!(window.dates().count(), range.days() as usize);
            }
        }
    }

    #[test]
    fn end_is_utc_date_regardless_of_time_of_day() {
        for now in ["2024-03-10T00:00:00Z", "2024-03-10T15:30:00Z", "2024-03-10T23:59:59.999Z"] {
            let window = DateWindow::resolve(ActivityRange::Month, at(now));
            assert_eq!(window.end, date("2024-03-10"));
        }

        // Offsets are converted to UTC before truncation
        let shifted = DateTime::parse_from_rfc3339("2024-03-10T22:00:00-05:00").unwrap().with_timezone(&Utc);
        assert_eq!(DateWindow::resolve(ActivityRange::Week, shifted).end, date("2024-03-11"));
    }

    #[test]
    fn windows_cross_month_and_year_boundaries() {
        let window = DateWindow::resolve(ActivityRange::Quarter, at("2024-03-01T08:00:00Z"));
        assert_eq!(window.start, date("2023-12-03"));
        assert_eq!(window.end_exclusive(), date("2024-03-02"));
    }

    #[test]
    fn dates_are_ascending_and_inclusive() {
        let window = DateWindow::resolve(ActivityRange::Week, at("2024-03-10T15:30:00Z"));
        let dates: Vec<_> = window.dates().collect();
        assert_eq!(dates.first(), Some(&date("2024-03-04")));
        assert_eq!(dates.last(), Some(&date("2024-03-10")));
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn range_symbols() {
        assert_eq!("7d".parse::<ActivityRange>().unwrap(), ActivityRange::Week);
        assert_eq!("30d".parse::<ActivityRange>().unwrap(), ActivityRange::Month);
        assert_eq!("90d".parse::<ActivityRange>().unwrap(), ActivityRange::Quarter);
        let _ = "14d".parse::<ActivityRange>().unwrap_err();

        assert_eq!(ActivityRange::Month.to_string(), "30d");
        assert_eq!(serde_json::to_string(&ActivityRange::Quarter).unwrap(), "\"90d\"");
    }

    #[test]
    fn window_serializes_as_iso_dates() {
        let window = DateWindow::resolve(ActivityRange::Week, at("2024-03-10T15:30:00Z"));
        assert_eq!(serde_json::to_string(&window).unwrap(), r#"{"start":"2024-03-04","end":"2024-03-10"}"#);
    }
}
