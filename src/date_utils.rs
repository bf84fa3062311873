use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

/// Trait for request params that carry a period selector plus an optional
/// explicit `from_date`/`to_date` pair.
#[allow(clippy::wrong_self_convention)]
pub trait PeriodFilterable {
    fn period(&self) -> Option<&String>;
    fn from_date(&self) -> Option<&String>;
    fn to_date(&self) -> Option<&String>;

    /// The selector named by the request. A missing selector with explicit
    /// dates means `Custom`; an unrecognized one means `AllTime`.
    fn selector(&self) -> PeriodSelector {
        let given = |s: Option<&String>| s.is_some_and(|v| !v.trim().is_empty());
        match self.period() {
            Some(s) if !s.trim().is_empty() => PeriodSelector::parse_or_default(s),
            _ if given(self.from_date()) || given(self.to_date()) => PeriodSelector::Custom,
            _ => PeriodSelector::default(),
        }
    }

    fn custom_range(&self) -> CustomRange {
        CustomRange {
            from: self.from_date().and_then(|s| parse_date(s)),
            to: self.to_date().and_then(|s| parse_date(s)),
        }
    }

    fn resolve_period(&self, today: NaiveDate) -> Period {
        resolve_period(self.selector(), self.custom_range(), today)
    }
}

/// Named time windows offered by report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PeriodSelector {
    Last6Months,
    #[default]
    Last12Months,
    YearToDate,
    AllTime,
    Custom,
}

impl FromStr for PeriodSelector {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "last-6-months" => Ok(Self::Last6Months),
            "last-12-months" => Ok(Self::Last12Months),
            "year-to-date" => Ok(Self::YearToDate),
            "all-time" => Ok(Self::AllTime),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

impl PeriodSelector {
    /// Typos select everything instead of producing an empty report.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::debug!(selector = s, "Unknown period selector, using all-time");
            Self::AllTime
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last6Months => "last-6-months",
            Self::Last12Months => "last-12-months",
            Self::YearToDate => "year-to-date",
            Self::AllTime => "all-time",
            Self::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last6Months => "Last 6 Months",
            Self::Last12Months => "Last 12 Months",
            Self::YearToDate => "Year to Date",
            Self::AllTime => "All Time",
            Self::Custom => "Custom Range",
        }
    }

    pub fn all() -> &'static [PeriodSelector] {
        &[
            Self::Last6Months,
            Self::Last12Months,
            Self::YearToDate,
            Self::AllTime,
            Self::Custom,
        ]
    }
}

/// Explicit bounds supplied alongside the `custom` selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A resolved window; `None` bounds are unbounded. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Period {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn start_str(&self) -> String {
        self.start.map(format_date).unwrap_or_default()
    }

    pub fn end_str(&self) -> String {
        self.end.map(format_date).unwrap_or_default()
    }

    /// Human-readable label, e.g. "Jan 1, 2024 – Mar 10, 2024" or "Since Jan 1, 2024".
    pub fn display_label(&self) -> String {
        let fmt = |d: NaiveDate| d.format("%b %-d, %Y").to_string();
        match (self.start, self.end) {
            (Some(s), Some(e)) => format!("{} – {}", fmt(s), fmt(e)),
            (Some(s), None) => format!("Since {}", fmt(s)),
            (None, Some(e)) => format!("Until {}", fmt(e)),
            (None, None) => "All Time".to_string(),
        }
    }
}

/// Turn a selector into concrete bounds relative to `today`.
pub fn resolve_period(selector: PeriodSelector, explicit: CustomRange, today: NaiveDate) -> Period {
    match selector {
        PeriodSelector::Last6Months => Period {
            start: Some(shift_months(today, -6)),
            end: Some(today),
        },
        PeriodSelector::Last12Months => Period {
            start: Some(shift_months(today, -12)),
            end: Some(today),
        },
        PeriodSelector::YearToDate => Period {
            start: Some(year_start(today)),
            end: Some(today),
        },
        PeriodSelector::AllTime => Period::unbounded(),
        PeriodSelector::Custom => Period {
            start: explicit.from,
            end: explicit.to,
        },
    }
}

/// The server's local calendar date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Move by whole calendar months, clamping to the last day of the target
/// month (Aug 31 minus 6 months is Feb 29 in a leap year).
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

/// Month index counted from year 0, so consecutive months differ by one.
pub fn month_ordinal(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Number of calendar months touched by the range `from..=to`
/// (Jan 31 to Feb 1 spans two months). Zero when `from` is after `to`.
pub fn months_spanned(from: NaiveDate, to: NaiveDate) -> u32 {
    let diff = month_ordinal(to) - month_ordinal(from);
    if diff < 0 {
        0
    } else {
        diff as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Params {
        period: Option<String>,
        from_date: Option<String>,
        to_date: Option<String>,
    }

    impl PeriodFilterable for Params {
        fn period(&self) -> Option<&String> {
            self.period.as_ref()
        }
        fn from_date(&self) -> Option<&String> {
            self.from_date.as_ref()
        }
        fn to_date(&self) -> Option<&String> {
            self.to_date.as_ref()
        }
    }

    #[test]
    fn test_year_to_date() {
        let period = resolve_period(
            PeriodSelector::YearToDate,
            CustomRange::default(),
            d(2024, 3, 10),
        );
        assert_eq!(period.start, Some(d(2024, 1, 1)));
        assert_eq!(period.end, Some(d(2024, 3, 10)));
        assert!(!period.contains(d(2023, 12, 31)));
        assert!(period.contains(d(2024, 2, 1)));
        assert!(period.contains(d(2024, 1, 1)));
        assert!(period.contains(d(2024, 3, 10)));
    }

    #[test]
    fn test_last_six_months_clamps_day() {
        let period = resolve_period(
            PeriodSelector::Last6Months,
            CustomRange::default(),
            d(2024, 8, 31),
        );
        assert_eq!(period.start, Some(d(2024, 2, 29)));
        assert_eq!(period.end, Some(d(2024, 8, 31)));
    }

    #[test]
    fn test_last_twelve_months_crosses_year() {
        let period = resolve_period(
            PeriodSelector::Last12Months,
            CustomRange::default(),
            d(2024, 3, 15),
        );
        assert_eq!(period.start, Some(d(2023, 3, 15)));
    }

    #[test]
    fn test_all_time_is_unbounded() {
        let period = resolve_period(
            PeriodSelector::AllTime,
            CustomRange {
                from: Some(d(2020, 1, 1)),
                to: None,
            },
            d(2024, 3, 15),
        );
        assert!(period.is_unbounded());
        assert!(period.contains(d(1900, 1, 1)));
    }

    #[test]
    fn test_custom_one_sided() {
        let period = resolve_period(
            PeriodSelector::Custom,
            CustomRange {
                from: Some(d(2024, 2, 1)),
                to: None,
            },
            d(2024, 3, 15),
        );
        assert_eq!(period.start, Some(d(2024, 2, 1)));
        assert_eq!(period.end, None);
        assert!(period.contains(d(2030, 1, 1)));
        assert!(!period.contains(d(2024, 1, 31)));
    }

    #[test]
    fn test_unknown_selector_falls_back_to_all_time() {
        assert_eq!(
            PeriodSelector::parse_or_default("last-6-monts"),
            PeriodSelector::AllTime
        );
        assert_eq!(
            "year-to-date".parse::<PeriodSelector>(),
            Ok(PeriodSelector::YearToDate)
        );
    }

    #[test]
    fn test_selector_round_trip() {
        for selector in PeriodSelector::all() {
            assert_eq!(selector.as_str().parse::<PeriodSelector>(), Ok(*selector));
        }
    }

    #[test]
    fn test_filterable_resolution() {
        let params = Params {
            period: None,
            from_date: Some("2024-01-01".into()),
            to_date: Some("2024-01-31".into()),
        };
        assert_eq!(params.selector(), PeriodSelector::Custom);
        let period = params.resolve_period(d(2024, 6, 1));
        assert_eq!(period.start, Some(d(2024, 1, 1)));
        assert_eq!(period.end, Some(d(2024, 1, 31)));

        let params = Params {
            period: Some("custom".into()),
            from_date: Some("not a date".into()),
            to_date: None,
        };
        assert!(params.resolve_period(d(2024, 6, 1)).is_unbounded());

        let params = Params {
            period: None,
            from_date: None,
            to_date: None,
        };
        assert_eq!(params.selector(), PeriodSelector::Last12Months);
    }

    #[test]
    fn test_months_spanned() {
        assert_eq!(months_spanned(d(2024, 1, 31), d(2024, 2, 1)), 2);
        assert_eq!(months_spanned(d(2023, 11, 5), d(2024, 2, 1)), 4);
        assert_eq!(months_spanned(d(2024, 3, 1), d(2024, 3, 31)), 1);
        assert_eq!(months_spanned(d(2024, 4, 1), d(2024, 3, 31)), 0);
    }

    #[test]
    fn test_display_label() {
        let period = Period {
            start: Some(d(2024, 1, 1)),
            end: Some(d(2024, 3, 10)),
        };
        assert_eq!(period.display_label(), "Jan 1, 2024 – Mar 10, 2024");
        assert_eq!(Period::unbounded().display_label(), "All Time");
    }
}
