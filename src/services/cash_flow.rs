use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::date_utils::{
    month_ordinal, month_start, months_spanned, shift_months, Period, PeriodSelector,
};
use crate::models::{CashFlow, CategorySelector, Classification};

/// Bucket count used when there is nothing to measure an all-time span from.
pub const FALLBACK_MONTHS: u32 = 24;

/// Upper bound on computed spans so charts stay finite.
pub const MAX_MONTHS: u32 = 120;

/// Keep the cash flows inside `period` that match `category`, in input order.
pub fn filter_cash_flows(
    cash_flows: &[CashFlow],
    period: &Period,
    category: CategorySelector,
) -> Vec<CashFlow> {
    cash_flows
        .iter()
        .filter(|cf| period.contains(cf.date) && category.matches(cf))
        .cloned()
        .collect()
}

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month_key: String,
    /// `Jan 2024`
    pub label: String,
    pub income_cents: i64,
    pub expenses_cents: i64,
    pub maintenance_cents: i64,
}

impl MonthlyBucket {
    fn empty(month: NaiveDate) -> Self {
        Self {
            month_key: month.format("%Y-%m").to_string(),
            label: month.format("%b %Y").to_string(),
            income_cents: 0,
            expenses_cents: 0,
            maintenance_cents: 0,
        }
    }

    pub fn net_cents(&self) -> i64 {
        self.income_cents.saturating_sub(self.debit_cents())
    }

    pub fn debit_cents(&self) -> i64 {
        self.expenses_cents.saturating_add(self.maintenance_cents)
    }

    pub fn total_activity_cents(&self) -> i64 {
        self.income_cents.saturating_add(self.debit_cents())
    }

    pub fn is_empty(&self) -> bool {
        self.total_activity_cents() == 0
    }
}

/// Bucket `cash_flows` into `months_to_show` calendar months ending with the
/// month that contains `anchor`, most recent month first.
///
/// Every month gets a bucket even when nothing happened in it. Cash flows
/// outside the window are ignored; malformed ones are skipped with a warning.
pub fn aggregate_by_month(
    cash_flows: &[CashFlow],
    months_to_show: u32,
    anchor: NaiveDate,
) -> Vec<MonthlyBucket> {
    let first_month = month_start(anchor);
    let mut buckets: Vec<MonthlyBucket> = (0..months_to_show)
        .map(|i| MonthlyBucket::empty(shift_months(first_month, -(i as i32))))
        .collect();

    let anchor_ordinal = month_ordinal(anchor);
    let mut skipped = 0usize;

    for cf in cash_flows {
        if let Err(e) = cf.check() {
            warn!(error = %e, "Skipping malformed cash flow during aggregation");
            skipped += 1;
            continue;
        }

        let offset = anchor_ordinal - month_ordinal(cf.date);
        if offset < 0 || offset >= months_to_show as i32 {
            continue;
        }

        let bucket = &mut buckets[offset as usize];
        let total = match cf.classify() {
            Classification::Income => &mut bucket.income_cents,
            Classification::Maintenance => &mut bucket.maintenance_cents,
            Classification::Expense => &mut bucket.expenses_cents,
        };
        *total = total.saturating_add(cf.amount_cents);
    }

    tracing::debug!(
        months = months_to_show,
        input = cash_flows.len(),
        skipped,
        "Aggregated cash flows by month"
    );
    buckets
}

/// How many months a chart shows and which month it ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    pub months: u32,
    pub anchor: NaiveDate,
}

impl MonthWindow {
    /// Whether `date` falls in one of the window's buckets.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let offset = month_ordinal(self.anchor) - month_ordinal(date);
        offset >= 0 && offset < self.months as i32
    }
}

/// Pick the bucket window for a selector.
///
/// Fixed selectors use fixed counts. All-time and custom ranges measure the
/// real span from the period start (or the earliest in-window cash flow) to
/// the anchor, capped at [`MAX_MONTHS`], and fall back to
/// [`FALLBACK_MONTHS`] when there is nothing to measure.
pub fn month_window(
    selector: PeriodSelector,
    period: &Period,
    cash_flows: &[CashFlow],
    today: NaiveDate,
) -> MonthWindow {
    match selector {
        PeriodSelector::Last6Months => MonthWindow {
            months: 6,
            anchor: today,
        },
        PeriodSelector::Last12Months => MonthWindow {
            months: 12,
            anchor: today,
        },
        PeriodSelector::YearToDate => MonthWindow {
            months: today.month(),
            anchor: today,
        },
        PeriodSelector::AllTime | PeriodSelector::Custom => {
            let anchor = period.end.unwrap_or(today);
            let earliest = period.start.or_else(|| {
                cash_flows
                    .iter()
                    .filter(|cf| cf.check().is_ok() && period.contains(cf.date))
                    .map(|cf| cf.date)
                    .min()
            });
            let months = match earliest {
                Some(start) => months_spanned(start, anchor).clamp(1, MAX_MONTHS),
                None => FALLBACK_MONTHS,
            };
            MonthWindow { months, anchor }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_utils::{resolve_period, CustomRange};
    use crate::models::Direction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cf(id: i64, direction: Direction, category: &str, amount: i64, date: NaiveDate) -> CashFlow {
        CashFlow {
            id,
            property_id: 1,
            date,
            direction,
            category: category.into(),
            amount_cents: amount,
            description: format!("flow {}", id),
        }
    }

    fn sample() -> Vec<CashFlow> {
        vec![
            cf(1, Direction::Credit, "RENT", 200_000, d(2024, 3, 1)),
            cf(2, Direction::Debit, "UTILITIES", 12_000, d(2023, 12, 31)),
            cf(3, Direction::Debit, "REPAIR", 45_000, d(2024, 2, 14)),
            cf(4, Direction::Credit, "RENT", 200_000, d(2024, 1, 1)),
            cf(5, Direction::Debit, "INSURANCE", 30_000, d(2024, 3, 10)),
        ]
    }

    #[test]
    fn test_scenario_rent_and_repairs_in_one_month() {
        let flows = vec![
            cf(1, Direction::Credit, "RENT", 200_000, d(2024, 1, 15)),
            cf(2, Direction::Debit, "REPAIRS", 50_000, d(2024, 1, 20)),
        ];
        let buckets = aggregate_by_month(&flows, 1, d(2024, 1, 31));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].month_key, "2024-01");
        assert_eq!(buckets[0].label, "Jan 2024");
        assert_eq!(buckets[0].income_cents, 200_000);
        assert_eq!(buckets[0].expenses_cents, 0);
        assert_eq!(buckets[0].maintenance_cents, 50_000);
    }

    #[test]
    fn test_empty_input_gives_zero_buckets() {
        let buckets = aggregate_by_month(&[], 3, d(2024, 5, 10));
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.is_empty()));
        let keys: Vec<&str> = buckets.iter().map(|b| b.month_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-05", "2024-04", "2024-03"]);
    }

    #[test]
    fn test_bucket_count_is_exact_regardless_of_input() {
        let buckets = aggregate_by_month(&sample(), 6, d(2024, 3, 15));
        assert_eq!(buckets.len(), 6);
        for b in &buckets {
            assert_eq!(b.month_key.len(), 7);
            assert_eq!(&b.month_key[4..5], "-");
        }
    }

    #[test]
    fn test_buckets_are_most_recent_first_across_year_boundary() {
        let buckets = aggregate_by_month(&sample(), 4, d(2024, 3, 15));
        let keys: Vec<&str> = buckets.iter().map(|b| b.month_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-02", "2024-01", "2023-12"]);

        assert_eq!(buckets[0].income_cents, 200_000);
        assert_eq!(buckets[0].expenses_cents, 30_000);
        assert_eq!(buckets[1].maintenance_cents, 45_000);
        assert_eq!(buckets[2].income_cents, 200_000);
        assert_eq!(buckets[3].expenses_cents, 12_000);
    }

    #[test]
    fn test_out_of_window_and_malformed_are_ignored() {
        let mut flows = sample();
        flows.push(cf(6, Direction::Debit, "UTILITIES", -999, d(2024, 3, 2)));
        flows.push(cf(7, Direction::Credit, "RENT", 1, d(2024, 4, 1)));

        let buckets = aggregate_by_month(&flows, 1, d(2024, 3, 31));
        assert_eq!(buckets[0].income_cents, 200_000);
        assert_eq!(buckets[0].expenses_cents, 30_000);
    }

    #[test]
    fn test_huge_amounts_saturate_instead_of_overflowing() {
        let flows = vec![
            cf(1, Direction::Credit, "RENT", i64::MAX, d(2024, 1, 5)),
            cf(2, Direction::Credit, "RENT", i64::MAX, d(2024, 1, 6)),
            cf(3, Direction::Debit, "REPAIRS", i64::MAX, d(2024, 1, 7)),
            cf(4, Direction::Debit, "INSURANCE", i64::MAX, d(2024, 1, 8)),
        ];
        let buckets = aggregate_by_month(&flows, 1, d(2024, 1, 31));
        assert_eq!(buckets[0].income_cents, i64::MAX);
        assert_eq!(buckets[0].debit_cents(), i64::MAX);
        assert_eq!(buckets[0].total_activity_cents(), i64::MAX);
        assert_eq!(buckets[0].net_cents(), 0);
    }

    #[test]
    fn test_zero_months_gives_no_buckets() {
        assert!(aggregate_by_month(&sample(), 0, d(2024, 3, 15)).is_empty());
    }

    #[test]
    fn test_filter_by_period_is_stable_and_inclusive() {
        let period = resolve_period(
            PeriodSelector::YearToDate,
            CustomRange::default(),
            d(2024, 3, 10),
        );
        let filtered = filter_cash_flows(&sample(), &period, CategorySelector::All);
        let ids: Vec<i64> = filtered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let period = Period {
            start: Some(d(2024, 1, 1)),
            end: Some(d(2024, 2, 29)),
        };
        let once = filter_cash_flows(&sample(), &period, CategorySelector::All);
        let twice = filter_cash_flows(&once, &period, CategorySelector::All);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_all_time_filter_is_identity() {
        let flows = sample();
        let filtered = filter_cash_flows(&flows, &Period::unbounded(), CategorySelector::All);
        assert_eq!(filtered, flows);
    }

    #[test]
    fn test_filter_by_category_group() {
        let flows = sample();
        let all = Period::unbounded();

        let income: Vec<i64> = filter_cash_flows(&flows, &all, CategorySelector::Income)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(income, vec![1, 4]);

        let expenses: Vec<i64> = filter_cash_flows(&flows, &all, CategorySelector::Expenses)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(expenses, vec![2, 5]);

        let maintenance: Vec<i64> = filter_cash_flows(&flows, &all, CategorySelector::Maintenance)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(maintenance, vec![3]);
    }

    #[test]
    fn test_month_window_fixed_selectors() {
        let today = d(2024, 3, 10);
        let period = Period::unbounded();
        assert_eq!(
            month_window(PeriodSelector::Last6Months, &period, &[], today).months,
            6
        );
        assert_eq!(
            month_window(PeriodSelector::Last12Months, &period, &[], today).months,
            12
        );
        assert_eq!(
            month_window(PeriodSelector::YearToDate, &period, &[], today).months,
            3
        );
    }

    #[test]
    fn test_month_window_all_time_uses_data_span() {
        let window = month_window(
            PeriodSelector::AllTime,
            &Period::unbounded(),
            &sample(),
            d(2024, 3, 10),
        );
        assert_eq!(window.months, 4);
        assert_eq!(window.anchor, d(2024, 3, 10));
    }

    #[test]
    fn test_month_window_all_time_without_data_falls_back() {
        let window =
            month_window(PeriodSelector::AllTime, &Period::unbounded(), &[], d(2024, 3, 10));
        assert_eq!(window.months, FALLBACK_MONTHS);
    }

    #[test]
    fn test_month_window_custom_anchors_on_end() {
        let period = Period {
            start: Some(d(2023, 11, 15)),
            end: Some(d(2024, 1, 31)),
        };
        let window = month_window(PeriodSelector::Custom, &period, &[], d(2024, 9, 1));
        assert_eq!(window.months, 3);
        assert_eq!(window.anchor, d(2024, 1, 31));
    }

    #[test]
    fn test_month_window_contains() {
        let window = MonthWindow {
            months: 2,
            anchor: d(2024, 1, 10),
        };
        assert!(window.contains(d(2024, 1, 31)));
        assert!(window.contains(d(2023, 12, 1)));
        assert!(!window.contains(d(2023, 11, 30)));
        assert!(!window.contains(d(2024, 2, 1)));
    }

    #[test]
    fn test_month_window_is_capped() {
        let period = Period {
            start: Some(d(1990, 1, 1)),
            end: None,
        };
        let window = month_window(PeriodSelector::Custom, &period, &[], d(2024, 1, 1));
        assert_eq!(window.months, MAX_MONTHS);
    }
}
