//! Turns cash flows into the shapes pages and exports need: per-row CSV
//! export, chart series with bar heights, and summary totals.

use std::io;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::date_utils::{format_date, resolve_period, CustomRange, Period, PeriodSelector};
use crate::db::queries::cash_flows;
use crate::error::{AppError, AppResult};
use crate::models::{CashFlow, CashFlowQuery, CategorySelector, Classification, Settings};
use crate::services::cash_flow::{
    aggregate_by_month, filter_cash_flows, month_window, MonthWindow, MonthlyBucket,
};

pub const EXPORT_HEADER: [&str; 7] = [
    "Month",
    "Income",
    "Expenses",
    "Maintenance",
    "Net Income",
    "Category",
    "Description",
];

/// Anything that can hand a report its raw cash flows.
pub trait CashFlowSource {
    fn fetch_cash_flows(&self, query: &CashFlowQuery) -> AppResult<Vec<CashFlow>>;
}

impl CashFlowSource for Connection {
    fn fetch_cash_flows(&self, query: &CashFlowQuery) -> AppResult<Vec<CashFlow>> {
        Ok(cash_flows::list_for_report(self, query)?)
    }
}

impl CashFlowSource for [CashFlow] {
    fn fetch_cash_flows(&self, query: &CashFlowQuery) -> AppResult<Vec<CashFlow>> {
        Ok(self.iter().filter(|cf| query.matches(cf)).cloned().collect())
    }
}

impl CashFlowSource for Vec<CashFlow> {
    fn fetch_cash_flows(&self, query: &CashFlowQuery) -> AppResult<Vec<CashFlow>> {
        self.as_slice().fetch_cash_flows(query)
    }
}

/// One line of the CSV export. Exactly one of the three amounts is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub month: NaiveDate,
    pub income_cents: i64,
    pub expenses_cents: i64,
    pub maintenance_cents: i64,
    pub net_income_cents: i64,
    pub category: String,
    pub description: String,
}

pub fn to_export_rows(cash_flows: &[CashFlow]) -> Vec<ExportRow> {
    cash_flows
        .iter()
        .filter_map(|cf| {
            if let Err(e) = cf.check() {
                warn!(error = %e, "Skipping malformed cash flow in export");
                return None;
            }
            let (income, expenses, maintenance) = match cf.classify() {
                Classification::Income => (cf.amount_cents, 0, 0),
                Classification::Expense => (0, cf.amount_cents, 0),
                Classification::Maintenance => (0, 0, cf.amount_cents),
            };
            Some(ExportRow {
                month: cf.date,
                income_cents: income,
                expenses_cents: expenses,
                maintenance_cents: maintenance,
                net_income_cents: income.saturating_sub(expenses).saturating_sub(maintenance),
                category: cf.category.clone(),
                description: cf.description.clone(),
            })
        })
        .collect()
}

pub fn write_export_csv<W: io::Write>(
    rows: &[ExportRow],
    settings: &Settings,
    writer: W,
) -> AppResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;

    for row in rows {
        wtr.write_record([
            format_date(row.month),
            settings.format_money_whole(row.income_cents),
            settings.format_money_whole(row.expenses_cents),
            settings.format_money_whole(row.maintenance_cents),
            settings.format_money_whole(row.net_income_cents),
            row.category.clone(),
            row.description.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_csv_string(rows: &[ExportRow], settings: &Settings) -> AppResult<String> {
    let mut buf = Vec::new();
    write_export_csv(rows, settings, &mut buf)?;
    String::from_utf8(buf).map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub month_key: String,
    pub label: String,
    pub amount_cents: i64,
    /// Share of the largest point in the series, 0..=100.
    pub height_pct: f64,
}

impl ChartPoint {
    pub fn bar_style(&self) -> String {
        format!("height: {:.1}%", self.height_pct)
    }
}

/// The amount a bucket plots for a series.
///
/// `All` is total activity (income plus both kinds of spending), and
/// `Expenses` includes maintenance so it reads as the full debit total.
pub fn series_amount(bucket: &MonthlyBucket, series: CategorySelector) -> i64 {
    match series {
        CategorySelector::All => bucket.total_activity_cents(),
        CategorySelector::Income => bucket.income_cents,
        CategorySelector::Expenses => bucket.debit_cents(),
        CategorySelector::Maintenance => bucket.maintenance_cents,
    }
}

pub fn to_chart_series(buckets: &[MonthlyBucket], series: CategorySelector) -> Vec<ChartPoint> {
    let amounts: Vec<i64> = buckets.iter().map(|b| series_amount(b, series)).collect();
    let max = amounts.iter().copied().max().unwrap_or(0);

    buckets
        .iter()
        .zip(amounts)
        .map(|(bucket, amount)| ChartPoint {
            month_key: bucket.month_key.clone(),
            label: bucket.label.clone(),
            amount_cents: amount,
            height_pct: if max > 0 {
                amount as f64 / max as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

fn saturating_total(buckets: &[MonthlyBucket], amount: impl Fn(&MonthlyBucket) -> i64) -> i64 {
    buckets.iter().map(amount).fold(0, i64::saturating_add)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_income_cents: i64,
    pub total_expenses_cents: i64,
    pub total_maintenance_cents: i64,
    pub net_income_cents: i64,
    pub transaction_count: usize,
    pub months: usize,
    pub average_monthly_net_cents: i64,
}

impl FinancialSummary {
    pub fn from_buckets(buckets: &[MonthlyBucket], transaction_count: usize) -> Self {
        let total_income_cents = saturating_total(buckets, |b| b.income_cents);
        let total_expenses_cents = saturating_total(buckets, |b| b.expenses_cents);
        let total_maintenance_cents = saturating_total(buckets, |b| b.maintenance_cents);
        let net_income_cents = total_income_cents
            .saturating_sub(total_expenses_cents)
            .saturating_sub(total_maintenance_cents);
        let months = buckets.len();

        Self {
            total_income_cents,
            total_expenses_cents,
            total_maintenance_cents,
            net_income_cents,
            transaction_count,
            months,
            average_monthly_net_cents: if months == 0 {
                0
            } else {
                net_income_cents / months as i64
            },
        }
    }

    pub fn has_data(&self) -> bool {
        self.transaction_count > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub property_id: Option<i64>,
    pub selector: PeriodSelector,
    pub range: CustomRange,
    pub category: CategorySelector,
    pub series: CategorySelector,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub selector: PeriodSelector,
    pub period: Period,
    pub window: MonthWindow,
    #[serde(skip)]
    pub cash_flows: Vec<CashFlow>,
    pub buckets: Vec<MonthlyBucket>,
    pub summary: FinancialSummary,
    pub chart: Vec<ChartPoint>,
}

impl Report {
    pub fn export_rows(&self) -> Vec<ExportRow> {
        to_export_rows(&self.cash_flows)
    }
}

/// Run the whole pipeline: resolve the period, fetch, filter, bucket by
/// month, then summarise and chart.
pub fn build_report<S: CashFlowSource + ?Sized>(
    source: &S,
    request: &ReportRequest,
    today: NaiveDate,
) -> AppResult<Report> {
    let period = resolve_period(request.selector, request.range, today);
    let fetched = source.fetch_cash_flows(&CashFlowQuery {
        property_id: request.property_id,
        from: period.start,
        to: period.end,
    })?;

    let cash_flows = filter_cash_flows(&fetched, &period, request.category);
    let window = month_window(request.selector, &period, &cash_flows, today);
    let buckets = aggregate_by_month(&cash_flows, window.months, window.anchor);

    let counted = cash_flows
        .iter()
        .filter(|cf| cf.check().is_ok() && window.contains(cf.date))
        .count();
    let summary = FinancialSummary::from_buckets(&buckets, counted);
    let chart = to_chart_series(&buckets, request.series);

    debug!(
        property_id = ?request.property_id,
        period = request.selector.as_str(),
        category = request.category.as_str(),
        fetched = fetched.len(),
        kept = cash_flows.len(),
        months = window.months,
        "Built cash flow report"
    );

    Ok(Report {
        selector: request.selector,
        period,
        window,
        cash_flows,
        buckets,
        summary,
        chart,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cf(
        id: i64,
        property_id: i64,
        direction: Direction,
        category: &str,
        amount: i64,
        date: NaiveDate,
    ) -> CashFlow {
        CashFlow {
            id,
            property_id,
            date,
            direction,
            category: category.into(),
            amount_cents: amount,
            description: format!("entry {}", id),
        }
    }

    fn bucket(key: &str, income: i64, expenses: i64, maintenance: i64) -> MonthlyBucket {
        MonthlyBucket {
            month_key: key.into(),
            label: key.into(),
            income_cents: income,
            expenses_cents: expenses,
            maintenance_cents: maintenance,
        }
    }

    #[test]
    fn test_export_rows_have_one_nonzero_amount() {
        let flows = vec![
            cf(1, 1, Direction::Credit, "RENT", 200_000, d(2024, 1, 15)),
            cf(2, 1, Direction::Debit, "REPAIRS", 50_000, d(2024, 1, 20)),
            cf(3, 1, Direction::Debit, "UTILITIES", 8_000, d(2024, 1, 22)),
        ];
        let rows = to_export_rows(&flows);
        assert_eq!(rows.len(), 3);
        for row in &rows {
            let nonzero = [row.income_cents, row.expenses_cents, row.maintenance_cents]
                .iter()
                .filter(|v| **v != 0)
                .count();
            assert_eq!(nonzero, 1);
            assert_eq!(
                row.net_income_cents,
                row.income_cents - row.expenses_cents - row.maintenance_cents
            );
        }
        assert_eq!(rows[1].maintenance_cents, 50_000);
        assert_eq!(rows[1].net_income_cents, -50_000);
    }

    #[test]
    fn test_export_skips_malformed_and_handles_empty() {
        assert!(to_export_rows(&[]).is_empty());
        let flows = vec![cf(1, 1, Direction::Debit, "UTILITIES", -1, d(2024, 1, 1))];
        assert!(to_export_rows(&flows).is_empty());
    }

    #[test]
    fn test_csv_output() {
        let flows = vec![
            cf(1, 1, Direction::Credit, "RENT", 123_449, d(2024, 1, 15)),
            cf(2, 1, Direction::Debit, "REPAIR", 50_000, d(2024, 1, 20)),
        ];
        let csv = export_csv_string(&to_export_rows(&flows), &Settings::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Month,Income,Expenses,Maintenance,Net Income,Category,Description"
        );
        assert_eq!(lines[1], "2024-01-15,\"$1,234\",$0,$0,\"$1,234\",RENT,entry 1");
        assert_eq!(lines[2], "2024-01-20,$0,$0,$500,-$500,REPAIR,entry 2");
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let csv = export_csv_string(&[], &Settings::default()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_chart_heights_relative_to_max() {
        let buckets = vec![bucket("2024-02", 50, 0, 0), bucket("2024-01", 200, 0, 0)];
        let points = to_chart_series(&buckets, CategorySelector::Income);
        assert_eq!(points[0].height_pct, 25.0);
        assert_eq!(points[1].height_pct, 100.0);
        assert_eq!(points[0].bar_style(), "height: 25.0%");
    }

    #[test]
    fn test_chart_all_zero_has_zero_heights() {
        let buckets = vec![bucket("2024-02", 0, 0, 0), bucket("2024-01", 0, 0, 0)];
        for series in CategorySelector::all() {
            let points = to_chart_series(&buckets, *series);
            assert_eq!(points.len(), 2);
            assert!(points.iter().all(|p| p.height_pct == 0.0 && !p.height_pct.is_nan()));
        }
    }

    #[test]
    fn test_series_amounts() {
        let b = bucket("2024-01", 1_000, 300, 200);
        assert_eq!(series_amount(&b, CategorySelector::All), 1_500);
        assert_eq!(series_amount(&b, CategorySelector::Income), 1_000);
        assert_eq!(series_amount(&b, CategorySelector::Expenses), 500);
        assert_eq!(series_amount(&b, CategorySelector::Maintenance), 200);
    }

    #[test]
    fn test_summary_from_buckets() {
        let buckets = vec![bucket("2024-02", 1_000, 300, 100), bucket("2024-01", 1_000, 200, 0)];
        let summary = FinancialSummary::from_buckets(&buckets, 5);
        assert_eq!(summary.total_income_cents, 2_000);
        assert_eq!(summary.total_expenses_cents, 500);
        assert_eq!(summary.total_maintenance_cents, 100);
        assert_eq!(summary.net_income_cents, 1_400);
        assert_eq!(summary.average_monthly_net_cents, 700);
        assert!(summary.has_data());

        assert_eq!(FinancialSummary::from_buckets(&[], 0).average_monthly_net_cents, 0);
    }

    #[test]
    fn test_summary_saturates_on_huge_totals() {
        let buckets = vec![
            bucket("2024-02", i64::MAX, 0, 0),
            bucket("2024-01", i64::MAX, 0, i64::MAX),
        ];
        let summary = FinancialSummary::from_buckets(&buckets, 3);
        assert_eq!(summary.total_income_cents, i64::MAX);
        assert_eq!(summary.total_maintenance_cents, i64::MAX);
        assert_eq!(summary.net_income_cents, 0);
    }

    #[test]
    fn test_build_report_from_memory_source() {
        let flows = vec![
            cf(1, 1, Direction::Credit, "RENT", 200_000, d(2024, 3, 1)),
            cf(2, 2, Direction::Credit, "RENT", 999_999, d(2024, 3, 1)),
            cf(3, 1, Direction::Debit, "REPAIR", 45_000, d(2024, 2, 14)),
            cf(4, 1, Direction::Debit, "UTILITIES", 12_000, d(2023, 12, 31)),
        ];
        let request = ReportRequest {
            property_id: Some(1),
            selector: PeriodSelector::YearToDate,
            ..Default::default()
        };
        let report = build_report(&flows, &request, d(2024, 3, 10)).unwrap();

        assert_eq!(report.period.start, Some(d(2024, 1, 1)));
        assert_eq!(report.buckets.len(), 3);
        assert_eq!(report.cash_flows.len(), 2);
        assert_eq!(report.summary.total_income_cents, 200_000);
        assert_eq!(report.summary.total_maintenance_cents, 45_000);
        assert_eq!(report.summary.total_expenses_cents, 0);
        assert_eq!(report.summary.transaction_count, 2);
        assert_eq!(report.chart.len(), 3);
        assert_eq!(report.export_rows().len(), 2);
    }

    #[test]
    fn test_build_report_category_narrowing() {
        let flows = vec![
            cf(1, 1, Direction::Credit, "RENT", 200_000, d(2024, 3, 1)),
            cf(2, 1, Direction::Debit, "REPAIR", 45_000, d(2024, 2, 14)),
        ];
        let request = ReportRequest {
            selector: PeriodSelector::AllTime,
            category: CategorySelector::Maintenance,
            ..Default::default()
        };
        let report = build_report(flows.as_slice(), &request, d(2024, 3, 10)).unwrap();
        assert_eq!(report.summary.total_income_cents, 0);
        assert_eq!(report.summary.total_maintenance_cents, 45_000);
        assert_eq!(report.window.months, 2);
    }

    #[test]
    fn test_build_report_empty_source() {
        let flows: Vec<CashFlow> = Vec::new();
        let report = build_report(&flows, &ReportRequest::default(), d(2024, 3, 10)).unwrap();
        assert_eq!(report.buckets.len(), 12);
        assert!(!report.summary.has_data());
        assert!(report.chart.iter().all(|p| p.height_pct == 0.0));
    }
}
