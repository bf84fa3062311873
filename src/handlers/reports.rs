use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::date_utils::{today, Period, PeriodFilterable, PeriodSelector};
use crate::error::AppResult;
use crate::filters::money_class;
use crate::form_utils::{deserialize_optional_i64, non_empty};
use crate::handlers::SelectOption;
use crate::models::{
    category_info, default_direction_for, CategoryInfo, CategorySelector, Direction,
    PropertyOption, Settings, CATEGORIES,
};
use crate::services::cash_flow::MonthlyBucket;
use crate::services::reports::{
    build_report, export_csv_string, ChartPoint, FinancialSummary, Report, ReportRequest,
};
use crate::state::AppState;

/// Query parameters shared by report pages and the reporting API.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub period: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category: Option<String>,
    pub series: Option<String>,
}

impl PeriodFilterable for ReportParams {
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

impl ReportParams {
    pub fn category_selector(&self) -> CategorySelector {
        self.category
            .as_deref()
            .map(CategorySelector::parse)
            .unwrap_or_default()
    }

    pub fn series_selector(&self) -> CategorySelector {
        self.series
            .as_deref()
            .map(CategorySelector::parse)
            .unwrap_or_default()
    }

    pub fn to_request(&self) -> ReportRequest {
        ReportRequest {
            property_id: self.property_id,
            selector: self.selector(),
            range: self.custom_range(),
            category: self.category_selector(),
            series: self.series_selector(),
        }
    }

    /// Canonical query string, used for export links.
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.property_id {
            parts.push(format!("property_id={}", id));
        }
        parts.push(format!("period={}", self.selector().as_str()));
        if let Some(from) = non_empty(&self.from_date) {
            parts.push(format!("from_date={}", urlencoding::encode(&from)));
        }
        if let Some(to) = non_empty(&self.to_date) {
            parts.push(format!("to_date={}", urlencoding::encode(&to)));
        }
        parts.push(format!("category={}", self.category_selector().as_str()));
        parts.push(format!("series={}", self.series_selector().as_str()));
        parts.join("&")
    }
}

pub struct ChartBar {
    pub label: String,
    pub amount: String,
    pub style: String,
}

pub struct BucketRow {
    pub label: String,
    pub income: String,
    pub expenses: String,
    pub maintenance: String,
    pub net: String,
    pub net_class: &'static str,
}

/// A report with every figure already formatted for the page.
pub struct ReportView {
    pub action: String,
    pub period_label: String,
    pub period_options: Vec<SelectOption>,
    pub category_options: Vec<SelectOption>,
    pub series_options: Vec<SelectOption>,
    pub property_options: Vec<SelectOption>,
    pub show_property_filter: bool,
    pub from_date: String,
    pub to_date: String,
    pub export_href: String,
    pub has_data: bool,
    pub total_income: String,
    pub total_expenses: String,
    pub total_maintenance: String,
    pub net_income: String,
    pub net_class: &'static str,
    pub average_net: String,
    pub transaction_count: usize,
    pub months: u32,
    pub bars: Vec<ChartBar>,
    pub rows: Vec<BucketRow>,
}

impl ReportView {
    pub fn new(
        report: &Report,
        params: &ReportParams,
        settings: &Settings,
        action: impl Into<String>,
    ) -> Self {
        let selector = params.selector();
        let category = params.category_selector();
        let series = params.series_selector();
        let summary = &report.summary;

        let bars = report
            .chart
            .iter()
            .rev()
            .map(|p| ChartBar {
                label: p.label.clone(),
                amount: settings.format_money_whole(p.amount_cents),
                style: p.bar_style(),
            })
            .collect();

        let rows = report
            .buckets
            .iter()
            .map(|b| BucketRow {
                label: b.label.clone(),
                income: settings.format_money_neutral(b.income_cents),
                expenses: settings.format_money_neutral(b.expenses_cents),
                maintenance: settings.format_money_neutral(b.maintenance_cents),
                net: settings.format_money_plain(b.net_cents()),
                net_class: money_class(b.net_cents()),
            })
            .collect();

        Self {
            action: action.into(),
            period_label: if selector == PeriodSelector::Custom {
                report.period.display_label()
            } else {
                selector.label().to_string()
            },
            period_options: PeriodSelector::all()
                .iter()
                .map(|s| SelectOption::new(s.as_str(), s.label(), *s == selector))
                .collect(),
            category_options: CategorySelector::all()
                .iter()
                .map(|c| SelectOption::new(c.as_str(), c.label(), *c == category))
                .collect(),
            series_options: CategorySelector::all()
                .iter()
                .map(|c| SelectOption::new(c.as_str(), c.label(), *c == series))
                .collect(),
            property_options: Vec::new(),
            show_property_filter: false,
            from_date: report.period.start_str(),
            to_date: report.period.end_str(),
            export_href: format!("/api/reports/export.csv?{}", params.query_string()),
            has_data: summary.has_data(),
            total_income: settings.format_money_neutral(summary.total_income_cents),
            total_expenses: settings.format_money_neutral(summary.total_expenses_cents),
            total_maintenance: settings.format_money_neutral(summary.total_maintenance_cents),
            net_income: settings.format_money_plain(summary.net_income_cents),
            net_class: money_class(summary.net_income_cents),
            average_net: settings.format_money_plain(summary.average_monthly_net_cents),
            transaction_count: summary.transaction_count,
            months: report.window.months,
            bars,
            rows,
        }
    }

    /// Adds a property drop-down to the filter form.
    pub fn with_property_filter(
        mut self,
        options: &[PropertyOption],
        selected: Option<i64>,
    ) -> Self {
        self.property_options = crate::handlers::property_choices(options, selected);
        self.show_property_filter = true;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub period: String,
    pub bounds: Period,
    pub months: u32,
    pub buckets: Vec<MonthlyBucket>,
}

#[derive(Debug, Serialize)]
pub struct ChartReport {
    pub series: &'static str,
    pub points: Vec<ChartPoint>,
}

fn run_report(state: &AppState, params: &ReportParams) -> AppResult<Report> {
    let conn = state.db.get()?;
    build_report(&*conn, &params.to_request(), today())
}

pub async fn monthly(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<MonthlyReport>> {
    let report = run_report(&state, &params)?;

    Ok(Json(MonthlyReport {
        period: report.selector.as_str().to_string(),
        bounds: report.period,
        months: report.window.months,
        buckets: report.buckets,
    }))
}

pub async fn chart(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<ChartReport>> {
    let report = run_report(&state, &params)?;

    Ok(Json(ChartReport {
        series: params.series_selector().as_str(),
        points: report.chart,
    }))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<FinancialSummary>> {
    let report = run_report(&state, &params)?;
    Ok(Json(report.summary))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<impl IntoResponse> {
    let settings = state.load_settings()?;
    let report = run_report(&state, &params)?;
    let rows = report.export_rows();
    let csv = export_csv_string(&rows, &settings)?;

    tracing::info!(
        rows = rows.len(),
        period = report.selector.as_str(),
        property_id = ?params.property_id,
        "Exported cash flows"
    );

    let filename = match params.property_id {
        Some(id) => format!("cash-flows-property-{}-{}.csv", id, report.selector.as_str()),
        None => format!("cash-flows-{}.csv", report.selector.as_str()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    ))
}

pub async fn categories() -> Json<&'static [CategoryInfo]> {
    Json(CATEGORIES)
}

#[derive(Debug, Deserialize)]
pub struct DefaultDirectionParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DefaultDirection {
    pub category: String,
    pub direction: Direction,
    pub known: bool,
    pub maintenance_like: bool,
}

pub async fn default_direction(
    Query(params): Query<DefaultDirectionParams>,
) -> Json<DefaultDirection> {
    let category = params.category.unwrap_or_default();
    let info = category_info(&category);

    Json(DefaultDirection {
        direction: default_direction_for(&category),
        known: info.is_some(),
        maintenance_like: info.map(|c| c.maintenance_like).unwrap_or(false),
        category,
    })
}
