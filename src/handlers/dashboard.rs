use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;

use crate::date_utils::today;
use crate::db::queries::{cash_flows, maintenance, properties, tenants, valuations};
use crate::error::{AppResult, RenderHtml};
use crate::handlers::cash_flows::CashFlowRow;
use crate::handlers::property_name;
use crate::handlers::reports::{ReportParams, ReportView};
use crate::models::Settings;
use crate::services::reports::build_report;
use crate::state::AppState;
use crate::VERSION;

pub struct UpcomingTask {
    pub title: String,
    pub property_name: String,
    pub due: String,
    pub cost: String,
    pub overdue: bool,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub property_count: i64,
    pub portfolio_value: String,
    pub unrealised_gain: String,
    pub gain_class: &'static str,
    pub active_tenants: usize,
    pub rent_roll: String,
    pub overdue_count: usize,
    pub report: ReportView,
    pub recent: Vec<CashFlowRow>,
    pub upcoming: Vec<UpcomingTask>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let today = today();

    let conn = state.db.get()?;

    let property_list = properties::list_properties(&conn)?;
    let latest_values = valuations::latest_values_by_property(&conn)?;
    let purchase_total: i64 = property_list.iter().map(|p| p.purchase_price_cents).sum();
    let portfolio_value: i64 = property_list
        .iter()
        .map(|p| {
            latest_values
                .get(&p.id)
                .copied()
                .unwrap_or(p.purchase_price_cents)
        })
        .sum();
    let gain = portfolio_value - purchase_total;

    let active: Vec<_> = tenants::list_tenants(&conn, None)?
        .into_iter()
        .filter(|t| t.is_active_on(today))
        .collect();
    let rent_roll: i64 = active.iter().map(|t| t.monthly_rent_cents).sum();

    let schedules = maintenance::list_schedules(&conn, None)?;
    let overdue_count = schedules.iter().filter(|s| s.is_overdue(today)).count();
    let upcoming = schedules
        .iter()
        .take(5)
        .map(|s| UpcomingTask {
            title: s.title.clone(),
            property_name: property_name(&options, s.property_id),
            due: s.next_due_date.clone(),
            cost: app_settings.format_money_neutral(s.estimated_cost_cents),
            overdue: s.is_overdue(today),
        })
        .collect();

    let recent = cash_flows::list_cash_flows(
        &conn,
        &cash_flows::CashFlowFilter {
            limit: Some(8),
            ..Default::default()
        },
    )?
    .iter()
    .map(|cf| CashFlowRow::new(cf, &app_settings))
    .collect();

    let report = build_report(&*conn, &params.to_request(), today)?;
    let report = ReportView::new(&report, &params, &app_settings, "/")
        .with_property_filter(&options, params.property_id);

    let template = DashboardTemplate {
        title: "Dashboard".into(),
        property_count: property_list.len() as i64,
        portfolio_value: app_settings.format_money_whole(portfolio_value),
        unrealised_gain: app_settings.format_money_plain(gain),
        gain_class: crate::filters::money_class(gain),
        active_tenants: active.len(),
        rent_roll: app_settings.format_money_neutral(rent_roll),
        overdue_count,
        report,
        recent,
        upcoming,
        settings: app_settings,
        version: VERSION,
    };

    template.render_html()
}
