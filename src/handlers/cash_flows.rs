use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::{format_date, parse_date, today, PeriodFilterable, PeriodSelector};
use crate::db::queries::cash_flows;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::money_class;
use crate::form_utils::{cents_to_input, deserialize_optional_i64, non_empty, parse_cents};
use crate::handlers::{not_found, property_choices, require_property, PropertyScope, SelectOption};
use crate::models::{
    category_info, category_label, default_direction_for, CashFlow, CashFlowWithProperty,
    Direction, NewCashFlow, Settings, CATEGORIES, MAX_PAGE_SIZE,
};
use crate::state::AppState;
use crate::validation::{validate, FormFields, CASH_FLOW_RULES};
use crate::VERSION;

/// A cash flow formatted for tables.
pub struct CashFlowRow {
    pub id: i64,
    pub date: String,
    pub property_id: i64,
    pub property_name: String,
    pub category: String,
    pub direction: &'static str,
    pub amount: String,
    pub amount_class: &'static str,
    pub description: String,
}

impl CashFlowRow {
    pub fn new(item: &CashFlowWithProperty, settings: &Settings) -> Self {
        let cf = &item.cash_flow;
        let signed = match cf.direction {
            Direction::Credit => cf.amount_cents,
            Direction::Debit => -cf.amount_cents,
        };
        Self {
            id: cf.id,
            date: format_date(cf.date),
            property_id: cf.property_id,
            property_name: item.property_name.clone(),
            category: category_label(&cf.category),
            direction: cf.direction.label(),
            amount: settings.format_money_plain(signed),
            amount_class: money_class(signed),
            description: cf.description.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/cash_flows.html")]
pub struct CashFlowsTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub rows: Vec<CashFlowRow>,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
    pub prev_href: String,
    pub next_href: String,
    pub property_options: Vec<SelectOption>,
    pub direction_options: Vec<SelectOption>,
    pub period_options: Vec<SelectOption>,
    pub category: String,
    pub search: String,
    pub from_date: String,
    pub to_date: String,
    pub new_href: String,
}

#[derive(Template)]
#[template(path = "pages/cash_flow_form.html")]
pub struct CashFlowFormTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub action: String,
    pub is_edit: bool,
    pub property_options: Vec<SelectOption>,
    pub direction_options: Vec<SelectOption>,
    pub category_options: Vec<SelectOption>,
    pub date: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CashFlowFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub direction: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub period: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<i64>,
}

impl PeriodFilterable for CashFlowFilterParams {
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

impl CashFlowFilterParams {
    /// The ledger lists everything until a period is picked.
    fn list_selector(&self) -> PeriodSelector {
        let untouched = [&self.period, &self.from_date, &self.to_date]
            .iter()
            .all(|v| non_empty(v).is_none());
        if untouched {
            PeriodSelector::AllTime
        } else {
            self.selector()
        }
    }

    fn direction(&self) -> Option<Direction> {
        non_empty(&self.direction).and_then(|d| Direction::parse(&d))
    }

    /// Query string without the page number.
    fn base_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.property_id {
            parts.push(format!("property_id={}", id));
        }
        if let Some(direction) = self.direction() {
            parts.push(format!("direction={}", direction.as_str()));
        }
        for (key, value) in [
            ("category", &self.category),
            ("search", &self.search),
            ("from_date", &self.from_date),
            ("to_date", &self.to_date),
        ] {
            if let Some(v) = non_empty(value) {
                parts.push(format!("{}={}", key, urlencoding::encode(&v)));
            }
        }
        parts.push(format!("period={}", self.list_selector().as_str()));
        parts.join("&")
    }
}

#[derive(Debug, Deserialize)]
pub struct CashFlowFormData {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub date: String,
    pub direction: Option<String>,
    pub category: String,
    pub amount: String,
    pub description: Option<String>,
}

impl FormFields for CashFlowFormData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "property_id" => self.property_id.map(|id| id.to_string()),
            "date" => Some(self.date.clone()),
            "direction" => self.direction.clone(),
            "category" => Some(self.category.clone()),
            "amount" => Some(self.amount.clone()),
            "description" => self.description.clone(),
            _ => None,
        }
    }
}

impl CashFlowFormData {
    /// Validates the form. A blank direction takes the category's default.
    fn to_new_cash_flow(&self) -> AppResult<NewCashFlow> {
        validate(CASH_FLOW_RULES, self)?;

        let category = self.category.trim();
        let category = category_info(category)
            .map(|c| c.code.to_string())
            .unwrap_or_else(|| category.to_string());

        let direction = match non_empty(&self.direction) {
            Some(d) => Direction::parse(&d)
                .ok_or_else(|| AppError::Validation("Direction must be CREDIT or DEBIT".into()))?,
            None => default_direction_for(&category),
        };

        Ok(NewCashFlow {
            property_id: self
                .property_id
                .ok_or_else(|| AppError::Validation("Property is required".into()))?,
            date: parse_date(&self.date)
                .ok_or_else(|| AppError::Validation("Date must be a date (YYYY-MM-DD)".into()))?,
            direction,
            category,
            amount_cents: parse_cents(&self.amount)
                .ok_or_else(|| AppError::Validation("Amount must be a number".into()))?,
            description: non_empty(&self.description).unwrap_or_default(),
        })
    }
}

fn direction_options(selected: Option<Direction>, blank_label: &str) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("", blank_label, selected.is_none())];
    for d in [Direction::Credit, Direction::Debit] {
        options.push(SelectOption::new(d.as_str(), d.label(), selected == Some(d)));
    }
    options
}

fn category_options() -> Vec<SelectOption> {
    CATEGORIES
        .iter()
        .map(|c| SelectOption::new(c.code, c.label, false))
        .collect()
}

/// Page position within a list, with the requested page clamped to the
/// pages that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(requested: Option<i64>, total_count: i64, page_size: i64) -> Self {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let total_pages = (total_count.max(1) - 1) / page_size + 1;
        Self {
            page: requested.unwrap_or(1).clamp(1, total_pages),
            page_size,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<CashFlowFilterParams>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let selector = params.list_selector();
    let period = crate::date_utils::resolve_period(selector, params.custom_range(), today());


    let mut filter = cash_flows::CashFlowFilter {
        property_id: params.property_id,
        direction: params.direction(),
        category: non_empty(&params.category),
        search: non_empty(&params.search),
        from_date: period.start,
        to_date: period.end,
        limit: None,
        offset: None,
    };

    let conn = state.db.get()?;
    let total_count = cash_flows::count_cash_flows(&conn, &filter)?;
    let pages = Pagination::new(params.page, total_count, app_settings.page_size);
    filter.limit = Some(pages.page_size);
    filter.offset = Some(pages.offset());
    let rows = cash_flows::list_cash_flows(&conn, &filter)?
        .iter()
        .map(|cf| CashFlowRow::new(cf, &app_settings))
        .collect();

    let Pagination { page, total_pages, .. } = pages;
    let base = params.base_query_string();

    let template = CashFlowsTemplate {
        title: "Cash Flows".into(),
        version: VERSION,
        rows,
        total_count,
        page,
        total_pages,
        prev_href: if page > 1 {
            format!("/cash-flows?{}&page={}", base, page - 1)
        } else {
            String::new()
        },
        next_href: if page < total_pages {
            format!("/cash-flows?{}&page={}", base, page + 1)
        } else {
            String::new()
        },
        property_options: property_choices(&options, params.property_id),
        direction_options: direction_options(params.direction(), "Any"),
        period_options: PeriodSelector::all()
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), *s == selector))
            .collect(),
        category: non_empty(&params.category).unwrap_or_default(),
        search: non_empty(&params.search).unwrap_or_default(),
        from_date: period.start_str(),
        to_date: period.end_str(),
        new_href: match params.property_id {
            Some(id) => format!("/cash-flows/new?property_id={}", id),
            None => "/cash-flows/new".into(),
        },
        settings: app_settings,
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(params): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let template = CashFlowFormTemplate {
        title: "Record Cash Flow".into(),
        settings: app_settings,
        version: VERSION,
        action: "/cash-flows/create".into(),
        is_edit: false,
        property_options: property_choices(&options, params.property_id),
        direction_options: direction_options(None, "From category"),
        category_options: category_options(),
        date: format_date(today()),
        category: String::new(),
        amount: String::new(),
        description: String::new(),
    };

    template.render_html()
}

fn load_cash_flow(state: &AppState, id: i64) -> AppResult<CashFlow> {
    let conn = state.db.get()?;
    cash_flows::get_cash_flow(&conn, id)?.ok_or_else(|| not_found("Cash flow", id))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let cf = load_cash_flow(&state, id)?;

    let template = CashFlowFormTemplate {
        title: "Edit Cash Flow".into(),
        settings: app_settings,
        version: VERSION,
        action: format!("/cash-flows/{}/update", id),
        is_edit: true,
        property_options: property_choices(&options, Some(cf.property_id)),
        direction_options: direction_options(Some(cf.direction), "From category"),
        category_options: category_options(),
        date: format_date(cf.date),
        category: cf.category,
        amount: cents_to_input(cf.amount_cents),
        description: cf.description,
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CashFlowFormData>,
) -> AppResult<Redirect> {
    debug!(category = %form.category, amount = %form.amount, "Creating cash flow");
    let new_cash_flow = form.to_new_cash_flow()?;

    let conn = state.db.get()?;
    require_property(&conn, new_cash_flow.property_id)?;
    let id = cash_flows::create_cash_flow(&conn, &new_cash_flow)?;
    info!(cash_flow_id = id, "Cash flow created via web form");

    Ok(Redirect::to(&format!(
        "/cash-flows?property_id={}",
        new_cash_flow.property_id
    )))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<CashFlowFormData>,
) -> AppResult<Redirect> {
    debug!(cash_flow_id = id, "Updating cash flow");
    let new_cash_flow = form.to_new_cash_flow()?;

    let conn = state.db.get()?;
    require_property(&conn, new_cash_flow.property_id)?;
    if !cash_flows::update_cash_flow(&conn, id, &new_cash_flow)? {
        return Err(not_found("Cash flow", id));
    }
    info!(cash_flow_id = id, "Cash flow updated via web form");

    Ok(Redirect::to(&format!(
        "/cash-flows?property_id={}",
        new_cash_flow.property_id
    )))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(cash_flow_id = id, "Deleting cash flow");
    let conn = state.db.get()?;

    if !cash_flows::delete_cash_flow(&conn, id)? {
        return Err(not_found("Cash flow", id));
    }

    Ok(Html(String::new()))
}
