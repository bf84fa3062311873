use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::today;
use crate::db::queries::{cash_flows, maintenance, properties, tenants, valuations};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::money_class;
use crate::form_utils::{cents_to_input, non_empty, parse_cents};
use crate::handlers::cash_flows::CashFlowRow;
use crate::handlers::maintenance::ScheduleRow;
use crate::handlers::reports::{ReportParams, ReportView};
use crate::handlers::tenants::TenantRow;
use crate::handlers::valuations::ValuationRow;
use crate::handlers::{not_found, SelectOption};
use crate::models::{NewProperty, Property, PropertyType, Settings};
use crate::services::reports::build_report;
use crate::state::AppState;
use crate::validation::{validate, FormFields, PROPERTY_RULES};
use crate::VERSION;

pub struct PropertyRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub property_type: &'static str,
    pub purchase_price: String,
    pub current_value: String,
    pub gain: String,
    pub gain_class: &'static str,
}

impl PropertyRow {
    fn new(property: &Property, latest_value: Option<i64>, settings: &Settings) -> Self {
        let value = latest_value.unwrap_or(property.purchase_price_cents);
        let gain = value - property.purchase_price_cents;
        Self {
            id: property.id,
            name: property.name.clone(),
            address: property.address.clone(),
            property_type: property.property_type.label(),
            purchase_price: settings.format_money_whole(property.purchase_price_cents),
            current_value: settings.format_money_whole(value),
            gain: settings.format_money_plain(gain),
            gain_class: money_class(gain),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/properties.html")]
pub struct PropertiesTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub rows: Vec<PropertyRow>,
}

#[derive(Template)]
#[template(path = "pages/property_form.html")]
pub struct PropertyFormTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub action: String,
    pub is_edit: bool,
    pub name: String,
    pub address: String,
    pub type_options: Vec<SelectOption>,
    pub purchase_price: String,
    pub purchase_date: String,
    pub notes: String,
}

#[derive(Template)]
#[template(path = "pages/property_detail.html")]
pub struct PropertyDetailTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub property: PropertyRow,
    pub purchase_date: String,
    pub notes: String,
    pub latest_valuation: String,
    pub report: ReportView,
    pub tenants: Vec<TenantRow>,
    pub schedules: Vec<ScheduleRow>,
    pub valuations: Vec<ValuationRow>,
    pub recent: Vec<CashFlowRow>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyFormData {
    pub name: String,
    pub address: String,
    pub property_type: String,
    pub purchase_price: Option<String>,
    pub purchase_date: Option<String>,
    pub notes: Option<String>,
}

impl FormFields for PropertyFormData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "address" => Some(self.address.clone()),
            "property_type" => Some(self.property_type.clone()),
            "purchase_price" => self.purchase_price.clone(),
            "purchase_date" => self.purchase_date.clone(),
            "notes" => self.notes.clone(),
            _ => None,
        }
    }
}

impl PropertyFormData {
    fn to_new_property(&self) -> AppResult<NewProperty> {
        validate(PROPERTY_RULES, self)?;

        let property_type = PropertyType::parse(self.property_type.trim()).ok_or_else(|| {
            AppError::Validation(format!("Unknown property type: {}", self.property_type))
        })?;

        Ok(NewProperty {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            property_type,
            purchase_price_cents: non_empty(&self.purchase_price)
                .and_then(|p| parse_cents(&p))
                .unwrap_or(0),
            purchase_date: non_empty(&self.purchase_date),
            notes: non_empty(&self.notes),
        })
    }
}

fn type_options(selected: Option<PropertyType>) -> Vec<SelectOption> {
    PropertyType::all()
        .iter()
        .map(|t| SelectOption::new(t.as_str(), t.label(), selected == Some(*t)))
        .collect()
}

pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let conn = state.db.get()?;

    let latest = valuations::latest_values_by_property(&conn)?;
    let rows = properties::list_properties(&conn)?
        .iter()
        .map(|p| PropertyRow::new(p, latest.get(&p.id).copied(), &app_settings))
        .collect();

    let template = PropertiesTemplate {
        title: "Properties".into(),
        settings: app_settings,
        version: VERSION,
        rows,
    };

    template.render_html()
}

pub async fn new_form(State(state): State<AppState>) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;

    let template = PropertyFormTemplate {
        title: "Add Property".into(),
        settings: app_settings,
        version: VERSION,
        action: "/properties/create".into(),
        is_edit: false,
        name: String::new(),
        address: String::new(),
        type_options: type_options(Some(PropertyType::Residential)),
        purchase_price: String::new(),
        purchase_date: String::new(),
        notes: String::new(),
    };

    template.render_html()
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(mut params): Query<ReportParams>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let today = today();
    params.property_id = Some(id);

    let conn = state.db.get()?;
    let property = properties::get_property(&conn, id)?.ok_or_else(|| not_found("Property", id))?;

    let latest = valuations::latest_valuation(&conn, id)?;
    let tenant_rows = tenants::list_tenants(&conn, Some(id))?
        .iter()
        .map(|t| TenantRow::new(t, &property.name, today, &app_settings))
        .collect();
    let schedule_rows = maintenance::list_schedules(&conn, Some(id))?
        .iter()
        .map(|s| ScheduleRow::new(s, &property.name, today, &app_settings))
        .collect();
    let valuation_rows = valuations::list_valuations(&conn, Some(id))?
        .iter()
        .map(|v| ValuationRow::new(v, &property.name, property.purchase_price_cents, &app_settings))
        .collect();
    let recent = cash_flows::list_cash_flows(
        &conn,
        &cash_flows::CashFlowFilter {
            property_id: Some(id),
            limit: Some(10),
            ..Default::default()
        },
    )?
    .iter()
    .map(|cf| CashFlowRow::new(cf, &app_settings))
    .collect();

    let report = build_report(&*conn, &params.to_request(), today)?;
    let report = ReportView::new(&report, &params, &app_settings, format!("/properties/{}", id));

    let template = PropertyDetailTemplate {
        title: property.name.clone(),
        property: PropertyRow::new(
            &property,
            latest.as_ref().map(|v| v.value_cents),
            &app_settings,
        ),
        purchase_date: property.purchase_date_or_empty().to_string(),
        notes: property.notes_text().to_string(),
        latest_valuation: latest
            .as_ref()
            .map(|v| {
                format!(
                    "{} on {}",
                    app_settings.format_money_whole(v.value_cents),
                    v.valuation_date
                )
            })
            .unwrap_or_else(|| "No valuation recorded".into()),
        report,
        tenants: tenant_rows,
        schedules: schedule_rows,
        valuations: valuation_rows,
        recent,
        settings: app_settings,
        version: VERSION,
    };

    template.render_html()
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let property = {
        let conn = state.db.get()?;
        properties::get_property(&conn, id)?.ok_or_else(|| not_found("Property", id))?
    };

    let template = PropertyFormTemplate {
        title: "Edit Property".into(),
        settings: app_settings,
        version: VERSION,
        action: format!("/properties/{}/update", id),
        is_edit: true,
        type_options: type_options(Some(property.property_type)),
        purchase_price: cents_to_input(property.purchase_price_cents),
        purchase_date: property.purchase_date_or_empty().to_string(),
        notes: property.notes_text().to_string(),
        name: property.name,
        address: property.address,
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<PropertyFormData>,
) -> AppResult<Redirect> {
    debug!(name = %form.name, "Creating property");
    let new_property = form.to_new_property()?;

    let conn = state.db.get()?;
    let id = properties::create_property(&conn, &new_property)?;
    info!(property_id = id, "Property created via web form");

    Ok(Redirect::to(&format!("/properties/{}", id)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<PropertyFormData>,
) -> AppResult<Redirect> {
    debug!(property_id = id, "Updating property");
    let new_property = form.to_new_property()?;

    let conn = state.db.get()?;
    if !properties::update_property(&conn, id, &new_property)? {
        return Err(not_found("Property", id));
    }
    info!(property_id = id, "Property updated via web form");

    Ok(Redirect::to(&format!("/properties/{}", id)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(property_id = id, "Deleting property");
    let conn = state.db.get()?;

    if !properties::delete_property(&conn, id)? {
        return Err(not_found("Property", id));
    }

    Ok(Html(String::new()))
}
