pub mod cash_flows;
pub mod dashboard;
pub mod maintenance;
pub mod properties;
pub mod reports;
pub mod settings;
pub mod tenants;
pub mod valuations;

use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries::properties as property_queries;
use crate::error::{AppError, AppResult};
use crate::form_utils::deserialize_optional_i64;
use crate::models::{Property, PropertyOption};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        .route("/properties", get(properties::index))
        .route("/cash-flows", get(cash_flows::index))
        .route("/tenants", get(tenants::index))
        .route("/maintenance", get(maintenance::index))
        .route("/valuations", get(valuations::index))
        .route("/settings", get(settings::index))
        // Property CRUD
        .route("/properties/new", get(properties::new_form))
        .route("/properties/create", post(properties::create))
        .route("/properties/:id", get(properties::show))
        .route("/properties/:id", delete(properties::delete))
        .route("/properties/:id/edit", get(properties::edit_form))
        .route("/properties/:id/update", post(properties::update))
        // Cash flow CRUD
        .route("/cash-flows/new", get(cash_flows::new_form))
        .route("/cash-flows/create", post(cash_flows::create))
        .route("/cash-flows/:id", delete(cash_flows::delete))
        .route("/cash-flows/:id/edit", get(cash_flows::edit_form))
        .route("/cash-flows/:id/update", post(cash_flows::update))
        // Tenant CRUD
        .route("/tenants/new", get(tenants::new_form))
        .route("/tenants/create", post(tenants::create))
        .route("/tenants/:id", delete(tenants::delete))
        .route("/tenants/:id/edit", get(tenants::edit_form))
        .route("/tenants/:id/update", post(tenants::update))
        // Maintenance schedule CRUD
        .route("/maintenance/new", get(maintenance::new_form))
        .route("/maintenance/create", post(maintenance::create))
        .route("/maintenance/:id", delete(maintenance::delete))
        .route("/maintenance/:id/edit", get(maintenance::edit_form))
        .route("/maintenance/:id/update", post(maintenance::update))
        // Valuation CRUD
        .route("/valuations/new", get(valuations::new_form))
        .route("/valuations/create", post(valuations::create))
        .route("/valuations/:id", delete(valuations::delete))
        .route("/valuations/:id/edit", get(valuations::edit_form))
        .route("/valuations/:id/update", post(valuations::update))
        // Settings
        .route("/settings/update", post(settings::update))
        // API (JSON and CSV for reports)
        .route("/api/reports/monthly", get(reports::monthly))
        .route("/api/reports/chart", get(reports::chart))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/export.csv", get(reports::export_csv))
        .route("/api/categories", get(reports::categories))
        .route(
            "/api/categories/default-direction",
            get(reports::default_direction),
        )
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// One `<option>` of a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// `?property_id=` on list pages and "new" forms. Blank means all properties.
#[derive(Debug, Default, Deserialize)]
pub struct PropertyScope {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
}

impl PropertyScope {
    pub fn new_href(&self, base: &str) -> String {
        match self.property_id {
            Some(id) => format!("{}/new?property_id={}", base, id),
            None => format!("{}/new", base),
        }
    }
}

pub fn property_choices(options: &[PropertyOption], selected: Option<i64>) -> Vec<SelectOption> {
    options
        .iter()
        .map(|p| SelectOption::new(p.id.to_string(), p.name.clone(), selected == Some(p.id)))
        .collect()
}

/// Display name for a property id, from the cached option list.
pub fn property_name(options: &[PropertyOption], id: i64) -> String {
    options
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("Property {}", id))
}

/// Look up the property a form refers to, turning a dangling id into a
/// validation error instead of a foreign key failure.
pub fn require_property(conn: &Connection, id: i64) -> AppResult<Property> {
    property_queries::get_property(conn, id)?
        .ok_or_else(|| AppError::Validation(format!("Property {} does not exist", id)))
}

pub fn not_found(kind: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}
