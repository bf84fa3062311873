use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::{format_date, today};
use crate::db::queries::maintenance;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::form_utils::{cents_to_input, deserialize_optional_i64, non_empty, parse_cents};
use crate::handlers::{
    not_found, property_choices, property_name, require_property, PropertyScope, SelectOption,
};
use crate::models::{MaintenanceFrequency, MaintenanceSchedule, NewMaintenanceSchedule, Settings};
use crate::state::AppState;
use crate::validation::{validate, FormFields, MAINTENANCE_RULES};
use crate::VERSION;

pub struct ScheduleRow {
    pub id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub title: String,
    pub frequency: &'static str,
    pub due: String,
    pub cost: String,
    pub overdue: bool,
    pub notes: String,
}

impl ScheduleRow {
    pub fn new(
        schedule: &MaintenanceSchedule,
        property_name: &str,
        today: NaiveDate,
        settings: &Settings,
    ) -> Self {
        Self {
            id: schedule.id,
            property_id: schedule.property_id,
            property_name: property_name.to_string(),
            title: schedule.title.clone(),
            frequency: schedule.frequency.label(),
            due: schedule.next_due_date.clone(),
            cost: settings.format_money_neutral(schedule.estimated_cost_cents),
            overdue: schedule.is_overdue(today),
            notes: schedule.notes_text().to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/maintenance.html")]
pub struct MaintenanceTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub rows: Vec<ScheduleRow>,
    pub overdue_count: usize,
    pub property_options: Vec<SelectOption>,
    pub new_href: String,
}

#[derive(Template)]
#[template(path = "pages/maintenance_form.html")]
pub struct MaintenanceFormTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub action: String,
    pub is_edit: bool,
    pub property_options: Vec<SelectOption>,
    pub frequency_options: Vec<SelectOption>,
    pub schedule_title: String,
    pub next_due_date: String,
    pub estimated_cost: String,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceFormData {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub title: String,
    pub frequency: String,
    pub next_due_date: String,
    pub estimated_cost: Option<String>,
    pub notes: Option<String>,
}

impl FormFields for MaintenanceFormData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "property_id" => self.property_id.map(|id| id.to_string()),
            "title" => Some(self.title.clone()),
            "frequency" => Some(self.frequency.clone()),
            "next_due_date" => Some(self.next_due_date.clone()),
            "estimated_cost" => self.estimated_cost.clone(),
            "notes" => self.notes.clone(),
            _ => None,
        }
    }
}

impl MaintenanceFormData {
    fn to_new_schedule(&self) -> AppResult<NewMaintenanceSchedule> {
        validate(MAINTENANCE_RULES, self)?;

        let frequency = MaintenanceFrequency::parse(self.frequency.trim()).ok_or_else(|| {
            AppError::Validation(format!("Unknown frequency: {}", self.frequency))
        })?;

        Ok(NewMaintenanceSchedule {
            property_id: self
                .property_id
                .ok_or_else(|| AppError::Validation("Property is required".into()))?,
            title: self.title.trim().to_string(),
            frequency,
            next_due_date: self.next_due_date.trim().to_string(),
            estimated_cost_cents: non_empty(&self.estimated_cost)
                .and_then(|c| parse_cents(&c))
                .unwrap_or(0),
            notes: non_empty(&self.notes),
        })
    }
}

fn frequency_options(selected: MaintenanceFrequency) -> Vec<SelectOption> {
    MaintenanceFrequency::all()
        .iter()
        .map(|f| SelectOption::new(f.as_str(), f.label(), *f == selected))
        .collect()
}

pub async fn index(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let today = today();

    let conn = state.db.get()?;
    let rows: Vec<ScheduleRow> = maintenance::list_schedules(&conn, scope.property_id)?
        .iter()
        .map(|s| ScheduleRow::new(s, &property_name(&options, s.property_id), today, &app_settings))
        .collect();

    let template = MaintenanceTemplate {
        title: "Maintenance".into(),
        settings: app_settings,
        version: VERSION,
        overdue_count: rows.iter().filter(|r| r.overdue).count(),
        rows,
        property_options: property_choices(&options, scope.property_id),
        new_href: scope.new_href("/maintenance"),
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let template = MaintenanceFormTemplate {
        title: "Add Maintenance".into(),
        settings: app_settings,
        version: VERSION,
        action: "/maintenance/create".into(),
        is_edit: false,
        property_options: property_choices(&options, scope.property_id),
        frequency_options: frequency_options(MaintenanceFrequency::OneOff),
        schedule_title: String::new(),
        next_due_date: format_date(today()),
        estimated_cost: String::new(),
        notes: String::new(),
    };

    template.render_html()
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let schedule = {
        let conn = state.db.get()?;
        maintenance::get_schedule(&conn, id)?.ok_or_else(|| not_found("Maintenance schedule", id))?
    };

    let template = MaintenanceFormTemplate {
        title: "Edit Maintenance".into(),
        settings: app_settings,
        version: VERSION,
        action: format!("/maintenance/{}/update", id),
        is_edit: true,
        property_options: property_choices(&options, Some(schedule.property_id)),
        frequency_options: frequency_options(schedule.frequency),
        estimated_cost: cents_to_input(schedule.estimated_cost_cents),
        notes: schedule.notes_text().to_string(),
        schedule_title: schedule.title,
        next_due_date: schedule.next_due_date,
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<MaintenanceFormData>,
) -> AppResult<Redirect> {
    debug!(title = %form.title, "Creating maintenance schedule");
    let schedule = form.to_new_schedule()?;

    let conn = state.db.get()?;
    require_property(&conn, schedule.property_id)?;
    let id = maintenance::create_schedule(&conn, &schedule)?;
    info!(schedule_id = id, "Maintenance schedule created via web form");

    Ok(Redirect::to(&format!("/maintenance?property_id={}", schedule.property_id)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<MaintenanceFormData>,
) -> AppResult<Redirect> {
    debug!(schedule_id = id, "Updating maintenance schedule");
    let schedule = form.to_new_schedule()?;

    let conn = state.db.get()?;
    require_property(&conn, schedule.property_id)?;
    if !maintenance::update_schedule(&conn, id, &schedule)? {
        return Err(not_found("Maintenance schedule", id));
    }
    info!(schedule_id = id, "Maintenance schedule updated via web form");

    Ok(Redirect::to(&format!("/maintenance?property_id={}", schedule.property_id)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(schedule_id = id, "Deleting maintenance schedule");
    let conn = state.db.get()?;

    if !maintenance::delete_schedule(&conn, id)? {
        return Err(not_found("Maintenance schedule", id));
    }

    Ok(Html(String::new()))
}
