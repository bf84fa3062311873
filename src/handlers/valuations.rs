use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::{format_date, today};
use crate::db::queries::{properties, valuations};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::money_class;
use crate::form_utils::{cents_to_input, deserialize_optional_i64, non_empty, parse_cents};
use crate::handlers::{not_found, property_choices, require_property, PropertyScope, SelectOption};
use crate::models::{NewValuation, Settings, Valuation, VALUATION_SOURCES};
use crate::state::AppState;
use crate::validation::{validate, FormFields, VALUATION_RULES};
use crate::VERSION;

pub struct ValuationRow {
    pub id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub date: String,
    pub value: String,
    pub source: String,
    pub gain: String,
    pub gain_pct: String,
    pub gain_class: &'static str,
    pub notes: String,
}

impl ValuationRow {
    pub fn new(
        valuation: &Valuation,
        property_name: &str,
        purchase_price_cents: i64,
        settings: &Settings,
    ) -> Self {
        let gain = valuation.value_cents - purchase_price_cents;
        let gain_pct = if purchase_price_cents > 0 {
            settings.format_percent(gain as f64 / purchase_price_cents as f64 * 100.0)
        } else {
            String::new()
        };
        Self {
            id: valuation.id,
            property_id: valuation.property_id,
            property_name: property_name.to_string(),
            date: valuation.valuation_date.clone(),
            value: settings.format_money_whole(valuation.value_cents),
            source: valuation.source.clone(),
            gain: settings.format_money_plain(gain),
            gain_pct,
            gain_class: money_class(gain),
            notes: valuation.notes_text().to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/valuations.html")]
pub struct ValuationsTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub rows: Vec<ValuationRow>,
    pub property_options: Vec<SelectOption>,
    pub new_href: String,
}

#[derive(Template)]
#[template(path = "pages/valuation_form.html")]
pub struct ValuationFormTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub action: String,
    pub is_edit: bool,
    pub property_options: Vec<SelectOption>,
    pub source_options: Vec<SelectOption>,
    pub valuation_date: String,
    pub value: String,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ValuationFormData {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub valuation_date: String,
    pub value: String,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl FormFields for ValuationFormData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "property_id" => self.property_id.map(|id| id.to_string()),
            "valuation_date" => Some(self.valuation_date.clone()),
            "value" => Some(self.value.clone()),
            "source" => self.source.clone(),
            "notes" => self.notes.clone(),
            _ => None,
        }
    }
}

impl ValuationFormData {
    fn to_new_valuation(&self) -> AppResult<NewValuation> {
        validate(VALUATION_RULES, self)?;

        Ok(NewValuation {
            property_id: self
                .property_id
                .ok_or_else(|| AppError::Validation("Property is required".into()))?,
            valuation_date: self.valuation_date.trim().to_string(),
            value_cents: parse_cents(&self.value).unwrap_or(0),
            source: non_empty(&self.source).unwrap_or_else(|| VALUATION_SOURCES[0].to_string()),
            notes: non_empty(&self.notes),
        })
    }
}

fn source_options(selected: &str) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = VALUATION_SOURCES
        .iter()
        .map(|s| SelectOption::new(*s, *s, *s == selected))
        .collect();
    // Keep free-text sources that predate the list selectable.
    if !selected.is_empty() && !VALUATION_SOURCES.contains(&selected) {
        options.push(SelectOption::new(selected, selected, true));
    }
    options
}

pub async fn index(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let conn = state.db.get()?;
    let property_list = properties::list_properties(&conn)?;
    let rows = valuations::list_valuations(&conn, scope.property_id)?
        .iter()
        .map(|v| {
            let property = property_list.iter().find(|p| p.id == v.property_id);
            ValuationRow::new(
                v,
                property.map(|p| p.name.as_str()).unwrap_or(""),
                property.map(|p| p.purchase_price_cents).unwrap_or(0),
                &app_settings,
            )
        })
        .collect();

    let template = ValuationsTemplate {
        title: "Valuations".into(),
        settings: app_settings,
        version: VERSION,
        rows,
        property_options: property_choices(&options, scope.property_id),
        new_href: scope.new_href("/valuations"),
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let template = ValuationFormTemplate {
        title: "Add Valuation".into(),
        settings: app_settings,
        version: VERSION,
        action: "/valuations/create".into(),
        is_edit: false,
        property_options: property_choices(&options, scope.property_id),
        source_options: source_options(VALUATION_SOURCES[0]),
        valuation_date: format_date(today()),
        value: String::new(),
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
    let valuation = {
        let conn = state.db.get()?;
        valuations::get_valuation(&conn, id)?.ok_or_else(|| not_found("Valuation", id))?
    };

    let template = ValuationFormTemplate {
        title: "Edit Valuation".into(),
        settings: app_settings,
        version: VERSION,
        action: format!("/valuations/{}/update", id),
        is_edit: true,
        property_options: property_choices(&options, Some(valuation.property_id)),
        source_options: source_options(&valuation.source),
        value: cents_to_input(valuation.value_cents),
        notes: valuation.notes_text().to_string(),
        valuation_date: valuation.valuation_date,
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<ValuationFormData>,
) -> AppResult<Redirect> {
    debug!(property_id = ?form.property_id, "Creating valuation");
    let valuation = form.to_new_valuation()?;

    let conn = state.db.get()?;
    require_property(&conn, valuation.property_id)?;
    let id = valuations::create_valuation(&conn, &valuation)?;
    info!(valuation_id = id, "Valuation created via web form");

    Ok(Redirect::to(&format!("/properties/{}", valuation.property_id)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ValuationFormData>,
) -> AppResult<Redirect> {
    debug!(valuation_id = id, "Updating valuation");
    let valuation = form.to_new_valuation()?;

    let conn = state.db.get()?;
    require_property(&conn, valuation.property_id)?;
    if !valuations::update_valuation(&conn, id, &valuation)? {
        return Err(not_found("Valuation", id));
    }
    info!(valuation_id = id, "Valuation updated via web form");

    Ok(Redirect::to(&format!("/properties/{}", valuation.property_id)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(valuation_id = id, "Deleting valuation");
    let conn = state.db.get()?;

    if !valuations::delete_valuation(&conn, id)? {
        return Err(not_found("Valuation", id));
    }

    Ok(Html(String::new()))
}
