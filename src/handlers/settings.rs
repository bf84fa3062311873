use askama::Template;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::info;

use crate::db::queries::settings;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::models::{Settings, MAX_PAGE_SIZE};
use crate::state::AppState;
use crate::VERSION;

#[derive(Template)]
#[template(path = "pages/settings.html")]
pub struct SettingsTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub saved: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub saved: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsFormData {
    pub theme: String,
    pub currency: String,
    pub page_size: String,
    pub locale: String,
}

impl SettingsFormData {
    fn to_settings(&self) -> AppResult<Settings> {
        let page_size = self
            .page_size
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Page size must be a number between 1 and {}",
                    MAX_PAGE_SIZE
                ))
            })?;

        Ok(Settings {
            theme: self.theme.trim().to_string(),
            currency: self.currency.trim().to_uppercase(),
            page_size,
            locale: self.locale.trim().to_string(),
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;

    let template = SettingsTemplate {
        title: "Settings".into(),
        settings: app_settings,
        version: VERSION,
        saved: query.saved.is_some(),
    };

    template.render_html()
}

pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<SettingsFormData>,
) -> AppResult<Redirect> {
    let new_settings = form.to_settings()?;

    let conn = state.db.get()?;
    settings::save_settings(&conn, &new_settings)?;
    info!(
        currency = %new_settings.currency,
        locale = %new_settings.locale,
        "Settings updated"
    );

    Ok(Redirect::to("/settings?saved=1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(page_size: &str) -> SettingsFormData {
        SettingsFormData {
            theme: "dark".into(),
            currency: "eur".into(),
            page_size: page_size.into(),
            locale: "de-DE".into(),
        }
    }

    #[test]
    fn test_form_to_settings() {
        let s = form("50").to_settings().unwrap();
        assert_eq!(s.currency, "EUR");
        assert_eq!(s.page_size, 50);
        assert!(s.is_dark());
    }

    #[test]
    fn test_page_size_must_be_in_range() {
        assert!(form("0").to_settings().is_err());
        assert!(form("many").to_settings().is_err());
        assert!(form("501").to_settings().is_err());
        assert!(form("9223372036854775807").to_settings().is_err());
        assert_eq!(form("500").to_settings().unwrap().page_size, MAX_PAGE_SIZE);
    }
}
