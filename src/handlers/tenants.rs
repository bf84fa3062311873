use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::date_utils::{format_date, parse_date, today};
use crate::db::queries::tenants;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::form_utils::{cents_to_input, deserialize_optional_i64, non_empty, parse_cents};
use crate::handlers::{
    not_found, property_choices, property_name, require_property, PropertyScope, SelectOption,
};
use crate::models::{NewTenant, Settings, Tenant};
use crate::state::AppState;
use crate::validation::{validate, FormFields, TENANT_RULES};
use crate::VERSION;

pub struct TenantRow {
    pub id: i64,
    pub name: String,
    pub property_id: i64,
    pub property_name: String,
    pub contact: String,
    pub lease: String,
    pub rent: String,
    pub deposit: String,
    pub active: bool,
}

impl TenantRow {
    pub fn new(
        tenant: &Tenant,
        property_name: &str,
        today: NaiveDate,
        settings: &Settings,
    ) -> Self {
        let contact = [tenant.email_text(), tenant.phone_text()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · ");
        let lease = match tenant.lease_end.as_deref() {
            Some(end) if !end.is_empty() => format!("{} to {}", tenant.lease_start, end),
            _ => format!("From {}", tenant.lease_start),
        };
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            property_id: tenant.property_id,
            property_name: property_name.to_string(),
            contact,
            lease,
            rent: settings.format_money_neutral(tenant.monthly_rent_cents),
            deposit: settings.format_money_neutral(tenant.deposit_cents),
            active: tenant.is_active_on(today),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/tenants.html")]
pub struct TenantsTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub rows: Vec<TenantRow>,
    pub property_options: Vec<SelectOption>,
    pub new_href: String,
}

#[derive(Template)]
#[template(path = "pages/tenant_form.html")]
pub struct TenantFormTemplate {
    pub title: String,
    pub settings: Settings,
    pub version: &'static str,
    pub action: String,
    pub is_edit: bool,
    pub property_options: Vec<SelectOption>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub lease_start: String,
    pub lease_end: String,
    pub monthly_rent: String,
    pub deposit: String,
}

#[derive(Debug, Deserialize)]
pub struct TenantFormData {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub property_id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lease_start: String,
    pub lease_end: Option<String>,
    pub monthly_rent: String,
    pub deposit: Option<String>,
}

impl FormFields for TenantFormData {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "property_id" => self.property_id.map(|id| id.to_string()),
            "name" => Some(self.name.clone()),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "lease_start" => Some(self.lease_start.clone()),
            "lease_end" => self.lease_end.clone(),
            "monthly_rent" => Some(self.monthly_rent.clone()),
            "deposit" => self.deposit.clone(),
            _ => None,
        }
    }
}

impl TenantFormData {
    fn to_new_tenant(&self) -> AppResult<NewTenant> {
        validate(TENANT_RULES, self)?;

        let lease_end = non_empty(&self.lease_end);
        if let (Some(start), Some(end)) = (
            parse_date(&self.lease_start),
            lease_end.as_deref().and_then(parse_date),
        ) {
            if end < start {
                return Err(AppError::Validation(
                    "Lease end must not be before lease start".into(),
                ));
            }
        }

        Ok(NewTenant {
            property_id: self
                .property_id
                .ok_or_else(|| AppError::Validation("Property is required".into()))?,
            name: self.name.trim().to_string(),
            email: non_empty(&self.email),
            phone: non_empty(&self.phone),
            lease_start: self.lease_start.trim().to_string(),
            lease_end,
            monthly_rent_cents: parse_cents(&self.monthly_rent).unwrap_or(0),
            deposit_cents: non_empty(&self.deposit)
                .and_then(|d| parse_cents(&d))
                .unwrap_or(0),
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let today = today();

    let conn = state.db.get()?;
    let rows = tenants::list_tenants(&conn, scope.property_id)?
        .iter()
        .map(|t| TenantRow::new(t, &property_name(&options, t.property_id), today, &app_settings))
        .collect();

    let template = TenantsTemplate {
        title: "Tenants".into(),
        settings: app_settings,
        version: VERSION,
        rows,
        property_options: property_choices(&options, scope.property_id),
        new_href: scope.new_href("/tenants"),
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(scope): Query<PropertyScope>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;

    let template = TenantFormTemplate {
        title: "Add Tenant".into(),
        settings: app_settings,
        version: VERSION,
        action: "/tenants/create".into(),
        is_edit: false,
        property_options: property_choices(&options, scope.property_id),
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        lease_start: format_date(today()),
        lease_end: String::new(),
        monthly_rent: String::new(),
        deposit: String::new(),
    };

    template.render_html()
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let app_settings = state.load_settings()?;
    let options = state.cached_property_options()?;
    let tenant = {
        let conn = state.db.get()?;
        tenants::get_tenant(&conn, id)?.ok_or_else(|| not_found("Tenant", id))?
    };

    let template = TenantFormTemplate {
        title: "Edit Tenant".into(),
        settings: app_settings,
        version: VERSION,
        action: format!("/tenants/{}/update", id),
        is_edit: true,
        property_options: property_choices(&options, Some(tenant.property_id)),
        email: tenant.email_text().to_string(),
        phone: tenant.phone_text().to_string(),
        lease_end: tenant.lease_end_text().to_string(),
        monthly_rent: cents_to_input(tenant.monthly_rent_cents),
        deposit: cents_to_input(tenant.deposit_cents),
        name: tenant.name,
        lease_start: tenant.lease_start,
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<TenantFormData>,
) -> AppResult<Redirect> {
    debug!(name = %form.name, "Creating tenant");
    let new_tenant = form.to_new_tenant()?;

    let conn = state.db.get()?;
    require_property(&conn, new_tenant.property_id)?;
    let id = tenants::create_tenant(&conn, &new_tenant)?;
    info!(tenant_id = id, "Tenant created via web form");

    Ok(Redirect::to(&format!("/properties/{}", new_tenant.property_id)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TenantFormData>,
) -> AppResult<Redirect> {
    debug!(tenant_id = id, "Updating tenant");
    let new_tenant = form.to_new_tenant()?;

    let conn = state.db.get()?;
    require_property(&conn, new_tenant.property_id)?;
    if !tenants::update_tenant(&conn, id, &new_tenant)? {
        return Err(not_found("Tenant", id));
    }
    info!(tenant_id = id, "Tenant updated via web form");

    Ok(Redirect::to(&format!("/properties/{}", new_tenant.property_id)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(tenant_id = id, "Deleting tenant");
    let conn = state.db.get()?;

    if !tenants::delete_tenant(&conn, id)? {
        return Err(not_found("Tenant", id));
    }

    Ok(Html(String::new()))
}
