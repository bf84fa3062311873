use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub property_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lease_start: String,
    pub lease_end: Option<String>,
    pub monthly_rent_cents: i64,
    pub deposit_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Tenant {
    /// A lease is active when it has started and has not ended before `today`.
    /// Unparseable dates count as open-ended.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        let started = NaiveDate::parse_from_str(&self.lease_start, "%Y-%m-%d")
            .map(|d| d <= today)
            .unwrap_or(true);
        let not_ended = self
            .lease_end
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d >= today)
            .unwrap_or(true);
        started && not_ended
    }

    pub fn email_text(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    pub fn phone_text(&self) -> &str {
        self.phone.as_deref().unwrap_or("")
    }

    pub fn lease_end_text(&self) -> &str {
        self.lease_end.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub property_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lease_start: String,
    pub lease_end: Option<String>,
    pub monthly_rent_cents: i64,
    pub deposit_cents: i64,
}
