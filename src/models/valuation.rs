use serde::{Deserialize, Serialize};

/// Sources offered by the valuation form. Stored values are free text.
pub const VALUATION_SOURCES: &[&str] = &["Estimate", "Appraisal", "Agent", "Sale"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Valuation {
    pub id: i64,
    pub property_id: i64,
    pub valuation_date: String,
    pub value_cents: i64,
    pub source: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Valuation {
    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct NewValuation {
    pub property_id: i64,
    pub valuation_date: String,
    pub value_cents: i64,
    pub source: String,
    pub notes: Option<String>,
}
