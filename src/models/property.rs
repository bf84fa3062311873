use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Residential,
    Commercial,
    MultiFamily,
    Land,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "Residential",
            PropertyType::Commercial => "Commercial",
            PropertyType::MultiFamily => "MultiFamily",
            PropertyType::Land => "Land",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::MultiFamily => "Multi-family",
            other => other.as_str(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Residential" => Some(PropertyType::Residential),
            "Commercial" => Some(PropertyType::Commercial),
            "MultiFamily" => Some(PropertyType::MultiFamily),
            "Land" => Some(PropertyType::Land),
            _ => None,
        }
    }

    pub fn all() -> &'static [PropertyType] {
        &[
            PropertyType::Residential,
            PropertyType::Commercial,
            PropertyType::MultiFamily,
            PropertyType::Land,
        ]
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub property_type: PropertyType,
    pub purchase_price_cents: i64,
    pub purchase_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Property {
    pub fn purchase_date_or_empty(&self) -> &str {
        self.purchase_date.as_deref().unwrap_or("")
    }

    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn is_type(&self, value: &str) -> bool {
        self.property_type.as_str() == value
    }
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    pub property_type: PropertyType,
    pub purchase_price_cents: i64,
    pub purchase_date: Option<String>,
    pub notes: Option<String>,
}

/// Minimal id/name pair for select boxes and list joins.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyOption {
    pub id: i64,
    pub name: String,
}
