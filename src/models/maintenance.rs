use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceFrequency {
    OneOff,
    Monthly,
    Quarterly,
    Annually,
}

impl MaintenanceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneOff => "OneOff",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Annually => "Annually",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OneOff => "One-off",
            other => other.as_str(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OneOff" => Some(Self::OneOff),
            "Monthly" => Some(Self::Monthly),
            "Quarterly" => Some(Self::Quarterly),
            "Annually" => Some(Self::Annually),
            _ => None,
        }
    }

    pub fn all() -> &'static [MaintenanceFrequency] {
        &[Self::OneOff, Self::Monthly, Self::Quarterly, Self::Annually]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    pub id: i64,
    pub property_id: i64,
    pub title: String,
    pub frequency: MaintenanceFrequency,
    pub next_due_date: String,
    pub estimated_cost_cents: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MaintenanceSchedule {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        NaiveDate::parse_from_str(&self.next_due_date, "%Y-%m-%d")
            .map(|due| due < today)
            .unwrap_or(false)
    }

    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn is_frequency(&self, value: &str) -> bool {
        self.frequency.as_str() == value
    }
}

#[derive(Debug, Clone)]
pub struct NewMaintenanceSchedule {
    pub property_id: i64,
    pub title: String,
    pub frequency: MaintenanceFrequency,
    pub next_due_date: String,
    pub estimated_cost_cents: i64,
    pub notes: Option<String>,
}
