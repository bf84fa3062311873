use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which way money moves. Credits increase income, debits increase an
/// expense or maintenance total. Amounts themselves are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "CREDIT",
            Direction::Debit => "DEBIT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Credit => "Credit",
            Direction::Debit => "Debit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT" => Some(Direction::Credit),
            "DEBIT" => Some(Direction::Debit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A category the application knows about. Categories stay free-form text
/// in storage; this table only supplies defaults and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub code: &'static str,
    pub label: &'static str,
    pub default_direction: Direction,
    pub maintenance_like: bool,
}

const fn income(code: &'static str, label: &'static str) -> CategoryInfo {
    CategoryInfo {
        code,
        label,
        default_direction: Direction::Credit,
        maintenance_like: false,
    }
}

const fn expense(code: &'static str, label: &'static str) -> CategoryInfo {
    CategoryInfo {
        code,
        label,
        default_direction: Direction::Debit,
        maintenance_like: false,
    }
}

const fn maintenance(code: &'static str, label: &'static str) -> CategoryInfo {
    CategoryInfo {
        code,
        label,
        default_direction: Direction::Debit,
        maintenance_like: true,
    }
}

pub const CATEGORIES: &[CategoryInfo] = &[
    income("RENT", "Rent"),
    income("DEPOSIT", "Deposit"),
    income("OTHER_INCOME", "Other Income"),
    maintenance("MAINTENANCE", "Maintenance"),
    maintenance("REPAIR", "Repair"),
    maintenance("REPAIRS", "Repairs"),
    expense("UTILITIES", "Utilities"),
    expense("INSURANCE", "Insurance"),
    expense("PROPERTY_TAX", "Property Tax"),
    expense("MORTGAGE", "Mortgage"),
    expense("MANAGEMENT_FEE", "Management Fee"),
    expense("OTHER_EXPENSE", "Other Expense"),
];

/// Case-insensitive lookup in [`CATEGORIES`].
pub fn category_info(category: &str) -> Option<&'static CategoryInfo> {
    let category = category.trim();
    CATEGORIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(category))
}

/// Direction a new cash flow gets when the user does not pick one.
/// Unknown categories are treated as expenses.
pub fn default_direction_for(category: &str) -> Direction {
    category_info(category)
        .map(|c| c.default_direction)
        .unwrap_or(Direction::Debit)
}

pub fn is_maintenance_like(category: &str) -> bool {
    category_info(category)
        .map(|c| c.maintenance_like)
        .unwrap_or(false)
}

/// Display label for a stored category, falling back to the raw value.
pub fn category_label(category: &str) -> String {
    category_info(category)
        .map(|c| c.label.to_string())
        .unwrap_or_else(|| category.to_string())
}

/// The total a cash flow contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Income,
    Expense,
    Maintenance,
}

/// Narrows a list of cash flows to one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySelector {
    #[default]
    All,
    Income,
    Expenses,
    Maintenance,
}

impl CategorySelector {
    /// Unknown values select everything rather than nothing.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "credit" => Self::Income,
            "expenses" | "expense" | "debit" => Self::Expenses,
            "maintenance" => Self::Maintenance,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Income => "income",
            Self::Expenses => "expenses",
            Self::Maintenance => "maintenance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Income => "Income",
            Self::Expenses => "Expenses",
            Self::Maintenance => "Maintenance",
        }
    }

    pub fn all() -> &'static [CategorySelector] {
        &[Self::All, Self::Income, Self::Expenses, Self::Maintenance]
    }

    pub fn matches(&self, cash_flow: &CashFlow) -> bool {
        match self {
            Self::All => true,
            Self::Income => cash_flow.direction == Direction::Credit,
            Self::Expenses => {
                cash_flow.direction == Direction::Debit && !cash_flow.is_maintenance()
            }
            Self::Maintenance => cash_flow.is_maintenance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCashFlow {
    #[error("cash flow {id} has a negative amount ({amount_cents})")]
    NegativeAmount { id: i64, amount_cents: i64 },

    #[error("cash flow {id} has an unreadable date {raw:?}")]
    InvalidDate { id: i64, raw: String },

    #[error("cash flow {id} has no amount")]
    MissingAmount { id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    pub id: i64,
    pub property_id: i64,
    pub date: NaiveDate,
    pub direction: Direction,
    pub category: String,
    pub amount_cents: i64,
    pub description: String,
}

impl CashFlow {
    pub fn is_maintenance(&self) -> bool {
        is_maintenance_like(&self.category)
    }

    pub fn classify(&self) -> Classification {
        if self.direction == Direction::Credit {
            Classification::Income
        } else if self.is_maintenance() {
            Classification::Maintenance
        } else {
            Classification::Expense
        }
    }

    pub fn check(&self) -> Result<(), MalformedCashFlow> {
        if self.amount_cents < 0 {
            return Err(MalformedCashFlow::NegativeAmount {
                id: self.id,
                amount_cents: self.amount_cents,
            });
        }
        Ok(())
    }

    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowWithProperty {
    #[serde(flatten)]
    pub cash_flow: CashFlow,
    pub property_name: String,
}

/// What a report asks its store for. Bounds are inclusive; `None` is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CashFlowQuery {
    pub property_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl CashFlowQuery {
    pub fn matches(&self, cash_flow: &CashFlow) -> bool {
        self.property_id.map_or(true, |id| cash_flow.property_id == id)
            && self.from.map_or(true, |from| cash_flow.date >= from)
            && self.to.map_or(true, |to| cash_flow.date <= to)
    }
}

#[derive(Debug, Clone)]
pub struct NewCashFlow {
    pub property_id: i64,
    pub date: NaiveDate,
    pub direction: Direction,
    pub category: String,
    pub amount_cents: i64,
    pub description: String,
}
