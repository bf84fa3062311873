//! Field rules shared by every create/update form.
//!
//! Each entity declares a static table of [`FieldRule`]s; handlers call
//! [`validate`] with the submitted form before touching the database.

use crate::date_utils::parse_date;
use crate::error::{AppError, AppResult};
use crate::form_utils::parse_cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    /// A decimal amount that is zero or more.
    NonNegative,
    MinLength(usize),
    /// `YYYY-MM-DD`
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub rules: &'static [Rule],
}

/// Read access to submitted form values by field name.
pub trait FormFields {
    fn field(&self, name: &str) -> Option<String>;
}

pub const PROPERTY_RULES: &[FieldRule] = &[
    FieldRule {
        field: "name",
        label: "Name",
        rules: &[Rule::Required, Rule::MinLength(2)],
    },
    FieldRule {
        field: "address",
        label: "Address",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "property_type",
        label: "Property type",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "purchase_price",
        label: "Purchase price",
        rules: &[Rule::NonNegative],
    },
    FieldRule {
        field: "purchase_date",
        label: "Purchase date",
        rules: &[Rule::Date],
    },
];

pub const TENANT_RULES: &[FieldRule] = &[
    FieldRule {
        field: "property_id",
        label: "Property",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "name",
        label: "Name",
        rules: &[Rule::Required, Rule::MinLength(2)],
    },
    FieldRule {
        field: "lease_start",
        label: "Lease start",
        rules: &[Rule::Required, Rule::Date],
    },
    FieldRule {
        field: "lease_end",
        label: "Lease end",
        rules: &[Rule::Date],
    },
    FieldRule {
        field: "monthly_rent",
        label: "Monthly rent",
        rules: &[Rule::Required, Rule::NonNegative],
    },
    FieldRule {
        field: "deposit",
        label: "Deposit",
        rules: &[Rule::NonNegative],
    },
];

pub const MAINTENANCE_RULES: &[FieldRule] = &[
    FieldRule {
        field: "property_id",
        label: "Property",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "title",
        label: "Title",
        rules: &[Rule::Required, Rule::MinLength(3)],
    },
    FieldRule {
        field: "frequency",
        label: "Frequency",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "next_due_date",
        label: "Next due date",
        rules: &[Rule::Required, Rule::Date],
    },
    FieldRule {
        field: "estimated_cost",
        label: "Estimated cost",
        rules: &[Rule::NonNegative],
    },
];

pub const VALUATION_RULES: &[FieldRule] = &[
    FieldRule {
        field: "property_id",
        label: "Property",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "valuation_date",
        label: "Valuation date",
        rules: &[Rule::Required, Rule::Date],
    },
    FieldRule {
        field: "value",
        label: "Value",
        rules: &[Rule::Required, Rule::NonNegative],
    },
];

pub const CASH_FLOW_RULES: &[FieldRule] = &[
    FieldRule {
        field: "property_id",
        label: "Property",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "date",
        label: "Date",
        rules: &[Rule::Required, Rule::Date],
    },
    FieldRule {
        field: "category",
        label: "Category",
        rules: &[Rule::Required],
    },
    FieldRule {
        field: "amount",
        label: "Amount",
        rules: &[Rule::Required, Rule::NonNegative],
    },
];

fn check_rule(rule: Rule, label: &str, value: &str) -> Option<String> {
    match rule {
        Rule::Required if value.is_empty() => Some(format!("{} is required", label)),
        Rule::Required => None,
        // Optional fields that were left blank have nothing else to check.
        _ if value.is_empty() => None,
        Rule::NonNegative => match parse_cents(value) {
            None => Some(format!("{} must be a number", label)),
            Some(cents) if cents < 0 => Some(format!("{} must not be negative", label)),
            Some(_) => None,
        },
        Rule::MinLength(min) if value.chars().count() < min => {
            Some(format!("{} must be at least {} characters", label, min))
        }
        Rule::MinLength(_) => None,
        Rule::Date if parse_date(value).is_none() => {
            Some(format!("{} must be a date (YYYY-MM-DD)", label))
        }
        Rule::Date => None,
    }
}

/// Every failed rule, in table order. At most one message per field.
pub fn check<F: FormFields + ?Sized>(rules: &[FieldRule], form: &F) -> Vec<String> {
    rules
        .iter()
        .filter_map(|field_rule| {
            let value = form.field(field_rule.field).unwrap_or_default();
            let value = value.trim();
            field_rule
                .rules
                .iter()
                .find_map(|rule| check_rule(*rule, field_rule.label, value))
        })
        .collect()
}

pub fn validate<F: FormFields + ?Sized>(rules: &[FieldRule], form: &F) -> AppResult<()> {
    let errors = check(rules, form);
    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(errors = ?errors, "Form validation failed");
        Err(AppError::Validation(errors.join("; ")))
    }
}
