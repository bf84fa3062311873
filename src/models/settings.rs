use crate::filters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest number of rows a list page may show.
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    pub currency: String,
    pub page_size: i64,
    pub locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_map(HashMap::new())
    }
}

impl Settings {
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            theme: map.get("theme").cloned().unwrap_or_else(|| "system".into()),
            currency: map.get("currency").cloned().unwrap_or_else(|| "USD".into()),
            page_size: map
                .get("page_size")
                .and_then(|s| s.parse().ok())
                .filter(|n: &i64| (1..=MAX_PAGE_SIZE).contains(n))
                .unwrap_or(25),
            locale: map.get("locale").cloned().unwrap_or_else(|| "en-US".into()),
        }
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("theme".into(), self.theme.clone());
        map.insert("currency".into(), self.currency.clone());
        map.insert("page_size".into(), self.page_size.to_string());
        map.insert("locale".into(), self.locale.clone());
        map
    }

    pub fn is_theme(&self, value: &str) -> bool {
        self.theme == value
    }

    pub fn is_currency(&self, value: &str) -> bool {
        self.currency == value
    }

    pub fn is_locale(&self, value: &str) -> bool {
        self.locale == value
    }

    pub fn is_dark(&self) -> bool {
        self.theme == "dark"
    }

    /// Signed amount, e.g. `+$1,200.00` / `-$80.00`.
    pub fn format_money_plain(&self, cents: i64) -> String {
        filters::format_money_plain(cents, &self.currency, &self.locale)
    }

    /// Unsigned amount, e.g. `$1,200.00`.
    pub fn format_money_neutral(&self, cents: i64) -> String {
        filters::format_money_neutral(cents, &self.currency, &self.locale)
    }

    /// Whole currency units, e.g. `$1,234` / `-$500`. Used for exports.
    pub fn format_money_whole(&self, cents: i64) -> String {
        filters::format_money_whole(cents, &self.currency, &self.locale)
    }

    pub fn format_percent(&self, value: f64) -> String {
        filters::format_percent(value, &self.locale)
    }
}
