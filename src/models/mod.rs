pub mod cash_flow;
pub mod maintenance;
pub mod property;
pub mod settings;
pub mod tenant;
pub mod valuation;

pub use cash_flow::{
    category_info, category_label, default_direction_for, is_maintenance_like, CashFlow,
    CashFlowQuery, CashFlowWithProperty, CategoryInfo, CategorySelector, Classification, Direction,
    MalformedCashFlow, NewCashFlow, CATEGORIES,
};
pub use maintenance::{MaintenanceFrequency, MaintenanceSchedule, NewMaintenanceSchedule};
pub use property::{NewProperty, Property, PropertyOption, PropertyType};
pub use settings::{Settings, MAX_PAGE_SIZE};
pub use tenant::{NewTenant, Tenant};
pub use valuation::{NewValuation, Valuation, VALUATION_SOURCES};
