pub mod cash_flows;
pub mod maintenance;
pub mod properties;
pub mod settings;
pub mod tenants;
pub mod valuations;
