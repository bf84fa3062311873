pub mod cash_flow;
pub mod reports;
