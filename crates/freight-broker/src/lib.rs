pub mod accounts;
pub mod brokerage;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
