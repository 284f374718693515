pub mod auth;
pub mod checklist;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
