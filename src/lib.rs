pub mod api;
pub mod config;
pub mod domain;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod store;
pub mod utils;
