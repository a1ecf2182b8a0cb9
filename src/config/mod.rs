//! config/mod.rs
pub mod app_config;
pub mod dispatch_config;
