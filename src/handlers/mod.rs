//! handlers/mod.rs
pub mod health_handler;
pub mod notification_handler;
