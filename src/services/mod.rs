//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod dispatch_engine;
pub mod dispatch_policy;
pub mod dispatch_tracker;
pub mod memory_store;
pub mod notification_service;
pub mod notification_store;
