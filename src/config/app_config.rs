//! config/app_config.rs
//! Configuración del proceso (servidor, base de datos, logs, shutdown).

use std::time::Duration;

use anyhow::{Context, Result};

use super::dispatch_config::DispatchConfig;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/notifications.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Dónde persistir las notificaciones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// `DATABASE_URL` no definido: SQLite en ./data
    Default,
    Sqlite(String),
    /// `DATABASE_URL=memory`: store en proceso, no durable
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub host: String,
    pub port: u16,
    pub storage: StorageTarget,
    pub log_format: LogFormat,
    pub shutdown_grace: Duration,
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("APP_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT inválido: {}", v))?,
            None => 8000,
        };

        let storage = match lookup("DATABASE_URL") {
            None => StorageTarget::Default,
            Some(url) if url.trim().is_empty() => StorageTarget::Default,
            Some(url) if url.trim().eq_ignore_ascii_case("memory") => StorageTarget::Memory,
            Some(url) => StorageTarget::Sqlite(url.trim().to_string()),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let shutdown_grace = match lookup("SHUTDOWN_GRACE_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("SHUTDOWN_GRACE_SECS inválido: {}", v))?,
            ),
            None => Duration::from_secs(5),
        };

        Ok(AppConfig {
            app_name: "Smart Notification System".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            host,
            port,
            storage,
            log_format,
            shutdown_grace,
            dispatch: DispatchConfig::from_lookup(&lookup)?,
        })
    }
}
