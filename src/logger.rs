//! logger.rs
//! Configuración del logger usando env_logger.

use std::io::Write;

use chrono::{SecondsFormat, Utc};
use env_logger;

use crate::config::app_config::LogFormat;

pub fn init_logger(format: LogFormat) {
    // Nivel desde RUST_LOG; si no está, "info".
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_env));

    match format {
        LogFormat::Text => {
            builder.format_timestamp_millis();
        }
        LogFormat::Json => {
            // Un objeto JSON por línea
            builder.format(|buf, record| {
                let line = serde_json::json!({
                    "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            });
        }
    }

    builder.init();
}
