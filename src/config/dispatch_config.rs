//! config/dispatch_config.rs
//! Parámetros de la política de reintentos y de la latencia simulada.
//! Se construye una sola vez al arrancar y luego es inmutable.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::models::notification_model::Channel;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub max_attempts: u32,
    /// Probabilidad de fallo simulado por intento, en [0, 1).
    pub failure_probability: f64,
    pub email_delay: Duration,
    pub messaging_delay: Duration,
    /// Semilla opcional para reproducir una secuencia de fallos.
    pub random_seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            max_attempts: 3,
            failure_probability: 0.1,
            email_delay: Duration::from_millis(1000),
            messaging_delay: Duration::from_millis(200),
            random_seed: None,
        }
    }
}

impl DispatchConfig {
    /// Lee la configuración a partir de una función de lookup (normalmente
    /// `std::env::var`). Las claves ausentes toman el valor por defecto.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DispatchConfig::default();

        let max_attempts = match lookup("RETRY_MAX_ATTEMPTS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("RETRY_MAX_ATTEMPTS inválido: {}", v))?,
            None => defaults.max_attempts,
        };

        let failure_probability = match lookup("ERROR_PROBABILITY") {
            Some(v) => v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("ERROR_PROBABILITY inválido: {}", v))?,
            None => defaults.failure_probability,
        };

        let email_delay = match lookup("EMAIL_DELAY") {
            Some(v) => parse_seconds("EMAIL_DELAY", &v)?,
            None => defaults.email_delay,
        };

        // TELEGRAM_DELAY se sigue aceptando por compatibilidad
        let messaging_delay = match lookup("MESSAGING_DELAY").or_else(|| lookup("TELEGRAM_DELAY")) {
            Some(v) => parse_seconds("MESSAGING_DELAY", &v)?,
            None => defaults.messaging_delay,
        };

        let random_seed = match lookup("DISPATCH_RANDOM_SEED") {
            Some(v) => Some(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("DISPATCH_RANDOM_SEED inválido: {}", v))?,
            ),
            None => None,
        };

        let config = DispatchConfig {
            max_attempts,
            failure_probability,
            email_delay,
            messaging_delay,
            random_seed,
        };
        config.validate()?;
        if !config.messaging_is_faster() {
            log::warn!(
                "(from_lookup) MESSAGING_DELAY ({:?}) no es menor que EMAIL_DELAY ({:?}), mensajería no se entregará antes que email",
                config.messaging_delay,
                config.email_delay
            );
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts < 1 {
            bail!("RETRY_MAX_ATTEMPTS debe ser >= 1");
        }
        if !(0.0..1.0).contains(&self.failure_probability) {
            bail!(
                "ERROR_PROBABILITY debe estar en [0, 1), se recibió {}",
                self.failure_probability
            );
        }
        if self.email_delay.is_zero() || self.messaging_delay.is_zero() {
            bail!("los delays por canal deben ser positivos");
        }
        Ok(())
    }

    /// Se espera que mensajería sea el canal rápido; si no, sólo se avisa.
    pub fn messaging_is_faster(&self) -> bool {
        self.messaging_delay < self.email_delay
    }

    /// Latencia simulada del canal.
    pub fn delay_for(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Email => self.email_delay,
            Channel::Messaging => self.messaging_delay,
        }
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<Duration> {
    let secs = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{} inválido: {}", key, raw))?;
    if !secs.is_finite() || secs <= 0.0 {
        bail!("{} debe ser un número positivo de segundos", key);
    }
    Duration::try_from_secs_f64(secs).with_context(|| format!("{} fuera de rango: {}", key, raw))
}
