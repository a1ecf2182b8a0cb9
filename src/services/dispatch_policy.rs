//! services/dispatch_policy.rs
//! Lógica de decisión por intento: latencia simulada del canal, fallo
//! inyectado y siguiente estado. No guarda estado entre llamadas.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::dispatch_config::DispatchConfig;
use crate::models::notification_model::{Channel, NotificationStatus};

/// Fuente de números aleatorios en [0, 1). Se inyecta para poder fijar
/// la secuencia de fallos en tests.
pub trait RandomSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// RNG del hilo actual.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn sample(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// RNG con semilla fija, para reproducir una corrida.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn sample(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            // Un panic con el lock tomado no deja el RNG en un estado inválido
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }
}

/// Regla de fallo simulado: la muestra cae bajo la probabilidad y el
/// intento no es el último. El último intento nunca se falla
/// artificialmente, así el despacho termina en `max_attempts` intentos.
pub fn simulated_failure(
    sample: f64,
    attempt_number: u32,
    max_attempts: u32,
    failure_probability: f64,
) -> bool {
    sample < failure_probability && attempt_number < max_attempts
}

#[derive(Clone)]
pub struct DispatchPolicy {
    config: DispatchConfig,
    random: Arc<dyn RandomSource>,
}

impl DispatchPolicy {
    pub fn new(config: DispatchConfig, random: Arc<dyn RandomSource>) -> Self {
        DispatchPolicy { config, random }
    }

    /// Política con la fuente aleatoria que indica la configuración:
    /// `SeededRandom` si hay semilla, `ThreadRandom` si no.
    pub fn from_config(config: DispatchConfig) -> Self {
        let random: Arc<dyn RandomSource> = match config.random_seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        DispatchPolicy::new(config, random)
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    pub fn delay_for(&self, channel: Channel) -> Duration {
        self.config.delay_for(channel)
    }

    /// Saca una muestra y decide si el intento `attempt_number` (base 1)
    /// se trata como fallido.
    pub fn should_simulate_failure(&self, attempt_number: u32) -> bool {
        simulated_failure(
            self.random.sample(),
            attempt_number,
            self.config.max_attempts,
            self.config.failure_probability,
        )
    }

    /// Estado tras un intento: sigue `Pending` si falló y quedan intentos,
    /// `Sent` si salió bien, `Failed` si ya no quedan intentos.
    pub fn next_status(&self, attempt_number: u32, failed: bool) -> NotificationStatus {
        if !failed {
            NotificationStatus::Sent
        } else if attempt_number < self.config.max_attempts {
            NotificationStatus::Pending
        } else {
            NotificationStatus::Failed
        }
    }
}
