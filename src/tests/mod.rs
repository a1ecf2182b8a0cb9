//! tests/mod.rs
//! Pruebas del servicio y utilidades compartidas entre ellas.

mod notification_service_tests;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::dispatch_config::DispatchConfig;
use crate::errors::StorageError;
use crate::models::notification_model::{NewNotification, Notification, NotificationStatus};
use crate::services::dispatch_engine::DispatchEngine;
use crate::services::dispatch_policy::{DispatchPolicy, RandomSource};
use crate::services::dispatch_tracker::DispatchTracker;
use crate::services::memory_store::MemoryNotificationStore;
use crate::services::notification_service::NotificationService;
use crate::services::notification_store::{Mutator, NotificationStore};

/// Devuelve las muestras en orden y repite la última cuando se acaban.
pub struct FixedSequence {
    draws: Vec<f64>,
    cursor: AtomicUsize,
}

impl FixedSequence {
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "FixedSequence necesita al menos una muestra");
        FixedSequence {
            draws,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn taken(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl RandomSource for FixedSequence {
    fn sample(&self) -> f64 {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.draws[i.min(self.draws.len() - 1)]
    }
}

/// Config con delays cortos para que los tests no tarden.
pub fn fast_config(max_attempts: u32, failure_probability: f64) -> DispatchConfig {
    DispatchConfig {
        max_attempts,
        failure_probability,
        email_delay: Duration::from_millis(30),
        messaging_delay: Duration::from_millis(10),
        random_seed: None,
    }
}

pub fn new_notification(user_id: i64, message: &str) -> NewNotification {
    NewNotification {
        user_id,
        message: message.to_string(),
        channel: crate::models::notification_model::Channel::Messaging,
    }
}

pub fn engine_with(
    store: Arc<dyn NotificationStore>,
    config: DispatchConfig,
    random: Arc<dyn RandomSource>,
) -> DispatchEngine {
    DispatchEngine::new(store, DispatchPolicy::new(config, random))
}

pub fn service_with(
    store: Arc<dyn NotificationStore>,
    config: DispatchConfig,
    random: Arc<dyn RandomSource>,
) -> NotificationService {
    let engine = engine_with(store.clone(), config, random);
    let tracker = DispatchTracker::new(tokio::runtime::Handle::current());
    NotificationService::new(store, engine, tracker)
}

/// Espera (con límite) a que la notificación llegue a un estado terminal.
pub async fn wait_for_terminal(
    store: &dyn NotificationStore,
    id: i64,
    timeout: Duration,
) -> Notification {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let current = store.get(id).await.expect("la notificación debería existir");
        if current.status.is_terminal() {
            return current;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "la notificación {} no llegó a estado terminal: {:?}",
            id,
            current
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Store que delega en memoria pero puede fallar a pedido.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryNotificationStore,
    pub fail_create: bool,
    /// Llamadas a `update` (base 1) que devuelven error de base de datos.
    pub failing_updates: HashSet<usize>,
    update_calls: AtomicUsize,
    /// Snapshots de cada update exitoso, en orden.
    pub history: Mutex<Vec<(NotificationStatus, u32)>>,
}

impl FlakyStore {
    pub fn failing_updates(calls: &[usize]) -> Self {
        FlakyStore {
            failing_updates: calls.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<(NotificationStatus, u32)> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for FlakyStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StorageError> {
        if self.fail_create {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.create(new).await
    }

    async fn get(&self, id: i64) -> Result<Notification, StorageError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: i64, mutator: Mutator) -> Result<Notification, StorageError> {
        let call = self.update_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_updates.contains(&call) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        let updated = self.inner.update(id, mutator).await?;
        self.history
            .lock()
            .unwrap()
            .push((updated.status, updated.attempts));
        Ok(updated)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        status: Option<NotificationStatus>,
    ) -> Result<Vec<Notification>, StorageError> {
        self.inner.list_by_user(user_id, status).await
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
