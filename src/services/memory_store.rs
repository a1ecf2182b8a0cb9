//! services/memory_store.rs
//! Store en memoria del proceso. Es el fallback cuando no hay base de datos
//! durable disponible: los datos se pierden al reiniciar.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::StorageError;
use crate::models::notification_model::{NewNotification, Notification, NotificationStatus};
use crate::services::notification_store::{apply_mutation, now_micros, Mutator, NotificationStore};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    records: BTreeMap<i64, Notification>,
}

#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    state: Mutex<MemoryState>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrado externo, sólo lo usan los tests para simular un registro
    /// que desaparece durante el despacho.
    #[cfg(test)]
    pub async fn remove(&self, id: i64) -> Option<Notification> {
        self.state.lock().await.records.remove(&id)
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StorageError> {
        let mut state = self.state.lock().await;
        state.last_id += 1;

        let now = now_micros();
        let notification = Notification {
            id: state.last_id,
            user_id: new.user_id,
            message: new.message,
            channel: new.channel,
            status: NotificationStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
        };
        state.records.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get(&self, id: i64) -> Result<Notification, StorageError> {
        self.state
            .lock()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn update(&self, id: i64, mutator: Mutator) -> Result<Notification, StorageError> {
        // El lock se mantiene durante lectura, mutación y escritura.
        let mut state = self.state.lock().await;
        let current = state.records.get(&id).ok_or(StorageError::NotFound(id))?;

        let next = apply_mutation(current, mutator)?;
        state.records.insert(id, next.clone());
        Ok(next)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        status: Option<NotificationStatus>,
    ) -> Result<Vec<Notification>, StorageError> {
        let state = self.state.lock().await;
        let mut items: Vec<Notification> = state
            .records
            .values()
            .filter(|n| n.user_id == user_id)
            .filter(|n| status.map_or(true, |s| n.status == s))
            .cloned()
            .collect();

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
