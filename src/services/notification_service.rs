//! services/notification_service.rs
//! Frontera entre la API y el motor de despacho: crea el registro de forma
//! síncrona y deja el despacho corriendo en segundo plano.

use std::sync::Arc;

use crate::errors::ServiceError;
use crate::models::notification_model::{
    CreateNotificationRequest, Notification, NotificationStatus,
};
use crate::services::dispatch_engine::DispatchEngine;
use crate::services::dispatch_tracker::DispatchTracker;
use crate::services::notification_store::NotificationStore;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    engine: DispatchEngine,
    tracker: DispatchTracker,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        engine: DispatchEngine,
        tracker: DispatchTracker,
    ) -> Self {
        Self {
            store,
            engine,
            tracker,
        }
    }

    /// Crea la notificación (`pending`, `attempts = 0`) y encola su despacho.
    ///
    /// Devuelve el registro tal cual quedó al crearse. Un error del store se
    /// propaga al que llama y en ese caso no se despacha nada.
    pub async fn submit(&self, req: CreateNotificationRequest) -> Result<Notification, ServiceError> {
        let new = req.validate().map_err(ServiceError::Validation)?;

        let notification = self.store.create(new).await?;
        log::info!(
            "(submit) Notificación {} creada para user_id={} canal={}",
            notification.id,
            notification.user_id,
            notification.channel
        );

        let engine = self.engine.clone();
        let (id, channel) = (notification.id, notification.channel);
        self.tracker.spawn(async move {
            let outcome = engine.dispatch(id, channel).await;
            log::debug!("(submit) Despacho de {} terminado: {:?}", id, outcome);
        });
        log::info!("(submit) Notificación {} encolada para envío", notification.id);

        Ok(notification)
    }

    /// Historial de un usuario, más recientes primero.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<NotificationStatus>,
    ) -> Result<Vec<Notification>, ServiceError> {
        let notifications = self.store.list_by_user(user_id, status).await?;
        log::debug!(
            "(list_for_user) {} notificaciones para user_id={} (status={:?})",
            notifications.len(),
            user_id,
            status
        );
        Ok(notifications)
    }

    pub fn storage_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn tracker(&self) -> &DispatchTracker {
        &self.tracker
    }
}
