//! services/dispatch_engine.rs
//! Ciclo de vida de una notificación desde `pending` hasta `sent`/`failed`.
//! Corre desacoplado del request que la creó.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::models::notification_model::{Channel, Notification, NotificationStatus};
use crate::services::dispatch_policy::DispatchPolicy;
use crate::services::notification_store::NotificationStore;

/// Resultado del despacho. Sólo se usa para logs y tests: lo observable
/// desde afuera es lo que queda persistido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { attempts: u32 },
    Failed { attempts: u32 },
    /// El registro desapareció (o ya era terminal) en el intento indicado.
    Abandoned { attempt: u32 },
}

#[derive(Clone)]
pub struct DispatchEngine {
    store: Arc<dyn NotificationStore>,
    policy: DispatchPolicy,
}

impl DispatchEngine {
    pub fn new(store: Arc<dyn NotificationStore>, policy: DispatchPolicy) -> Self {
        DispatchEngine { store, policy }
    }

    /// Despacha la notificación `notification_id` por `channel`.
    ///
    /// Cada intento espera la latencia del canal, consulta la política y
    /// actualiza el registro releído del store. Los errores de storage en
    /// intentos intermedios se registran y cuentan como reintento; en el
    /// último intento (o si se agotan) la notificación queda `failed`.
    pub async fn dispatch(&self, notification_id: i64, channel: Channel) -> DispatchOutcome {
        let max_attempts = self.policy.max_attempts();
        log::debug!(
            "(dispatch) Iniciando despacho id={} canal={} max_attempts={}",
            notification_id,
            channel,
            max_attempts
        );

        for attempt in 1..=max_attempts {
            // Único punto de suspensión: latencia simulada del canal
            tokio::time::sleep(self.policy.delay_for(channel)).await;

            let failed = self.policy.should_simulate_failure(attempt);
            let next_status = self.policy.next_status(attempt, failed);

            let result = self
                .store
                .update(
                    notification_id,
                    Box::new(move |n: &mut Notification| {
                        n.status = next_status;
                        n.attempts = attempt;
                    }),
                )
                .await;

            match result {
                Ok(updated) => match updated.status {
                    NotificationStatus::Pending => {
                        log::warn!(
                            "(dispatch) Notificación {} falló en el intento {}, reintentando...",
                            notification_id,
                            attempt
                        );
                    }
                    NotificationStatus::Sent => {
                        log::info!(
                            "(dispatch) Notificación {} enviada tras {} intento(s)",
                            notification_id,
                            attempt
                        );
                        return DispatchOutcome::Sent { attempts: attempt };
                    }
                    NotificationStatus::Failed => {
                        log::error!(
                            "(dispatch) Notificación {} falló tras {} intentos",
                            notification_id,
                            attempt
                        );
                        return DispatchOutcome::Failed { attempts: attempt };
                    }
                },
                Err(StorageError::NotFound(_)) | Err(StorageError::Terminal { .. }) => {
                    log::info!(
                        "(dispatch) Notificación {} ya no está disponible en el intento {}, se abandona",
                        notification_id,
                        attempt
                    );
                    return DispatchOutcome::Abandoned { attempt };
                }
                Err(e) => {
                    log::error!(
                        "(dispatch) Error enviando notificación {} en el intento {}: {}",
                        notification_id,
                        attempt,
                        e
                    );
                }
            }
        }

        self.mark_failed(notification_id, max_attempts).await
    }

    async fn mark_failed(&self, notification_id: i64, max_attempts: u32) -> DispatchOutcome {
        let result = self
            .store
            .update(
                notification_id,
                Box::new(move |n: &mut Notification| {
                    n.status = NotificationStatus::Failed;
                    n.attempts = max_attempts;
                }),
            )
            .await;

        match result {
            Ok(_) => {
                log::error!(
                    "(mark_failed) Notificación {} falló tras {} intentos",
                    notification_id,
                    max_attempts
                );
                DispatchOutcome::Failed {
                    attempts: max_attempts,
                }
            }
            Err(StorageError::NotFound(_)) | Err(StorageError::Terminal { .. }) => {
                log::info!(
                    "(mark_failed) Notificación {} ya no está disponible, se abandona",
                    notification_id
                );
                DispatchOutcome::Abandoned {
                    attempt: max_attempts,
                }
            }
            Err(e) => {
                // Queda `pending`; no hay a quién reportarlo.
                log::error!(
                    "(mark_failed) No se pudo marcar como fallida la notificación {}: {}",
                    notification_id,
                    e
                );
                DispatchOutcome::Abandoned {
                    attempt: max_attempts,
                }
            }
        }
    }
}
