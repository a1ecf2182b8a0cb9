//! errors.rs
//! Taxonomía de errores del store y del servicio de notificaciones.

use thiserror::Error;

use crate::models::notification_model::NotificationStatus;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("notificación {0} no encontrada")]
    NotFound(i64),

    /// El registro ya está en estado terminal y no se vuelve a tocar.
    #[error("notificación {id} ya está en estado terminal ({status})")]
    Terminal { id: i64, status: NotificationStatus },

    /// El guard optimista del UPDATE no afectó ninguna fila.
    #[error("conflicto al actualizar notificación {0}")]
    Conflict(i64),

    #[error("registro inválido: {0}")]
    Corrupt(String),

    #[error("error de base de datos: {0}")]
    Database(#[from] sqlx::Error),

    #[error("error en migraciones: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request inválido: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
