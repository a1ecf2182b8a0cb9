//! database.rs
//! Selección del backend de persistencia, con fallback al store en memoria.

use std::sync::Arc;

use crate::config::app_config::{StorageTarget, DEFAULT_DATABASE_URL};
use crate::services::memory_store::MemoryNotificationStore;
use crate::services::notification_store::{NotificationStore, SqliteNotificationStore};

/// Abre el store configurado. Nunca falla: si el backend durable no se
/// puede abrir se usa el store en memoria y se avisa con un warning.
pub async fn open_store(target: &StorageTarget) -> Arc<dyn NotificationStore> {
    match target {
        StorageTarget::Memory => {
            log::warn!(
                "(open_store) DATABASE_URL=memory, usando store en memoria (los datos no sobreviven un reinicio)"
            );
            Arc::new(MemoryNotificationStore::new())
        }
        StorageTarget::Default => {
            log::warn!(
                "(open_store) DATABASE_URL no definido, usando {}",
                DEFAULT_DATABASE_URL
            );
            // Crear carpeta "data"
            if let Err(e) = std::fs::create_dir_all("data") {
                log::warn!(
                    "(open_store) No se pudo crear el directorio 'data': {}. Usando store en memoria",
                    e
                );
                return Arc::new(MemoryNotificationStore::new());
            }
            open_sqlite(DEFAULT_DATABASE_URL).await
        }
        StorageTarget::Sqlite(url) => open_sqlite(url).await,
    }
}

async fn open_sqlite(url: &str) -> Arc<dyn NotificationStore> {
    log::info!("(open_store) Conectando a SQLite en {}", url);
    match SqliteNotificationStore::connect(url).await {
        Ok(store) => {
            log::info!("(open_store) SQLite listo, migraciones aplicadas");
            Arc::new(store)
        }
        Err(e) => {
            log::warn!(
                "(open_store) No se pudo abrir {}: {}. Usando store en memoria (no durable)",
                url,
                e
            );
            Arc::new(MemoryNotificationStore::new())
        }
    }
}
