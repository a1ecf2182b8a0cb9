//! services/notification_store.rs
//! Persistencia de notificaciones: contrato `NotificationStore` y su
//! implementación sobre SQLite con sqlx.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

use crate::errors::StorageError;
use crate::models::notification_model::{NewNotification, Notification, NotificationStatus};

/// Cambio a aplicar sobre una copia fresca del registro dentro de `update`.
pub type Mutator = Box<dyn FnOnce(&mut Notification) + Send>;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserta con `status = pending` y `attempts = 0`.
    async fn create(&self, new: NewNotification) -> Result<Notification, StorageError>;

    async fn get(&self, id: i64) -> Result<Notification, StorageError>;

    /// Lee el registro, aplica `mutator` y persiste `status`, `attempts` y
    /// `updated_at` de forma atómica. `NotFound` si el id ya no existe.
    async fn update(&self, id: i64, mutator: Mutator) -> Result<Notification, StorageError>;

    /// Más recientes primero. Vacío si no hay coincidencias.
    async fn list_by_user(
        &self,
        user_id: i64,
        status: Option<NotificationStatus>,
    ) -> Result<Vec<Notification>, StorageError>;

    /// Nombre del backend, para logs y health check.
    fn backend(&self) -> &'static str;
}

/// Timestamps con precisión de microsegundos, igual a lo que se guarda.
pub(crate) fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Reglas comunes a todos los backends para una mutación:
/// un registro terminal no se toca, `attempts` no retrocede y
/// los campos inmutables se conservan.
pub(crate) fn apply_mutation(
    current: &Notification,
    mutator: Mutator,
) -> Result<Notification, StorageError> {
    if current.status.is_terminal() {
        return Err(StorageError::Terminal {
            id: current.id,
            status: current.status,
        });
    }

    let mut draft = current.clone();
    mutator(&mut draft);

    if draft.attempts < current.attempts {
        return Err(StorageError::Corrupt(format!(
            "attempts de la notificación {} no puede bajar de {} a {}",
            current.id, current.attempts, draft.attempts
        )));
    }

    let mut next = current.clone();
    next.status = draft.status;
    next.attempts = draft.attempts;
    next.updated_at = now_micros().max(current.updated_at);
    Ok(next)
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("timestamp inválido '{}': {}", raw, e)))
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification, StorageError> {
    let channel: String = row.try_get("channel")?;
    let status: String = row.try_get("status")?;
    let attempts: i64 = row.try_get("attempts")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        channel: channel.parse().map_err(StorageError::Corrupt)?,
        status: status.parse().map_err(StorageError::Corrupt)?,
        attempts: u32::try_from(attempts)
            .map_err(|_| StorageError::Corrupt(format!("attempts inválido: {}", attempts)))?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, message, channel, status, attempts, created_at, updated_at FROM notifications";

#[derive(Clone, Debug)]
pub struct SqliteNotificationStore {
    db_pool: Pool<Sqlite>,
}

impl SqliteNotificationStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteNotificationStore { db_pool }
    }

    /// Abre (o crea) la base indicada por `url` y corre las migraciones.
    ///
    /// El pool usa una única conexión: SQLite serializa las escrituras de
    /// todos modos y así `sqlite::memory:` comparte la misma base.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = SqliteNotificationStore::new(db_pool);
        store.run_migrations().await?;
        Ok(store)
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StorageError> {
        let now = now_micros();
        let now_str = format_ts(&now);

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (
                user_id, message, channel, status, attempts, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, 'pending', 0, ?4, ?4)
            "#,
        )
        .bind(new.user_id)
        .bind(&new.message)
        .bind(new.channel.as_str())
        .bind(&now_str)
        .execute(&self.db_pool)
        .await?;

        Ok(Notification {
            id: result.last_insert_rowid(),
            user_id: new.user_id,
            message: new.message,
            channel: new.channel,
            status: NotificationStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: i64) -> Result<Notification, StorageError> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(StorageError::NotFound(id))?;

        row_to_notification(&row)
    }

    async fn update(&self, id: i64, mutator: Mutator) -> Result<Notification, StorageError> {
        // Si algo falla antes del commit, el drop de `tx` hace rollback.
        let mut tx = self.db_pool.begin().await?;

        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound(id))?;
        let current = row_to_notification(&row)?;

        let next = apply_mutation(&current, mutator)?;

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = ?1,
                attempts = ?2,
                updated_at = ?3
            WHERE id = ?4 AND status = 'pending'
            "#,
        )
        .bind(next.status.as_str())
        .bind(i64::from(next.attempts))
        .bind(format_ts(&next.updated_at))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(id));
        }

        tx.commit().await?;
        Ok(next)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        status: Option<NotificationStatus>,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "{} WHERE user_id = ?1 AND status = ?2 ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(user_id)
                .bind(status.as_str())
                .fetch_all(&self.db_pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(&self.db_pool)
                .await?
            }
        };

        rows.iter().map(row_to_notification).collect()
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
