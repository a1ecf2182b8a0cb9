//! models/notification_model.rs
//! Entidad `Notification` y los DTOs de la API de notificaciones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longitud máxima aceptada para `message`.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Canal por el que se "envía" la notificación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    /// Mensajería instantánea (antes "telegram").
    #[serde(alias = "telegram")]
    Messaging,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Messaging => "messaging",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "messaging" | "telegram" => Ok(Channel::Messaging),
            other => Err(format!("canal desconocido: {}", other)),
        }
    }
}

/// Estado de entrega. `Sent` y `Failed` son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            other => Err(format!("estado desconocido: {}", other)),
        }
    }
}

/// Registro persistido. Se serializa tal cual en las respuestas HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub channel: Channel,
    pub status: NotificationStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos de alta ya validados, lo que recibe el store en `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
    pub channel: Channel,
}

/// Body de POST /api/notifications
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: i64,
    pub message: String,
    /// Clientes antiguos mandan el campo como "type".
    #[serde(alias = "type")]
    pub channel: Channel,
}

impl CreateNotificationRequest {
    /// Valida el request y lo convierte en `NewNotification`.
    pub fn validate(self) -> Result<NewNotification, String> {
        if self.user_id < 0 {
            return Err(format!("user_id inválido: {}", self.user_id));
        }
        if self.message.trim().is_empty() {
            return Err("message no puede estar vacío".to_string());
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(format!(
                "message supera el máximo de {} caracteres",
                MAX_MESSAGE_LEN
            ));
        }
        Ok(NewNotification {
            user_id: self.user_id,
            message: self.message,
            channel: self.channel,
        })
    }
}

/// Query de GET /api/notifications/{user_id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub status: Option<NotificationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub total: usize,
}

/// Respuesta de GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
    pub status: String,
    pub storage: String,
}
