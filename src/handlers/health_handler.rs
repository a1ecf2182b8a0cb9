//! handlers/health_handler.rs
use actix_web::{web, HttpResponse};

use crate::{
    config::app_config::AppConfig, models::notification_model::HealthResponse,
    services::notification_service::NotificationService,
};

/// GET /
pub async fn health_endpoint(
    config: web::Data<AppConfig>,
    notification_service: web::Data<NotificationService>,
) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        service: config.app_name.clone(),
        version: config.app_version.clone(),
        status: "running".to_string(),
        storage: notification_service.storage_backend().to_string(),
    })
}
