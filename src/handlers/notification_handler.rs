//! handlers/notification_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    errors::ServiceError,
    models::notification_model::{
        CreateNotificationRequest, NotificationListQuery, NotificationListResponse,
    },
    services::notification_service::NotificationService,
};

/// POST /api/notifications
pub async fn create_notification_endpoint(
    notification_service: web::Data<NotificationService>,
    body: web::Json<CreateNotificationRequest>,
) -> HttpResponse {
    match notification_service.submit(body.into_inner()).await {
        Ok(notification) => HttpResponse::Created().json(notification),
        Err(ServiceError::Validation(msg)) => {
            HttpResponse::UnprocessableEntity().json(json!({ "detail": msg }))
        }
        Err(e) => {
            log::error!("(create_notification_endpoint) Error creando notificación: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "detail": "Failed to create notification"
            }))
        }
    }
}

/// GET /api/notifications/{user_id}?status=...
pub async fn list_notifications_endpoint(
    notification_service: web::Data<NotificationService>,
    path: web::Path<i64>,
    query: web::Query<NotificationListQuery>,
) -> HttpResponse {
    let user_id = path.into_inner();

    match notification_service
        .list_for_user(user_id, query.status)
        .await
    {
        Ok(notifications) => HttpResponse::Ok().json(NotificationListResponse {
            total: notifications.len(),
            notifications,
        }),
        Err(e) => {
            log::error!(
                "(list_notifications_endpoint) Error obteniendo notificaciones de user_id={}: {}",
                user_id,
                e
            );
            HttpResponse::InternalServerError().json(json!({
                "detail": "Failed to retrieve notifications"
            }))
        }
    }
}
