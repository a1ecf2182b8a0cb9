//! app.rs
use crate::handlers::{health_handler, notification_handler};
use actix_web::{error, web, HttpResponse};
use serde_json::json;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    // Body, query o path mal formados -> 422 con el detalle
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::UnprocessableEntity().json(json!({ "detail": detail })),
        )
        .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::UnprocessableEntity().json(json!({ "detail": detail })),
        )
        .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::UnprocessableEntity().json(json!({ "detail": detail })),
        )
        .into()
    }))
    .route("/", web::get().to(health_handler::health_endpoint))
    .service(
        web::scope("/api").service(
            web::scope("/notifications")
                .route(
                    "",
                    web::post().to(notification_handler::create_notification_endpoint),
                )
                .route(
                    "/{user_id}",
                    web::get().to(notification_handler::list_notifications_endpoint),
                ),
        ),
    );
}
