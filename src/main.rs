use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::dispatch_engine::DispatchEngine;
use crate::services::dispatch_policy::DispatchPolicy;
use crate::services::dispatch_tracker::DispatchTracker;
use crate::services::notification_service::NotificationService;

mod app;
mod config;
mod database;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    let config = AppConfig::from_env().context("Configuración inválida")?;
    init_logger(config.log_format);

    log::info!(
        "Iniciando {} v{} (max_attempts={}, error_probability={}, email_delay={:?}, messaging_delay={:?})",
        config.app_name,
        config.app_version,
        config.dispatch.max_attempts,
        config.dispatch.failure_probability,
        config.dispatch.email_delay,
        config.dispatch.messaging_delay
    );

    // Store durable o fallback en memoria
    let store = database::open_store(&config.storage).await;

    // Los despachos corren en el runtime principal, no en los workers
    let tracker = DispatchTracker::new(tokio::runtime::Handle::current());
    let engine = DispatchEngine::new(
        store.clone(),
        DispatchPolicy::from_config(config.dispatch.clone()),
    );
    let notification_service = NotificationService::new(store, engine, tracker);

    let bind_addr = (config.host.clone(), config.port);
    let shutdown_grace = config.shutdown_grace;
    let app_config = web::Data::new(config);
    let service_data = web::Data::new(notification_service.clone());

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", bind_addr.0, bind_addr.1);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_config.clone())
            .app_data(service_data.clone())
            .configure(app::init_app)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    let tracker = notification_service.tracker();
    log::info!(
        "Servidor detenido, esperando {} despacho(s) en curso (máx {:?})",
        tracker.in_flight(),
        shutdown_grace
    );
    if tracker.wait_idle(shutdown_grace).await {
        log::info!("Todos los despachos terminaron");
    } else {
        log::warn!(
            "Se abandonan {} despacho(s) sin estado terminal",
            tracker.in_flight()
        );
    }

    Ok(())
}
