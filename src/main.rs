use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::time::Duration;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod notify;
mod routes;
mod utils;

use config::Config;
use db::init_db;
use notify::mailer::{Mailer, SmtpConfig};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Student Attendance Management API"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    // Absence notices are queued by the attendance workflow; the dispatcher
    // drains the queue only when SMTP is configured, otherwise rows stay
    // pending until it is.
    match SmtpConfig::from_env() {
        Some(smtp) => match Mailer::new(&smtp) {
            Ok(mailer) => {
                let dispatcher_pool = pool.clone();
                let poll_interval = Duration::from_secs(config.notify_poll_secs);
                let max_attempts = config.notify_max_attempts;
                actix_web::rt::spawn(async move {
                    notify::outbox::run_dispatcher(
                        dispatcher_pool,
                        mailer,
                        poll_interval,
                        max_attempts,
                    )
                    .await;
                });
            }
            Err(e) => {
                warn!(error = %e, "SMTP misconfigured; absence notifications stay queued");
            }
        },
        None => {
            warn!("SMTP_HOST not set; absence notifications stay queued");
        }
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
