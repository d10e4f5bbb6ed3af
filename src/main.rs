use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod leave;
mod model;
mod models;
mod routes;
mod seed;
mod store;
mod utils;

use config::Config;
use db::init_db;
use leave::LeaveService;
use store::{LeaveStore, MemoryLeaveStore, MySqlLeaveStore};
use utils::email_index::EmailIndex;

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave Desk"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store: Arc<dyn LeaveStore> = if config.uses_memory_store() {
        warn!("Using the in-memory store; data is lost on restart");
        Arc::new(MemoryLeaveStore::new())
    } else {
        Arc::new(MySqlLeaveStore::new(init_db(&config.database_url).await?))
    };

    let emails = Data::new(EmailIndex::new());

    if config.seed_demo_users {
        seed::seed_demo_users(store.as_ref(), &emails, config.default_leave_balance)
            .await
            .context("Failed to seed demo users")?;
    }

    let store_for_warmup = store.clone();
    let emails_for_warmup = emails.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = emails_for_warmup.warmup(store_for_warmup.as_ref(), 500).await {
            error!(error = ?e, "Failed to warmup email filter");
        }
    });

    let service = Data::new(LeaveService::new(store.clone(), config.decision_retry_attempts));
    let store_data: Data<dyn LeaveStore> = Data::from(store);
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(routes::json_config())
            .app_data(Data::new(config.clone()))
            .app_data(store_data.clone())
            .app_data(service.clone())
            .app_data(emails.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
