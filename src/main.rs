use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod leave;
mod model;
mod routes;
mod state;
mod store;
mod utils;

use config::{Config, StoreBackend};
use db::init_db;

use crate::docs::ApiDoc;
use crate::leave::calendar::SystemClock;
use crate::routes::Limiters;
use crate::state::AppState;
use crate::store::LeaveRequestStore;
use crate::store::documents::LocalDocumentStorage;
use crate::store::memory::InMemoryLeaveStore;
use crate::store::mysql::MySqlLeaveStore;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

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
        .init();

    info!(backend = ?config.store_backend, "Server starting...");

    let store: Arc<dyn LeaveRequestStore> = match config.store_backend {
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the mysql backend")?;
            Arc::new(MySqlLeaveStore::new(init_db(url).await?))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory leave store, requests are lost on restart");
            Arc::new(InMemoryLeaveStore::new())
        }
    };

    let documents = LocalDocumentStorage::open(&config.document_dir)
        .await
        .with_context(|| format!("cannot open document directory '{}'", config.document_dir))?;

    let state = Data::new(AppState::new(
        &config,
        store,
        Arc::new(documents),
        Arc::new(SystemClock),
    ));
    let limiters = Arc::new(Limiters::from_config(&config)?);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
