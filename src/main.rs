use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use attendance::clock_in::SystemClock;
use attendance::config::Config;
use attendance::db::init_db;
use attendance::docs::ApiDoc;
use attendance::offline::{JsonFileStorage, OfflineQueue};
use attendance::routes::{self, Limiters};
use attendance::state::AppState;
use attendance::store::MySqlStore;
use attendance::sync::SyncReconciler;
use attendance::utils::site_cache::CachedSites;
use attendance::writer::RecordWriter;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service"
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
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(MySqlStore::new(pool.clone()));

    let storage = JsonFileStorage::open(&config.sync_queue_dir)
        .await
        .context("Failed to open offline queue")?;
    let queue = Arc::new(OfflineQueue::new(Arc::new(storage)));
    match queue.pending().await {
        Ok(0) => {}
        Ok(pending) => info!(pending, "Offline attendance writes waiting for sync"),
        Err(e) => error!(error = %e, "Offline queue unreadable"),
    }

    let state = Data::new(AppState {
        sites: Arc::new(CachedSites::new(
            store.clone(),
            Duration::from_secs(config.site_cache_ttl_secs),
        )),
        employees: store.clone(),
        backend: store.clone(),
        writer: Arc::new(RecordWriter::new(store.clone(), queue.clone())),
        reconciler: Arc::new(SyncReconciler::new(store.clone(), queue)),
        clock: Arc::new(SystemClock),
        late_after: config.late_after,
    });

    let limiters = Limiters::from_config(&config)?;
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
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(state.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data, limiters.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
