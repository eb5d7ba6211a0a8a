mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use crate::db::db::DBClient;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use service::{
    accrual_service::AccrualService,
    notification_service::NotificationService,
    payout_service::PayoutService,
    reconciliation_service::ReconciliationService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    // Services
    pub accrual_service: Arc<AccrualService<DBClient>>,
    pub payout_service: Arc<PayoutService<DBClient>>,
    pub reconciliation_service: Arc<ReconciliationService<DBClient>>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let accrual_service = Arc::new(AccrualService::new(db_client_arc.clone()));
        let payout_service = Arc::new(PayoutService::new(
            db_client_arc.clone(),
            config.payout_export_dir.clone(),
        ));
        let reconciliation_service = Arc::new(ReconciliationService::new(
            db_client_arc.clone(),
            Arc::new(NotificationService::new()),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            accrual_service,
            payout_service,
            reconciliation_service,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let allowed_origins = vec![
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://localhost:8000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST]);

    let app_state = Arc::new(AppState::new(DBClient::new(pool), config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    if config.payout_schedule_enabled {
        let app_state_clone = app_state.clone();
        tokio::spawn(async move {
            service::background_jobs::start_weekly_payout_job(app_state_clone).await;
        });
    } else {
        tracing::info!("Weekly payout job disabled (set PAYOUT_SCHEDULE_ENABLED=true to enable)");
    }

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
