//! PassHub Server - event pass booking and entry validation
//!
//! REST API server for places, passes, refunds and gate scanning.

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use passhub_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{passes::PassesService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting PassHub Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &config)?;
    services.users.ensure_admin().await?;
    spawn_refund_retry(services.passes.clone(), config.payments.refund_retry_secs);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        repository,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically resend refunds the gateway did not accept at cancel time
fn spawn_refund_retry(passes: PassesService, every_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = passes.retry_pending_refunds().await {
                tracing::warn!(error = %e, "Refund retry round failed");
            }
        }
    });
}

/// Console output (pretty or JSON) plus optional daily-rotated JSON files
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("passhub_server={},tower_http=debug", logging.level).into());

    let json = logging.format.eq_ignore_ascii_case("json");
    let pretty_layer = (!json).then(|| fmt::layer());
    let json_layer = json.then(|| fmt::layer().json());

    let (file_layer, guard) = match logging.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "passhub-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    guard
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Public catalogue
        .route("/places", get(api::places::list_places))
        .route("/places/:id", get(api::places::get_place))
        .route("/places/:id/availability", get(api::places::availability))
        // Host
        .route(
            "/host/places",
            get(api::host::list_my_places).post(api::host::create_place),
        )
        .route(
            "/host/places/:id",
            put(api::host::update_place).delete(api::host::delete_place),
        )
        .route(
            "/host/places/:id/capacity",
            get(api::host::capacity_status).put(api::host::update_capacity),
        )
        .route("/host/places/:id/security", put(api::host::assign_security))
        .route("/host/places/:id/bookings", get(api::host::place_bookings))
        // Passes
        .route("/passes/request", post(api::passes::request_pass))
        .route("/passes/mine", get(api::passes::my_passes))
        .route("/passes/:id", get(api::passes::get_pass))
        .route("/passes/:id/refund-quote", get(api::passes::refund_quote))
        .route("/passes/cancel/:id", post(api::passes::cancel_pass))
        // Payments
        .route("/payments/:id", get(api::payments::get_payment))
        .route("/payments/:id/confirm", post(api::payments::confirm_payment))
        .route("/payments/:id/fail", post(api::payments::fail_payment))
        // Security staff
        .route("/security/places", get(api::security::assigned_places))
        .route("/security/scan-pass", post(api::security::scan_pass))
        // Administration
        .route("/admin/users", get(api::admin::list_users))
        .route("/admin/users/:id/role", put(api::admin::update_role))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
