//! Membership billing service binary.
//!
//! Loads configuration, wires adapters into the lifecycle manager and serves
//! the membership HTTP API.

use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use membership_billing::adapters::http::{membership_router, MembershipAppState};
use membership_billing::adapters::{
    InMemoryBookingStore, InMemoryCatalog, MockPaymentGateway, PostgresBookingStore,
    PostgresCatalog, StripeConfig, StripePaymentGateway,
};
use membership_billing::application::MembershipLifecycleManager;
use membership_billing::config::{AppConfig, ConfigError, GatewayKind, ValidationError};
use membership_billing::ports::{BookingStore, CatalogReader, PaymentGateway, SystemClock};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (store, catalog) = build_persistence(&config).await?;
    let gateway = build_gateway(&config);
    let manager = MembershipLifecycleManager::new(
        store,
        catalog,
        gateway,
        Arc::new(SystemClock),
        config.lifecycle_settings(),
    );

    let app = Router::new()
        .nest("/api", membership_router())
        .with_state(MembershipAppState { manager })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config))
                .layer(TimeoutLayer::new(config.server.request_timeout())),
        );

    let listener = tokio::net::TcpListener::bind(config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        environment = ?config.server.environment,
        "membership billing listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn build_persistence(
    config: &AppConfig,
) -> Result<(Arc<dyn BookingStore>, Arc<dyn CatalogReader>), StartupError> {
    if !config.database.uses_postgres() {
        tracing::warn!("no database URL configured, using the in-memory store");
        return Ok((
            Arc::new(InMemoryBookingStore::new()),
            Arc::new(InMemoryCatalog::new()),
        ));
    }

    let db = &config.database;
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(db.acquire_timeout())
        .connect(&db.url)
        .await?;

    if db.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    Ok((
        Arc::new(PostgresBookingStore::new(pool.clone())),
        Arc::new(PostgresCatalog::new(pool)),
    ))
}

fn build_gateway(config: &AppConfig) -> Arc<dyn PaymentGateway> {
    let payment = &config.payment;
    match (payment.gateway, payment.stripe_api_key.as_ref()) {
        (GatewayKind::Stripe, Some(key)) => {
            let mut stripe = StripeConfig::new(key.expose_secret().clone());
            if let Some(url) = &payment.stripe_api_base_url {
                stripe = stripe.with_base_url(url.clone());
            }
            if payment.is_test_mode() {
                tracing::info!("stripe gateway running in test mode");
            }
            Arc::new(StripePaymentGateway::new(stripe))
        }
        _ => {
            tracing::warn!("using the mock payment gateway; no money will move");
            Arc::new(MockPaymentGateway::new())
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
