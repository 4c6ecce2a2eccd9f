//! Event outbox service.
//!
//! Serves the event log API and, unless disabled, runs the dispatch loop
//! against the configured broker endpoint.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use event_outbox::adapters::events::{DispatchEngine, HttpPublisherClient};
use event_outbox::adapters::http::{event_log_router, EventLogAppState};
use event_outbox::adapters::postgres::PostgresLogStore;
use event_outbox::config::AppConfig;
use event_outbox::ports::LogStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config.database.pool_options().connect(&config.database.url).await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let store: Arc<dyn LogStore> =
        Arc::new(PostgresLogStore::new(pool, config.eid.generator()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher = match config.publisher.http_config() {
        Some(http) if config.dispatcher.enabled => {
            let publisher = Arc::new(HttpPublisherClient::new(http)?);
            let engine = DispatchEngine::with_config(
                store.clone(),
                publisher,
                config.dispatcher.to_dispatch_config()?,
            );
            Some(tokio::spawn(async move { engine.run(shutdown_rx).await }))
        }
        _ => {
            warn!("Dispatcher disabled; serving the event log API only");
            None
        }
    };

    let app = event_log_router()
        .with_state(EventLogAppState::new(store))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Event outbox listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = dispatcher {
        handle.await?;
    }

    info!("Event outbox stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
