use std::sync::Arc;

use anyhow::Context;
use backend::{
    api::{AppState, build_router},
    availability::AvailabilityCalculator,
    booking::BookingCoordinator,
    config::AppConfig,
    db::Db,
    metrics::counters::Counters,
    reservation::{repository_sqlx::SqlxReservationRepository, store::ReservationStore},
};
use common::logger::{LogFormat, init_logger};
use tokio::net::TcpListener;

/// Connects the database, runs migrations and wires store, calculator and
/// coordinator around one shared persistence handle.
async fn init_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let db = Db::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.database_url))?;
    db.migrate().await.context("schema migration failed")?;

    let repo = Arc::new(SqlxReservationRepository::new(db.pool.clone()));
    let store = Arc::new(ReservationStore::new(repo));
    let counters = Counters::default();

    let calculator = Arc::new(AvailabilityCalculator::new(
        store.clone(),
        cfg.venue.clone(),
        cfg.slot_cache_ttl,
        counters.clone(),
    ));
    let coordinator = Arc::new(BookingCoordinator::new(
        calculator.clone(),
        store,
        counters.clone(),
    ));

    Ok(AppState::new(calculator, coordinator, counters))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("diner-server", LogFormat::from_env());

    let cfg = AppConfig::from_env()?;
    tracing::info!(
        database_url = %cfg.database_url,
        tables = cfg.venue.table_count,
        opening = %cfg.venue.opening_time.format("%H:%M"),
        closing = %cfg.venue.closing_time.format("%H:%M"),
        interval_minutes = cfg.venue.slot_interval_minutes,
        "starting reservation service"
    );

    let state = init_state(&cfg).await?;
    let app = build_router(state);

    let listener = TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!("Listening on {}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e, error.message = %e, "Unexpected error"
            )
        })
}
