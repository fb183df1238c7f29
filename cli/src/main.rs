pub mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use backend::{
    availability::AvailabilityCalculator,
    booking::BookingCoordinator,
    config::AppConfig,
    db::Db,
    metrics::counters::Counters,
    reservation::{repository_sqlx::SqlxReservationRepository, store::ReservationStore},
    time::fmt_time,
};
use cli::{Cli, Command};
use common::logger::{LogFormat, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("diner-cli", LogFormat::from_env());

    let mut cfg = AppConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        cfg.database_url = url.clone();
    }

    let db = Db::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.database_url))?;
    db.migrate().await.context("schema migration failed")?;

    let repo = Arc::new(SqlxReservationRepository::new(db.pool.clone()));
    let store = Arc::new(ReservationStore::new(repo));
    let counters = Counters::default();
    // Single-shot process: nothing to cache between queries.
    let calculator = Arc::new(AvailabilityCalculator::new(
        store.clone(),
        cfg.venue.clone(),
        std::time::Duration::ZERO,
        counters.clone(),
    ));

    match &cli.command {
        Command::Slots { date, time, .. } => {
            let slots = calculator
                .compute_slots(*date, cli.command.slot_params())
                .await?;

            let rows: Vec<(String, u32)> = match time {
                Some(t) => vec![(fmt_time(*t), slots.get(t).copied().unwrap_or(0))],
                None => slots.iter().map(|(t, n)| (fmt_time(*t), *n)).collect(),
            };

            if cli.json {
                let map: serde_json::Map<_, _> =
                    rows.into_iter().map(|(t, n)| (t, json!(n))).collect();
                println!("{}", serde_json::Value::Object(map));
            } else if rows.is_empty() {
                println!("{date}: fully booked");
            } else {
                for (t, n) in rows {
                    println!("{t}  {n}");
                }
            }
        }

        Command::List { date } => {
            let reservations = store.reservations_on(*date).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reservations)?);
            } else {
                for r in &reservations {
                    println!(
                        "#{:<5} {}  {:>2}p  {:>3}m  {} <{}>",
                        r.id,
                        fmt_time(r.start_time),
                        r.party_size,
                        r.duration_minutes,
                        r.name,
                        r.email
                    );
                }
                println!("{} reservation(s) on {date}", reservations.len());
            }
        }

        Command::Cancel { id } => {
            let coordinator = BookingCoordinator::new(calculator, store, counters);
            coordinator.cancel(*id).await?;

            if cli.json {
                println!("{}", json!({ "cancelled": id }));
            } else {
                println!("reservation #{id} cancelled");
            }
        }
    }

    Ok(())
}
