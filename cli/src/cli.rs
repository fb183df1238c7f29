use clap::{Parser, Subcommand};

use backend::availability::SlotParams;
use backend::time::{parse_date, parse_time};
use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Parser)]
#[clap(name = "diner", version)]
pub struct Cli {
    /// Database connection string; falls back to DATABASE_URL
    #[clap(long, global = true)]
    pub database_url: Option<String>,

    /// Emit JSON instead of plain text
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remaining capacity per slot for a date
    Slots {
        #[clap(long, value_parser = date_arg)]
        date: NaiveDate,

        /// Only report this slot
        #[clap(long, value_parser = time_arg)]
        time: Option<NaiveTime>,

        /// Override the configured table count
        #[clap(long)]
        tables: Option<u32>,

        /// Override the configured slot interval (minutes)
        #[clap(long)]
        interval: Option<u32>,
    },

    /// Reservations stored for a date
    List {
        #[clap(long, value_parser = date_arg)]
        date: NaiveDate,
    },

    /// Delete a reservation by id
    Cancel {
        #[clap(long)]
        id: i64,
    },
}

impl Command {
    pub(crate) fn slot_params(&self) -> SlotParams {
        match self {
            Command::Slots {
                tables, interval, ..
            } => SlotParams {
                tables: *tables,
                interval_minutes: *interval,
            },
            _ => SlotParams::default(),
        }
    }
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}

fn time_arg(raw: &str) -> Result<NaiveTime, String> {
    parse_time(raw).map_err(|e| e.to_string())
}
