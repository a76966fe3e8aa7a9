use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode};
use kma_core::{Config, ForecastQuery, KmaClient, ObservationQuery, Table};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "kma", version, about = "KMA weather observations and forecasts as tables")]
pub struct Cli {
    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the data.go.kr service key.
    Configure,

    /// Hourly ASOS observations for a station.
    Observations {
        /// ASOS station number, e.g. 108 for Seoul.
        #[arg(long)]
        station: String,

        /// First hour, YYYYMMDDHH.
        #[arg(long)]
        start: String,

        /// Last hour, YYYYMMDDHH.
        #[arg(long)]
        end: String,

        /// Page size; the provider default of 24 covers one day.
        #[arg(long)]
        rows: Option<u32>,
    },

    /// Short-term forecast for a grid cell, one row per forecast time.
    Forecast {
        /// Grid x coordinate.
        #[arg(long)]
        nx: String,

        /// Grid y coordinate.
        #[arg(long)]
        ny: String,

        /// Issue time, YYYYMMDDHHMM; if absent, the latest published run.
        #[arg(long)]
        base: Option<String>,

        #[arg(long)]
        rows: Option<u32>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Observations {
                station,
                start,
                end,
                rows,
            } => {
                let mut query =
                    ObservationQuery::between(station, parse_hour(&start)?, parse_hour(&end)?);
                if let Some(rows) = rows {
                    query = query.with_rows(rows);
                }

                let table = client()?.fetch_observations(&query).await?;
                print_table(&table, self.format)
            }
            Command::Forecast { nx, ny, base, rows } => {
                let mut query = match base {
                    Some(base) => ForecastQuery::at(parse_minute(&base)?, nx, ny),
                    None => ForecastQuery::latest(now_kst(), nx, ny),
                };
                if let Some(rows) = rows {
                    query = query.with_rows(rows);
                }
                info!(base = %query.dt_base(), "requesting forecast");

                let table = client()?.fetch_forecast(&query).await?;
                print_table(&table, self.format)
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("data.go.kr service key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Use the decoded (not URL-encoded) key")
        .prompt()
        .context("Failed to read service key")?;

    config.set_service_key(key);
    config.service_key()?;
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn client() -> Result<KmaClient> {
    let config = Config::load()?;
    let key = config.service_key()?;
    Ok(KmaClient::with_config(key, &config.client_config())?)
}

fn print_table(table: &Table, format: Format) -> Result<()> {
    match format {
        Format::Table => print!("{table}"),
        Format::Csv => table
            .write_csv(std::io::stdout().lock())
            .context("Failed to write CSV")?,
        Format::Json => println!("{}", serde_json::to_string_pretty(table)?),
    }
    Ok(())
}

/// KMA works in Korea Standard Time regardless of where the CLI runs.
fn now_kst() -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::hours(9)
}

fn parse_hour(s: &str) -> Result<NaiveDateTime> {
    if s.len() != 10 {
        bail!("Expected YYYYMMDDHH, got '{s}'");
    }
    NaiveDateTime::parse_from_str(&format!("{s}00"), "%Y%m%d%H%M")
        .with_context(|| format!("Invalid date/hour '{s}', expected YYYYMMDDHH"))
}

fn parse_minute(s: &str) -> Result<NaiveDateTime> {
    if s.len() != 12 {
        bail!("Expected YYYYMMDDHHMM, got '{s}'");
    }
    NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M")
        .with_context(|| format!("Invalid date/time '{s}', expected YYYYMMDDHHMM"))
}
