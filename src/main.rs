//! querygate - read-only SQL execution gateway
//!
//! Command-line entry point. The actual logic is in the library modules
//! for better testability.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use querygate::chat::{self, Intent};
use querygate::config::{ConnectionConfig, GatewayConfig, load_config};
use querygate::db::postgres::PostgresConnector;
use querygate::export::{self, Grid};
use querygate::forecast;
use querygate::gateway::{Gateway, validate};
use querygate::render;
use querygate::sql::format_sql;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "querygate", version, about = "Read-only SQL execution gateway")]
struct Cli {
    /// Path to config.toml (defaults to ~/.querygate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// postgres:// URL overriding the configured endpoint
    #[arg(long, global = true)]
    url: Option<String>,

    /// Access policy file listing visible tables
    #[arg(long, global = true)]
    access: Option<PathBuf>,

    /// Print cache statistics as JSON after the command
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a read-only query
    Query {
        sql: String,
        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Pretty-print the SQL before the results
        #[arg(long)]
        show_sql: bool,
    },
    /// Execute a query and extend it with a linear-trend forecast
    Forecast {
        sql: String,
        /// Number of future points (defaults to forecast.default_horizon)
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List tables across every configured catalog/schema
    Tables,
    /// Check whether a statement would be accepted
    Check { sql: String },
    /// Answer a generator intent given as JSON (use `-` for stdin)
    Intent { json: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn emit(grid: &impl Grid, format: OutputFormat) {
    match format {
        OutputFormat::Table => print!("{}", render::to_table(grid)),
        OutputFormat::Csv => print!("{}", export::to_csv(grid)),
        OutputFormat::Json => println!("{}", export::to_json(grid)),
    }
}

fn build_config(cli: &Cli) -> Result<GatewayConfig> {
    let mut config = match (&cli.config, &cli.url) {
        (Some(path), _) => load_config(Some(path))?,
        // A URL alone is enough; the config file is optional then
        (None, Some(url)) => match load_config(None) {
            Ok(config) => config,
            Err(querygate::ConfigError::NotFound(_)) => {
                GatewayConfig::new(ConnectionConfig::from_url(url)?, vec![])
            }
            Err(e) => return Err(e.into()),
        },
        (None, None) => load_config(None)?,
    };

    if let Some(url) = &cli.url {
        config.engine = ConnectionConfig::from_url(url)?;
        config.fill_default_target();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Command::Check { sql } = &cli.command {
        match validate(sql) {
            Ok(()) => println!("ok"),
            Err(rejection) => bail!("rejected: {}", rejection),
        }
        return Ok(());
    }

    let config = build_config(&cli)?;
    let connector = PostgresConnector::new(config.engine.clone(), config.query.page_size);
    let gateway = Gateway::new(config, connector)?;

    if let Some(path) = &cli.access {
        gateway
            .access()
            .reload_from(path)
            .with_context(|| format!("Failed to load access policy {}", path.display()))?;
    }

    match cli.command {
        Command::Query {
            sql,
            no_cache,
            format,
            show_sql,
        } => {
            if show_sql {
                eprintln!("{}\n", format_sql(&sql));
            }
            let outcome = gateway.execute(&sql, !no_cache).await?;
            emit(&outcome.result, format);
            eprintln!(
                "{} ms{}",
                outcome.execution_time.as_millis(),
                if outcome.from_cache { " (cached)" } else { "" }
            );
        }
        Command::Forecast {
            sql,
            horizon,
            format,
        } => {
            let outcome = gateway.execute(&sql, true).await?;
            let horizon = horizon.unwrap_or(gateway.config().forecast.default_horizon);
            match forecast::forecast_linear(&outcome.result, horizon)
                .and_then(|points| forecast::merge(&outcome.result, &points))
            {
                Ok(augmented) => emit(&augmented, format),
                Err(e) => {
                    emit(&outcome.result, format);
                    eprintln!("forecast unavailable: {}", e);
                }
            }
        }
        Command::Tables => {
            for table in gateway.describe_tables().await {
                let columns: Vec<String> = table
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.data_type))
                    .collect();
                println!("{} ({})", table.qualified_name(), columns.join(", "));
            }
        }
        Command::Intent { json } => {
            let json = if json == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                json
            };
            let intent = Intent::from_json(&json).context("Invalid intent JSON")?;
            let reply = chat::respond(&gateway, intent).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Check { .. } => unreachable!("handled before connecting"),
    }

    if cli.stats {
        eprintln!("{}", serde_json::to_string_pretty(&gateway.cache_stats())?);
    }

    Ok(())
}
