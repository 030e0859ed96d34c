//! Fair Value - four-method intrinsic value calculator.
//!
//! `fair-value evaluate <TICKER>` prints a report for one company;
//! `fair-value serve` exposes the same evaluation over HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fair_value::routes::FairValueQuery;
use fair_value::valuation::LynchPeriod;
use fair_value::{report, FairValueService, FairValueState};
use fair_value_common::config::{Config, ConfigSource};
use fair_value_common::logging::init_from_config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fair-value")]
#[command(version)]
#[command(about = "Estimate a stock's fair value with DCF, Peter Lynch, relative and PEG methods", long_about = None)]
struct Cli {
    /// Config file (default: ~/.fairvalue/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one ticker and print the report
    Evaluate {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Discount rate (%), defaults to the CAPM estimate
        #[arg(long)]
        wacc: Option<f64>,

        /// Terminal growth rate (%)
        #[arg(long)]
        terminal_growth: Option<f64>,

        /// EPS growth basis for the Peter Lynch method (annual, quarterly)
        #[arg(long)]
        lynch_period: Option<LynchPeriod>,

        /// Sector average P/E
        #[arg(long)]
        sector_pe: Option<f64>,

        /// Forward growth estimate (%) for the PEG method
        #[arg(long)]
        growth: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP service
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = ConfigSource::resolve(cli.config.as_deref());
    let config = Config::load_and_validate(&source)?;
    init_from_config(&config.observability);
    source.log();

    match cli.command {
        Commands::Evaluate {
            ticker,
            wacc,
            terminal_growth,
            lynch_period,
            sector_pe,
            growth,
            json,
        } => {
            let query = FairValueQuery {
                wacc_percent: wacc,
                terminal_growth_percent: terminal_growth,
                lynch_period,
                sector_pe,
                forward_growth_percent: growth,
            };

            let state = FairValueState::new(config);
            let (facts, report) = state
                .evaluate_ticker(&ticker, &query)
                .await
                .with_context(|| format!("Failed to evaluate {}", ticker))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report::render_report(&report.ticker, &facts, &report));
            }
            Ok(())
        }
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Fair Value v{}", env!("CARGO_PKG_VERSION"));
            FairValueService::new(config).start().await
        }
    }
}
