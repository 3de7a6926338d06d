//! fxrates - Currency conversion with cached exchange rates
//!
//! Keeps a local snapshot of exchange rates for a few anchor currencies,
//! refreshes it at most once per freshness window, and answers conversion
//! queries from it. Also ships an interactive HTTP request tester.

use std::error::Error;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use fxrates::cli::{Cli, Command, RatesConfig};
use fxrates::converter::{
    convert, list_anchors, list_currencies, normalize_code, unavailable_anchors, validate_amount,
};
use fxrates::data::ExchangeRateClient;
use fxrates::probe::ProbeClient;
use fxrates::refresh::{load_or_refresh, LoadedRates, RatesOrigin};
use fxrates::resolver::{exchange_rate, rates_relative_to};
use fxrates::ui::{self, format::format_amount};

/// Installs the stderr log subscriber; `RUST_LOG` overrides `-v`
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fxrates={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Loads rates for the session, refreshing the snapshot when it is stale
async fn load_rates(config: &RatesConfig, force: bool) -> Result<LoadedRates, Box<dyn Error>> {
    let client =
        ExchangeRateClient::with_base_url(config.api_url.clone()).with_timeout(config.timeout);
    let loaded = load_or_refresh(&config.store(), &client, &config.anchors, force).await?;
    Ok(loaded)
}

fn describe_origin(loaded: &LoadedRates) -> String {
    match loaded.origin {
        RatesOrigin::Cache => "Using cached rates".to_string(),
        RatesOrigin::Fresh => "Fetched fresh rates".to_string(),
        RatesOrigin::StaleCache => "Refresh failed; using outdated cached rates".to_string(),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = RatesConfig::from_cli(&cli)?;
    let command = cli.command.unwrap_or(Command::Menu);

    match command {
        Command::Probe => {
            let mut console = ui::stdio();
            ui::run_probe_menu(&mut console, &ProbeClient::new()).await?;
        }
        Command::Convert { amount, from, to } => {
            let amount = validate_amount(amount)?;
            let from = normalize_code(&from)?;
            let to = normalize_code(&to)?;
            let loaded = load_rates(&config, false).await?;
            let result = convert(&loaded.table, amount, &from, &to)?;
            println!(
                "{} {from} = {} {to}",
                format_amount(amount),
                format_amount(result)
            );
        }
        Command::Rate { from, to } => {
            let from = normalize_code(&from)?;
            let to = normalize_code(&to)?;
            let loaded = load_rates(&config, false).await?;
            let rate = exchange_rate(&loaded.table, &from, &to)?;
            println!("1 {from} = {rate:.6} {to}");
        }
        Command::List => {
            let loaded = load_rates(&config, false).await?;
            let currencies = list_currencies(&loaded.table);
            println!("Anchors: {}", list_anchors(&loaded.table).join(", "));
            let missing = unavailable_anchors(&loaded.table);
            if !missing.is_empty() {
                println!("Unavailable anchors: {}", missing.join(", "));
            }
            println!("Currencies ({}):", currencies.len());
            let mut console = ui::stdio();
            ui::render_currency_list(&mut console, &currencies)?;
        }
        Command::Refresh => {
            let loaded = load_rates(&config, true).await?;
            println!("{}", describe_origin(&loaded));
            for (anchor, set) in loaded.table.entries() {
                match set {
                    Some(set) => println!("  {anchor}: {} rates", set.rates.len()),
                    None => println!("  {anchor}: {}", "unavailable".red()),
                }
            }
            if loaded.origin == RatesOrigin::Fresh && loaded.table.has_rates() {
                println!("Saved to {}", config.cache_path.display());
            }
        }
        Command::Rates { base } => {
            let loaded = load_rates(&config, false).await?;
            let mut console = ui::stdio();
            match base {
                Some(base) => {
                    let base = normalize_code(&base)?;
                    let rates = rates_relative_to(&loaded.table, &base)?;
                    ui::render_rates(&mut console, &base, &rates)?;
                }
                None => ui::run_rates_prompt(&mut console, &loaded.table)?,
            }
        }
        Command::Menu => {
            let loaded = load_rates(&config, false).await?;
            println!("{}", describe_origin(&loaded).cyan());
            let mut console = ui::stdio();
            ui::run_converter_menu(&mut console, &loaded.table)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
