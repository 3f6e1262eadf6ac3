//! hostsched - place a share on a storage host.
//!
//! Reads a host snapshot and a request, runs the configured filter chain,
//! and reports which hosts passed and which one was selected.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hostsched_filters::{FilterEnv, FilterHandler, HeartbeatLiveness, STANDARD_NAMESPACE};
use hostsched_scheduler::{config::Config, driver::FilterScheduler, input};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod output;

use output::OutputFormat;

/// Capacity-aware storage host scheduler.
#[derive(Debug, Parser)]
#[command(name = "hostsched")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered filters.
    Filters,

    /// Run the filter chain over a host snapshot and select a host.
    Schedule {
        /// JSON file with an array of host states.
        #[arg(long, env = "HOSTSCHED_HOSTS_FILE")]
        hosts: PathBuf,

        /// JSON file with the request's filter properties.
        #[arg(long, env = "HOSTSCHED_REQUEST_FILE")]
        request: PathBuf,
    },
}

fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Prefer RUST_LOG, fall back to HOSTSCHED_LOG_LEVEL. Logs go to stderr so
    // stdout stays machine readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, &config) {
        output::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let format: OutputFormat = cli.format.parse()?;
    let handler = FilterHandler::with_standard_filters();

    match cli.command {
        Commands::Filters => {
            let descriptors = handler.get_all_classes(STANDARD_NAMESPACE);
            output::print_filters(STANDARD_NAMESPACE, &descriptors, format);
        }
        Commands::Schedule { hosts, request } => {
            let hosts = input::load_hosts(&hosts)?;
            let mut props = input::load_request(&request)?;
            info!(candidates = hosts.len(), size_gb = props.size, "Loaded scheduling input");

            let env = FilterEnv::new(Arc::new(HeartbeatLiveness::new(config.service_down_time)));
            let scheduler = FilterScheduler::new(&handler, &config.scheduler_options(), &env)?;

            let verdicts = scheduler.evaluate(&hosts, &props)?;
            match scheduler.schedule(&hosts, &mut props) {
                Ok(selection) => output::print_schedule(&verdicts, Some(&selection), format),
                Err(e) => {
                    output::print_schedule(&verdicts, None, format);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
