// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Netgate CLI - send HTTP requests that wait out network outages.
//!
//! Requests are held while the network is unavailable and retried on
//! transport failures and transient server errors with a fixed delay.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use netgate_cli_config::{
	load_config_with_cli,
	runtime::{LogFormat, LogLevel, LoggingConfig},
	sources::CliOverrides,
};

mod fetch;
mod monitor;

/// Netgate - connectivity-aware HTTP client
#[derive(Parser, Debug)]
#[command(name = "netgate", version, about, long_about = None)]
struct Args {
	/// Config file layered above the user config
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log level (error, warn, info, debug, trace)
	#[arg(long, global = true)]
	log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Send one request through the connectivity gate and retry loop
	Fetch(fetch::FetchArgs),

	/// Run a single reachability probe
	Probe {
		/// Endpoint to probe instead of the configured one
		#[arg(long)]
		url: Option<String>,
	},

	/// Print network availability transitions until interrupted
	Watch {
		/// Re-probe period in seconds
		#[arg(long, value_name = "SECS")]
		interval: Option<u64>,
	},

	/// Inspect or create the configuration file
	Config {
		#[command(subcommand)]
		command: ConfigCommand,
	},
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
	/// Print the effective configuration
	Show,
	/// Print the user config file location
	Path,
	/// Write the default config file if none exists
	Init,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		let mut overrides = CliOverrides {
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then(|| "json".to_string()),
			config_file: args.config.clone(),
			..Default::default()
		};

		match &args.command {
			Command::Fetch(fetch) => {
				overrides.max_retries = fetch.max_retries;
				overrides.retry_delay_ms = fetch.retry_delay_ms;
				overrides.probe_url = fetch.probe_url.clone();
			}
			Command::Probe { url } => overrides.probe_url = url.clone(),
			_ => {}
		}

		overrides
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

fn default_directives(level: tracing::Level) -> String {
	format!("netgate={level},netgate_common_http={level},netgate_cli_config={level}")
}

/// Subscriber active only while configuration loads, before the configured
/// level and format are known. Surfaces warnings about ignored or suspicious
/// settings.
fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
	W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
	tracing_subscriber::fmt()
		.compact()
		.with_ansi(false)
		.with_writer(writer)
		.with_env_filter(EnvFilter::new(default_directives(tracing::Level::WARN)))
		.finish()
}

// Logs go to stderr; stdout carries response bodies.
fn init_tracing(logging: &LoggingConfig) {
	let level = log_level_to_tracing(logging.level);
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let overrides = CliOverrides::from(&args);
	let config = tracing::subscriber::with_default(bootstrap_subscriber(std::io::stderr), || load_config_with_cli(overrides))
		.context("failed to load configuration")?;

	init_tracing(&config.logging);
	debug!(command = ?args.command, "starting netgate");

	match args.command {
		Command::Fetch(fetch_args) => fetch::run(&config, fetch_args).await,
		Command::Probe { .. } => monitor::run_probe(&config).await,
		Command::Watch { interval } => monitor::run_watch(&config, interval).await,
		Command::Config { command } => run_config(&config, command),
	}
}

fn run_config(config: &netgate_cli_config::NetgateConfig, command: ConfigCommand) -> Result<()> {
	match command {
		ConfigCommand::Show => {
			let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
			print!("{rendered}");
		}
		ConfigCommand::Path => {
			println!("{}", config.paths.user_config_file.display());
		}
		ConfigCommand::Init => {
			let path = &config.paths.user_config_file;
			if netgate_cli_config::ensure_default_config(path).context("failed to write default config")? {
				println!("created {}", path.display());
			} else {
				println!("{} already exists", path.display());
			}
		}
	}
	Ok(())
}
