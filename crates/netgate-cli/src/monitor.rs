// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `probe` and `watch` commands.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use tracing::{debug, info};

use netgate_cli_config::validation::MAX_POLL_INTERVAL_SECS;
use netgate_cli_config::NetgateConfig;
use netgate_common_http::{new_client, ConnectivityMonitor, HttpProbe, IntervalStatusSource, ReachabilityProbe};

fn availability_label(available: bool) -> &'static str {
	if available {
		"available"
	} else {
		"unavailable"
	}
}

fn configured_probe(config: &NetgateConfig) -> Result<HttpProbe> {
	let connectivity = &config.connectivity;
	let url = Url::parse(&connectivity.probe_url)
		.with_context(|| format!("invalid probe url {}", connectivity.probe_url))?;
	let client = new_client().context("failed to build HTTP client")?;
	Ok(HttpProbe::new(client, url).with_timeout(connectivity.probe_timeout))
}

pub async fn run_probe(config: &NetgateConfig) -> Result<()> {
	let probe = configured_probe(config)?;
	debug!(url = %probe.url(), "probing");
	let available = probe.probe().await;
	println!("{}", availability_label(available));
	Ok(())
}

pub async fn run_watch(config: &NetgateConfig, interval_secs: Option<u64>) -> Result<()> {
	let period = interval_secs
		.map(Duration::from_secs)
		.or(config.connectivity.poll_interval)
		.filter(|period| !period.is_zero())
		.context("watch needs a non-zero poll interval")?;
	if period.as_secs() > MAX_POLL_INTERVAL_SECS {
		bail!("poll interval must be at most {MAX_POLL_INTERVAL_SECS} seconds");
	}

	let probe = configured_probe(config)?;
	info!(url = %probe.url(), period_secs = period.as_secs(), "watching connectivity");

	let monitor = ConnectivityMonitor::with_status_source(probe, IntervalStatusSource::new(period)).await;
	let mut availability = monitor.subscribe();
	println!("{}", availability_label(*availability.borrow_and_update()));

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				debug!("interrupted");
				return Ok(());
			}
			changed = availability.changed() => {
				changed.context("connectivity monitor stopped")?;
				println!("{}", availability_label(*availability.borrow_and_update()));
			}
		}
	}
}
