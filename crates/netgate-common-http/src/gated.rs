// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring of probe, status source, monitor and retrying sender around a
//! reqwest client.

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::debug;

use crate::connectivity::{ConnectivityMonitor, HttpProbe, IntervalStatusSource, DEFAULT_PROBE_TIMEOUT};
use crate::retry::{RetryPolicy, RetryingSender};

/// A reqwest client behind the connectivity gate and retry loop.
pub type GatedClient = RetryingSender<Client>;

#[derive(Debug, Clone)]
pub struct GatedClientOptions {
	pub policy: RetryPolicy,
	pub probe_url: Url,
	pub probe_timeout: Duration,
	/// Re-probe period when no platform notifications are wired. `None`
	/// leaves the flag at its initial probe until refreshed explicitly.
	pub poll_interval: Option<Duration>,
}

impl GatedClientOptions {
	pub fn new(probe_url: Url) -> Self {
		Self {
			policy: RetryPolicy::default(),
			probe_url,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
			poll_interval: Some(Duration::from_secs(30)),
		}
	}
}

/// Builds a [`GatedClient`] that probes `options.probe_url` with the same
/// underlying client.
pub async fn gated_client(client: Client, options: GatedClientOptions) -> GatedClient {
	let probe = HttpProbe::new(client.clone(), options.probe_url).with_timeout(options.probe_timeout);

	let monitor = match options.poll_interval {
		Some(period) if !period.is_zero() => {
			debug!(period_secs = period.as_secs(), "polling connectivity");
			ConnectivityMonitor::with_status_source(probe, IntervalStatusSource::new(period)).await
		}
		_ => ConnectivityMonitor::new(probe).await,
	};

	RetryingSender::new(client, monitor, options.policy)
}
