// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args as ClapArgs;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use tracing::{info, warn};

use netgate_cli_config::runtime::{ConnectivityConfig, RetryConfig};
use netgate_cli_config::NetgateConfig;
use netgate_common_http::{gated_client, new_client, CancellationToken, GatedClientOptions, RetryPolicy, SendError};

#[derive(ClapArgs, Debug)]
pub struct FetchArgs {
	/// Target URL
	pub url: String,

	/// HTTP method
	#[arg(short = 'X', long, default_value = "GET")]
	pub method: String,

	/// Request header, repeatable
	#[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
	pub headers: Vec<String>,

	/// Request body
	#[arg(short = 'd', long)]
	pub data: Option<String>,

	/// Retries after the first attempt
	#[arg(long)]
	pub max_retries: Option<u32>,

	/// Fixed delay between attempts in milliseconds
	#[arg(long)]
	pub retry_delay_ms: Option<u64>,

	/// Reachability endpoint
	#[arg(long)]
	pub probe_url: Option<String>,

	/// Give up after this many seconds, including time spent offline
	#[arg(long, value_name = "SECS")]
	pub timeout: Option<u64>,
}

pub fn retry_policy(config: &RetryConfig) -> Result<RetryPolicy> {
	let statuses = config
		.retryable_statuses
		.iter()
		.map(|code| StatusCode::from_u16(*code).with_context(|| format!("invalid retryable status {code}")))
		.collect::<Result<Vec<_>>>()?;

	Ok(RetryPolicy::default()
		.with_max_retries(config.max_retries)
		.with_retry_delay(config.retry_delay)
		.with_retryable_statuses(statuses))
}

pub fn gated_options(config: &NetgateConfig) -> Result<GatedClientOptions> {
	let ConnectivityConfig {
		probe_url,
		probe_timeout,
		poll_interval,
	} = &config.connectivity;

	Ok(GatedClientOptions {
		policy: retry_policy(&config.retry)?,
		probe_url: Url::parse(probe_url).with_context(|| format!("invalid probe url {probe_url}"))?,
		probe_timeout: *probe_timeout,
		poll_interval: *poll_interval,
	})
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
	let (name, value) = raw
		.split_once(':')
		.ok_or_else(|| anyhow!("header {raw:?} is not in 'Name: value' form"))?;
	let name = HeaderName::from_bytes(name.trim().as_bytes()).with_context(|| format!("invalid header name in {raw:?}"))?;
	let value = HeaderValue::from_str(value.trim()).with_context(|| format!("invalid header value in {raw:?}"))?;
	Ok((name, value))
}

/// Cancels `cancel` on Ctrl-C or once `timeout` elapses.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
	let on_signal = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("interrupted, cancelling request");
			on_signal.cancel();
		}
	});

	if let Some(timeout) = timeout {
		let on_timeout = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(timeout).await;
			warn!(timeout_secs = timeout.as_secs(), "timed out, cancelling request");
			on_timeout.cancel();
		});
	}
}

pub async fn run(config: &NetgateConfig, args: FetchArgs) -> Result<()> {
	let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
		.with_context(|| format!("invalid method {}", args.method))?;
	let url = Url::parse(&args.url).with_context(|| format!("invalid url {}", args.url))?;

	let client = new_client().context("failed to build HTTP client")?;
	let mut builder = client.request(method, url);
	for raw in &args.headers {
		let (name, value) = parse_header(raw)?;
		builder = builder.header(name, value);
	}
	if let Some(data) = args.data {
		builder = builder.body(data);
	}
	let request = builder.build().context("failed to build request")?;

	let gated = gated_client(client, gated_options(config)?).await;

	let cancel = CancellationToken::new();
	spawn_cancel_triggers(&cancel, args.timeout.map(Duration::from_secs));

	let response = match gated.send(request, &cancel).await {
		Ok(response) => response,
		Err(SendError::Cancelled) => bail!("request cancelled"),
		Err(err) => return Err(err).context("request failed"),
	};

	let status = response.status();
	info!(status = status.as_u16(), "response received");
	eprintln!("{status}");

	let body = response.bytes().await.context("failed to read response body")?;
	let mut stdout = std::io::stdout().lock();
	stdout.write_all(&body)?;
	stdout.flush()?;
	Ok(())
}
