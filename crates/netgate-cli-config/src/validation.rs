// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use tracing::warn;
use url::Url;

use crate::runtime::NetgateConfig;
use crate::ConfigError;

/// Upper bound for `connectivity.poll_interval_secs` (one day).
pub const MAX_POLL_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Validate the configuration.
///
/// Returns Ok(()) if valid, or ConfigError::InvalidValue naming the field.
pub fn validate_config(config: &NetgateConfig) -> Result<(), ConfigError> {
	validate_retry(config)?;
	validate_connectivity(config)?;

	Ok(())
}

fn validate_retry(config: &NetgateConfig) -> Result<(), ConfigError> {
	for status in &config.retry.retryable_statuses {
		if !(100..=599).contains(status) {
			return Err(ConfigError::invalid_value(
				"retry.retryable_statuses",
				format!("{status} is not an HTTP status code"),
			));
		}
		if *status < 400 {
			warn!(status, "retrying a non-error status; such responses will never be returned");
		}
	}

	if config.retry.max_retries == 0 {
		warn!("retry.max_retries is 0; failed requests will not be retried");
	}

	if config.retry.retry_delay.is_zero() && config.retry.max_retries > 0 {
		warn!("retry.retry_delay_ms is 0; retries will be sent back to back");
	}

	Ok(())
}

fn validate_connectivity(config: &NetgateConfig) -> Result<(), ConfigError> {
	let url = Url::parse(&config.connectivity.probe_url).map_err(|e| {
		ConfigError::invalid_value("connectivity.probe_url", e.to_string())
	})?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::invalid_value(
			"connectivity.probe_url",
			format!("unsupported scheme '{}'", url.scheme()),
		));
	}

	if config.connectivity.probe_timeout.is_zero() {
		return Err(ConfigError::invalid_value(
			"connectivity.probe_timeout_ms",
			"must be greater than 0",
		));
	}

	if let Some(period) = config.connectivity.poll_interval {
		if period.as_secs() > MAX_POLL_INTERVAL_SECS {
			return Err(ConfigError::invalid_value(
				"connectivity.poll_interval_secs",
				format!("must be at most {MAX_POLL_INTERVAL_SECS} (0 disables polling)"),
			));
		}
	}

	Ok(())
}
