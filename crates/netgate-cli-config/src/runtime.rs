// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::layer::*;
use crate::paths::PathsConfig;

pub const DEFAULT_MAX_RETRIES: u32 = 25;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 2] = [502, 500];
pub const DEFAULT_PROBE_URL: &str = "http://www.google.com";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// The final, validated configuration for Netgate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetgateConfig {
	pub retry: RetryConfig,
	pub connectivity: ConnectivityConfig,
	pub logging: LoggingConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
	pub max_retries: u32,
	#[serde(rename = "retry_delay_ms", with = "duration_ms")]
	pub retry_delay: Duration,
	pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: DEFAULT_MAX_RETRIES,
			retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
			retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
	pub probe_url: String,
	#[serde(rename = "probe_timeout_ms", with = "duration_ms")]
	pub probe_timeout: Duration,
	/// `None` disables periodic re-probing.
	#[serde(rename = "poll_interval_secs", with = "optional_duration_secs")]
	pub poll_interval: Option<Duration>,
}

impl Default for ConnectivityConfig {
	fn default() -> Self {
		Self {
			probe_url: DEFAULT_PROBE_URL.to_string(),
			probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
			poll_interval: Some(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
		}
	}
}

mod duration_ms {
	use serde::{self, Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let ms = u64::deserialize(deserializer)?;
		Ok(Duration::from_millis(ms))
	}
}

// Serialized as whole seconds; 0 means disabled.
mod optional_duration_secs {
	use serde::{self, Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.map(|d| d.as_secs()).unwrap_or(0))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = u64::deserialize(deserializer)?;
		Ok((secs > 0).then(|| Duration::from_secs(secs)))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: LogLevel::Info,
			format: LogFormat::Pretty,
		}
	}
}

impl NetgateConfig {
	/// Build runtime config from a merged layer and paths.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Self {
		Self {
			retry: build_retry_config(layer.retry),
			connectivity: build_connectivity_config(layer.connectivity),
			logging: build_logging_config(layer.logging),
			paths,
		}
	}
}

fn build_retry_config(layer: Option<RetryLayer>) -> RetryConfig {
	let layer = layer.unwrap_or_default();
	RetryConfig {
		max_retries: layer.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
		retry_delay: Duration::from_millis(layer.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)),
		retryable_statuses: layer
			.retryable_statuses
			.unwrap_or_else(|| DEFAULT_RETRYABLE_STATUSES.to_vec()),
	}
}

fn build_connectivity_config(layer: Option<ConnectivityLayer>) -> ConnectivityConfig {
	let layer = layer.unwrap_or_default();
	let poll_secs = layer
		.poll_interval_secs
		.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
	ConnectivityConfig {
		probe_url: layer
			.probe_url
			.unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
		probe_timeout: Duration::from_millis(
			layer.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS),
		),
		poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
	}
}

fn build_logging_config(layer: Option<LoggingLayer>) -> LoggingConfig {
	let layer = layer.unwrap_or_default();
	LoggingConfig {
		level: parse_log_level(layer.level.as_deref()),
		format: parse_log_format(layer.format.as_deref()),
	}
}

fn parse_log_level(s: Option<&str>) -> LogLevel {
	match s {
		Some("error") => LogLevel::Error,
		Some("warn") => LogLevel::Warn,
		Some("info") => LogLevel::Info,
		Some("debug") => LogLevel::Debug,
		Some("trace") => LogLevel::Trace,
		_ => LogLevel::Info,
	}
}

fn parse_log_format(s: Option<&str>) -> LogFormat {
	match s {
		Some("json") => LogFormat::Json,
		Some("compact") => LogFormat::Compact,
		Some("pretty") => LogFormat::Pretty,
		_ => LogFormat::Pretty,
	}
}
