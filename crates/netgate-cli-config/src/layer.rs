// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use serde::Deserialize;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub retry: Option<RetryLayer>,
	#[serde(default)]
	pub connectivity: Option<ConnectivityLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RetryLayer {
	#[serde(default)]
	pub max_retries: Option<u32>,
	#[serde(default)]
	pub retry_delay_ms: Option<u64>,
	#[serde(default)]
	pub retryable_statuses: Option<Vec<u16>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectivityLayer {
	#[serde(default)]
	pub probe_url: Option<String>,
	#[serde(default)]
	pub probe_timeout_ms: Option<u64>,
	/// 0 disables periodic re-probing.
	#[serde(default)]
	pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merge another layer on top of this one; `other` wins field by field.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.retry, other.retry, RetryLayer::merge);
		merge_option(&mut self.connectivity, other.connectivity, ConnectivityLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

impl RetryLayer {
	fn merge(&mut self, other: RetryLayer) {
		if other.max_retries.is_some() {
			self.max_retries = other.max_retries;
		}
		if other.retry_delay_ms.is_some() {
			self.retry_delay_ms = other.retry_delay_ms;
		}
		if other.retryable_statuses.is_some() {
			self.retryable_statuses = other.retryable_statuses;
		}
	}
}

impl ConnectivityLayer {
	fn merge(&mut self, other: ConnectivityLayer) {
		if other.probe_url.is_some() {
			self.probe_url = other.probe_url;
		}
		if other.probe_timeout_ms.is_some() {
			self.probe_timeout_ms = other.probe_timeout_ms;
		}
		if other.poll_interval_secs.is_some() {
			self.poll_interval_secs = other.poll_interval_secs;
		}
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}
}
