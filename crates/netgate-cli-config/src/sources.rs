// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::layer::*;
use crate::paths::{PathsConfig, SYSTEM_CONFIG_FILE};
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	ExplicitFile = 40,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied when the runtime config is built
		Ok(ConfigLayer::default())
	}
}

/// File-based configuration source (TOML).
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
	required: bool,
}

impl FileSource {
	/// System config: /etc/netgate/config.toml
	pub fn system() -> Self {
		Self {
			path: PathBuf::from(SYSTEM_CONFIG_FILE),
			precedence: Precedence::SystemFile,
			name: "system-config",
			required: false,
		}
	}

	/// User config: ~/.config/netgate/config.toml
	pub fn user(paths: &PathsConfig) -> Self {
		Self {
			path: paths.user_config_file.clone(),
			precedence: Precedence::UserFile,
			name: "user-config",
			required: false,
		}
	}

	/// File named on the command line; it must exist.
	pub fn explicit(path: PathBuf) -> Self {
		Self {
			path,
			precedence: Precedence::ExplicitFile,
			name: "explicit-config",
			required: true,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}
	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			if self.required {
				return Err(ConfigError::FileNotFound(self.path.clone()));
			}
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path)?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: NETGATE_<FIELD>. Unparseable values are ignored with a warning.
pub struct EnvSource {
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Reads the process environment at load time.
	pub fn new() -> Self {
		Self { vars: None }
	}

	/// Reads a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let vars: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut layer = ConfigLayer::default();
		for (key, value) in vars {
			if !key.starts_with("NETGATE_") {
				continue;
			}

			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				// Retry
				"NETGATE_RETRY_MAX_RETRIES" => {
					if let Some(v) = parse_env(&key, &value) {
						retry(&mut layer).max_retries = Some(v);
					}
				}
				"NETGATE_RETRY_DELAY_MS" => {
					if let Some(v) = parse_env(&key, &value) {
						retry(&mut layer).retry_delay_ms = Some(v);
					}
				}
				"NETGATE_RETRY_STATUSES" => {
					let statuses: Result<Vec<u16>, _> =
						value.split(',').map(|s| s.trim().parse::<u16>()).collect();
					match statuses {
						Ok(statuses) => retry(&mut layer).retryable_statuses = Some(statuses),
						Err(e) => warn!(key = %key, error = %e, "ignoring unparseable env var"),
					}
				}

				// Connectivity
				"NETGATE_PROBE_URL" => {
					connectivity(&mut layer).probe_url = Some(value);
				}
				"NETGATE_PROBE_TIMEOUT_MS" => {
					if let Some(v) = parse_env(&key, &value) {
						connectivity(&mut layer).probe_timeout_ms = Some(v);
					}
				}
				"NETGATE_POLL_INTERVAL_SECS" => {
					if let Some(v) = parse_env(&key, &value) {
						connectivity(&mut layer).poll_interval_secs = Some(v);
					}
				}

				// Logging
				"NETGATE_LOG_LEVEL" => {
					logging(&mut layer).level = Some(value);
				}
				"NETGATE_LOG_FORMAT" => {
					logging(&mut layer).format = Some(value);
				}

				_ => {
					// Unknown NETGATE_ variable, ignore
				}
			}
		}

		Ok(layer)
	}
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Option<T>
where
	T::Err: std::fmt::Display,
{
	match value.parse() {
		Ok(v) => Some(v),
		Err(e) => {
			warn!(key = %key, error = %e, "ignoring unparseable env var");
			None
		}
	}
}

fn retry(layer: &mut ConfigLayer) -> &mut RetryLayer {
	layer.retry.get_or_insert_with(RetryLayer::default)
}

fn connectivity(layer: &mut ConfigLayer) -> &mut ConnectivityLayer {
	layer
		.connectivity
		.get_or_insert_with(ConnectivityLayer::default)
}

fn logging(layer: &mut ConfigLayer) -> &mut LoggingLayer {
	layer.logging.get_or_insert_with(LoggingLayer::default)
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub max_retries: Option<u32>,
	pub retry_delay_ms: Option<u64>,
	pub probe_url: Option<String>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
	pub config_file: Option<PathBuf>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let mut layer = ConfigLayer::default();

		if let Some(max_retries) = self.overrides.max_retries {
			retry(&mut layer).max_retries = Some(max_retries);
		}

		if let Some(delay) = self.overrides.retry_delay_ms {
			retry(&mut layer).retry_delay_ms = Some(delay);
		}

		if let Some(ref url) = self.overrides.probe_url {
			connectivity(&mut layer).probe_url = Some(url.clone());
		}

		if let Some(ref level) = self.overrides.log_level {
			logging(&mut layer).level = Some(level.clone());
		}

		if let Some(ref format) = self.overrides.log_format {
			logging(&mut layer).format = Some(format.clone());
		}

		Ok(layer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Cli > Precedence::Environment);
		assert!(Precedence::Environment > Precedence::ExplicitFile);
		assert!(Precedence::ExplicitFile > Precedence::UserFile);
		assert!(Precedence::UserFile > Precedence::SystemFile);
		assert!(Precedence::SystemFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert_eq!(layer, ConfigLayer::default());
	}

	#[test]
	fn test_file_source_missing_file_returns_empty() {
		let paths = PathsConfig {
			user_config_file: PathBuf::from("/nonexistent/config.toml"),
			..Default::default()
		};
		let source = FileSource::user(&paths);
		assert_eq!(source.load().unwrap(), ConfigLayer::default());
	}

	#[test]
	fn test_explicit_file_must_exist() {
		let source = FileSource::explicit(PathBuf::from("/nonexistent/netgate.toml"));
		assert!(matches!(source.load(), Err(ConfigError::FileNotFound(_))));
	}

	#[test]
	fn test_file_source_parses_toml() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[retry]\nmax_retries = 7\n\n[logging]\nformat = \"compact\"").unwrap();

		let source = FileSource::explicit(file.path().to_path_buf());
		let layer = source.load().unwrap();
		assert_eq!(layer.retry.unwrap().max_retries, Some(7));
		assert_eq!(layer.logging.unwrap().format.as_deref(), Some("compact"));
	}

	#[test]
	fn test_file_source_reports_malformed_toml() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[retry\nmax_retries = ").unwrap();

		let source = FileSource::explicit(file.path().to_path_buf());
		match source.load() {
			Err(ConfigError::TomlParse { path, .. }) => assert_eq!(path, file.path()),
			other => panic!("expected parse error, got {other:?}"),
		}
	}

	#[test]
	fn test_env_source_reads_known_vars() {
		let source = EnvSource::from_vars([
			("NETGATE_RETRY_MAX_RETRIES", "10"),
			("NETGATE_RETRY_DELAY_MS", " 500 "),
			("NETGATE_RETRY_STATUSES", "502, 500,504"),
			("NETGATE_PROBE_URL", "https://probe.example"),
			("NETGATE_POLL_INTERVAL_SECS", "0"),
			("NETGATE_LOG_LEVEL", "trace"),
			("PATH", "/usr/bin"),
		]);
		let layer = source.load().unwrap();

		let retry = layer.retry.unwrap();
		assert_eq!(retry.max_retries, Some(10));
		assert_eq!(retry.retry_delay_ms, Some(500));
		assert_eq!(retry.retryable_statuses, Some(vec![502, 500, 504]));

		let connectivity = layer.connectivity.unwrap();
		assert_eq!(connectivity.probe_url.as_deref(), Some("https://probe.example"));
		assert_eq!(connectivity.poll_interval_secs, Some(0));

		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("trace"));
	}

	#[test]
	fn test_env_source_ignores_garbage() {
		let source = EnvSource::from_vars([
			("NETGATE_RETRY_MAX_RETRIES", "many"),
			("NETGATE_RETRY_STATUSES", "502,bad"),
			("NETGATE_PROBE_URL", "   "),
			("NETGATE_UNKNOWN", "1"),
		]);
		assert_eq!(source.load().unwrap(), ConfigLayer::default());
	}

	#[test]
	fn test_cli_source_maps_overrides() {
		let source = CliSource::new(CliOverrides {
			max_retries: Some(2),
			log_format: Some("json".to_string()),
			..Default::default()
		});
		let layer = source.load().unwrap();
		assert_eq!(layer.retry.unwrap().max_retries, Some(2));
		assert_eq!(layer.logging.unwrap().format.as_deref(), Some("json"));
		assert!(layer.connectivity.is_none());
	}
}
