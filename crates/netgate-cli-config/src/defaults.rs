// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default configuration file generation.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ConfigError;

/// Default configuration file template, written by `netgate config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"#
# Netgate Configuration File
# Location: ~/.config/netgate/config.toml
#
# Every value below is the built-in default. Environment variables
# (NETGATE_*) and command-line flags override this file.
#

# =============================================================================
# Retry Configuration
# =============================================================================

[retry]
# Retries after the first attempt (total sends = max_retries + 1)
max_retries = 25

# Fixed pause between attempts (in milliseconds); there is no backoff
retry_delay_ms = 1000

# Response statuses retried like transport errors
retryable_statuses = [502, 500]

# =============================================================================
# Connectivity Configuration
# =============================================================================

[connectivity]
# Endpoint fetched to decide whether the network is available
probe_url = "http://www.google.com"

# Per-probe timeout (in milliseconds)
probe_timeout_ms = 5000

# Re-probe period (in seconds, at most 86400); 0 disables polling
poll_interval_secs = 30

# =============================================================================
# Logging Configuration
# =============================================================================

[logging]
# Log level: error, warn, info, debug, trace
level = "info"

# Log format: pretty, json, compact
format = "pretty"
"#;

/// Ensure the config directory exists and create a default config file if none exists.
///
/// Returns `true` if a new config file was created, `false` if one already existed.
pub fn ensure_default_config(config_file_path: &Path) -> Result<bool, ConfigError> {
	if config_file_path.exists() {
		debug!(path = %config_file_path.display(), "config file already exists");
		return Ok(false);
	}

	if let Some(parent) = config_file_path.parent() {
		if !parent.exists() {
			debug!(path = %parent.display(), "creating config directory");
			fs::create_dir_all(parent)?;
		}
	}

	info!(path = %config_file_path.display(), "creating default config file");
	fs::write(config_file_path, DEFAULT_CONFIG_TEMPLATE)?;

	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;
	use crate::runtime::NetgateConfig;
	use tempfile::tempdir;

	#[test]
	fn test_default_config_template_matches_builtin_defaults() {
		let layer: ConfigLayer = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
		let from_template = NetgateConfig::from_layer(layer, PathsConfig::default());
		let builtin = NetgateConfig::from_layer(ConfigLayer::default(), PathsConfig::default());
		assert_eq!(from_template, builtin);
	}

	#[test]
	fn test_ensure_default_config_creates_file_and_parents() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("nested/netgate/config.toml");

		let created = ensure_default_config(&config_path).unwrap();
		assert!(created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert!(contents.contains("[retry]"));
		assert!(contents.contains("probe_url"));
	}

	#[test]
	fn test_ensure_default_config_does_not_overwrite() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("config.toml");

		fs::write(&config_path, "# existing config\n").unwrap();

		let created = ensure_default_config(&config_path).unwrap();
		assert!(!created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert_eq!(contents, "# existing config\n");
	}
}
