// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Netgate CLI.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - Layered configuration from multiple sources
//! - TOML configuration file parsing
//! - Environment variable overrides
//! - Configuration validation

pub mod defaults;
pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod sources;
pub mod validation;

pub use defaults::{ensure_default_config, DEFAULT_CONFIG_TEMPLATE};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::NetgateConfig;
pub use sources::{ConfigSource, Precedence};

/// Load configuration from all sources with default precedence.
pub fn load_config() -> Result<NetgateConfig, ConfigError> {
	load_config_with_cli(sources::CliOverrides::default())
}

/// Load configuration with CLI overrides.
///
/// `cli.config_file`, when set, is layered above the user file and must exist.
pub fn load_config_with_cli(cli: sources::CliOverrides) -> Result<NetgateConfig, ConfigError> {
	let paths = paths::resolve_xdg_paths()?;

	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::system()));
	registry.register(Box::new(sources::FileSource::user(&paths)));
	if let Some(ref file) = cli.config_file {
		registry.register(Box::new(sources::FileSource::explicit(file.clone())));
	}
	registry.register(Box::new(sources::EnvSource::new()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load(paths)
}
