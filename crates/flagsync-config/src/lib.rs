// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for flagsync.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - `$XDG_CONFIG_HOME/flagsync/config.toml`
//! - `./.flagsync.toml` (or the file passed with `--config`)
//! - `FLAGSYNC_*` environment variables
//! - command-line flags

pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod sources;
pub mod validation;

use std::path::PathBuf;

pub use error::{ConfigError, Result};
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::{LogFormat, LogLevel, LoggingConfig, SyncConfig};
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Loads configuration from every source. `config_file` replaces the
/// workspace file.
pub fn load_config(config_file: Option<PathBuf>, cli: CliOverrides) -> Result<SyncConfig> {
	let mut paths = paths::resolve_paths()?;
	if let Some(file) = config_file {
		paths = paths.with_workspace_file(file);
	}

	let mut registry = ConfigRegistry::new();
	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::user(&paths)));
	registry.register(Box::new(sources::FileSource::workspace(&paths)));
	registry.register(Box::new(sources::EnvSource::new()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load()
}
