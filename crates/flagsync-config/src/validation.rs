// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::runtime::SyncConfig;

pub fn validate_config(config: &SyncConfig) -> Result<()> {
	if config.manifest_path.as_os_str().is_empty() {
		return Err(ConfigError::invalid_value(
			"manifest",
			"manifest path cannot be empty",
		));
	}

	if config.request_timeout == Duration::ZERO {
		return Err(ConfigError::invalid_value(
			"sync.timeout_secs",
			"timeout must be greater than zero",
		));
	}

	if let Some(plugin) = &config.plugin {
		if plugin == "default" && config.base_url.is_empty() {
			// The env or CLI may still supply it before the command runs.
			warn!("default plugin selected without sync.base_url");
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;

	fn base() -> SyncConfig {
		SyncConfig::from_layer(ConfigLayer::default()).unwrap()
	}

	#[test]
	fn defaults_are_valid() {
		validate_config(&base()).unwrap();
	}

	#[test]
	fn rejects_empty_manifest_path() {
		let mut config = base();
		config.manifest_path = Default::default();
		let err = validate_config(&config).unwrap_err();
		assert_eq!(
			err.to_string(),
			"invalid value for manifest: manifest path cannot be empty"
		);
	}

	#[test]
	fn rejects_zero_timeout() {
		let mut config = base();
		config.request_timeout = Duration::ZERO;
		assert!(validate_config(&config).is_err());
	}
}
