// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Holds configuration sources and merges them by precedence.

use tracing::{debug, info};

use crate::error::Result;
use crate::layer::ConfigLayer;
use crate::runtime::SyncConfig;
use crate::sources::ConfigSource;
use crate::validation::validate_config;

#[derive(Default)]
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		debug!(
			source = source.name(),
			precedence = ?source.precedence(),
			"registering config source"
		);
		self.sources.push(source);
	}

	/// Merges every source, lowest precedence first, then builds and
	/// validates the result. Any source that fails to load fails the whole
	/// load; missing files are not failures.
	pub fn load(&self) -> Result<SyncConfig> {
		let mut sorted: Vec<_> = self.sources.iter().collect();
		sorted.sort_by_key(|s| s.precedence());

		let mut merged = ConfigLayer::default();
		for source in sorted {
			let layer = source.load()?;
			debug!(source = source.name(), "merging config layer");
			merged.merge(layer);
		}

		let config = SyncConfig::from_layer(merged)?;
		validate_config(&config)?;

		info!(
			manifest = %config.manifest_path.display(),
			plugin = config.plugin.as_deref().unwrap_or("-"),
			log_level = %config.logging.level,
			"configuration loaded"
		);
		Ok(config)
	}

	pub fn source_count(&self) -> usize {
		self.sources.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ConfigError;
	use crate::sources::{
		CliOverrides, CliSource, DefaultsSource, EnvSource, FileSource, Precedence,
	};
	use std::path::PathBuf;
	use std::time::Duration;

	struct FixedSource {
		precedence: Precedence,
		plugin: &'static str,
	}

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<ConfigLayer> {
			let mut layer = ConfigLayer::default();
			layer.sync_mut().plugin = Some(self.plugin.to_string());
			Ok(layer)
		}
	}

	#[test]
	fn sources_merge_in_precedence_order() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(FixedSource {
			precedence: Precedence::Cli,
			plugin: "from-cli",
		}));
		registry.register(Box::new(FixedSource {
			precedence: Precedence::UserFile,
			plugin: "from-user",
		}));

		assert_eq!(registry.source_count(), 2);
		assert_eq!(registry.load().unwrap().plugin.as_deref(), Some("from-cli"));
	}

	#[test]
	fn full_stack_layers_files_env_and_cli() {
		let dir = tempfile::tempdir().unwrap();
		let user = dir.path().join("user.toml");
		let workspace = dir.path().join("workspace.toml");
		std::fs::write(
			&user,
			r#"
manifest = "user.json"
[sync]
plugin = "default"
base_url = "https://user.example.com"
[plugins.devcycle]
project = "shop"
"#,
		)
		.unwrap();
		std::fs::write(
			&workspace,
			r#"
[sync]
base_url = "https://workspace.example.com"
timeout_secs = 12
"#,
		)
		.unwrap();

		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(FileSource::custom(user, Precedence::UserFile, "user")));
		registry.register(Box::new(FileSource::custom(
			workspace,
			Precedence::WorkspaceFile,
			"workspace",
		)));
		registry.register(Box::new(EnvSource::from_vars([("FLAGSYNC_PLUGIN", "devcycle")])));
		registry.register(Box::new(CliSource::new(CliOverrides {
			manifest: Some(PathBuf::from("cli.json")),
			..Default::default()
		})));

		let config = registry.load().unwrap();
		assert_eq!(config.manifest_path, PathBuf::from("cli.json"));
		assert_eq!(config.plugin.as_deref(), Some("devcycle"));
		assert_eq!(config.base_url, "https://workspace.example.com");
		assert_eq!(config.request_timeout, Duration::from_secs(12));
		assert!(config.plugins.contains_key("devcycle"));
	}

	#[test]
	fn zero_timeout_fails_validation() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(EnvSource::from_vars([("FLAGSYNC_TIMEOUT_SECS", "0")])));

		let err = registry.load().unwrap_err();
		assert!(matches!(
			err,
			ConfigError::InvalidValue { ref field, .. } if field == "sync.timeout_secs"
		));
	}
}
