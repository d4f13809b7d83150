// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, files, environment, CLI.

use std::path::PathBuf;

use flagsync_core::SecretString;
use tracing::{debug, trace};

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;

pub const DEFAULT_MANIFEST: &str = "flags.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "pretty";

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	UserFile = 30,
	WorkspaceFile = 40,
	Environment = 50,
	Cli = 60,
}

pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	fn precedence(&self) -> Precedence;

	fn load(&self) -> Result<ConfigLayer>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer> {
		let mut layer = ConfigLayer {
			manifest: Some(PathBuf::from(DEFAULT_MANIFEST)),
			..Default::default()
		};
		layer.sync_mut().timeout_secs = Some(DEFAULT_TIMEOUT_SECS);
		let logging = layer.logging_mut();
		logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
		logging.format = Some(DEFAULT_LOG_FORMAT.to_string());
		Ok(layer)
	}
}

/// TOML file source. A missing file contributes an empty layer.
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
}

impl FileSource {
	pub fn user(paths: &PathsConfig) -> Self {
		Self::custom(
			paths.user_config_file.clone(),
			Precedence::UserFile,
			"user-config",
		)
	}

	pub fn workspace(paths: &PathsConfig) -> Self {
		Self::custom(
			paths.workspace_config_file.clone(),
			Precedence::WorkspaceFile,
			"workspace-config",
		)
	}

	pub fn custom(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
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

	fn load(&self) -> Result<ConfigLayer> {
		if !self.path.exists() {
			debug!(
				path = %self.path.display(),
				source = self.name,
				"config file not found, skipping"
			);
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
			path: self.path.clone(),
			source,
		})?;
		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: self.path.clone(),
			source,
		})
	}
}

/// Environment variable source.
///
/// Reads `FLAGSYNC_MANIFEST`, `FLAGSYNC_PLUGIN`, `FLAGSYNC_BASE_URL`,
/// `FLAGSYNC_AUTH_TOKEN`, `FLAGSYNC_TIMEOUT_SECS`, `FLAGSYNC_LOG_LEVEL` and
/// `FLAGSYNC_LOG_FORMAT`. Empty values are ignored.
#[derive(Default)]
pub struct EnvSource {
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Reads the process environment at load time.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer> {
		let vars: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut layer = ConfigLayer::default();
		for (key, value) in vars {
			if !key.starts_with("FLAGSYNC_") {
				continue;
			}
			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"FLAGSYNC_MANIFEST" => layer.manifest = Some(PathBuf::from(value)),
				"FLAGSYNC_PLUGIN" => layer.sync_mut().plugin = Some(value),
				"FLAGSYNC_BASE_URL" => layer.sync_mut().base_url = Some(value),
				"FLAGSYNC_AUTH_TOKEN" => {
					layer.sync_mut().auth_token = Some(SecretString::new(value))
				}
				"FLAGSYNC_TIMEOUT_SECS" => {
					let secs = value.parse().map_err(|_| {
						ConfigError::invalid_value(
							key.as_str(),
							format!("{value:?} is not a number of seconds"),
						)
					})?;
					layer.sync_mut().timeout_secs = Some(secs);
				}
				"FLAGSYNC_LOG_LEVEL" => layer.logging_mut().level = Some(value),
				"FLAGSYNC_LOG_FORMAT" => layer.logging_mut().format = Some(value),
				_ => {}
			}
		}
		Ok(layer)
	}
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub manifest: Option<PathBuf>,
	pub plugin: Option<String>,
	pub base_url: Option<String>,
	pub auth_token: Option<SecretString>,
	pub timeout_secs: Option<u64>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
}

pub struct CliSource {
	overrides: CliOverrides,
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

	fn load(&self) -> Result<ConfigLayer> {
		let o = self.overrides.clone();
		let mut layer = ConfigLayer {
			manifest: o.manifest,
			..Default::default()
		};
		if o.plugin.is_some()
			|| o.base_url.is_some()
			|| o.auth_token.is_some()
			|| o.timeout_secs.is_some()
		{
			let sync = layer.sync_mut();
			sync.plugin = o.plugin;
			sync.base_url = o.base_url;
			sync.auth_token = o.auth_token;
			sync.timeout_secs = o.timeout_secs;
		}
		if o.log_level.is_some() || o.log_format.is_some() {
			let logging = layer.logging_mut();
			logging.level = o.log_level;
			logging.format = o.log_format;
		}
		Ok(layer)
	}
}
