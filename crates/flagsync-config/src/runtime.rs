// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use flagsync_core::SecretString;
use flagsync_plugin::{ConfigSchema, PluginConfig};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::sources::{DEFAULT_MANIFEST, DEFAULT_TIMEOUT_SECS};

/// Property that carries the bearer token in a plugin's schema.
const AUTH_TOKEN_PROPERTY: &str = "authToken";

#[derive(Debug, Clone)]
pub struct SyncConfig {
	pub manifest_path: PathBuf,
	pub plugin: Option<String>,
	pub base_url: String,
	pub auth_token: Option<SecretString>,
	/// Deadline for a whole sync operation.
	pub request_timeout: Duration,
	/// `[plugins.<name>]` settings.
	pub plugins: BTreeMap<String, Map<String, Value>>,
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Warn => "warn",
			Self::Info => "info",
			Self::Debug => "debug",
			Self::Trace => "trace",
		}
	}
}

impl FromStr for LogLevel {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"error" => Ok(Self::Error),
			"warn" | "warning" => Ok(Self::Warn),
			"info" => Ok(Self::Info),
			"debug" => Ok(Self::Debug),
			"trace" => Ok(Self::Trace),
			_ => Err(ConfigError::invalid_value(
				"logging.level",
				format!("unknown level {s:?}"),
			)),
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
	#[default]
	Pretty,
	Compact,
	Json,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(Self::Pretty),
			"compact" => Ok(Self::Compact),
			"json" => Ok(Self::Json),
			_ => Err(ConfigError::invalid_value(
				"logging.format",
				format!("unknown format {s:?}"),
			)),
		}
	}
}

impl SyncConfig {
	/// Builds the runtime config from a merged layer.
	pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
		let sync = layer.sync.unwrap_or_default();
		let logging = layer.logging.unwrap_or_default();

		let logging = LoggingConfig {
			level: logging
				.level
				.as_deref()
				.map(str::parse)
				.transpose()?
				.unwrap_or_default(),
			format: logging
				.format
				.as_deref()
				.map(str::parse)
				.transpose()?
				.unwrap_or_default(),
		};

		Ok(Self {
			manifest_path: layer
				.manifest
				.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
			plugin: sync.plugin.filter(|p| !p.is_empty()),
			base_url: sync.base_url.unwrap_or_default(),
			auth_token: sync.auth_token.filter(|t| !t.is_empty()),
			request_timeout: Duration::from_secs(sync.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
			plugins: layer.plugins.unwrap_or_default(),
			logging,
		})
	}

	/// Builds the configuration snapshot handed to plugin `name`, reading
	/// fallbacks from the process environment.
	pub fn plugin_config(&self, name: &str, schema: Option<&ConfigSchema>) -> PluginConfig {
		self.plugin_config_with_env(name, schema, |var| std::env::var(var).ok())
	}

	/// Settings missing from `[plugins.<name>]` are filled from the schema
	/// property's env var, then from its default. The auth token resolves as
	/// `[sync]`, then the plugin table, then the env var.
	pub fn plugin_config_with_env<F>(
		&self,
		name: &str,
		schema: Option<&ConfigSchema>,
		env: F,
	) -> PluginConfig
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |var: &Option<String>| {
			var.as_deref()
				.and_then(&env)
				.filter(|v| !v.trim().is_empty())
		};

		let mut custom = self.plugins.get(name).cloned().unwrap_or_default();
		let mut auth_token = self.auth_token.clone();

		if let Some(schema) = schema {
			for (key, property) in &schema.properties {
				if key == AUTH_TOKEN_PROPERTY {
					let from_table = custom
						.remove(key)
						.and_then(|v| v.as_str().map(str::to_string))
						.filter(|v| !v.trim().is_empty());
					if auth_token.is_none() {
						auth_token = from_table
							.or_else(|| lookup(&property.env_var))
							.map(SecretString::new);
					}
					continue;
				}
				if custom.contains_key(key) {
					continue;
				}
				if let Some(value) = lookup(&property.env_var) {
					custom.insert(key.clone(), Value::String(value));
				} else if let Some(default) = &property.default {
					custom.insert(key.clone(), default.clone());
				}
			}
		}

		PluginConfig {
			base_url: self.base_url.clone(),
			auth_token,
			custom,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flagsync_plugin::ConfigProperty;
	use serde_json::json;

	fn config(toml_src: &str) -> SyncConfig {
		SyncConfig::from_layer(toml::from_str(toml_src).unwrap()).unwrap()
	}

	fn devcycle_schema() -> ConfigSchema {
		ConfigSchema::new()
			.required_property("project", ConfigProperty::string("project"))
			.required_property(
				"clientId",
				ConfigProperty::string("client id").with_env_var("DEVCYCLE_CLIENT_ID"),
			)
			.property(
				"environment",
				ConfigProperty::string("environment").with_default("development"),
			)
	}

	#[test]
	fn empty_layer_uses_defaults() {
		let config = SyncConfig::from_layer(ConfigLayer::default()).unwrap();
		assert_eq!(config.manifest_path, PathBuf::from("flags.json"));
		assert_eq!(config.request_timeout, Duration::from_secs(30));
		assert_eq!(config.logging, LoggingConfig::default());
		assert!(config.plugin.is_none());
	}

	#[test]
	fn unknown_log_level_is_rejected() {
		let err = SyncConfig::from_layer(toml::from_str("[logging]\nlevel = \"loud\"").unwrap())
			.unwrap_err();
		assert!(
			matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "logging.level")
		);
	}

	#[test]
	fn plugin_config_prefers_table_then_env_then_default() {
		let config = config(
			r#"
[plugins.devcycle]
project = "shop"
"#,
		);
		let plugin = config.plugin_config_with_env("devcycle", Some(&devcycle_schema()), |var| {
			(var == "DEVCYCLE_CLIENT_ID").then(|| "env-id".to_string())
		});

		assert_eq!(plugin.custom["project"], json!("shop"));
		assert_eq!(plugin.custom["clientId"], json!("env-id"));
		assert_eq!(plugin.custom["environment"], json!("development"));
	}

	#[test]
	fn auth_token_from_plugin_table_beats_env() {
		let config = config(
			r#"
[plugins.default]
baseUrl = "http://flags.example.com"
authToken = "table-token"
"#,
		);
		let schema = ConfigSchema::new()
			.property("baseUrl", ConfigProperty::string("base url"))
			.property(
				"authToken",
				ConfigProperty::string("token")
					.with_env_var("FLAGSYNC_AUTH_TOKEN")
					.sensitive(),
			);
		let plugin = config.plugin_config_with_env("default", Some(&schema), |_| {
			Some("env-token".to_string())
		});

		assert_eq!(plugin.auth_token.as_ref().map(|t| t.expose()), Some("table-token"));
		assert!(!plugin.custom.contains_key("authToken"));
		assert_eq!(plugin.custom["baseUrl"], json!("http://flags.example.com"));
	}

	#[test]
	fn table_value_beats_env() {
		let config = config(
			r#"
[plugins.devcycle]
clientId = "file-id"
"#,
		);
		let plugin = config.plugin_config_with_env("devcycle", Some(&devcycle_schema()), |_| {
			Some("env-id".to_string())
		});
		assert_eq!(plugin.custom["clientId"], json!("file-id"));
	}

	#[test]
	fn auth_token_falls_back_to_schema_env_var() {
		let schema = ConfigSchema::new().property(
			"authToken",
			ConfigProperty::string("token")
				.with_env_var("FLAGSYNC_AUTH_TOKEN")
				.sensitive(),
		);
		let config = config("[sync]\nbase_url = \"https://flags.example.com\"");

		let plugin = config.plugin_config_with_env("default", Some(&schema), |var| {
			(var == "FLAGSYNC_AUTH_TOKEN").then(|| "env-token".to_string())
		});

		assert_eq!(plugin.base_url, "https://flags.example.com");
		assert_eq!(plugin.auth_token.unwrap().expose(), "env-token");
		assert!(!plugin.custom.contains_key("authToken"));
	}

	#[test]
	fn configured_auth_token_wins() {
		let config = config("[sync]\nauth_token = \"file-token\"");
		let plugin = config.plugin_config_with_env("default", None, |_| Some("env".into()));
		assert_eq!(plugin.auth_token.unwrap().expose(), "file-token");
	}
}
