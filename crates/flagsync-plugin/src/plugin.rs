// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use flagsync_core::{Flag, Flagset, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::OperationContext;
use crate::error::{PluginError, PushFailure, Result};

/// An operation a plugin may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
	Pull,
	Push,
	Compare,
	Delete,
}

impl Capability {
	pub fn as_str(&self) -> &'static str {
		match self {
			Capability::Pull => "pull",
			Capability::Push => "push",
			Capability::Compare => "compare",
			Capability::Delete => "delete",
		}
	}

	pub fn description(&self) -> &'static str {
		match self {
			Capability::Pull => "Fetch flags from the remote source",
			Capability::Push => "Create and update flags in the remote source",
			Capability::Compare => "Diff local flags against the remote source",
			Capability::Delete => "Delete or archive flags in the remote source",
		}
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
	Experimental,
	Beta,
	Stable,
}

impl fmt::Display for Stability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Stability::Experimental => "experimental",
			Stability::Beta => "beta",
			Stability::Stable => "stable",
		})
	}
}

/// Describes one configuration field a plugin accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigProperty {
	#[serde(rename = "type")]
	pub property_type: String,
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub env_var: Option<String>,
	#[serde(default)]
	pub sensitive: bool,
}

impl ConfigProperty {
	pub fn string(description: impl Into<String>) -> Self {
		Self {
			property_type: "string".to_string(),
			description: description.into(),
			default: None,
			env_var: None,
			sensitive: false,
		}
	}

	pub fn with_default(mut self, default: impl Into<Value>) -> Self {
		self.default = Some(default.into());
		self
	}

	pub fn with_env_var(mut self, env_var: impl Into<String>) -> Self {
		self.env_var = Some(env_var.into());
		self
	}

	pub fn sensitive(mut self) -> Self {
		self.sensitive = true;
		self
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
	pub required: Vec<String>,
	pub properties: BTreeMap<String, ConfigProperty>,
}

impl ConfigSchema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn property(mut self, name: impl Into<String>, property: ConfigProperty) -> Self {
		self.properties.insert(name.into(), property);
		self
	}

	pub fn required_property(mut self, name: impl Into<String>, property: ConfigProperty) -> Self {
		let name = name.into();
		self.required.push(name.clone());
		self.properties.insert(name, property);
		self
	}

	pub fn is_required(&self, name: &str) -> bool {
		self.required.iter().any(|r| r == name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
	pub name: String,
	pub version: String,
	pub description: String,
	pub stability: Stability,
	pub capabilities: Vec<Capability>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub config_schema: Option<ConfigSchema>,
}

impl PluginMetadata {
	pub fn has_capability(&self, capability: Capability) -> bool {
		self.capabilities.contains(&capability)
	}
}

/// Settings handed to [`SyncPlugin::configure`]. Plugins keep their own copy.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
	pub base_url: String,
	pub auth_token: Option<SecretString>,
	pub custom: Map<String, Value>,
}

impl PluginConfig {
	/// A non-empty string value from `custom`.
	pub fn custom_str(&self, key: &str) -> Option<&str> {
		self.custom
			.get(key)
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
	}
}

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
	pub ctx: OperationContext,
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
	pub ctx: OperationContext,
	/// Classify only; issue no mutating calls.
	pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
	pub ctx: OperationContext,
}

#[derive(Debug, Default)]
pub struct PushResult {
	pub created: Vec<Flag>,
	pub updated: Vec<Flag>,
	pub deleted: Vec<Flag>,
	pub unchanged: Vec<Flag>,
	pub errors: Vec<PushFailure>,
}

impl PushResult {
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub fn has_changes(&self) -> bool {
		!(self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagDiff {
	pub key: String,
	pub local: Flag,
	pub remote: Flag,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareResult {
	pub added: Vec<Flag>,
	pub removed: Vec<Flag>,
	pub modified: Vec<FlagDiff>,
	pub unchanged: Vec<Flag>,
}

impl CompareResult {
	pub fn has_differences(&self) -> bool {
		!(self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty())
	}
}

/// The contract every sync backend implements.
///
/// Callers check [`SyncPlugin::has_capability`] before invoking an operation.
/// Operations a plugin does not override report
/// [`PluginError::NotSupported`].
#[async_trait]
pub trait SyncPlugin: Send + Sync {
	/// Built fresh on every call. Safe to call before `configure`.
	fn metadata(&self) -> PluginMetadata;

	/// Stores the configuration and builds any client. No network I/O.
	/// Calling it again replaces the previous configuration.
	fn configure(&mut self, config: PluginConfig) -> Result<()>;

	fn validate_config(&self) -> Result<()>;

	async fn pull(&self, _opts: &PullOptions) -> Result<Flagset> {
		Err(self.not_supported(Capability::Pull))
	}

	async fn push(&self, _local: &Flagset, _opts: &PushOptions) -> Result<PushResult> {
		Err(self.not_supported(Capability::Push))
	}

	async fn compare(&self, _local: &Flagset, _opts: &CompareOptions) -> Result<CompareResult> {
		Err(self.not_supported(Capability::Compare))
	}

	fn has_capability(&self, capability: Capability) -> bool {
		self.metadata().has_capability(capability)
	}

	fn not_supported(&self, operation: Capability) -> PluginError {
		PluginError::NotSupported {
			plugin: self.metadata().name,
			operation,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	struct PullOnly;

	#[async_trait]
	impl SyncPlugin for PullOnly {
		fn metadata(&self) -> PluginMetadata {
			PluginMetadata {
				name: "pull-only".into(),
				version: "0.0.1".into(),
				description: "test".into(),
				stability: Stability::Experimental,
				capabilities: vec![Capability::Pull],
				config_schema: None,
			}
		}

		fn configure(&mut self, _config: PluginConfig) -> Result<()> {
			Ok(())
		}

		fn validate_config(&self) -> Result<()> {
			Ok(())
		}

		async fn pull(&self, _opts: &PullOptions) -> Result<Flagset> {
			Ok(Flagset::default())
		}
	}

	#[test]
	fn capability_check_reads_metadata() {
		let plugin = PullOnly;
		assert!(plugin.has_capability(Capability::Pull));
		assert!(!plugin.has_capability(Capability::Push));
	}

	#[tokio::test]
	async fn missing_operation_reports_not_supported() {
		let plugin = PullOnly;
		let err = plugin
			.push(&Flagset::default(), &PushOptions::default())
			.await
			.unwrap_err();
		assert_eq!(
			err.to_string(),
			"plugin \"pull-only\" does not support push operation"
		);
	}

	#[test]
	fn custom_str_skips_empty_and_non_strings() {
		let mut config = PluginConfig::default();
		config.custom.insert("project".into(), json!("p1"));
		config.custom.insert("empty".into(), json!(""));
		config.custom.insert("number".into(), json!(3));

		assert_eq!(config.custom_str("project"), Some("p1"));
		assert_eq!(config.custom_str("empty"), None);
		assert_eq!(config.custom_str("number"), None);
		assert_eq!(config.custom_str("absent"), None);
	}

	#[test]
	fn schema_builder_tracks_required_fields() {
		let schema = ConfigSchema::new()
			.required_property("project", ConfigProperty::string("Project key"))
			.property(
				"environment",
				ConfigProperty::string("Environment").with_default("development"),
			);
		assert!(schema.is_required("project"));
		assert!(!schema.is_required("environment"));
		assert_eq!(
			schema.properties["environment"].default,
			Some(json!("development"))
		);
	}

	#[test]
	fn metadata_serializes_camel_case() {
		let value = serde_json::to_value(PullOnly.metadata()).unwrap();
		assert_eq!(value["stability"], "experimental");
		assert_eq!(value["capabilities"], json!(["pull"]));
		assert!(value.get("configSchema").is_none());
	}
}
