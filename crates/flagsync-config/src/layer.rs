// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use std::collections::BTreeMap;
use std::path::PathBuf;

use flagsync_core::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Partial configuration. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub manifest: Option<PathBuf>,
	#[serde(default)]
	pub sync: Option<SyncLayer>,
	/// `[plugins.<name>]` tables, passed to plugins as their custom settings.
	#[serde(default)]
	pub plugins: Option<BTreeMap<String, Map<String, Value>>>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncLayer {
	#[serde(default)]
	pub plugin: Option<String>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub auth_token: Option<SecretString>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merges `other` into this layer. Values set in `other` win.
	pub fn merge(&mut self, other: ConfigLayer) {
		if other.manifest.is_some() {
			self.manifest = other.manifest;
		}
		merge_option(&mut self.sync, other.sync, SyncLayer::merge);
		merge_option(&mut self.plugins, other.plugins, merge_plugins);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}

	pub fn sync_mut(&mut self) -> &mut SyncLayer {
		self.sync.get_or_insert_with(SyncLayer::default)
	}

	pub fn logging_mut(&mut self) -> &mut LoggingLayer {
		self.logging.get_or_insert_with(LoggingLayer::default)
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

/// Plugin tables merge key by key, so a workspace file can override one
/// setting of a plugin configured in the user file.
fn merge_plugins(
	target: &mut BTreeMap<String, Map<String, Value>>,
	source: BTreeMap<String, Map<String, Value>>,
) {
	for (name, table) in source {
		target.entry(name).or_default().extend(table);
	}
}

impl SyncLayer {
	fn merge(&mut self, other: SyncLayer) {
		if other.plugin.is_some() {
			self.plugin = other.plugin;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.auth_token.is_some() {
			self.auth_token = other.auth_token;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
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
