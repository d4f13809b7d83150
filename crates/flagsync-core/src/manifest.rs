// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Manifest document codec and file I/O.
//!
//! A manifest is a JSON object keyed by flag:
//!
//! ```json
//! {"flags": {"new-checkout": {"flagType": "boolean", "defaultValue": false,
//!                             "description": "", "expiry": "2025-12-31"}}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{FlagError, Result};
use crate::flag::{Flag, FlagType, FlagValue, EXPIRY_FORMAT};
use crate::flagset::Flagset;

/// On-disk manifest shape. Keys are kept in a `BTreeMap` so output is sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDocument {
	#[serde(default)]
	pub flags: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
	#[serde(rename = "flagType")]
	pub flag_type: String,
	#[serde(default)]
	pub description: String,
	#[serde(rename = "defaultValue", default)]
	pub default_value: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiry: Option<String>,
}

impl ManifestEntry {
	fn into_flag(self, key: String) -> Result<Flag> {
		let flag_type: FlagType = self.flag_type.parse()?;
		let default_value = FlagValue::from_json(&key, flag_type, self.default_value)?;
		let expiry = Flag::parse_expiry(&key, self.expiry)?;
		Ok(Flag {
			key,
			description: self.description,
			default_value,
			expiry,
		})
	}
}

impl From<&Flag> for ManifestEntry {
	fn from(flag: &Flag) -> Self {
		Self {
			flag_type: flag.flag_type().to_string(),
			description: flag.description.clone(),
			default_value: flag.default_value.to_json(),
			expiry: format_expiry(flag),
		}
	}
}

impl TryFrom<ManifestDocument> for Flagset {
	type Error = FlagError;

	fn try_from(doc: ManifestDocument) -> Result<Self> {
		let flags = doc
			.flags
			.into_iter()
			.map(|(key, entry)| entry.into_flag(key))
			.collect::<Result<Vec<_>>>()?;
		Ok(Flagset::new(flags))
	}
}

impl From<Flagset> for ManifestDocument {
	fn from(set: Flagset) -> Self {
		Self {
			flags: set
				.iter()
				.map(|flag| (flag.key.clone(), ManifestEntry::from(flag)))
				.collect(),
		}
	}
}

/// A flag in the flat record form sent to REST backends and printed by
/// `compare --json`: `{key, type, description, defaultValue, expiry?}`.
#[derive(Debug, Clone, Serialize)]
pub struct FlagRecord {
	pub key: String,
	#[serde(rename = "type")]
	pub flag_type: String,
	pub description: String,
	#[serde(rename = "defaultValue")]
	pub default_value: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiry: Option<String>,
}

impl From<&Flag> for FlagRecord {
	fn from(flag: &Flag) -> Self {
		Self {
			key: flag.key.clone(),
			flag_type: flag.flag_type().to_string(),
			description: flag.description.clone(),
			default_value: flag.default_value.to_json(),
			expiry: format_expiry(flag),
		}
	}
}

fn format_expiry(flag: &Flag) -> Option<String> {
	flag.expiry.map(|d| d.format(EXPIRY_FORMAT).to_string())
}

/// Parses a manifest document from a string.
pub fn parse_flagset(json: &str) -> Result<Flagset> {
	let doc: ManifestDocument = serde_json::from_str(json)?;
	Flagset::try_from(doc)
}

/// Renders a flagset as a pretty-printed manifest document.
pub fn to_manifest_json(set: &Flagset) -> Result<String> {
	let doc = ManifestDocument::from(set.clone());
	Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn load_flagset(path: &Path) -> Result<Flagset> {
	let content = std::fs::read_to_string(path).map_err(|source| FlagError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let set = parse_flagset(&content)?;
	debug!(path = %path.display(), flags = set.len(), "loaded manifest");
	Ok(set)
}

pub fn save_flagset(path: &Path, set: &Flagset) -> Result<()> {
	let mut content = to_manifest_json(set)?;
	content.push('\n');
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).map_err(|source| FlagError::Io {
			path: parent.to_path_buf(),
			source,
		})?;
	}
	std::fs::write(path, content).map_err(|source| FlagError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(path = %path.display(), flags = set.len(), "saved manifest");
	Ok(())
}
