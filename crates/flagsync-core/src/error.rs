// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

use crate::flag::FlagType;

/// Errors raised while building or parsing flags and flagsets.
#[derive(Debug, Error)]
pub enum FlagError {
	#[error("unknown flag type: {0}")]
	UnknownFlagType(String),

	#[error("flag {key}: default value must be {expected}, found {found}")]
	InvalidDefaultValue {
		key: String,
		expected: FlagType,
		found: String,
	},

	#[error("flag {key}: missing default value")]
	MissingDefaultValue { key: String },

	#[error("flag {key}: invalid expiry date {value:?} (expected YYYY-MM-DD or RFC 3339)")]
	InvalidExpiry { key: String, value: String },

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T> = std::result::Result<T, FlagError>;
