// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use flagsync_core::FlagError;
use thiserror::Error;

use crate::plugin::Capability;

/// Why an in-flight operation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
	#[error("operation cancelled")]
	Cancelled,
	#[error("operation deadline exceeded")]
	DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("plugin name must not be empty")]
	EmptyName,

	#[error("plugin {0:?} is already registered")]
	Duplicate(String),

	#[error("plugin {name:?} not found (available: {})", available.join(", "))]
	NotFound { name: String, available: Vec<String> },
}

#[derive(Debug, Error)]
pub enum PluginError {
	#[error("invalid configuration for plugin {plugin:?}: {message}")]
	ConfigInvalid { plugin: String, message: String },

	#[error("plugin {plugin:?} does not support {operation} operation")]
	NotSupported {
		plugin: String,
		operation: Capability,
	},

	#[error("transport error: {message}")]
	Transport { message: String },

	#[error(transparent)]
	Interrupted(#[from] Interrupted),

	#[error("authentication failed (HTTP {status}): {body}")]
	Auth { status: u16, body: String },

	#[error("remote API error (HTTP {status}): {body}")]
	RemoteApi { status: u16, body: String },

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	#[error(transparent)]
	Flag(#[from] FlagError),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error("plugin {plugin:?} {operation} failed: {source}")]
	Operation {
		plugin: String,
		operation: Capability,
		#[source]
		source: Box<PluginError>,
	},
}

impl PluginError {
	pub fn config_invalid(plugin: impl Into<String>, message: impl Into<String>) -> Self {
		PluginError::ConfigInvalid {
			plugin: plugin.into(),
			message: message.into(),
		}
	}

	/// True when the operation was cancelled or ran past its deadline.
	pub fn is_interrupted(&self) -> bool {
		match self {
			PluginError::Interrupted(_) => true,
			PluginError::Operation { source, .. } => source.is_interrupted(),
			_ => false,
		}
	}

	/// Attaches the plugin and operation name unless the error already names
	/// its plugin.
	pub fn in_operation(self, plugin: &str, operation: Capability) -> Self {
		match self {
			e @ (PluginError::ConfigInvalid { .. }
			| PluginError::NotSupported { .. }
			| PluginError::Operation { .. }) => e,
			other => PluginError::Operation {
				plugin: plugin.to_string(),
				operation,
				source: Box::new(other),
			},
		}
	}
}

pub type Result<T> = std::result::Result<T, PluginError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
	Create,
	Update,
}

impl fmt::Display for PushAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PushAction::Create => f.write_str("create"),
			PushAction::Update => f.write_str("update"),
		}
	}
}

/// A per-flag failure collected during push.
#[derive(Debug, Error)]
#[error("failed to {action} flag {key:?}: {error}")]
pub struct PushFailure {
	pub key: String,
	pub action: PushAction,
	#[source]
	pub error: PluginError,
}
