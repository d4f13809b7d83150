// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use flagsync_common_http::HttpStatusError;
use flagsync_plugin::PluginError;
use thiserror::Error;

use crate::plugin::PLUGIN_NAME;

#[derive(Debug, Error)]
pub enum DevCycleError {
	#[error("clientId and clientSecret are required")]
	MissingCredentials,

	#[error("invalid URL {url:?}: {message}")]
	InvalidUrl { url: String, message: String },

	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("authentication failed (HTTP {status}): {body}")]
	Auth { status: u16, body: String },

	#[error("DevCycle API returned HTTP {status}: {body}")]
	Api { status: u16, body: String },

	#[error("failed to decode response: {0}")]
	Decode(String),
}

impl From<HttpStatusError> for DevCycleError {
	fn from(e: HttpStatusError) -> Self {
		DevCycleError::Api {
			status: e.status.as_u16(),
			body: e.body,
		}
	}
}

impl From<DevCycleError> for PluginError {
	fn from(e: DevCycleError) -> Self {
		match e {
			DevCycleError::MissingCredentials | DevCycleError::InvalidUrl { .. } => {
				PluginError::config_invalid(PLUGIN_NAME, e.to_string())
			}
			DevCycleError::Request(e) => PluginError::Transport {
				message: e.to_string(),
			},
			DevCycleError::Auth { status, body } => PluginError::Auth { status, body },
			DevCycleError::Api { status, body } => PluginError::RemoteApi { status, body },
			DevCycleError::Decode(message) => PluginError::InvalidResponse(message),
		}
	}
}

pub type Result<T> = std::result::Result<T, DevCycleError>;
