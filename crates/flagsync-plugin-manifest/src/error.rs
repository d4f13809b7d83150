// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use flagsync_common_http::HttpStatusError;
use flagsync_core::FlagError;
use flagsync_plugin::PluginError;
use thiserror::Error;

use crate::plugin::PLUGIN_NAME;

#[derive(Debug, Error)]
pub enum ManifestClientError {
	#[error("invalid base URL {url:?}: {message}")]
	InvalidBaseUrl { url: String, message: String },

	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("manifest API returned HTTP {status}: {body}")]
	Api { status: u16, body: String },

	#[error("invalid manifest in response: {0}")]
	Manifest(#[from] FlagError),
}

impl From<HttpStatusError> for ManifestClientError {
	fn from(e: HttpStatusError) -> Self {
		ManifestClientError::Api {
			status: e.status.as_u16(),
			body: e.body,
		}
	}
}

impl From<ManifestClientError> for PluginError {
	fn from(e: ManifestClientError) -> Self {
		match e {
			ManifestClientError::InvalidBaseUrl { .. } => {
				PluginError::config_invalid(PLUGIN_NAME, e.to_string())
			}
			ManifestClientError::Request(e) => PluginError::Transport {
				message: e.to_string(),
			},
			ManifestClientError::Api { status, body } => PluginError::RemoteApi { status, body },
			ManifestClientError::Manifest(e) => PluginError::Flag(e),
		}
	}
}

pub type Result<T> = std::result::Result<T, ManifestClientError>;
