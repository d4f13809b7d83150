// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `default` sync plugin, backed by a REST manifest management API.

pub mod client;
pub mod error;
pub mod plugin;

pub use client::ManifestClient;
pub use error::{ManifestClientError, Result};
pub use plugin::{ManifestPlugin, PLUGIN_NAME};
