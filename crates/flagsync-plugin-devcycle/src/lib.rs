// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `devcycle` sync plugin.
//!
//! Flags map to DevCycle variables. Creating a flag creates a feature that
//! carries the variable, with "on" and "off" variations.
//!
//! | Flag type | DevCycle type |
//! |-----------|---------------|
//! | boolean   | Boolean |
//! | string    | String |
//! | integer, float | Number |
//! | object    | JSON |

pub mod client;
pub mod error;
pub mod plugin;
pub mod types;

pub use client::{
	DevCycleClient, DevCycleClientBuilder, AUDIENCE, DEFAULT_API_URL, DEFAULT_AUTH_URL,
};
pub use error::{DevCycleError, Result};
pub use plugin::{DevCyclePlugin, DEFAULT_ENVIRONMENT, PLUGIN_NAME};
pub use types::{Feature, Variable, Variation};
