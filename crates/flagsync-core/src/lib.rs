// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for flagsync.
//!
//! This crate holds the flag model shared by every plugin and by the CLI:
//! typed flags, sorted flagsets, and the manifest document they are loaded
//! from and saved to.
//!
//! # Example
//!
//! ```
//! use flagsync_core::{parse_flagset, FlagType, FlagValue};
//!
//! let set = parse_flagset(r#"{"flags": {
//!     "ratio": {"flagType": "float", "defaultValue": 1.0, "description": ""}
//! }}"#).unwrap();
//!
//! let ratio = set.get("ratio").unwrap();
//! assert_eq!(ratio.flag_type(), FlagType::Float);
//! assert_eq!(ratio.default_value, FlagValue::Float(1.0));
//! assert_eq!(ratio.default_value.render(), "1");
//! ```

pub mod error;
pub mod flag;
pub mod flagset;
pub mod manifest;
pub mod secret;

pub use error::{FlagError, Result};
pub use flag::{Flag, FlagType, FlagValue, EXPIRY_FORMAT};
pub use flagset::Flagset;
pub use manifest::{
	load_flagset, parse_flagset, save_flagset, to_manifest_json, FlagRecord,
	ManifestDocument, ManifestEntry,
};
pub use secret::SecretString;
