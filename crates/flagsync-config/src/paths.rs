// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Config file locations.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

pub const WORKSPACE_CONFIG_FILE: &str = ".flagsync.toml";

#[derive(Debug, Clone)]
pub struct PathsConfig {
	/// `$XDG_CONFIG_HOME/flagsync/config.toml`
	pub user_config_file: PathBuf,
	/// `./.flagsync.toml`, unless `--config` names another file.
	pub workspace_config_file: PathBuf,
}

impl PathsConfig {
	pub fn with_workspace_file(mut self, path: PathBuf) -> Self {
		self.workspace_config_file = path;
		self
	}
}

/// Resolves paths from `XDG_CONFIG_HOME` (or `~/.config`) and the current
/// directory.
pub fn resolve_paths() -> Result<PathsConfig> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) => PathBuf::from(dir),
		None => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};
	let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
		path: PathBuf::from("."),
		source,
	})?;

	let paths = PathsConfig {
		user_config_file: config_home.join("flagsync").join("config.toml"),
		workspace_config_file: cwd.join(WORKSPACE_CONFIG_FILE),
	};
	tracing::debug!(
		user = %paths.user_config_file.display(),
		workspace = %paths.workspace_config_file.display(),
		"resolved config paths"
	);
	Ok(paths)
}
