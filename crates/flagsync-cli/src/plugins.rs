// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use flagsync_plugin::{PluginRegistry, RegistryError};
use flagsync_plugin_devcycle::DevCyclePlugin;
use flagsync_plugin_manifest::ManifestPlugin;

/// Registers every plugin shipped with the binary.
pub fn register_builtin_plugins(registry: &PluginRegistry) -> Result<(), RegistryError> {
	registry.register(ManifestPlugin::boxed)?;
	registry.register(DevCyclePlugin::boxed)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registers_default_and_devcycle() {
		let registry = PluginRegistry::new();
		register_builtin_plugins(&registry).unwrap();
		assert_eq!(registry.list(), vec!["default", "devcycle"]);
	}

	#[test]
	fn second_registration_is_rejected() {
		let registry = PluginRegistry::new();
		register_builtin_plugins(&registry).unwrap();
		assert_eq!(
			register_builtin_plugins(&registry),
			Err(RegistryError::Duplicate("default".to_string()))
		);
	}
}
