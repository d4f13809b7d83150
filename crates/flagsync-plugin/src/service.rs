// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operation entry points used by the CLI.

use flagsync_core::Flagset;
use tracing::{info, instrument};

use crate::error::{PluginError, Result};
use crate::plugin::{
	Capability, CompareOptions, CompareResult, PluginConfig, PluginMetadata, PullOptions,
	PushOptions, PushResult, SyncPlugin,
};
use crate::registry::PluginRegistry;

/// Runs plugin operations against an explicitly passed registry.
///
/// Every operation takes a fresh instance from the registry, configures it,
/// validates the configuration and checks the capability before running.
#[derive(Clone, Copy)]
pub struct SyncService<'a> {
	registry: &'a PluginRegistry,
}

impl<'a> SyncService<'a> {
	pub fn new(registry: &'a PluginRegistry) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &'a PluginRegistry {
		self.registry
	}

	pub fn list_plugins(&self) -> Vec<String> {
		self.registry.list()
	}

	pub fn describe_plugin(&self, name: &str) -> Result<PluginMetadata> {
		Ok(self.registry.get(name)?.metadata())
	}

	#[instrument(skip(self, config, opts), fields(plugin = %name))]
	pub async fn pull(
		&self,
		name: &str,
		config: PluginConfig,
		opts: &PullOptions,
	) -> Result<Flagset> {
		let plugin = self.prepare(name, config, Capability::Pull)?;
		info!("pulling flags");
		let flags = plugin
			.pull(opts)
			.await
			.map_err(|e| e.in_operation(name, Capability::Pull))?;
		info!(flags = flags.len(), "pull complete");
		Ok(flags)
	}

	#[instrument(skip(self, config, local, opts), fields(plugin = %name, dry_run = opts.dry_run))]
	pub async fn push(
		&self,
		name: &str,
		config: PluginConfig,
		local: &Flagset,
		opts: &PushOptions,
	) -> Result<PushResult> {
		let plugin = self.prepare(name, config, Capability::Push)?;
		info!(flags = local.len(), "pushing flags");
		let result = plugin
			.push(local, opts)
			.await
			.map_err(|e| e.in_operation(name, Capability::Push))?;
		info!(
			created = result.created.len(),
			updated = result.updated.len(),
			unchanged = result.unchanged.len(),
			errors = result.errors.len(),
			"push complete"
		);
		Ok(result)
	}

	#[instrument(skip(self, config, local, opts), fields(plugin = %name))]
	pub async fn compare(
		&self,
		name: &str,
		config: PluginConfig,
		local: &Flagset,
		opts: &CompareOptions,
	) -> Result<CompareResult> {
		let plugin = self.prepare(name, config, Capability::Compare)?;
		info!(flags = local.len(), "comparing flags");
		let result = plugin
			.compare(local, opts)
			.await
			.map_err(|e| e.in_operation(name, Capability::Compare))?;
		info!(
			added = result.added.len(),
			modified = result.modified.len(),
			removed = result.removed.len(),
			unchanged = result.unchanged.len(),
			"compare complete"
		);
		Ok(result)
	}

	fn prepare(
		&self,
		name: &str,
		config: PluginConfig,
		capability: Capability,
	) -> Result<Box<dyn SyncPlugin>> {
		let mut plugin = self.registry.get(name)?;
		if !plugin.has_capability(capability) {
			return Err(PluginError::NotSupported {
				plugin: name.to_string(),
				operation: capability,
			});
		}
		plugin.configure(config)?;
		plugin.validate_config()?;
		Ok(plugin)
	}
}
