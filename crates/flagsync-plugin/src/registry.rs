// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::RegistryError;
use crate::plugin::{Stability, SyncPlugin};

/// Builds a fresh, unconfigured plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn SyncPlugin> + Send + Sync>;

/// What the registry keeps per plugin. Instances are never stored.
#[derive(Clone)]
pub struct PluginInfo {
	pub name: String,
	pub description: String,
	pub stability: Stability,
	factory: PluginFactory,
}

impl PluginInfo {
	pub fn instantiate(&self) -> Box<dyn SyncPlugin> {
		(self.factory)()
	}
}

impl fmt::Debug for PluginInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PluginInfo")
			.field("name", &self.name)
			.field("description", &self.description)
			.field("stability", &self.stability)
			.finish_non_exhaustive()
	}
}

/// Concurrent map from plugin name to factory.
pub struct PluginRegistry {
	plugins: RwLock<HashMap<String, PluginInfo>>,
}

static GLOBAL: OnceLock<PluginRegistry> = OnceLock::new();

impl PluginRegistry {
	pub fn new() -> Self {
		Self {
			plugins: RwLock::new(HashMap::new()),
		}
	}

	/// Process-wide default instance for call sites without a registry handle.
	pub fn global() -> &'static PluginRegistry {
		GLOBAL.get_or_init(PluginRegistry::new)
	}

	/// Registers a factory under the name its plugins report.
	///
	/// The factory is called once to read metadata. The first registration of
	/// a name wins; later ones fail with [`RegistryError::Duplicate`].
	pub fn register<F>(&self, factory: F) -> Result<(), RegistryError>
	where
		F: Fn() -> Box<dyn SyncPlugin> + Send + Sync + 'static,
	{
		let metadata = factory().metadata();
		if metadata.name.is_empty() {
			return Err(RegistryError::EmptyName);
		}

		let mut plugins = self.plugins.write();
		match plugins.entry(metadata.name.clone()) {
			Entry::Occupied(_) => Err(RegistryError::Duplicate(metadata.name)),
			Entry::Vacant(slot) => {
				debug!(
					plugin = %metadata.name,
					stability = %metadata.stability,
					"registering plugin"
				);
				slot.insert(PluginInfo {
					name: metadata.name,
					description: metadata.description,
					stability: metadata.stability,
					factory: Arc::new(factory),
				});
				Ok(())
			}
		}
	}

	/// Returns a new instance on every call.
	pub fn get(&self, name: &str) -> Result<Box<dyn SyncPlugin>, RegistryError> {
		let info = self.info(name)?;
		Ok(info.instantiate())
	}

	pub fn info(&self, name: &str) -> Result<PluginInfo, RegistryError> {
		let plugins = self.plugins.read();
		match plugins.get(name) {
			Some(info) => Ok(info.clone()),
			None => {
				let mut available: Vec<String> = plugins.keys().cloned().collect();
				available.sort();
				Err(RegistryError::NotFound {
					name: name.to_string(),
					available,
				})
			}
		}
	}

	pub fn contains(&self, name: &str) -> bool {
		self.plugins.read().contains_key(name)
	}

	/// Registered names, sorted.
	pub fn list(&self) -> Vec<String> {
		let mut names: Vec<String> = self.plugins.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// A sorted snapshot of every registration.
	pub fn get_all(&self) -> Vec<PluginInfo> {
		let mut all: Vec<PluginInfo> = self.plugins.read().values().cloned().collect();
		all.sort_by(|a, b| a.name.cmp(&b.name));
		all
	}

	pub fn len(&self) -> usize {
		self.plugins.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.read().is_empty()
	}
}

impl Default for PluginRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Result;
	use crate::plugin::{Capability, PluginConfig, PluginMetadata};
	use async_trait::async_trait;
	use proptest::prelude::*;

	struct MockPlugin {
		name: String,
		description: String,
		base_url: String,
	}

	impl MockPlugin {
		fn boxed(name: &str, description: &str) -> Box<dyn SyncPlugin> {
			Box::new(MockPlugin {
				name: name.to_string(),
				description: description.to_string(),
				base_url: String::new(),
			})
		}
	}

	#[async_trait]
	impl SyncPlugin for MockPlugin {
		fn metadata(&self) -> PluginMetadata {
			PluginMetadata {
				name: self.name.clone(),
				version: "1.0.0".into(),
				description: self.description.clone(),
				stability: Stability::Experimental,
				capabilities: vec![Capability::Pull],
				config_schema: None,
			}
		}

		fn configure(&mut self, config: PluginConfig) -> Result<()> {
			self.base_url = config.base_url;
			Ok(())
		}

		fn validate_config(&self) -> Result<()> {
			if self.base_url.is_empty() {
				return Err(crate::error::PluginError::config_invalid(
					&self.name,
					"baseUrl is required",
				));
			}
			Ok(())
		}
	}

	#[test]
	fn register_and_get() {
		let registry = PluginRegistry::new();
		registry.register(|| MockPlugin::boxed("mock", "first")).unwrap();

		let plugin = registry.get("mock").unwrap();
		assert_eq!(plugin.metadata().name, "mock");
		assert!(registry.contains("mock"));
	}

	#[test]
	fn duplicate_registration_keeps_first() {
		let registry = PluginRegistry::new();
		registry.register(|| MockPlugin::boxed("mock", "first")).unwrap();

		let err = registry
			.register(|| MockPlugin::boxed("mock", "second"))
			.unwrap_err();

		assert_eq!(err, RegistryError::Duplicate("mock".into()));
		assert_eq!(registry.get("mock").unwrap().metadata().description, "first");
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn empty_name_is_rejected() {
		let registry = PluginRegistry::new();
		let err = registry.register(|| MockPlugin::boxed("", "x")).unwrap_err();
		assert_eq!(err, RegistryError::EmptyName);
		assert!(registry.is_empty());
	}

	#[test]
	fn unknown_name_lists_available() {
		let registry = PluginRegistry::new();
		registry.register(|| MockPlugin::boxed("b", "")).unwrap();
		registry.register(|| MockPlugin::boxed("a", "")).unwrap();

		match registry.get("c") {
			Err(RegistryError::NotFound { name, available }) => {
				assert_eq!(name, "c");
				assert_eq!(available, vec!["a", "b"]);
			}
			Err(other) => panic!("unexpected error: {other}"),
			Ok(_) => panic!("expected lookup to fail"),
		}
	}

	#[test]
	fn get_returns_independent_instances() {
		let registry = PluginRegistry::new();
		registry.register(|| MockPlugin::boxed("mock", "")).unwrap();

		let mut first = registry.get("mock").unwrap();
		first
			.configure(PluginConfig {
				base_url: "http://localhost".into(),
				..Default::default()
			})
			.unwrap();
		let second = registry.get("mock").unwrap();

		assert!(first.validate_config().is_ok());
		assert!(second.validate_config().is_err());
	}

	#[test]
	fn get_all_is_sorted_snapshot() {
		let registry = PluginRegistry::new();
		for name in ["zeta", "alpha", "mid"] {
			registry.register(move || MockPlugin::boxed(name, "")).unwrap();
		}

		let snapshot = registry.get_all();
		registry.register(|| MockPlugin::boxed("late", "")).unwrap();

		let names: Vec<_> = snapshot.iter().map(|p| p.name.as_str()).collect();
		assert_eq!(names, vec!["alpha", "mid", "zeta"]);
		assert_eq!(registry.list(), vec!["alpha", "late", "mid", "zeta"]);
	}

	#[test]
	fn concurrent_registration_of_same_name_admits_one() {
		let registry = PluginRegistry::new();

		let successes: usize = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..8)
				.map(|i| {
					let registry = &registry;
					scope.spawn(move || {
						let unique = format!("plugin-{i}");
						registry
							.register(move || MockPlugin::boxed(&unique, ""))
							.unwrap();
						registry
							.register(move || MockPlugin::boxed("shared", &format!("from {i}")))
							.is_ok()
					})
				})
				.collect();
			handles
				.into_iter()
				.map(|h| h.join().unwrap())
				.filter(|ok| *ok)
				.count()
		});

		assert_eq!(successes, 1);
		assert_eq!(registry.len(), 9);
	}

	proptest! {
		/// Any non-empty name registered once can be looked up by that name.
		#[test]
		fn registered_names_are_retrievable(
			names in prop::collection::hash_set("[a-z][a-z0-9-]{0,12}", 1..8)
		) {
			let registry = PluginRegistry::new();
			for name in &names {
				let owned = name.clone();
				registry.register(move || MockPlugin::boxed(&owned, "")).unwrap();
			}

			prop_assert_eq!(registry.len(), names.len());
			for name in &names {
				prop_assert_eq!(registry.get(name).unwrap().metadata().name, name.clone());
			}
			let mut sorted: Vec<String> = names.into_iter().collect();
			sorted.sort();
			prop_assert_eq!(registry.list(), sorted);
		}
	}
}
