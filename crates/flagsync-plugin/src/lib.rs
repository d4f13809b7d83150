// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sync plugin contract for flagsync.
//!
//! A backend implements [`SyncPlugin`] and is registered into a
//! [`PluginRegistry`] by name. [`SyncService`] resolves a plugin from the
//! registry and runs pull, push or compare through it. Backends share the
//! diff and push logic in [`reconcile`].

pub mod context;
pub mod error;
pub mod plugin;
pub mod reconcile;
pub mod registry;
pub mod service;

pub use context::OperationContext;
pub use error::{Interrupted, PluginError, PushAction, PushFailure, RegistryError, Result};
pub use plugin::{
	Capability, CompareOptions, CompareResult, ConfigProperty, ConfigSchema, FlagDiff,
	PluginConfig, PluginMetadata, PullOptions, PushOptions, PushResult, Stability, SyncPlugin,
};
pub use reconcile::{apply_push, compare, flags_equal, plan_push, FlagMutator, PushStep};
pub use registry::{PluginFactory, PluginInfo, PluginRegistry};
pub use service::SyncService;
