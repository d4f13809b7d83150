// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use flagsync_core::{Flag, FlagType, FlagValue, Flagset, SecretString};
use flagsync_plugin::{
	apply_push, compare, Capability, CompareOptions, CompareResult, ConfigProperty, ConfigSchema,
	FlagMutator, OperationContext, PluginConfig, PluginError, PluginMetadata, PullOptions,
	PushOptions, PushResult, Result, Stability, SyncPlugin,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::DevCycleClient;
use crate::types::{Variable, TYPE_BOOLEAN, TYPE_JSON, TYPE_NUMBER, TYPE_STRING};

pub const PLUGIN_NAME: &str = "devcycle";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Syncs flags with DevCycle variables.
#[derive(Debug, Default)]
pub struct DevCyclePlugin {
	project: String,
	environment: String,
	client_id: String,
	client_secret: Option<SecretString>,
	client: Option<DevCycleClient>,
}

impl DevCyclePlugin {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn boxed() -> Box<dyn SyncPlugin> {
		Box::new(Self::new())
	}

	pub fn project(&self) -> &str {
		&self.project
	}

	pub fn environment(&self) -> &str {
		&self.environment
	}

	fn client(&self) -> Result<&DevCycleClient> {
		self.client.as_ref().ok_or_else(|| {
			PluginError::config_invalid(
				PLUGIN_NAME,
				"client not configured; ensure clientId and clientSecret are provided",
			)
		})
	}

	/// Fetches remote variables as flags. Variables of unsupported types are
	/// skipped; `view` decides what happens to defaults that do not fit.
	async fn fetch_remote(&self, ctx: &OperationContext, view: RemoteView) -> Result<Flagset> {
		let client = self.client()?;
		let variables = ctx
			.run(async {
				client
					.get_variables(&self.project)
					.await
					.map_err(PluginError::from)
			})
			.await?;

		let total = variables.len();
		let flags: Flagset = variables
			.into_iter()
			.filter_map(|v| variable_to_flag(v, view))
			.collect();
		debug!(
			project = %self.project,
			environment = %self.environment,
			variables = total,
			flags = flags.len(),
			"converted DevCycle variables"
		);
		Ok(flags)
	}
}

#[async_trait]
impl SyncPlugin for DevCyclePlugin {
	fn metadata(&self) -> PluginMetadata {
		PluginMetadata {
			name: PLUGIN_NAME.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			description: "Syncs flags with the DevCycle feature management platform".to_string(),
			stability: Stability::Beta,
			capabilities: vec![Capability::Pull, Capability::Push, Capability::Compare],
			config_schema: Some(
				ConfigSchema::new()
					.required_property("project", ConfigProperty::string("DevCycle project key"))
					.required_property(
						"clientId",
						ConfigProperty::string("DevCycle OAuth client ID")
							.with_env_var("DEVCYCLE_CLIENT_ID"),
					)
					.required_property(
						"clientSecret",
						ConfigProperty::string("DevCycle OAuth client secret")
							.with_env_var("DEVCYCLE_CLIENT_SECRET")
							.sensitive(),
					)
					.property(
						"environment",
						ConfigProperty::string("Target environment for sync operations")
							.with_default(DEFAULT_ENVIRONMENT),
					),
			),
		}
	}

	/// Missing credentials leave the client unset; `validate_config` reports
	/// which field is absent.
	fn configure(&mut self, config: PluginConfig) -> Result<()> {
		self.project = config.custom_str("project").unwrap_or_default().to_string();
		self.environment = config
			.custom_str("environment")
			.unwrap_or(DEFAULT_ENVIRONMENT)
			.to_string();
		self.client_id = config.custom_str("clientId").unwrap_or_default().to_string();
		self.client_secret = config.custom_str("clientSecret").map(SecretString::from);

		self.client = match &self.client_secret {
			Some(secret) if !self.client_id.is_empty() => {
				let mut builder = DevCycleClient::builder(self.client_id.clone(), secret.clone());
				if let Some(auth_url) = config.custom_str("authUrl") {
					builder = builder.auth_url(auth_url);
				}
				if !config.base_url.is_empty() {
					builder = builder.api_url(config.base_url.clone());
				}
				Some(builder.build()?)
			}
			_ => None,
		};
		Ok(())
	}

	fn validate_config(&self) -> Result<()> {
		let missing = if self.project.is_empty() {
			Some("project")
		} else if self.client_id.is_empty() {
			Some("clientId")
		} else if self.client_secret.is_none() {
			Some("clientSecret")
		} else {
			None
		};
		if let Some(field) = missing {
			return Err(PluginError::config_invalid(
				PLUGIN_NAME,
				format!("{field} is required"),
			));
		}
		self.client().map(|_| ())
	}

	async fn pull(&self, opts: &PullOptions) -> Result<Flagset> {
		self.validate_config()?;
		self.fetch_remote(&opts.ctx, RemoteView::Manifest).await
	}

	async fn push(&self, local: &Flagset, opts: &PushOptions) -> Result<PushResult> {
		self.validate_config()?;
		let remote = self.fetch_remote(&opts.ctx, RemoteView::Reconcile).await?;
		let remote = align_numbers(local, remote);
		debug!(
			project = %self.project,
			local = local.len(),
			remote = remote.len(),
			dry_run = opts.dry_run,
			"pushing flags to DevCycle"
		);

		let mutator = DevCycleMutator {
			client: self.client()?,
			project: &self.project,
		};
		apply_push(local, &remote, &mutator, opts).await
	}

	async fn compare(&self, local: &Flagset, opts: &CompareOptions) -> Result<CompareResult> {
		self.validate_config()?;
		let remote = self.fetch_remote(&opts.ctx, RemoteView::Reconcile).await?;
		let remote = align_numbers(local, remote);
		Ok(compare(local, &remote))
	}
}

struct DevCycleMutator<'a> {
	client: &'a DevCycleClient,
	project: &'a str,
}

#[async_trait]
impl FlagMutator for DevCycleMutator<'_> {
	async fn create_flag(&self, flag: &Flag) -> Result<()> {
		self.client
			.create_feature_with_variable(self.project, &flag_to_variable(flag))
			.await
			.map_err(PluginError::from)
	}

	/// The variable PATCH carries only the description. A changed default is
	/// reported as updated but stays as it is on the remote.
	async fn update_flag(&self, local: &Flag, remote: &Flag) -> Result<()> {
		if local.default_value.render() != remote.default_value.render() {
			warn!(
				flag = %local.key,
				local = %local.default_value,
				remote = %remote.default_value,
				"DevCycle variable default differs; only the description is updated"
			);
		}
		self.client
			.update_variable(self.project, &local.key, &flag_to_variable(local))
			.await
			.map_err(PluginError::from)
	}
}

pub fn flag_type_for(variable_type: &str) -> Option<FlagType> {
	match variable_type {
		TYPE_BOOLEAN => Some(FlagType::Boolean),
		TYPE_STRING => Some(FlagType::String),
		TYPE_NUMBER => Some(FlagType::Float),
		TYPE_JSON => Some(FlagType::Object),
		_ => None,
	}
}

pub fn variable_type_for(flag_type: FlagType) -> &'static str {
	match flag_type {
		FlagType::Boolean => TYPE_BOOLEAN,
		FlagType::String => TYPE_STRING,
		FlagType::Integer | FlagType::Float => TYPE_NUMBER,
		FlagType::Object => TYPE_JSON,
	}
}

/// How remote variables whose default does not fit their type are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteView {
	/// For writing to the manifest: a missing default takes the type's zero
	/// value and a mismatched default drops the variable.
	Manifest,
	/// For reconciliation: the raw default is kept as an opaque value, so the
	/// key still matches its local flag and never compares equal by accident.
	Reconcile,
}

/// Converts a remote variable. Unsupported types are skipped with a warning.
fn variable_to_flag(variable: Variable, view: RemoteView) -> Option<Flag> {
	let Some(flag_type) = flag_type_for(&variable.variable_type) else {
		warn!(
			variable = %variable.key,
			variable_type = %variable.variable_type,
			"skipping DevCycle variable of unsupported type"
		);
		return None;
	};

	let raw = variable.default_value.unwrap_or(Value::Null);
	let converted = FlagValue::from_json(&variable.key, flag_type, raw.clone());
	let default_value = match (converted, view) {
		(Ok(value), _) => value,
		(Err(_), RemoteView::Manifest) if raw.is_null() => FlagValue::zero(flag_type),
		(Err(e), RemoteView::Manifest) => {
			warn!(variable = %variable.key, error = %e, "skipping DevCycle variable");
			return None;
		}
		(Err(e), RemoteView::Reconcile) => {
			debug!(variable = %variable.key, error = %e, "keeping raw DevCycle default");
			FlagValue::Object(raw)
		}
	};

	Some(Flag {
		key: variable.key,
		description: variable.description,
		default_value,
		expiry: None,
	})
}

fn flag_to_variable(flag: &Flag) -> Variable {
	Variable {
		key: flag.key.clone(),
		variable_type: variable_type_for(flag.flag_type()).to_string(),
		description: flag.description.clone(),
		default_value: Some(flag.default_value.to_json()),
		..Default::default()
	}
}

/// DevCycle stores every number as `Number`. Where the local flag is an
/// integer and the remote value is integral, read it back as an integer so
/// unchanged integer flags compare equal.
fn align_numbers(local: &Flagset, remote: Flagset) -> Flagset {
	remote
		.into_iter()
		.map(|mut flag| {
			if let FlagValue::Float(f) = flag.default_value {
				let local_is_integer = local
					.get(&flag.key)
					.is_some_and(|l| l.flag_type() == FlagType::Integer);
				if local_is_integer && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
					flag.default_value = FlagValue::Integer(f as i64);
				}
			}
			flag
		})
		.collect()
}
