// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use flagsync_core::{Flag, Flagset, SecretString};
use flagsync_plugin::{
	apply_push, compare, Capability, CompareOptions, CompareResult, ConfigProperty, ConfigSchema,
	FlagMutator, OperationContext, PluginConfig, PluginError, PluginMetadata, PullOptions,
	PushOptions, PushResult, Result, Stability, SyncPlugin,
};
use tracing::debug;

use crate::client::ManifestClient;

pub const PLUGIN_NAME: &str = "default";

const BASE_URL_PROPERTY: &str = "baseUrl";
const AUTH_TOKEN_PROPERTY: &str = "authToken";

/// Syncs against the REST manifest API.
#[derive(Debug, Default)]
pub struct ManifestPlugin {
	config: PluginConfig,
	client: Option<ManifestClient>,
}

impl ManifestPlugin {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn boxed() -> Box<dyn SyncPlugin> {
		Box::new(Self::new())
	}

	fn client(&self) -> Result<&ManifestClient> {
		self.client
			.as_ref()
			.ok_or_else(|| PluginError::config_invalid(PLUGIN_NAME, "plugin is not configured"))
	}

	async fn fetch_remote(&self, ctx: &OperationContext) -> Result<Flagset> {
		let client = self.client()?;
		ctx.run(async { client.pull_flags().await.map_err(PluginError::from) })
			.await
	}
}

#[async_trait]
impl SyncPlugin for ManifestPlugin {
	fn metadata(&self) -> PluginMetadata {
		PluginMetadata {
			name: PLUGIN_NAME.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			description: "Syncs flags with a REST manifest management API".to_string(),
			stability: Stability::Stable,
			capabilities: vec![Capability::Pull, Capability::Push, Capability::Compare],
			config_schema: Some(
				ConfigSchema::new()
					.property(
						"baseUrl",
						ConfigProperty::string("Base URL of the manifest management API"),
					)
					.property(
						"authToken",
						ConfigProperty::string("Bearer token for API authentication")
							.with_env_var("FLAGSYNC_AUTH_TOKEN")
							.sensitive(),
					),
			),
		}
	}

	/// `[plugins.default]` settings apply when the shared sync settings are unset.
	fn configure(&mut self, mut config: PluginConfig) -> Result<()> {
		if config.base_url.is_empty() {
			if let Some(base_url) = config.custom_str(BASE_URL_PROPERTY).map(str::to_string) {
				config.base_url = base_url;
			}
		}
		if config.auth_token.is_none() {
			config.auth_token = config
				.custom_str(AUTH_TOKEN_PROPERTY)
				.map(SecretString::from);
		}

		self.client = if config.base_url.is_empty() {
			None
		} else {
			Some(ManifestClient::new(&config.base_url, config.auth_token.clone())?)
		};
		self.config = config;
		Ok(())
	}

	fn validate_config(&self) -> Result<()> {
		if self.config.base_url.is_empty() {
			return Err(PluginError::config_invalid(PLUGIN_NAME, "baseUrl is required"));
		}
		Ok(())
	}

	async fn pull(&self, opts: &PullOptions) -> Result<Flagset> {
		debug!(plugin = PLUGIN_NAME, "pulling flags");
		self.fetch_remote(&opts.ctx).await
	}

	async fn push(&self, local: &Flagset, opts: &PushOptions) -> Result<PushResult> {
		let remote = self.fetch_remote(&opts.ctx).await?;
		debug!(
			plugin = PLUGIN_NAME,
			local = local.len(),
			remote = remote.len(),
			dry_run = opts.dry_run,
			"pushing flags"
		);
		apply_push(local, &remote, self.client()?, opts).await
	}

	async fn compare(&self, local: &Flagset, opts: &CompareOptions) -> Result<CompareResult> {
		let remote = self.fetch_remote(&opts.ctx).await?;
		Ok(compare(local, &remote))
	}
}

#[async_trait]
impl FlagMutator for ManifestClient {
	async fn create_flag(&self, flag: &Flag) -> Result<()> {
		ManifestClient::create_flag(self, flag)
			.await
			.map_err(PluginError::from)
	}

	async fn update_flag(&self, local: &Flag, _remote: &Flag) -> Result<()> {
		ManifestClient::update_flag(self, local)
			.await
			.map_err(PluginError::from)
	}
}
