// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::ExitCode;

use anyhow::{Context, Result};
use flagsync_config::SyncConfig;
use flagsync_core::{load_flagset, save_flagset, Flagset};
use flagsync_plugin::{
	CompareOptions, OperationContext, PluginConfig, PullOptions, PushOptions, SyncService,
};
use tracing::{info, warn};

use crate::render;

/// Plugin used when neither config nor `--plugin` names one.
pub const DEFAULT_PLUGIN: &str = "default";

/// Everything a sync command needs, resolved once in `main`.
pub struct SyncCommand<'a> {
	pub service: SyncService<'a>,
	pub config: SyncConfig,
	pub ctx: OperationContext,
}

impl SyncCommand<'_> {
	fn plugin_name(&self) -> &str {
		self.config.plugin.as_deref().unwrap_or(DEFAULT_PLUGIN)
	}

	fn plugin_config(&self) -> Result<PluginConfig> {
		let name = self.plugin_name();
		let metadata = self
			.service
			.describe_plugin(name)
			.with_context(|| format!("failed to resolve plugin {name:?}"))?;
		Ok(self
			.config
			.plugin_config(name, metadata.config_schema.as_ref()))
	}

	fn load_local(&self) -> Result<Flagset> {
		let path = &self.config.manifest_path;
		load_flagset(path).with_context(|| format!("failed to load manifest {}", path.display()))
	}

	pub async fn pull(&self) -> Result<ExitCode> {
		let name = self.plugin_name();
		let opts = PullOptions {
			ctx: self.ctx.clone(),
		};
		let flags = self
			.service
			.pull(name, self.plugin_config()?, &opts)
			.await
			.context("pull failed")?;

		let path = &self.config.manifest_path;
		save_flagset(path, &flags)
			.with_context(|| format!("failed to write manifest {}", path.display()))?;

		info!(path = %path.display(), flags = flags.len(), "wrote manifest");
		println!("Pulled {} flags into {}", flags.len(), path.display());
		Ok(ExitCode::SUCCESS)
	}

	pub async fn push(&self, dry_run: bool) -> Result<ExitCode> {
		let local = self.load_local()?;
		let opts = PushOptions {
			ctx: self.ctx.clone(),
			dry_run,
		};
		let result = self
			.service
			.push(self.plugin_name(), self.plugin_config()?, &local, &opts)
			.await
			.context("push failed")?;

		print!("{}", render::push_result(&result, dry_run));

		if result.has_errors() {
			warn!(errors = result.errors.len(), "push finished with errors");
			return Ok(ExitCode::FAILURE);
		}
		Ok(ExitCode::SUCCESS)
	}

	pub async fn compare(&self, json: bool) -> Result<ExitCode> {
		let local = self.load_local()?;
		let opts = CompareOptions {
			ctx: self.ctx.clone(),
		};
		let result = self
			.service
			.compare(self.plugin_name(), self.plugin_config()?, &local, &opts)
			.await
			.context("compare failed")?;

		if json {
			let out = serde_json::to_string_pretty(&render::compare_json(&result))
				.context("failed to encode compare result")?;
			println!("{out}");
		} else {
			print!("{}", render::compare_result(&result));
		}
		Ok(ExitCode::SUCCESS)
	}
}

pub fn plugin_list(service: &SyncService<'_>) -> ExitCode {
	print!("{}", render::plugin_list(&service.registry().get_all()));
	ExitCode::SUCCESS
}

pub fn plugin_info(service: &SyncService<'_>, name: &str) -> Result<ExitCode> {
	let metadata = service
		.describe_plugin(name)
		.with_context(|| format!("failed to describe plugin {name:?}"))?;
	print!("{}", render::plugin_info(&metadata));
	Ok(ExitCode::SUCCESS)
}
