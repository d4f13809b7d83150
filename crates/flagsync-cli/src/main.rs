// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! flagsync - sync a local flag manifest with a remote flag backend.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flagsync_config::{load_config, CliOverrides, LogFormat, LogLevel, LoggingConfig, SyncConfig};
use flagsync_core::SecretString;
use flagsync_plugin::{OperationContext, PluginRegistry, SyncService};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod plugins;
mod render;

use commands::SyncCommand;

/// Sync feature flags between a local manifest and a remote backend
#[derive(Parser, Debug)]
#[command(name = "flagsync", version, about, long_about = None)]
struct Args {
	/// Path to a config file (replaces ./.flagsync.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Path to the local flag manifest
	#[arg(short, long, global = true)]
	manifest: Option<PathBuf>,

	/// Plugin to sync through
	#[arg(short, long, global = true)]
	plugin: Option<String>,

	/// Base URL of the remote flag API
	#[arg(long, global = true)]
	base_url: Option<String>,

	/// Bearer token for the remote flag API
	#[arg(long, env = "FLAGSYNC_AUTH_TOKEN", hide_env_values = true, global = true)]
	auth_token: Option<String>,

	/// Operation timeout in seconds
	#[arg(long, global = true)]
	timeout: Option<u64>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Inspect registered plugins
	Plugin {
		#[command(subcommand)]
		command: PluginCommand,
	},
	/// Fetch remote flags and write them to the manifest
	Pull,
	/// Create and update remote flags from the manifest
	Push {
		/// Show what would change without changing anything
		#[arg(long)]
		dry_run: bool,
	},
	/// Show how the manifest differs from the remote
	Compare {
		/// Print the result as JSON
		#[arg(long)]
		json: bool,
	},
}

#[derive(Subcommand, Debug)]
enum PluginCommand {
	/// List registered plugins
	List,
	/// Show a plugin's capabilities and configuration options
	Info { name: String },
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			manifest: args.manifest.clone(),
			plugin: args.plugin.clone(),
			base_url: args.base_url.clone(),
			auth_token: args
				.auth_token
				.clone()
				.filter(|t| !t.is_empty())
				.map(SecretString::new),
			timeout_secs: args.timeout,
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then(|| "json".to_string()),
		}
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!("flagsync={}", log_level_to_tracing(logging.level)))
	});

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

/// Cancels `ctx` on Ctrl-C.
fn cancel_on_ctrl_c(ctx: &OperationContext) {
	let token = ctx.token().clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("interrupt received, cancelling");
			token.cancel();
		}
	});
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let args = Args::parse();

	let config = load_config(args.config.clone(), CliOverrides::from(&args))
		.context("failed to load configuration")?;

	init_tracing(&config.logging);
	debug!(
		manifest = %config.manifest_path.display(),
		plugin = config.plugin.as_deref().unwrap_or(commands::DEFAULT_PLUGIN),
		timeout = ?config.request_timeout,
		"resolved configuration"
	);

	let registry = PluginRegistry::new();
	plugins::register_builtin_plugins(&registry).context("failed to register plugins")?;
	let service = SyncService::new(&registry);

	match args.command {
		Command::Plugin {
			command: PluginCommand::List,
		} => Ok(commands::plugin_list(&service)),
		Command::Plugin {
			command: PluginCommand::Info { name },
		} => commands::plugin_info(&service, &name),
		Command::Pull => sync_command(service, config).pull().await,
		Command::Push { dry_run } => sync_command(service, config).push(dry_run).await,
		Command::Compare { json } => sync_command(service, config).compare(json).await,
	}
}

fn sync_command(service: SyncService<'_>, config: SyncConfig) -> SyncCommand<'_> {
	let ctx = OperationContext::new().with_timeout(config.request_timeout);
	cancel_on_ctrl_c(&ctx);
	SyncCommand {
		service,
		config,
		ctx,
	}
}
