// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plain-text and JSON output for command results.

use std::fmt::Write;

use flagsync_core::{Flag, FlagRecord};
use flagsync_plugin::{CompareResult, PluginInfo, PluginMetadata, PushResult};
use serde_json::{json, Value};

pub fn plugin_list(plugins: &[PluginInfo]) -> String {
	if plugins.is_empty() {
		return "No plugins registered.\n".to_string();
	}

	let mut out = String::new();
	let _ = writeln!(out, "{:<16} {:<14} DESCRIPTION", "NAME", "STABILITY");
	for info in plugins {
		let _ = writeln!(
			out,
			"{:<16} {:<14} {}",
			info.name,
			info.stability.to_string(),
			info.description
		);
	}
	out
}

pub fn plugin_info(metadata: &PluginMetadata) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Plugin:      {}", metadata.name);
	let _ = writeln!(out, "Version:     {}", metadata.version);
	let _ = writeln!(out, "Stability:   {}", metadata.stability);
	let _ = writeln!(out, "Description: {}", metadata.description);

	let _ = writeln!(out, "\nCapabilities:");
	for capability in &metadata.capabilities {
		let _ = writeln!(out, "  {:<10} {}", capability.as_str(), capability.description());
	}

	if let Some(schema) = metadata.config_schema.as_ref().filter(|s| !s.properties.is_empty()) {
		let _ = writeln!(out, "\nConfiguration:");
		for (name, property) in &schema.properties {
			let mut markers = Vec::new();
			if schema.is_required(name) {
				markers.push("required".to_string());
			}
			if let Some(env) = &property.env_var {
				markers.push(format!("env: {env}"));
			}
			if let Some(default) = &property.default {
				markers.push(format!("default: {}", display_json(default)));
			}
			if property.sensitive {
				markers.push("sensitive".to_string());
			}

			let _ = write!(out, "  {name} ({}): {}", property.property_type, property.description);
			if !markers.is_empty() {
				let _ = write!(out, " [{}]", markers.join(", "));
			}
			out.push('\n');
		}
	}
	out
}

pub fn push_result(result: &PushResult, dry_run: bool) -> String {
	let mut out = String::new();
	let prefix = if dry_run { "DRY RUN: Would " } else { "" };

	if !result.created.is_empty() {
		let verb = if dry_run { "create" } else { "Created" };
		let _ = writeln!(out, "{prefix}{verb} {}:", count(result.created.len()));
		for flag in &result.created {
			let _ = writeln!(out, "  + {}", flag_line(flag));
		}
	}

	if !result.updated.is_empty() {
		let verb = if dry_run { "update" } else { "Updated" };
		let _ = writeln!(out, "{prefix}{verb} {}:", count(result.updated.len()));
		for flag in &result.updated {
			let _ = writeln!(out, "  ~ {}", flag_line(flag));
		}
	}

	if !result.has_changes() {
		let _ = writeln!(out, "Remote is up to date.");
	}
	let _ = writeln!(out, "Unchanged: {}", result.unchanged.len());

	if result.has_errors() {
		let _ = writeln!(out, "\nWarning: {} failed:", count(result.errors.len()));
		for failure in &result.errors {
			let _ = writeln!(out, "  ! {} ({}): {}", failure.key, failure.action, failure.error);
		}
	}
	out
}

pub fn compare_result(result: &CompareResult) -> String {
	let mut out = String::new();

	if !result.has_differences() {
		let _ = writeln!(
			out,
			"No differences ({} unchanged).",
			count(result.unchanged.len())
		);
		return out;
	}

	if !result.added.is_empty() {
		let _ = writeln!(out, "Added (local only):");
		for flag in &result.added {
			let _ = writeln!(out, "  + {}", flag_line(flag));
		}
	}

	if !result.modified.is_empty() {
		let _ = writeln!(out, "Modified:");
		for diff in &result.modified {
			let _ = writeln!(
				out,
				"  ~ {}: {} -> {}",
				diff.key, diff.local.default_value, diff.remote.default_value
			);
			if diff.local.description != diff.remote.description {
				let _ = writeln!(
					out,
					"      description: {:?} -> {:?}",
					diff.local.description, diff.remote.description
				);
			}
		}
	}

	if !result.removed.is_empty() {
		let _ = writeln!(out, "Removed (remote only):");
		for flag in &result.removed {
			let _ = writeln!(out, "  - {}", flag_line(flag));
		}
	}

	let _ = writeln!(out, "Unchanged: {}", result.unchanged.len());
	out
}

pub fn compare_json(result: &CompareResult) -> Value {
	let records =
		|flags: &[Flag]| -> Vec<FlagRecord> { flags.iter().map(FlagRecord::from).collect() };
	json!({
		"added": records(&result.added),
		"modified": result
			.modified
			.iter()
			.map(|d| json!({
				"key": d.key,
				"local": FlagRecord::from(&d.local),
				"remote": FlagRecord::from(&d.remote),
			}))
			.collect::<Vec<_>>(),
		"removed": records(&result.removed),
		"unchanged": result.unchanged.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
	})
}

fn flag_line(flag: &Flag) -> String {
	format!("{} ({}) = {}", flag.key, flag.flag_type(), flag.default_value)
}

fn count(n: usize) -> String {
	if n == 1 {
		"1 flag".to_string()
	} else {
		format!("{n} flags")
	}
}

fn display_json(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
