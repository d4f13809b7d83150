// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local/remote reconciliation shared by every backend.
//!
//! Flags are matched by key. Two flags are the same when key, type and
//! description match and their default values render to the same string
//! (see [`FlagValue::render`](flagsync_core::FlagValue::render)).

use std::collections::HashMap;

use async_trait::async_trait;
use flagsync_core::{Flag, Flagset};
use tracing::{debug, warn};

use crate::error::{PluginError, PushAction, PushFailure, Result};
use crate::plugin::{CompareResult, FlagDiff, PushOptions, PushResult};

pub fn flags_equal(a: &Flag, b: &Flag) -> bool {
	a.key == b.key
		&& a.flag_type() == b.flag_type()
		&& a.description == b.description
		&& a.default_value.render() == b.default_value.render()
}

/// Diffs `local` against `remote`.
///
/// Added, modified and unchanged follow local order; removed follows remote
/// order.
pub fn compare(local: &Flagset, remote: &Flagset) -> CompareResult {
	let remote_by_key = index(remote);
	let mut result = CompareResult::default();

	for flag in local {
		match remote_by_key.get(flag.key.as_str()) {
			None => result.added.push(flag.clone()),
			Some(remote_flag) if flags_equal(flag, remote_flag) => {
				result.unchanged.push(flag.clone())
			}
			Some(remote_flag) => result.modified.push(FlagDiff {
				key: flag.key.clone(),
				local: flag.clone(),
				remote: (*remote_flag).clone(),
			}),
		}
	}

	let local_by_key = index(local);
	result.removed = remote
		.iter()
		.filter(|f| !local_by_key.contains_key(f.key.as_str()))
		.cloned()
		.collect();

	result
}

/// One planned step of a push, in local flagset order.
#[derive(Debug, Clone, PartialEq)]
pub enum PushStep {
	Create(Flag),
	Update { local: Flag, remote: Flag },
	Unchanged(Flag),
}

impl PushStep {
	pub fn key(&self) -> &str {
		match self {
			PushStep::Create(flag) | PushStep::Unchanged(flag) => &flag.key,
			PushStep::Update { local, .. } => &local.key,
		}
	}
}

/// Classifies every local flag. Remote-only flags are ignored; push never
/// deletes.
pub fn plan_push(local: &Flagset, remote: &Flagset) -> Vec<PushStep> {
	let remote_by_key = index(remote);
	local
		.iter()
		.map(|flag| match remote_by_key.get(flag.key.as_str()) {
			None => PushStep::Create(flag.clone()),
			Some(remote_flag) if flags_equal(flag, remote_flag) => {
				PushStep::Unchanged(flag.clone())
			}
			Some(remote_flag) => PushStep::Update {
				local: flag.clone(),
				remote: (*remote_flag).clone(),
			},
		})
		.collect()
}

/// The mutating half of a backend, driven by [`apply_push`].
#[async_trait]
pub trait FlagMutator: Send + Sync {
	async fn create_flag(&self, flag: &Flag) -> Result<()>;

	async fn update_flag(&self, local: &Flag, remote: &Flag) -> Result<()>;
}

/// Replays the push plan against `mutator`.
///
/// Steps run sequentially in key order. A failed create or update is recorded
/// in [`PushResult::errors`] and the push moves on to the next flag. Only an
/// interrupted context aborts the whole push.
pub async fn apply_push<M>(
	local: &Flagset,
	remote: &Flagset,
	mutator: &M,
	opts: &PushOptions,
) -> Result<PushResult>
where
	M: FlagMutator + ?Sized,
{
	let mut result = PushResult::default();

	for step in plan_push(local, remote) {
		match step {
			PushStep::Unchanged(flag) => result.unchanged.push(flag),
			PushStep::Create(flag) => {
				if opts.dry_run {
					result.created.push(flag);
					continue;
				}
				debug!(flag = %flag.key, "creating flag");
				match opts.ctx.run(mutator.create_flag(&flag)).await {
					Ok(()) => result.created.push(flag),
					Err(e) if e.is_interrupted() => return Err(e),
					Err(e) => record_failure(&mut result, flag.key, PushAction::Create, e),
				}
			}
			PushStep::Update { local, remote } => {
				if opts.dry_run {
					result.updated.push(local);
					continue;
				}
				debug!(flag = %local.key, "updating flag");
				match opts.ctx.run(mutator.update_flag(&local, &remote)).await {
					Ok(()) => result.updated.push(local),
					Err(e) if e.is_interrupted() => return Err(e),
					Err(e) => record_failure(&mut result, local.key, PushAction::Update, e),
				}
			}
		}
	}

	Ok(result)
}

fn record_failure(result: &mut PushResult, key: String, action: PushAction, error: PluginError) {
	warn!(flag = %key, %action, error = %error, "push failed for flag");
	result.errors.push(PushFailure { key, action, error });
}

fn index(set: &Flagset) -> HashMap<&str, &Flag> {
	set.iter().map(|f| (f.key.as_str(), f)).collect()
}
