// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Interrupted;

/// Cancellation and deadline carried by every plugin operation.
///
/// Clones share the same cancellation token, so cancelling the context held
/// by a signal handler aborts requests running under any clone.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
	token: CancellationToken,
	deadline: Option<Instant>,
}

impl OperationContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(token: CancellationToken) -> Self {
		Self {
			token,
			deadline: None,
		}
	}

	/// Sets a deadline `timeout` from now, keeping any earlier deadline.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(existing) => existing.min(deadline),
			None => deadline,
		});
		self
	}

	pub fn token(&self) -> &CancellationToken {
		&self.token
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn cancel(&self) {
		self.token.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	pub fn check(&self) -> Result<(), Interrupted> {
		if self.token.is_cancelled() {
			return Err(Interrupted::Cancelled);
		}
		match self.deadline {
			Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
			_ => Ok(()),
		}
	}

	/// Drives `fut` until it completes, the context is cancelled, or the
	/// deadline passes. The future is dropped on interruption, which aborts
	/// any request it had in flight.
	pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
	where
		F: Future<Output = Result<T, E>>,
		E: From<Interrupted>,
	{
		self.check()?;

		let deadline = async {
			match self.deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = self.token.cancelled() => Err(Interrupted::Cancelled.into()),
			_ = deadline => Err(Interrupted::DeadlineExceeded.into()),
			result = fut => result,
		}
	}
}
