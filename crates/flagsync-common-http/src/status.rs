// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::error;

/// A non-2xx response, with the body kept verbatim.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status}: {body}")]
pub struct HttpStatusError {
	pub status: StatusCode,
	pub body: String,
}

/// Passes 2xx responses through. Any other status is consumed into an
/// [`HttpStatusError`] carrying the body text.
pub async fn error_for_status(response: Response) -> Result<Response, HttpStatusError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}

	let url = response.url().clone();
	let body = response
		.text()
		.await
		.unwrap_or_else(|e| format!("<failed to read body: {e}>"));
	error!(%url, status = status.as_u16(), "request failed");
	Err(HttpStatusError { status, body })
}
