// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for flagsync.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header
//! - A status check that keeps the response body of failed requests

mod client;
mod status;

pub use client::{builder, new_client_with_timeout, user_agent};
pub use status::{error_for_status, HttpStatusError};
