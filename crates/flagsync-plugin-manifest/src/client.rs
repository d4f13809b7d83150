// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the REST manifest API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | pull      | `GET {base}/manifest` |
//! | create    | `POST {base}/manifest/flags` |
//! | update    | `PUT {base}/manifest/flags/{key}` |

use std::time::Duration;

use flagsync_common_http::error_for_status;
use flagsync_core::{parse_flagset, Flag, FlagRecord, Flagset, SecretString};
use reqwest::{Client, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::error::{ManifestClientError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ManifestClient {
	http: Client,
	base_url: Url,
	auth_token: Option<SecretString>,
}

impl ManifestClient {
	pub fn new(base_url: &str, auth_token: Option<SecretString>) -> Result<Self> {
		Self::with_timeout(base_url, auth_token, DEFAULT_TIMEOUT)
	}

	pub fn with_timeout(
		base_url: &str,
		auth_token: Option<SecretString>,
		timeout: Duration,
	) -> Result<Self> {
		let invalid = |message: String| ManifestClientError::InvalidBaseUrl {
			url: base_url.to_string(),
			message,
		};
		let parsed =
			Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
		if parsed.cannot_be_a_base() {
			return Err(invalid("URL cannot be used as a base".to_string()));
		}

		let http = flagsync_common_http::new_client_with_timeout(timeout)?;

		Ok(Self {
			http,
			base_url: parsed,
			auth_token: auth_token.filter(|t| !t.is_empty()),
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base_url.clone();
		// cannot_be_a_base was rejected in the constructor.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}
		url
	}

	fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		match &self.auth_token {
			Some(token) => request.bearer_auth(token.expose()),
			None => request,
		}
	}

	pub async fn pull_flags(&self) -> Result<Flagset> {
		let url = self.endpoint(&["manifest"]);
		debug!(url = %url, "fetching manifest");

		let response = self.authorize(self.http.get(url)).send().await?;
		let body = error_for_status(response).await?.text().await?;
		let flags = parse_flagset(&body)?;

		debug!(flags = flags.len(), "fetched manifest");
		Ok(flags)
	}

	pub async fn create_flag(&self, flag: &Flag) -> Result<()> {
		let url = self.endpoint(&["manifest", "flags"]);
		debug!(url = %url, flag = %flag.key, "creating flag");

		let response = self
			.authorize(self.http.post(url))
			.json(&FlagRecord::from(flag))
			.send()
			.await?;
		error_for_status(response).await?;
		Ok(())
	}

	pub async fn update_flag(&self, flag: &Flag) -> Result<()> {
		let url = self.endpoint(&["manifest", "flags", &flag.key]);
		debug!(url = %url, flag = %flag.key, "updating flag");

		let response = self
			.authorize(self.http.put(url))
			.json(&FlagRecord::from(flag))
			.send()
			.await?;
		error_for_status(response).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_appends_segments_to_base_path() {
		let client =
			ManifestClient::new("https://flags.example.com/openfeature/v0/", None).unwrap();
		assert_eq!(
			client.endpoint(&["manifest", "flags", "new checkout"]).as_str(),
			"https://flags.example.com/openfeature/v0/manifest/flags/new%20checkout"
		);
	}

	#[test]
	fn key_with_slash_stays_one_segment() {
		let client = ManifestClient::new("http://localhost:8080", None).unwrap();
		assert_eq!(
			client.endpoint(&["manifest", "flags", "team/flag"]).path(),
			"/manifest/flags/team%2Fflag"
		);
	}

	#[test]
	fn rejects_unparseable_base_url() {
		let err = ManifestClient::new("not a url", None).unwrap_err();
		assert!(matches!(err, ManifestClientError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn rejects_non_base_url() {
		let err = ManifestClient::new("mailto:flags@example.com", None).unwrap_err();
		assert!(matches!(err, ManifestClientError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn empty_token_is_dropped() {
		let client = ManifestClient::new("http://localhost", Some(SecretString::from(""))).unwrap();
		assert!(client.auth_token.is_none());
	}
}
