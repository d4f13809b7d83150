// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! DevCycle management API client with a cached client-credentials token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use flagsync_common_http::error_for_status;
use flagsync_core::SecretString;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::error::{DevCycleError, Result};
use crate::types::{feature_for_variable, TokenResponse, Variable, VariableUpdate};

pub const DEFAULT_AUTH_URL: &str = "https://auth.devcycle.com/oauth/token";
pub const DEFAULT_API_URL: &str = "https://api.devcycle.com";
pub const AUDIENCE: &str = "https://api.devcycle.com/";

/// Tokens are treated as expired this long before the server says they are.
pub const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
	access: SecretString,
	expires_at: DateTime<Utc>,
}

impl CachedToken {
	fn is_valid(&self) -> bool {
		Utc::now() < self.expires_at
	}
}

pub struct DevCycleClientBuilder {
	client_id: String,
	client_secret: SecretString,
	auth_url: String,
	api_url: String,
	timeout: Duration,
}

impl DevCycleClientBuilder {
	/// Overrides the OAuth token endpoint.
	pub fn auth_url(mut self, url: impl Into<String>) -> Self {
		self.auth_url = url.into();
		self
	}

	/// Overrides the management API base URL.
	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.api_url = url.into();
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn build(self) -> Result<DevCycleClient> {
		if self.client_id.is_empty() || self.client_secret.is_empty() {
			return Err(DevCycleError::MissingCredentials);
		}

		let auth_url = parse_url(&self.auth_url)?;
		let api_url = parse_url(self.api_url.trim_end_matches('/'))?;
		if api_url.cannot_be_a_base() {
			return Err(DevCycleError::InvalidUrl {
				url: self.api_url,
				message: "URL cannot be used as a base".to_string(),
			});
		}

		let http = flagsync_common_http::new_client_with_timeout(self.timeout)?;

		debug!(auth_url = %auth_url, api_url = %api_url, "DevCycle client initialized");

		Ok(DevCycleClient {
			http,
			auth_url,
			api_url,
			client_id: self.client_id,
			client_secret: self.client_secret,
			token: RwLock::new(None),
		})
	}
}

fn parse_url(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|e| DevCycleError::InvalidUrl {
		url: raw.to_string(),
		message: e.to_string(),
	})
}

/// Client for the DevCycle management API.
///
/// Every request first makes sure a valid access token is cached, so a
/// long-lived client re-authenticates on its own when the token expires.
#[derive(Debug)]
pub struct DevCycleClient {
	http: Client,
	auth_url: Url,
	api_url: Url,
	client_id: String,
	client_secret: SecretString,
	token: RwLock<Option<CachedToken>>,
}

impl DevCycleClient {
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<SecretString>,
	) -> DevCycleClientBuilder {
		DevCycleClientBuilder {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			auth_url: DEFAULT_AUTH_URL.to_string(),
			api_url: DEFAULT_API_URL.to_string(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Seeds the token cache, replacing any cached token.
	pub async fn set_token(&self, access: impl Into<SecretString>, expires_at: DateTime<Utc>) {
		*self.token.write().await = Some(CachedToken {
			access: access.into(),
			expires_at,
		});
	}

	pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
		self.token.read().await.as_ref().map(|t| t.expires_at)
	}

	/// Returns a valid access token, exchanging client credentials when the
	/// cached one is missing or expired.
	async fn authenticate(&self) -> Result<SecretString> {
		{
			let cached = self.token.read().await;
			if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
				return Ok(token.access.clone());
			}
		}

		let mut cached = self.token.write().await;

		// Another caller may have refreshed while we waited for the write lock.
		if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
			return Ok(token.access.clone());
		}

		debug!(auth_url = %self.auth_url, "requesting DevCycle access token");

		let response = self
			.http
			.post(self.auth_url.clone())
			.form(&[
				("grant_type", "client_credentials"),
				("client_id", self.client_id.as_str()),
				("client_secret", self.client_secret.expose()),
				("audience", AUDIENCE),
			])
			.send()
			.await?;

		let response = error_for_status(response)
			.await
			.map_err(|e| DevCycleError::Auth {
				status: e.status.as_u16(),
				body: e.body,
			})?;

		let token: TokenResponse = response
			.json()
			.await
			.map_err(|e| DevCycleError::Decode(format!("token response: {e}")))?;

		let lifetime = token
			.expires_in
			.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
			.min(u64::from(u32::MAX));
		let expires_at = Utc::now() + chrono::Duration::seconds(lifetime as i64);
		let access = SecretString::new(token.access_token);

		info!(token_type = %token.token_type, %expires_at, "authenticated with DevCycle");

		*cached = Some(CachedToken {
			access: access.clone(),
			expires_at,
		});
		Ok(access)
	}

	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.api_url.clone();
		// cannot_be_a_base was rejected by the builder.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}
		url
	}

	async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
		let token = self.authenticate().await?;
		Ok(self
			.http
			.request(method, url)
			.bearer_auth(token.expose())
			.header(ACCEPT, "application/json"))
	}

	async fn execute(&self, request: RequestBuilder) -> Result<Response> {
		let response = request.send().await?;
		Ok(error_for_status(response).await?)
	}

	async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
		response
			.json()
			.await
			.map_err(|e| DevCycleError::Decode(format!("{what}: {e}")))
	}

	pub async fn get_variables(&self, project: &str) -> Result<Vec<Variable>> {
		let url = self.endpoint(&["v1", "projects", project, "variables"]);
		debug!(url = %url, project, "fetching DevCycle variables");

		let request = self.request(Method::GET, url).await?;
		let variables: Vec<Variable> =
			Self::decode(self.execute(request).await?, "variables").await?;

		debug!(count = variables.len(), "fetched DevCycle variables");
		Ok(variables)
	}

	/// Creates a feature that carries `variable`. DevCycle variables cannot
	/// exist outside a feature.
	pub async fn create_feature_with_variable(
		&self,
		project: &str,
		variable: &Variable,
	) -> Result<()> {
		let url = self.endpoint(&["v2", "projects", project, "features"]);
		debug!(url = %url, variable = %variable.key, "creating DevCycle feature");

		let request = self
			.request(Method::POST, url)
			.await?
			.json(&feature_for_variable(variable));
		self.execute(request).await?;
		Ok(())
	}

	/// Updates a variable's description.
	pub async fn update_variable(
		&self,
		project: &str,
		key: &str,
		variable: &Variable,
	) -> Result<()> {
		let url = self.endpoint(&["v1", "projects", project, "variables", key]);
		debug!(url = %url, variable = %key, "updating DevCycle variable");

		let request = self
			.request(Method::PATCH, url)
			.await?
			.json(&VariableUpdate {
				description: &variable.description,
			});
		self.execute(request).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_requires_credentials() {
		let err = DevCycleClient::builder("", "secret").build().unwrap_err();
		assert!(matches!(err, DevCycleError::MissingCredentials));

		let err = DevCycleClient::builder("id", "").build().unwrap_err();
		assert!(matches!(err, DevCycleError::MissingCredentials));
	}

	#[test]
	fn builder_rejects_bad_urls() {
		let err = DevCycleClient::builder("id", "secret")
			.api_url("not a url")
			.build()
			.unwrap_err();
		assert!(matches!(err, DevCycleError::InvalidUrl { .. }));
	}

	#[test]
	fn endpoint_encodes_segments() {
		let client = DevCycleClient::builder("id", "secret")
			.api_url("https://api.devcycle.com/")
			.build()
			.unwrap();
		assert_eq!(
			client
				.endpoint(&["v1", "projects", "my project", "variables"])
				.as_str(),
			"https://api.devcycle.com/v1/projects/my%20project/variables"
		);
	}

	#[tokio::test]
	async fn fresh_client_has_no_token() {
		let client = DevCycleClient::builder("id", "secret").build().unwrap();
		assert!(client.token_expiry().await.is_none());
	}

	#[test]
	fn token_validity_tracks_expiry() {
		let valid = CachedToken {
			access: SecretString::from("t"),
			expires_at: Utc::now() + chrono::Duration::seconds(30),
		};
		let expired = CachedToken {
			access: SecretString::from("t"),
			expires_at: Utc::now() - chrono::Duration::seconds(1),
		};
		assert!(valid.is_valid());
		assert!(!expired.is_valid());
	}
}
