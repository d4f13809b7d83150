// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{Duration, Utc};
use flagsync_core::{Flag, FlagValue, Flagset};
use flagsync_plugin::{
	CompareOptions, PluginConfig, PluginError, PullOptions, PushAction, PushOptions, SyncPlugin,
};
use flagsync_plugin_devcycle::{DevCycleClient, DevCycleError, DevCyclePlugin};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_body(token: &str) -> Value {
	json!({"access_token": token, "token_type": "Bearer", "expires_in": 3600})
}

fn client_for(server: &MockServer) -> DevCycleClient {
	DevCycleClient::builder("client-id", "client-secret")
		.auth_url(format!("{}/oauth/token", server.uri()))
		.api_url(server.uri())
		.build()
		.unwrap()
}

async fn mount_variables(server: &MockServer, token: &str, variables: Value) {
	Mock::given(method("GET"))
		.and(path("/v1/projects/shop/variables"))
		.and(header("Authorization", format!("Bearer {token}").as_str()))
		.respond_with(ResponseTemplate::new(200).set_body_json(variables))
		.mount(server)
		.await;
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/oauth/token"))
		.and(body_string_contains("grant_type=client_credentials"))
		.and(body_string_contains("client_id=client-id"))
		.and(body_string_contains("audience=https%3A%2F%2Fapi.devcycle.com%2F"))
		.respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh")))
		.expect(1)
		.mount(&server)
		.await;
	mount_variables(&server, "fresh", json!([])).await;

	let client = client_for(&server);
	client.set_token("stale", Utc::now() - Duration::seconds(5)).await;

	client.get_variables("shop").await.unwrap();
	client.get_variables("shop").await.unwrap();

	let expiry = client.token_expiry().await.unwrap();
	assert!(expiry > Utc::now() + Duration::seconds(3000));
	assert!(expiry <= Utc::now() + Duration::seconds(3600 - 60));
}

#[tokio::test]
async fn valid_token_skips_authentication() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/oauth/token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(token_body("unused")))
		.expect(0)
		.mount(&server)
		.await;
	mount_variables(&server, "cached", json!([])).await;

	let client = client_for(&server);
	client.set_token("cached", Utc::now() + Duration::minutes(10)).await;

	client.get_variables("shop").await.unwrap();
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/oauth/token"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(token_body("shared"))
				.set_delay(std::time::Duration::from_millis(50)),
		)
		.expect(1)
		.mount(&server)
		.await;
	mount_variables(&server, "shared", json!([])).await;

	let client = Arc::new(client_for(&server));
	let handles: Vec<_> = (0..5)
		.map(|_| {
			let client = client.clone();
			tokio::spawn(async move { client.get_variables("shop").await })
		})
		.collect();
	for handle in handles {
		handle.await.unwrap().unwrap();
	}
}

#[tokio::test]
async fn auth_failure_keeps_status_and_body() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/oauth/token"))
		.respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
		.mount(&server)
		.await;

	let err = client_for(&server).get_variables("shop").await.unwrap_err();

	match err {
		DevCycleError::Auth { status, body } => {
			assert_eq!(status, 401);
			assert_eq!(body, r#"{"error":"invalid_client"}"#);
		}
		other => panic!("unexpected error: {other}"),
	}
}

fn configured_plugin(server: &MockServer) -> DevCyclePlugin {
	let custom = json!({
		"project": "shop",
		"clientId": "client-id",
		"clientSecret": "client-secret",
		"authUrl": format!("{}/oauth/token", server.uri()),
	});
	let mut plugin = DevCyclePlugin::new();
	plugin
		.configure(PluginConfig {
			base_url: server.uri(),
			custom: custom.as_object().cloned().unwrap(),
			..Default::default()
		})
		.unwrap();
	plugin.validate_config().unwrap();
	plugin
}

async fn mount_token(server: &MockServer) {
	Mock::given(method("POST"))
		.and(path("/oauth/token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok")))
		.mount(server)
		.await;
}

fn remote_variables() -> Value {
	json!([
		{"_id": "1", "key": "show-banner", "type": "Boolean", "defaultValue": false, "description": "Banner"},
		{"_id": "2", "key": "limit", "type": "Number", "defaultValue": 10},
		{"_id": "3", "key": "theme", "type": "JSON", "defaultValue": {"color": "blue"}},
		{"_id": "4", "key": "title", "type": "String"},
		{"_id": "5", "key": "launch", "type": "Date", "defaultValue": "2025-01-01"}
	])
}

#[tokio::test]
async fn pull_converts_supported_variables() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	mount_variables(&server, "tok", remote_variables()).await;

	let flags = configured_plugin(&server)
		.pull(&PullOptions::default())
		.await
		.unwrap();

	assert_eq!(
		flags.keys().collect::<Vec<_>>(),
		vec!["limit", "show-banner", "theme", "title"]
	);
	assert_eq!(flags.get("limit").unwrap().default_value, FlagValue::Float(10.0));
	assert_eq!(
		flags.get("title").unwrap().default_value,
		FlagValue::String(String::new())
	);
}

#[tokio::test]
async fn push_creates_features_and_patches_descriptions() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	mount_variables(&server, "tok", remote_variables()).await;

	Mock::given(method("POST"))
		.and(path("/v2/projects/shop/features"))
		.and(header("Authorization", "Bearer tok"))
		.and(body_json(json!({
			"key": "checkout",
			"name": "checkout",
			"type": "release",
			"variables": [{"key": "checkout", "name": "checkout", "type": "Boolean", "defaultValue": true}],
			"variations": [
				{"key": "variation-on", "name": "Variation On", "variables": {"checkout": false}},
				{"key": "variation-off", "name": "Variation Off", "variables": {"checkout": true}}
			]
		})))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "f1"})))
		.expect(1)
		.mount(&server)
		.await;

	Mock::given(method("PATCH"))
		.and(path("/v1/projects/shop/variables/show-banner"))
		.and(body_json(json!({"description": "Top banner"})))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let local = Flagset::new(vec![
		Flag::new("checkout", true),
		Flag::new("limit", 10i64),
		Flag::new("show-banner", false).with_description("Top banner"),
	]);

	let result = configured_plugin(&server)
		.push(&local, &PushOptions::default())
		.await
		.unwrap();

	assert_eq!(keys(&result.created), vec!["checkout"]);
	assert_eq!(keys(&result.updated), vec!["show-banner"]);
	assert_eq!(keys(&result.unchanged), vec!["limit"]);
	assert!(!result.has_errors());
}

#[tokio::test]
async fn mistyped_remote_default_is_patched_not_recreated() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	mount_variables(
		&server,
		"tok",
		json!([
			{"key": "dark-mode", "type": "Boolean", "defaultValue": "yes"},
			{"key": "title", "type": "String"}
		]),
	)
	.await;

	Mock::given(method("POST"))
		.and(path("/v2/projects/shop/features"))
		.respond_with(ResponseTemplate::new(201))
		.expect(0)
		.mount(&server)
		.await;
	Mock::given(method("PATCH"))
		.respond_with(ResponseTemplate::new(200))
		.expect(2)
		.mount(&server)
		.await;

	let local = Flagset::new(vec![Flag::new("dark-mode", true), Flag::new("title", "")]);
	let plugin = configured_plugin(&server);

	let result = plugin.push(&local, &PushOptions::default()).await.unwrap();
	assert!(result.created.is_empty());
	assert_eq!(keys(&result.updated), vec!["dark-mode", "title"]);

	let pulled = plugin.pull(&PullOptions::default()).await.unwrap();
	assert_eq!(pulled.keys().collect::<Vec<_>>(), vec!["title"]);
}

#[tokio::test]
async fn per_flag_failures_are_collected() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	mount_variables(&server, "tok", json!([])).await;

	Mock::given(method("POST"))
		.and(path("/v2/projects/shop/features"))
		.and(body_string_contains("\"key\":\"broken\""))
		.respond_with(ResponseTemplate::new(400).set_body_string("invalid feature key"))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/v2/projects/shop/features"))
		.respond_with(ResponseTemplate::new(201))
		.mount(&server)
		.await;

	let local = Flagset::new(vec![
		Flag::new("alpha", "a"),
		Flag::new("broken", "b"),
		Flag::new("gamma", "c"),
	]);

	let result = configured_plugin(&server)
		.push(&local, &PushOptions::default())
		.await
		.unwrap();

	assert_eq!(keys(&result.created), vec!["alpha", "gamma"]);
	assert_eq!(result.errors.len(), 1);
	assert_eq!(result.errors[0].key, "broken");
	assert_eq!(result.errors[0].action, PushAction::Create);
	assert!(matches!(
		result.errors[0].error,
		PluginError::RemoteApi { status: 400, ref body } if body == "invalid feature key"
	));
}

#[tokio::test]
async fn unreachable_remote_aborts_push() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	Mock::given(method("GET"))
		.and(path("/v1/projects/shop/variables"))
		.respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
		.mount(&server)
		.await;

	let err = configured_plugin(&server)
		.push(
			&Flagset::new(vec![Flag::new("a", true)]),
			&PushOptions::default(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, PluginError::RemoteApi { status: 503, .. }));
}

#[tokio::test]
async fn compare_treats_integral_numbers_as_integers() {
	let server = MockServer::start().await;
	mount_token(&server).await;
	mount_variables(&server, "tok", remote_variables()).await;

	let local = Flagset::new(vec![
		Flag::new("limit", 10i64),
		Flag::new("theme", FlagValue::Object(json!({"color": "red"}))),
		Flag::new("new-flag", 1.5f64),
	]);

	let result = configured_plugin(&server)
		.compare(&local, &CompareOptions::default())
		.await
		.unwrap();

	assert_eq!(keys(&result.unchanged), vec!["limit"]);
	assert_eq!(result.modified.len(), 1);
	assert_eq!(result.modified[0].key, "theme");
	assert_eq!(keys(&result.added), vec!["new-flag"]);
	assert_eq!(keys(&result.removed), vec!["show-banner", "title"]);
}

fn keys(flags: &[Flag]) -> Vec<&str> {
	flags.iter().map(|f| f.key.as_str()).collect()
}
