// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! DevCycle management API payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TYPE_BOOLEAN: &str = "Boolean";
pub const TYPE_STRING: &str = "String";
pub const TYPE_NUMBER: &str = "Number";
pub const TYPE_JSON: &str = "JSON";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
	#[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// One of `Boolean`, `String`, `Number` or `JSON`.
	#[serde(rename = "type")]
	pub variable_type: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
	#[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub key: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub description: String,
	/// `release`, `experiment`, `permission` or `ops`.
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub feature_type: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub variables: Vec<Variable>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub variations: Vec<Variation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variation {
	pub key: String,
	pub name: String,
	#[serde(default)]
	pub variables: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VariableUpdate<'a> {
	pub description: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	pub access_token: String,
	#[serde(default)]
	pub token_type: String,
	pub expires_in: u64,
}

/// The value a new feature's "on" variation serves.
pub fn on_value(variable_type: &str, default_value: Option<&Value>) -> Value {
	match variable_type {
		TYPE_BOOLEAN => match default_value.and_then(Value::as_bool) {
			Some(b) => Value::Bool(!b),
			None => Value::Bool(true),
		},
		TYPE_STRING => Value::String("enabled".to_string()),
		TYPE_NUMBER => Value::from(1),
		TYPE_JSON => serde_json::json!({"enabled": true}),
		_ => default_value.cloned().unwrap_or(Value::Null),
	}
}

/// Builds the feature that carries a single new variable, with "on" and
/// "off" variations. The off variation serves the variable's default.
pub fn feature_for_variable(variable: &Variable) -> Feature {
	let off = variable.default_value.clone().unwrap_or(Value::Null);
	let on = on_value(&variable.variable_type, variable.default_value.as_ref());

	Feature {
		id: None,
		key: variable.key.clone(),
		name: variable.key.clone(),
		description: variable.description.clone(),
		feature_type: Some("release".to_string()),
		variables: vec![Variable {
			key: variable.key.clone(),
			name: Some(variable.key.clone()),
			variable_type: variable.variable_type.clone(),
			description: variable.description.clone(),
			default_value: variable.default_value.clone(),
			..Default::default()
		}],
		variations: vec![
			Variation {
				key: "variation-on".to_string(),
				name: "Variation On".to_string(),
				variables: Map::from_iter([(variable.key.clone(), on)]),
			},
			Variation {
				key: "variation-off".to_string(),
				name: "Variation Off".to_string(),
				variables: Map::from_iter([(variable.key.clone(), off)]),
			},
		],
	}
}
