// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{FlagError, Result};

/// Date format used for flag expiry (`2025-12-31`).
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// The primitive type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagType {
	Integer,
	Float,
	Boolean,
	String,
	Object,
}

impl FlagType {
	pub const ALL: [FlagType; 5] = [
		FlagType::Integer,
		FlagType::Float,
		FlagType::Boolean,
		FlagType::String,
		FlagType::Object,
	];

	/// Canonical lowercase name, as written in manifests.
	pub fn as_str(&self) -> &'static str {
		match self {
			FlagType::Integer => "integer",
			FlagType::Float => "float",
			FlagType::Boolean => "boolean",
			FlagType::String => "string",
			FlagType::Object => "object",
		}
	}
}

impl fmt::Display for FlagType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FlagType {
	type Err = FlagError;

	/// Parses a flag type, accepting the aliases other tools emit
	/// (`Number`, `bool`, `JSON`, ...). Anything else is rejected.
	fn from_str(s: &str) -> Result<Self> {
		match s {
			"integer" | "Integer" => Ok(FlagType::Integer),
			"float" | "Float" | "Number" => Ok(FlagType::Float),
			"boolean" | "bool" | "Boolean" => Ok(FlagType::Boolean),
			"string" | "String" => Ok(FlagType::String),
			"object" | "Object" | "JSON" => Ok(FlagType::Object),
			other => Err(FlagError::UnknownFlagType(other.to_string())),
		}
	}
}

impl Serialize for FlagType {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for FlagType {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// A flag's default value, tagged by the flag's declared type.
///
/// Values only enter this type through [`FlagValue::from_json`], which checks
/// the JSON shape against the declared [`FlagType`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
	Integer(i64),
	Float(f64),
	Boolean(bool),
	String(String),
	/// A JSON object or array.
	Object(Value),
}

impl FlagValue {
	pub fn flag_type(&self) -> FlagType {
		match self {
			FlagValue::Integer(_) => FlagType::Integer,
			FlagValue::Float(_) => FlagType::Float,
			FlagValue::Boolean(_) => FlagType::Boolean,
			FlagValue::String(_) => FlagType::String,
			FlagValue::Object(_) => FlagType::Object,
		}
	}

	/// Converts an untyped JSON value into a value of `flag_type`.
	///
	/// Integers accept JSON numbers with no fractional part, so `3.0` from a
	/// remote that only knows doubles still parses as `3`.
	pub fn from_json(key: &str, flag_type: FlagType, value: Value) -> Result<Self> {
		let mismatch = |value: &Value| FlagError::InvalidDefaultValue {
			key: key.to_string(),
			expected: flag_type,
			found: json_kind(value).to_string(),
		};

		match (flag_type, value) {
			(_, Value::Null) => Err(FlagError::MissingDefaultValue {
				key: key.to_string(),
			}),
			(FlagType::Integer, Value::Number(n)) => {
				if let Some(i) = n.as_i64() {
					return Ok(FlagValue::Integer(i));
				}
				match n.as_f64() {
					Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
						Ok(FlagValue::Integer(f as i64))
					}
					_ => Err(FlagError::InvalidDefaultValue {
						key: key.to_string(),
						expected: flag_type,
						found: format!("non-integral number {n}"),
					}),
				}
			}
			(FlagType::Float, Value::Number(n)) => n
				.as_f64()
				.map(FlagValue::Float)
				.ok_or_else(|| mismatch(&Value::Number(n))),
			(FlagType::Boolean, Value::Bool(b)) => Ok(FlagValue::Boolean(b)),
			(FlagType::String, Value::String(s)) => Ok(FlagValue::String(s)),
			(FlagType::Object, v @ (Value::Object(_) | Value::Array(_))) => {
				Ok(FlagValue::Object(v))
			}
			(_, other) => Err(mismatch(&other)),
		}
	}

	/// The zero value for a type, used when a remote omits a default.
	pub fn zero(flag_type: FlagType) -> Self {
		match flag_type {
			FlagType::Integer => FlagValue::Integer(0),
			FlagType::Float => FlagValue::Float(0.0),
			FlagType::Boolean => FlagValue::Boolean(false),
			FlagType::String => FlagValue::String(String::new()),
			FlagType::Object => FlagValue::Object(Value::Object(serde_json::Map::new())),
		}
	}

	pub fn to_json(&self) -> Value {
		match self {
			FlagValue::Integer(i) => Value::from(*i),
			FlagValue::Float(f) if is_exact_integer(*f) => Value::from(*f as i64),
			FlagValue::Float(f) => serde_json::Number::from_f64(*f)
				.map(Value::Number)
				.unwrap_or(Value::Null),
			FlagValue::Boolean(b) => Value::Bool(*b),
			FlagValue::String(s) => Value::String(s.clone()),
			FlagValue::Object(v) => v.clone(),
		}
	}

	/// Stable textual rendering used for equality during reconciliation.
	///
	/// Numbers render without a trailing `.0` (`1.0` and `1` both render as
	/// `1`), and object keys render in sorted order. Two values are considered
	/// the same default exactly when their renderings match.
	pub fn render(&self) -> String {
		match self {
			FlagValue::Integer(i) => i.to_string(),
			FlagValue::Float(f) => render_float(*f),
			FlagValue::Boolean(b) => b.to_string(),
			FlagValue::String(s) => s.clone(),
			FlagValue::Object(v) => {
				let mut out = String::new();
				render_json(v, &mut out);
				out
			}
		}
	}
}

impl fmt::Display for FlagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

impl From<bool> for FlagValue {
	fn from(b: bool) -> Self {
		FlagValue::Boolean(b)
	}
}

impl From<i64> for FlagValue {
	fn from(i: i64) -> Self {
		FlagValue::Integer(i)
	}
}

impl From<f64> for FlagValue {
	fn from(f: f64) -> Self {
		FlagValue::Float(f)
	}
}

impl From<&str> for FlagValue {
	fn from(s: &str) -> Self {
		FlagValue::String(s.to_string())
	}
}

impl From<String> for FlagValue {
	fn from(s: String) -> Self {
		FlagValue::String(s)
	}
}

fn render_float(f: f64) -> String {
	// Display for f64 already drops a zero fraction: 1.0 -> "1", 1.5 -> "1.5".
	format!("{f}")
}

fn render_json(value: &Value, out: &mut String) {
	match value {
		Value::Null => out.push_str("null"),
		Value::Bool(b) => {
			let _ = write!(out, "{b}");
		}
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				let _ = write!(out, "{i}");
			} else if let Some(u) = n.as_u64() {
				let _ = write!(out, "{u}");
			} else if let Some(f) = n.as_f64() {
				out.push_str(&render_float(f));
			}
		}
		Value::String(s) => {
			let _ = write!(out, "{}", Value::String(s.clone()));
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				render_json(item, out);
			}
			out.push(']');
		}
		Value::Object(map) => {
			let mut keys: Vec<&String> = map.keys().collect();
			keys.sort();
			out.push('{');
			for (i, key) in keys.into_iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				let _ = write!(out, "{}:", Value::String(key.clone()));
				render_json(&map[key], out);
			}
			out.push('}');
		}
	}
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// A single feature flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
	pub key: String,
	pub description: String,
	pub default_value: FlagValue,
	pub expiry: Option<NaiveDate>,
}

impl Flag {
	pub fn new(key: impl Into<String>, default_value: impl Into<FlagValue>) -> Self {
		Self {
			key: key.into(),
			description: String::new(),
			default_value: default_value.into(),
			expiry: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
		self.expiry = Some(expiry);
		self
	}

	pub fn flag_type(&self) -> FlagType {
		self.default_value.flag_type()
	}

	pub fn has_expiry(&self) -> bool {
		self.expiry.is_some()
	}

	pub fn expiry_date(&self) -> Option<NaiveDate> {
		self.expiry
	}

	pub fn is_expired(&self) -> bool {
		self.is_expired_at(Utc::now())
	}

	/// A flag expires at the start (UTC midnight) of its expiry date.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		match self.expiry.and_then(|d| d.and_hms_opt(0, 0, 0)) {
			Some(midnight) => now > midnight.and_utc(),
			None => false,
		}
	}

	/// Accepts a plain date or an ISO-8601 datetime, keeping only its date part.
	pub(crate) fn parse_expiry(key: &str, raw: Option<String>) -> Result<Option<NaiveDate>> {
		match raw {
			None => Ok(None),
			Some(s) if s.is_empty() => Ok(None),
			Some(s) => NaiveDate::parse_from_str(&s, EXPIRY_FORMAT)
				.or_else(|_| DateTime::parse_from_rfc3339(&s).map(|dt| dt.date_naive()))
				.or_else(|_| {
					NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
				})
				.map(Some)
				.map_err(|_| FlagError::InvalidExpiry {
					key: key.to_string(),
					value: s,
				}),
		}
	}
}

/// Integral floats within the exactly representable range write back as JSON integers.
fn is_exact_integer(f: f64) -> bool {
	const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
	f.fract() == 0.0 && f.abs() <= MAX_EXACT
}
