// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::flag::Flag;
use crate::manifest::ManifestDocument;

/// An ordered collection of flags, sorted by key.
///
/// Serializes to and from the manifest document shape
/// (`{"flags": {<key>: {...}}}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ManifestDocument", into = "ManifestDocument")]
pub struct Flagset {
	flags: Vec<Flag>,
}

impl Flagset {
	pub fn new(mut flags: Vec<Flag>) -> Self {
		flags.sort_by(|a, b| a.key.cmp(&b.key));
		Self { flags }
	}

	pub fn flags(&self) -> &[Flag] {
		&self.flags
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
		self.flags.iter()
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&Flag> {
		self.flags
			.binary_search_by(|f| f.key.as_str().cmp(key))
			.ok()
			.map(|idx| &self.flags[idx])
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.flags.iter().map(|f| f.key.as_str())
	}

	pub fn into_flags(self) -> Vec<Flag> {
		self.flags
	}
}

impl FromIterator<Flag> for Flagset {
	fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
		Flagset::new(iter.into_iter().collect())
	}
}

impl<'a> IntoIterator for &'a Flagset {
	type Item = &'a Flag;
	type IntoIter = std::slice::Iter<'a, Flag>;

	fn into_iter(self) -> Self::IntoIter {
		self.flags.iter()
	}
}

impl IntoIterator for Flagset {
	type Item = Flag;
	type IntoIter = std::vec::IntoIter<Flag>;

	fn into_iter(self) -> Self::IntoIter {
		self.flags.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_sorts_by_key() {
		let set = Flagset::new(vec![
			Flag::new("zeta", 1i64),
			Flag::new("alpha", true),
			Flag::new("mid", "x"),
		]);
		let keys: Vec<_> = set.keys().collect();
		assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
	}

	#[test]
	fn get_finds_by_key() {
		let set: Flagset = vec![Flag::new("b", 2i64), Flag::new("a", 1i64)].into_iter().collect();
		assert_eq!(set.get("b").map(|f| f.key.as_str()), Some("b"));
		assert!(set.get("c").is_none());
	}
}
