//! Preprocessor define sets

use lumen_core::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

/// The set of preprocessor symbols defined for one shader permutation.
///
/// Symbols are kept sorted, so equal sets always iterate, print, and
/// hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefineSet(BTreeSet<String>);

impl DefineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the symbol was not already present
    pub fn insert(&mut self, symbol: impl Into<String>) -> bool {
        self.0.insert(symbol.into())
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        self.0.remove(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.0.retain(keep);
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbols in `self` but not in `other`
    pub fn missing_from<'a>(&'a self, other: &'a DefineSet) -> impl Iterator<Item = &'a str> + 'a {
        self.0.difference(&other.0).map(String::as_str)
    }

    /// `#define` lines for GLSL-style consumers
    pub fn preamble(&self) -> String {
        self.0.iter().map(|s| format!("#define {} 1\n", s)).collect()
    }

    /// Stable key for caching compiled permutations
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::from_parts(self.0.iter().map(String::as_str))
    }
}

impl fmt::Display for DefineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for symbol in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(symbol)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for DefineSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for DefineSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a DefineSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
