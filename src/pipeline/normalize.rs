use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sentinel city name for records with no usable city value
pub const UNKNOWN_CITY: &str = "Unknown";

/// Known divergences between the event dataset and the reference dataset.
/// Applied verbatim before canonicalization, so entries are case-sensitive.
static BUILTIN_ALIASES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    HashMap::from([("New York".to_string(), "New York City".to_string())])
});

/// Exact-match rewrite table for city names whose spelling differs
/// between the two datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityAliases {
    aliases: HashMap<String, String>,
}

impl Default for CityAliases {
    fn default() -> Self {
        Self {
            aliases: BUILTIN_ALIASES.clone(),
        }
    }
}

impl CityAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Add entries on top of the existing table; later entries win on conflict
    pub fn extend(&mut self, entries: HashMap<String, String>) {
        self.aliases.extend(entries);
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Fill in the sentinel for missing city names and rewrite known aliases.
/// Alias matching is on the verbatim trimmed name; canonical folding
/// happens afterwards in [`CanonicalKey::from_name`].
pub fn normalize_city(raw: Option<&str>, aliases: &CityAliases) -> String {
    match raw.map(str::trim) {
        None | Some("") => UNKNOWN_CITY.to_string(),
        Some(name) => aliases.resolve(name).to_string(),
    }
}

/// Accent- and case-insensitive city key used for reference joins.
///
/// Derived by NFKD decomposition, dropping combining marks, collapsing
/// runs of whitespace and lowercasing, so "Montréal", "MONTREAL" and
/// "montreal" all produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn from_name(name: &str) -> Self {
        let folded: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
        let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
        CanonicalKey(collapsed.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
