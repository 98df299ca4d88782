//! The bibliographic record model.
//!
//! A [`BibRecord`] is one BibTeX entry: its entry type, its citation key and
//! a mapping of lower-cased field names to values.

use serde::Serialize;
use std::collections::BTreeMap;

/// Metadata fields dropped from a cleaned record.
pub const REMOVED_FIELDS: &[&str] = &[
    "month",
    "keyword",
    "keywords",
    "language",
    "read",
    "rating",
    "date-added",
    "date-modified",
    "abstract",
    "local-url",
    "file",
    "uri",
    "issn",
    "numpages",
];

/// One parsed bibliographic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibRecord {
    /// Entry type without the `@` (e.g. "article")
    #[serde(rename = "ENTRYTYPE")]
    pub entry_type: String,
    /// The citation key
    #[serde(rename = "ID")]
    pub id: String,
    /// Field values keyed by lower-cased field name
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl BibRecord {
    /// Creates an empty record.
    pub fn new(entry_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter, mostly useful in tests.
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns a field value (field names are case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_lowercase())
            .map(|value| value.as_str())
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_lowercase())
    }
}

/// Removes the [`REMOVED_FIELDS`] metadata from a record.
///
/// Returns the names of the fields that were actually removed.
pub fn strip_fields(record: &mut BibRecord) -> Vec<String> {
    let mut removed = Vec::new();
    for name in REMOVED_FIELDS {
        if record.remove(name).is_some() {
            removed.push(name.to_string());
        }
    }
    removed
}
