//! Journal name abbreviations.
//!
//! The bundled table maps full journal titles (in canonical LaTeX encoding)
//! to their standard abbreviations. Lookups are exact and case-sensitive.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Bundled abbreviation table, a JSON object of `"title": "abbreviation"`.
const BUNDLED_TABLE: &str = include_str!("../data/journal_abbreviations.json");

lazy_static! {
    static ref BUNDLED: HashMap<String, String> = match serde_json::from_str(BUNDLED_TABLE) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("bundled journal table is invalid: {}", e);
            HashMap::new()
        }
    };
}

/// Errors that can occur when loading an abbreviation table.
#[derive(Error, Debug)]
pub enum JournalsError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// An immutable journal title to abbreviation mapping.
#[derive(Debug, Clone)]
pub struct JournalAbbreviations {
    table: HashMap<String, String>,
}

impl JournalAbbreviations {
    /// The table shipped with the tool.
    pub fn bundled() -> Self {
        Self {
            table: BUNDLED.clone(),
        }
    }

    /// Builds a table from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a JSON object of `"title": "abbreviation"` pairs.
    pub fn from_json(json: &str) -> Result<Self, JournalsError> {
        let table: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { table })
    }

    /// Loads the bundled table with the entries of a user file laid over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object of
    /// strings.
    pub fn bundled_with_overlay(path: &Path) -> Result<Self, JournalsError> {
        let content = fs::read_to_string(path)?;
        let overlay = Self::from_json(&content)?;
        let mut merged = Self::bundled();
        tracing::debug!(
            "merging {} abbreviations from {}",
            overlay.len(),
            path.display()
        );
        merged.table.extend(overlay.table);
        Ok(merged)
    }

    /// Returns the abbreviation for an exact journal title.
    pub fn abbreviate(&self, journal: &str) -> Option<&str> {
        self.table.get(journal).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for JournalAbbreviations {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_bundled_table_loads() {
        let table = JournalAbbreviations::bundled();
        assert!(table.len() > 300, "bundled table has {} entries", table.len());
    }

    #[test]
    fn test_bundled_lookup() {
        let table = JournalAbbreviations::bundled();
        assert_eq!(table.abbreviate("Physical Review"), Some("Phys. Rev."));
        assert_eq!(
            table.abbreviate("Physical Review Letters"),
            Some("Phys. Rev. Lett.")
        );
        assert_eq!(
            table.abbreviate(r"Annales de llnstitut Henri Poincar{\'e}"),
            Some(r"Ann. Inst. Henri Poincar{\'e}")
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        // Given: titles differing from a table key by one character or by case
        let table = JournalAbbreviations::bundled();

        // Then: none of them match
        assert_eq!(table.abbreviate("Physical Reviews"), None);
        assert_eq!(table.abbreviate("physical review"), None);
        assert_eq!(table.abbreviate("Physical Review "), None);
        assert_eq!(table.abbreviate("Physical"), None);
    }

    #[test]
    fn test_from_json_rejects_non_string_values() {
        let result = JournalAbbreviations::from_json(r#"{"Nature": 1}"#);
        assert!(matches!(result, Err(JournalsError::JsonError(_))));
    }

    #[test]
    fn test_overlay_adds_and_replaces_entries() {
        // Given: a user file adding one title and overriding another
        let file = create_temp_file(
            r#"{"Journal of Made-Up Results": "J. Made-Up Res.", "Physical Review": "PR"}"#,
        );

        // When: we load it over the bundled table
        let table = JournalAbbreviations::bundled_with_overlay(file.path()).unwrap();

        // Then: both entries win, and the rest of the bundled table is kept
        assert_eq!(
            table.abbreviate("Journal of Made-Up Results"),
            Some("J. Made-Up Res.")
        );
        assert_eq!(table.abbreviate("Physical Review"), Some("PR"));
        assert_eq!(
            table.abbreviate("Physical Review Letters"),
            Some("Phys. Rev. Lett.")
        );
    }

    #[test]
    fn test_overlay_missing_file() {
        let result = JournalAbbreviations::bundled_with_overlay(Path::new(
            "/nonexistent/path/journals.json",
        ));
        assert!(matches!(result, Err(JournalsError::IoError(_))));
    }
}
