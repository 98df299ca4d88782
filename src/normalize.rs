//! Record normalization.
//!
//! Applies the cleanup steps to one parsed record, in order:
//!
//! 1. `~` join markers in the author list become spaces
//! 2. every field is brought to canonical LaTeX encoding
//! 3. a `Lastname:YEARxx` citation key is generated unless the key already
//!    contains a colon
//! 4. authors are rewritten as `von Last, Jr, F.~M.`
//! 5. the journal title is abbreviated when it is in the table
//! 6. page ranges are cut down to the first page

use rand::Rng;
use thiserror::Error;

use crate::journals::JournalAbbreviations;
use crate::latex;
use crate::names::{self, NameError, PersonName};
use crate::record::BibRecord;

/// Fields whose values are copied through untouched.
const VERBATIM_FIELDS: &[&str] = &["url", "doi", "eprint"];

/// Letters used for the citation key suffix.
const KEY_SUFFIX_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors that can occur when normalizing a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("malformed author name '{name}': {source}")]
    MalformedName { name: String, source: NameError },
}

/// Cleans up single bibliographic records.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    journals: JournalAbbreviations,
}

impl RecordNormalizer {
    pub fn new(journals: JournalAbbreviations) -> Self {
        Self { journals }
    }

    /// Returns the normalized copy of `record`.
    ///
    /// The random source only feeds the two-letter key suffix; pass a seeded
    /// generator for reproducible keys.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingField`] when `author` is absent, or
    /// `year` is absent and a key has to be generated, and a malformed-record
    /// error when the author list is empty or a name cannot be split. The
    /// input record is never modified.
    pub fn normalize<R: Rng + ?Sized>(
        &self,
        record: &BibRecord,
        rng: &mut R,
    ) -> Result<BibRecord, NormalizeError> {
        let mut out = record.clone();

        let author = out
            .get("author")
            .ok_or(NormalizeError::MissingField("author"))?;
        let author = replace_join_markers(author);
        out.set("author", author);

        homogenize_fields(&mut out);

        let authors = parse_authors(out.get("author").unwrap_or_default())?;

        if !out.id.contains(':') {
            let year = out
                .get("year")
                .map(str::trim)
                .filter(|year| !year.is_empty())
                .ok_or(NormalizeError::MissingField("year"))?;
            let key = generate_key(&authors[0], year, rng)?;
            tracing::info!("generated citation key {} (was {})", key, out.id);
            out.id = key;
        } else {
            tracing::debug!("keeping curated citation key {}", out.id);
        }

        out.set("author", names::format_names(&authors));

        if let Some(abbreviation) = out
            .get("journal")
            .and_then(|journal| self.journals.abbreviate(journal))
            .map(str::to_string)
        {
            tracing::debug!("abbreviated journal to {}", abbreviation);
            out.set("journal", abbreviation);
        }

        if let Some(first_page) = out.get("pages").and_then(first_page) {
            out.set("pages", first_page);
        }

        Ok(out)
    }
}

/// Replaces `~` join markers with spaces, keeping `\~` accents.
fn replace_join_markers(author: &str) -> String {
    let mut out = String::with_capacity(author.len());
    let mut previous = None;
    for c in author.chars() {
        if c == '~' && previous != Some('\\') {
            out.push(' ');
        } else {
            out.push(c);
        }
        previous = Some(c);
    }
    out
}

fn homogenize_fields(record: &mut BibRecord) {
    for (name, value) in record.fields.iter_mut() {
        if VERBATIM_FIELDS.contains(&name.as_str()) {
            continue;
        }
        let encoded = latex::homogenize(value);
        *value = if name == "title" {
            latex::protect_capitals(&encoded)
        } else {
            encoded
        };
    }
}

fn parse_authors(author: &str) -> Result<Vec<PersonName>, NormalizeError> {
    let raw = names::split_authors(author);
    if raw.is_empty() {
        return Err(NormalizeError::MalformedRecord(
            "author list is empty".to_string(),
        ));
    }

    raw.into_iter()
        .map(|name| {
            names::parse_name(&name).map_err(|source| NormalizeError::MalformedName { name, source })
        })
        .collect()
}

/// Builds a `Family:YEARxx` key from the first author's family name.
fn generate_key<R: Rng + ?Sized>(
    first_author: &PersonName,
    year: &str,
    rng: &mut R,
) -> Result<String, NormalizeError> {
    let family: String = first_author
        .last
        .concat()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();
    if family.is_empty() {
        return Err(NormalizeError::MalformedRecord(format!(
            "no usable family name in '{}' for the citation key",
            first_author.family_name()
        )));
    }

    let suffix: String = (0..2)
        .map(|_| KEY_SUFFIX_LETTERS[rng.gen_range(0..KEY_SUFFIX_LETTERS.len())] as char)
        .collect();

    Ok(format!("{}:{}{}", family, year, suffix))
}

/// The first page of a `first-last` range, or `None` if there is no range.
fn first_page(pages: &str) -> Option<String> {
    pages
        .split_once('-')
        .map(|(first, _)| first.trim_end().to_string())
}
