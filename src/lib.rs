//! cleanbib: clean up a single BibTeX record.
//!
//! This library provides functionality to:
//! - Parse and serialize BibTeX entries
//! - Split author names into their BibTeX parts and reformat them
//! - Homogenize LaTeX accents and protect capitals in titles
//! - Abbreviate journal names and generate `Family:YEARxx` citation keys
//! - Read records from the clipboard, a file, or a DOI lookup

pub mod bibtex;
pub mod journals;
pub mod latex;
pub mod names;
pub mod normalize;
pub mod record;
pub mod source;

pub use bibtex::{BibFormat, Bibtex, ParseError};
pub use journals::{JournalAbbreviations, JournalsError};
pub use names::{format_authors, parse_name, split_authors, NameError, PersonName};
pub use normalize::{NormalizeError, RecordNormalizer};
pub use record::{strip_fields, BibRecord, REMOVED_FIELDS};
pub use source::SourceError;
