//! Where records come from and where they go.
//!
//! Input is read from the system clipboard, a file, stdin, or fetched from
//! doi.org by content negotiation. The cleaned record is written back to the
//! clipboard.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

const DOI_RESOLVER: &str = "https://doi.org/";
const BIBTEX_MEDIA_TYPE: &str = "text/bibliography; style=bibtex";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when reading or writing a record.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("DOI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DOI lookup returned HTTP {0}")]
    Status(u16),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("input is empty")]
    Empty,
}

fn non_empty(text: String) -> Result<String, SourceError> {
    if text.trim().is_empty() {
        Err(SourceError::Empty)
    } else {
        Ok(text)
    }
}

/// Reads the current text content of the clipboard.
pub fn read_clipboard() -> Result<String, SourceError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;
    let text = clipboard
        .get_text()
        .map_err(|e| SourceError::Clipboard(e.to_string()))?;
    non_empty(text)
}

/// Replaces the clipboard content with `text`.
///
/// On Linux the process owns the X11/Wayland selection, so this blocks until
/// another client (a clipboard manager or a later copy) takes it over.
pub fn write_clipboard(text: &str) -> Result<(), SourceError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;

    #[cfg(target_os = "linux")]
    {
        use arboard::SetExtLinux;
        clipboard
            .set()
            .wait()
            .text(text.to_string())
            .map_err(|e| SourceError::Clipboard(e.to_string()))
    }

    #[cfg(not(target_os = "linux"))]
    {
        clipboard
            .set_text(text.to_string())
            .map_err(|e| SourceError::Clipboard(e.to_string()))
    }
}

/// Reads a record from a file, or from stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String, SourceError> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    non_empty(text)
}

/// Strips resolver prefixes so that only the bare DOI remains.
///
/// # Examples
///
/// ```
/// use cleanbib::source::normalize_doi;
///
/// assert_eq!(normalize_doi("https://doi.org/10.1103/PhysRev.47.777"), "10.1103/PhysRev.47.777");
/// assert_eq!(normalize_doi("doi:10.1103/PhysRev.47.777"), "10.1103/PhysRev.47.777");
/// ```
pub fn normalize_doi(doi: &str) -> &str {
    let doi = doi.trim();
    let prefixes = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi.org/",
        "doi:",
    ];
    prefixes
        .iter()
        .find_map(|prefix| {
            doi.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| doi[prefix.len()..].trim_start())
        })
        .unwrap_or(doi)
}

/// Fetches the BibTeX record registered for a DOI.
pub fn fetch_doi(doi: &str) -> Result<String, SourceError> {
    let url = format!("{}{}", DOI_RESOLVER, normalize_doi(doi));
    tracing::debug!("fetching {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, BIBTEX_MEDIA_TYPE)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    non_empty(response.text()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_normalize_doi_bare() {
        assert_eq!(normalize_doi("10.1103/PhysRev.47.777"), "10.1103/PhysRev.47.777");
        assert_eq!(normalize_doi("  10.1103/PhysRev.47.777\n"), "10.1103/PhysRev.47.777");
    }

    #[test]
    fn test_normalize_doi_prefixes() {
        let inputs = [
            "doi:10.1000/xyz",
            "DOI: 10.1000/xyz",
            "https://doi.org/10.1000/xyz",
            "http://dx.doi.org/10.1000/xyz",
            "https://DX.DOI.ORG/10.1000/xyz",
            "doi.org/10.1000/xyz",
        ];
        for input in inputs {
            assert_eq!(normalize_doi(input), "10.1000/xyz", "input: {}", input);
        }
    }

    #[test]
    fn test_normalize_doi_keeps_case_of_suffix() {
        assert_eq!(normalize_doi("doi:10.1000/ABC.def"), "10.1000/ABC.def");
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"@article{x, author = {Doe, J.}}").unwrap();
        file.flush().unwrap();

        let text = read_input(file.path()).unwrap();

        assert!(text.starts_with("@article"));
    }

    #[test]
    fn test_read_input_empty_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"  \n\t").unwrap();
        file.flush().unwrap();

        assert!(matches!(read_input(file.path()), Err(SourceError::Empty)));
    }

    #[test]
    fn test_read_input_missing_file() {
        let result = read_input(Path::new("/nonexistent/record.bib"));
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
