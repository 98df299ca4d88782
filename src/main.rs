//! CLI for cleanbib - Clean up a BibTeX record from the clipboard or a DOI.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use cleanbib::{
    source, strip_fields, BibFormat, Bibtex, JournalAbbreviations, RecordNormalizer,
    SourceError,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Clean up a BibTeX record from the clipboard or a DOI
#[derive(Parser)]
#[command(name = "cleanbib")]
#[command(version)]
#[command(after_help = "\
Examples:
  cleanbib                              clean the record on the clipboard
  cleanbib --doi 10.1103/PhysRev.47.777
  cleanbib --input paper.bib --no-copy
  pbpaste | cleanbib -i - --json

Authors become 'von Last, Jr, F.~M.', keys become 'Lastname:YEARxx',
journals are abbreviated and page ranges keep their first page.")]
struct Cli {
    /// Fetch the record for this DOI instead of reading the clipboard
    #[arg(short, long, conflicts_with = "input")]
    doi: Option<String>,

    /// Read the record from a file (use '-' for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Don't write the result back to the clipboard
    #[arg(long)]
    no_copy: bool,

    /// Don't strip metadata fields (month, abstract, file, ...)
    #[arg(long)]
    keep_fields: bool,

    /// Extra journal abbreviations (JSON object of "title": "abbreviation")
    #[arg(long, value_name = "PATH")]
    abbreviations: Option<PathBuf>,

    /// Print the cleaned record as JSON instead of BibTeX
    #[arg(long)]
    json: bool,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

// ---------------------------------------------------------------------------
// AppError: semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10: clipboard, file or stdin unreadable or empty
    Input(String),
    /// Exit 11: DOI lookup failed
    Fetch(String),
    /// Exit 12: input is not a BibTeX entry
    Parse(String),
    /// Exit 13: record cannot be normalized
    Record(String),
    /// Exit 14: abbreviation file unreadable or invalid
    Abbreviations(String),
    /// Exit 15: cannot write the result
    Output(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Input(_) => 10,
            AppError::Fetch(_) => 11,
            AppError::Parse(_) => 12,
            AppError::Record(_) => 13,
            AppError::Abbreviations(_) => 14,
            AppError::Output(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Input(msg) => {
                write!(
                    f,
                    "{}\n  hint: copy a BibTeX entry first, or use --input <PATH> / --doi <DOI>",
                    msg
                )
            }
            AppError::Fetch(msg) => {
                write!(
                    f,
                    "{}\n  hint: check the DOI and your network connection",
                    msg
                )
            }
            AppError::Parse(msg) => {
                write!(
                    f,
                    "{}\n  hint: the input must contain an entry like '@article{{key, author = {{...}}, ...}}'",
                    msg
                )
            }
            AppError::Record(msg) => {
                write!(
                    f,
                    "{}\n  hint: the record needs an 'author' field, and a 'year' unless its key already contains ':'",
                    msg
                )
            }
            AppError::Abbreviations(msg) => {
                write!(
                    f,
                    "{}\n  hint: the file must be a JSON object mapping journal titles to abbreviations",
                    msg
                )
            }
            AppError::Output(msg) => {
                write!(f, "{}\n  hint: use --no-copy when no clipboard is available", msg)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "cleanbib=warn",
        1 => "cleanbib=info",
        _ => "cleanbib=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    // 1. Acquire the raw text
    let text = if let Some(doi) = &cli.doi {
        source::fetch_doi(doi).map_err(|e| match e {
            SourceError::Empty => AppError::Fetch(format!("DOI '{}': empty response", doi)),
            e => AppError::Fetch(format!("DOI '{}': {}", doi, e)),
        })?
    } else if let Some(path) = &cli.input {
        source::read_input(path).map_err(|e| map_input_error(path, e))?
    } else {
        source::read_clipboard().map_err(|e| AppError::Input(format!("clipboard: {}", e)))?
    };

    // 2. Parse
    let format = Bibtex;
    let record = format
        .parse_record(&text)
        .map_err(|e| AppError::Parse(e.to_string()))?;

    // 3. Load the journal table
    let journals = match &cli.abbreviations {
        Some(path) => JournalAbbreviations::bundled_with_overlay(path).map_err(|e| {
            AppError::Abbreviations(format!("'{}': {}", path.display(), e))
        })?,
        None => JournalAbbreviations::bundled(),
    };

    // 4. Normalize
    let mut cleaned = RecordNormalizer::new(journals)
        .normalize(&record, &mut rand::thread_rng())
        .map_err(|e| AppError::Record(format!("{}: {}", record.id, e)))?;

    // 5. Strip metadata
    if !cli.keep_fields {
        let removed = strip_fields(&mut cleaned);
        if !removed.is_empty() {
            tracing::info!("removed fields: {}", removed.join(", "));
        }
    }

    // 6. Write the result
    let output = if cli.json {
        let mut json = serde_json::to_string_pretty(&cleaned)
            .map_err(|e| AppError::Output(format!("JSON: {}", e)))?;
        json.push('\n');
        json
    } else {
        format.serialize_record(&cleaned)
    };

    {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", output)
            .and_then(|_| handle.flush())
            .map_err(|e| AppError::Output(format!("stdout: {}", e)))?;
    }

    // Stdout is complete before the clipboard write, which may block on Linux
    // until the selection is taken over.
    if !cli.no_copy {
        source::write_clipboard(&output)
            .map_err(|e| AppError::Output(format!("clipboard: {}", e)))?;
        eprintln!("cleaned {}, copied to clipboard", cleaned.id);
    }

    Ok(())
}

fn map_input_error(path: &Path, e: SourceError) -> AppError {
    if path == Path::new("-") {
        AppError::Input(format!("stdin: {}", e))
    } else {
        AppError::Input(format!("'{}': {}", path.display(), e))
    }
}
