//! Integration tests using TOML fixtures.
//!
//! Each TOML file in `tests/fixtures/normalize/` holds one BibTeX record and
//! the fields expected after parsing, normalizing and stripping it; the files
//! in `tests/fixtures/errors/` hold records that must be rejected.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use cleanbib::{strip_fields, BibFormat, BibRecord, Bibtex, RecordNormalizer};

/// A test fixture loaded from a TOML file.
#[derive(Debug, Deserialize)]
struct Fixture {
    /// Name of the test case
    name: String,
    /// Input BibTeX text
    bibtex: String,
    /// Skip the metadata stripping pass
    #[serde(default)]
    keep_fields: bool,
    /// Exact expected citation key
    #[serde(default)]
    expected_id: Option<String>,
    /// Expected citation key without its random two-letter suffix
    #[serde(default)]
    expected_id_prefix: Option<String>,
    /// Fields whose values must match exactly
    #[serde(default)]
    expected_fields: BTreeMap<String, String>,
    /// Fields that must not be present in the result
    #[serde(default)]
    absent_fields: Vec<String>,
    /// Expected error message fragment (for error tests)
    #[serde(default)]
    expected_error: Option<String>,
}

/// Load all fixtures from a directory.
fn load_fixtures(dir: &Path) -> Vec<(String, Fixture)> {
    let mut fixtures = Vec::new();

    if !dir.exists() {
        return fixtures;
    }

    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();

        if path.extension().map_or(false, |e| e == "toml") {
            let content = fs::read_to_string(&path).unwrap();
            let fixture: Fixture = toml::from_str(&content)
                .unwrap_or_else(|e| panic!("invalid fixture {}: {}", path.display(), e));
            let name = path.file_stem().unwrap().to_string_lossy().to_string();
            fixtures.push((name, fixture));
        }
    }

    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    fixtures
}

/// Parse, normalize and strip a fixture's record, as the binary does.
fn clean(fixture: &Fixture, seed: u64) -> Result<BibRecord, String> {
    let record = Bibtex
        .parse_record(&fixture.bibtex)
        .map_err(|e| e.to_string())?;
    let mut cleaned = RecordNormalizer::default()
        .normalize(&record, &mut StdRng::seed_from_u64(seed))
        .map_err(|e| e.to_string())?;
    if !fixture.keep_fields {
        strip_fields(&mut cleaned);
    }
    Ok(cleaned)
}

/// Run normalization tests - verify the cleaned record.
fn run_normalize_test(name: &str, fixture: &Fixture) {
    let cleaned = clean(fixture, 42)
        .unwrap_or_else(|e| panic!("Test '{}' failed with unexpected error: {}", name, e));

    if let Some(expected_id) = &fixture.expected_id {
        assert_eq!(
            cleaned.id, *expected_id,
            "Test '{}' failed: expected key '{}', got '{}'",
            name, expected_id, cleaned.id
        );
    }

    if let Some(prefix) = &fixture.expected_id_prefix {
        let suffix = cleaned.id.strip_prefix(prefix.as_str()).unwrap_or_else(|| {
            panic!(
                "Test '{}' failed: expected key starting with '{}', got '{}'",
                name, prefix, cleaned.id
            )
        });
        assert!(
            suffix.len() == 2 && suffix.chars().all(|c| c.is_ascii_alphabetic()),
            "Test '{}' failed: bad key suffix in '{}'",
            name,
            cleaned.id
        );
    }

    for (field, expected) in &fixture.expected_fields {
        assert_eq!(
            cleaned.get(field),
            Some(expected.as_str()),
            "Test '{}' field '{}' mismatch",
            name,
            field
        );
    }

    for field in &fixture.absent_fields {
        assert!(
            cleaned.get(field).is_none(),
            "Test '{}' failed: field '{}' should have been removed",
            name,
            field
        );
    }
}

/// Run the same fixture twice through the pipeline - the second pass must
/// not change anything.
fn run_idempotence_test(name: &str, fixture: &Fixture) {
    let once = clean(fixture, 1).unwrap();
    let text = Bibtex.serialize_record(&once);
    let again = Fixture {
        name: fixture.name.clone(),
        bibtex: text,
        keep_fields: fixture.keep_fields,
        expected_id: None,
        expected_id_prefix: None,
        expected_fields: BTreeMap::new(),
        absent_fields: Vec::new(),
        expected_error: None,
    };
    let twice = clean(&again, 2).unwrap();

    assert_eq!(twice, once, "Test '{}' is not idempotent", name);
}

/// Run error tests - verify that the record is rejected.
fn run_error_test(name: &str, fixture: &Fixture) {
    match clean(fixture, 42) {
        Ok(record) => panic!(
            "Test '{}' expected an error but produced key '{}'",
            name, record.id
        ),
        Err(message) => {
            if let Some(expected_error) = &fixture.expected_error {
                assert!(
                    message.contains(expected_error.as_str()),
                    "Test '{}' error mismatch: expected '{}', got '{}'",
                    name,
                    expected_error,
                    message
                );
            }
        }
    }
}

#[test]
fn test_normalize_fixtures() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/normalize");
    let fixtures = load_fixtures(&fixtures_dir);
    assert!(!fixtures.is_empty(), "no fixtures in {}", fixtures_dir.display());

    for (name, fixture) in fixtures {
        println!("Running normalize test: {}", fixture.name);
        run_normalize_test(&name, &fixture);
    }
}

#[test]
fn test_normalize_fixtures_are_idempotent() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/normalize");

    for (name, fixture) in load_fixtures(&fixtures_dir) {
        println!("Running idempotence test: {}", fixture.name);
        run_idempotence_test(&name, &fixture);
    }
}

#[test]
fn test_error_fixtures() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/errors");
    let fixtures = load_fixtures(&fixtures_dir);
    assert!(!fixtures.is_empty(), "no fixtures in {}", fixtures_dir.display());

    for (name, fixture) in fixtures {
        println!("Running error test: {}", fixture.name);
        run_error_test(&name, &fixture);
    }
}
