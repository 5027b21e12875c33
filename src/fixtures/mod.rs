//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded waveforms, loads them from JSON or text
//! dumps, parses optional expectation JSON, and compares calibration results
//! against those expectations. It backs the `echo_cli` binary and the
//! integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Waveform;
use crate::calibration::ThresholdResult;

/// Default location for fixture waveform/expectation assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug, Serialize)]
pub struct FixtureMetadata {
    pub name: String,
    pub waveform_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture data.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub description: Option<String>,
    pub waveform: Waveform,
    pub expectations: Option<FixtureExpectations>,
}

/// On-disk JSON waveform schema.
#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    description: Option<String>,
    samples: Vec<u32>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureExpectations {
    #[serde(default)]
    pub edge_index: Option<usize>,
    #[serde(default)]
    pub liquid_index: Option<usize>,
    pub t1: i64,
    pub x: i64,
    pub t2: i64,
    pub y: i64,
    #[serde(default)]
    pub note: Option<String>,
    /// Allowed deviation for edge/liquid indices and x/y
    #[serde(default)]
    pub index_tolerance: i64,
    /// Allowed deviation for t1/t2
    #[serde(default)]
    pub threshold_tolerance: i64,
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &ThresholdResult) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        check_index(
            &mut failures,
            "edge_index",
            self.edge_index,
            actual.edge_index,
            self.index_tolerance,
        );
        check_index(
            &mut failures,
            "liquid_index",
            self.liquid_index,
            actual.liquid_index,
            self.index_tolerance,
        );
        check_value(&mut failures, "t1", self.t1, actual.t1, self.threshold_tolerance);
        check_value(&mut failures, "x", self.x, actual.x, self.index_tolerance);
        check_value(&mut failures, "t2", self.t2, actual.t2, self.threshold_tolerance);
        check_value(&mut failures, "y", self.y, actual.y, self.index_tolerance);

        if self.note != actual.note {
            failures.push(ExpectationFailure {
                field: "note",
                expected: serde_json::json!(self.note),
                actual: serde_json::json!(actual.note),
                tolerance: 0,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

fn check_value(
    failures: &mut Vec<ExpectationFailure>,
    field: &'static str,
    expected: i64,
    actual: i64,
    tolerance: i64,
) {
    if (expected - actual).abs() > tolerance {
        failures.push(ExpectationFailure {
            field,
            expected: serde_json::json!(expected),
            actual: serde_json::json!(actual),
            tolerance,
        });
    }
}

fn check_index(
    failures: &mut Vec<ExpectationFailure>,
    field: &'static str,
    expected: Option<usize>,
    actual: Option<usize>,
    tolerance: i64,
) {
    let within = match (expected, actual) {
        (Some(e), Some(a)) => (e as i64 - a as i64).abs() <= tolerance,
        (None, None) => true,
        _ => false,
    };
    if !within {
        failures.push(ExpectationFailure {
            field,
            expected: serde_json::json!(expected),
            actual: serde_json::json!(actual),
            tolerance,
        });
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "tolerance": failure.tolerance,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single field.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: &'static str,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
    pub tolerance: i64,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if is_waveform_file(&path) {
                fixtures.push(self.metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture samples + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let waveform_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&waveform_path)?;
        let (waveform, description) = read_waveform(&waveform_path)?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            description,
            waveform,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, waveform_path: &Path) -> Result<FixtureMetadata> {
        let name = waveform_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", waveform_path.display()))?
            .to_string();
        let expect_path = waveform_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            waveform_path: waveform_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn is_waveform_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    file_name.ends_with(".json") && !file_name.ends_with(EXPECT_SUFFIX)
}

fn is_text_dump(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("txt") | Some("csv")
    )
}

fn read_waveform(path: &Path) -> Result<(Waveform, Option<String>)> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    if is_text_dump(path) {
        let waveform = Waveform::parse_text(&contents)
            .with_context(|| format!("parsing text dump {}", path.display()))?;
        return Ok((waveform, None));
    }

    let file: FixtureFile =
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok((Waveform::new(file.samples), file.description))
}
