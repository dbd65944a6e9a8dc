//! Test suite data model and loading.
//!
//! A suite is a single JSON document naming the policy and data sources plus
//! a list of entry points, each carrying its own test cases:
//!
//! ```json
//! {
//!   "source": { "rego": "policy.rego", "data": "data.json", "package": "authz" },
//!   "entryPoints": [
//!     { "var": "allow",
//!       "tests": [ { "name": "admin allowed", "input": {...}, "expected": true } ] }
//!   ]
//! }
//! ```
//!
//! The suite is immutable once loaded; iteration order over entry points and
//! tests is the file order, which is the execution-order contract.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::errors::RegoTestError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub source: Source,
    pub entry_points: Vec<EntryPoint>,
}

/// Policy and data sources shared by every test in the suite.
#[derive(Debug, Deserialize)]
pub struct Source {
    pub rego: PathBuf,
    pub data: PathBuf,
    pub package: String,
}

#[derive(Debug, Deserialize)]
pub struct EntryPoint {
    pub var: String,
    pub tests: Vec<TestCase>,
}

/// One test case. `input` and `expected` are arbitrary JSON; a missing key
/// deserializes to null. Names are not required to be unique across entry
/// points, so a `--only` filter may match several cases.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub expected: Value,
}

impl TestSuite {
    /// Read and parse a suite file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegoTestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| RegoTestError::SuiteRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| RegoTestError::SuiteParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Number of test cases across all entry points, before any filtering.
    pub fn total_tests(&self) -> usize {
        self.entry_points.iter().map(|ep| ep.tests.len()).sum()
    }
}

impl Source {
    /// Fully-qualified query for an entry point variable: `package.var`.
    pub fn query(&self, var: &str) -> String {
        format!("{}.{}", self.package, var)
    }
}
