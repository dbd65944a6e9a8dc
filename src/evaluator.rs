//! The evaluator gateway: invoking opa and recovering its result.
//!
//! The policy evaluator is an opaque external executable. The gateway owns
//! the whole invocation contract: argument construction, feeding the input
//! document on stdin, capturing the combined output, and navigating the
//! response envelope down to the single evaluated value.
//!
//! The seam is the [`Evaluator`] trait, so the suite driver can be exercised
//! against an in-process fake without any subprocess.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::Value;

use crate::errors::RegoTestError;
use crate::extract::extract_last_object;
use crate::provision;

/// Everything one evaluation needs, built per test case and never mutated.
#[derive(Debug)]
pub struct EvaluationRequest<'a> {
    pub rego_path: &'a Path,
    pub data_path: &'a Path,
    /// Fully-qualified query, `package.var`. The gateway prepends `data.`.
    pub query: &'a str,
    pub input: &'a Value,
}

/// The single extracted value plus the raw output kept for diagnostics.
#[derive(Debug)]
pub struct Evaluation {
    pub value: Value,
    pub raw_output: String,
}

/// Capability seam for policy evaluation. One call, one evaluation,
/// fully synchronous.
pub trait Evaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<Evaluation, RegoTestError>;
}

// The response envelope opa prints after any diagnostics:
// { "result": [ { "expressions": [ { "value": ..., "text": ..., "location": ... } ] } ] }

#[derive(Debug, Deserialize)]
struct OpaResponse {
    #[serde(default)]
    result: Vec<OpaResult>,
}

#[derive(Debug, Deserialize)]
struct OpaResult {
    #[serde(default)]
    expressions: Vec<OpaExpression>,
}

#[derive(Debug, Deserialize)]
struct OpaExpression {
    value: Value,
    #[serde(default)]
    #[allow(dead_code)]
    text: String,
    #[serde(default)]
    #[allow(dead_code)]
    location: Value,
}

/// Subprocess-backed evaluator driving the opa binary.
pub struct OpaEvaluator {
    exe_path: PathBuf,
}

impl OpaEvaluator {
    /// Evaluator using the shared cache location for the opa binary,
    /// provisioning it on first use.
    pub fn new() -> Self {
        Self {
            exe_path: provision::opa_cache_path(),
        }
    }

    /// Evaluator bound to an explicit executable, skipping provisioning
    /// cache resolution. Mainly for tests pointing at a fake evaluator.
    pub fn with_exe_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            exe_path: path.into(),
        }
    }

    fn invoke(&self, request: &EvaluationRequest<'_>, input: &[u8]) -> Result<(bool, String), RegoTestError> {
        let mut child = Command::new(&self.exe_path)
            .arg("eval")
            .arg("--fail")
            .arg("--stdin-input")
            .arg("-d")
            .arg(request.rego_path)
            .arg("-d")
            .arg(request.data_path)
            .arg(format!("data.{}", request.query))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RegoTestError::ProcessFailed {
                detail: format!("could not spawn '{}': {}", self.exe_path.display(), e),
                output: String::new(),
            })?;

        // stdin is always piped above. The input document is small, so a
        // plain write-then-wait is safe: opa drains stdin before it starts
        // producing output.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .map_err(|e| RegoTestError::ProcessFailed {
                    detail: format!("could not write input: {}", e),
                    output: String::new(),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| RegoTestError::ProcessFailed {
                detail: format!("wait failed: {}", e),
                output: String::new(),
            })?;

        // Rego print() diagnostics land on stderr and the result object on
        // stdout, so stderr-then-stdout reproduces the "diagnostics before
        // result" layout the extraction contract expects.
        let mut combined = String::from_utf8_lossy(&output.stderr).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stdout));

        Ok((output.status.success(), combined))
    }
}

impl Default for OpaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for OpaEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<Evaluation, RegoTestError> {
        provision::ensure_opa(&self.exe_path)?;

        let input =
            serde_json::to_vec(request.input).map_err(|e| RegoTestError::InvalidInput { source: e })?;

        let (success, combined) = self.invoke(request, &input)?;
        if !success {
            return Err(RegoTestError::ProcessFailed {
                detail: "exit status != 0".to_string(),
                output: combined,
            });
        }

        let raw_object = extract_last_object(&combined)?;
        let response: OpaResponse = serde_json::from_str(&raw_object)
            .map_err(|e| RegoTestError::InvalidJson { source: e })?;

        let result = response.result.into_iter().next().ok_or(RegoTestError::NoResult)?;
        let expression = result
            .expressions
            .into_iter()
            .next()
            .ok_or(RegoTestError::NoExpression)?;

        Ok(Evaluation {
            value: expression.value,
            raw_output: combined,
        })
    }
}
