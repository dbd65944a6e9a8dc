//! Unified error type for every failure mode in the harness.
//!
//! The taxonomy splits two ways: suite-level errors and evaluator
//! provisioning failures abort the whole run, while everything that can go
//! wrong inside a single evaluation (bad input, process failure, empty
//! result) fails only that test case. The two output-recovery variants are
//! deliberately run-fatal: an evaluator whose output cannot be parsed at all
//! would fail every remaining case the same way.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RegoTestError {
    #[error("failed to read test suite '{path}'")]
    #[diagnostic(code(regotest::suite::read))]
    SuiteRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse test suite '{path}'")]
    #[diagnostic(
        code(regotest::suite::parse),
        help("the suite must be a JSON document with 'source' and 'entryPoints' keys")
    )]
    SuiteParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("opa evaluator unavailable: {reason}")]
    #[diagnostic(code(regotest::evaluator::unavailable))]
    EvaluatorUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    #[error("could not serialize test input")]
    #[diagnostic(code(regotest::evaluator::input))]
    InvalidInput {
        #[source]
        source: serde_json::Error,
    },

    #[error("opa failed: {detail}")]
    #[diagnostic(code(regotest::evaluator::process))]
    ProcessFailed {
        detail: String,
        /// Combined stderr + stdout of the failed invocation.
        output: String,
    },

    #[error("no closing '}}' found in evaluator output")]
    #[diagnostic(
        code(regotest::extract::no_closing_brace),
        help("the evaluator is expected to print its result object with braces in column one")
    )]
    NoClosingBrace,

    #[error("no opening '{{' found in evaluator output")]
    #[diagnostic(code(regotest::extract::no_opening_brace))]
    NoOpeningBrace,

    #[error("invalid json in evaluator response")]
    #[diagnostic(code(regotest::evaluator::json))]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("no result in response")]
    #[diagnostic(code(regotest::evaluator::no_result))]
    NoResult,

    #[error("no expression in result")]
    #[diagnostic(code(regotest::evaluator::no_expression))]
    NoExpression,
}

impl RegoTestError {
    /// True for errors that abort the whole run rather than failing a
    /// single test case.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegoTestError::SuiteRead { .. }
                | RegoTestError::SuiteParse { .. }
                | RegoTestError::EvaluatorUnavailable { .. }
                | RegoTestError::NoClosingBrace
                | RegoTestError::NoOpeningBrace
        )
    }

    /// The raw evaluator output attached to this error, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            RegoTestError::ProcessFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
