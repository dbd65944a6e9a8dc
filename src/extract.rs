//! Recovery of the trailing result object from the evaluator's output.
//!
//! The evaluator intermixes free-form diagnostics (rego `print()` calls and
//! the like) with exactly one trailing pretty-printed JSON object:
//!
//! ```text
//! some print output
//! more print output
//! {
//!   "result": [ ... ]
//! }
//! ```
//!
//! Extraction is line-oriented, not a balanced-brace scan: the object's
//! opening and closing braces are assumed to sit in column one of their own
//! lines, which holds for the evaluator's pretty-printer. A diagnostic line
//! that itself starts with `{` or `}` between the boundaries would defeat
//! the heuristic; that fragility is part of the documented contract.

use crate::errors::RegoTestError;

/// Extract the last column-one-delimited object from `text`.
///
/// Scans backward for the last line starting with `}`, then backward again
/// for the nearest line starting with `{`, and returns the inclusive slice
/// joined with newlines. Parsing the result is the caller's concern.
pub fn extract_last_object(text: &str) -> Result<String, RegoTestError> {
    let lines: Vec<&str> = text.split('\n').collect();

    let end_index = lines
        .iter()
        .rposition(|line| line.as_bytes().first() == Some(&b'}'))
        .ok_or(RegoTestError::NoClosingBrace)?;

    let start_index = lines[..=end_index]
        .iter()
        .rposition(|line| line.as_bytes().first() == Some(&b'{'))
        .ok_or(RegoTestError::NoOpeningBrace)?;

    Ok(lines[start_index..=end_index].join("\n"))
}
