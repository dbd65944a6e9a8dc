// Suite driver semantics against a scripted in-process evaluator:
// tally invariants, --only filtering, --bail truncation, verdict comparison.

use std::cell::RefCell;
use std::rc::Rc;

use regotest::errors::RegoTestError;
use regotest::evaluator::{Evaluation, EvaluationRequest, Evaluator};
use regotest::report::ReportStyle;
use regotest::runner::{RunOptions, TestRunner};
use regotest::suite::TestSuite;
use serde_json::{json, Value};

/// Evaluator scripted through each case's input document:
/// - `{"behavior": "process-error"}` fails like a nonzero opa exit,
/// - `{"behavior": "garbled-output"}` fails like unparseable output (fatal),
/// - otherwise the `value` key (or null) is returned as the result.
struct ScriptedEvaluator {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<Evaluation, RegoTestError> {
        self.calls.borrow_mut().push(request.query.to_string());
        match request.input.get("behavior").and_then(Value::as_str) {
            Some("process-error") => Err(RegoTestError::ProcessFailed {
                detail: "exit status != 0".to_string(),
                output: "undefined decision".to_string(),
            }),
            Some("garbled-output") => Err(RegoTestError::NoClosingBrace),
            _ => Ok(Evaluation {
                value: request.input.get("value").cloned().unwrap_or(Value::Null),
                raw_output: "raw".to_string(),
            }),
        }
    }
}

fn runner() -> (TestRunner, Rc<RefCell<Vec<String>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let evaluator = ScriptedEvaluator {
        calls: calls.clone(),
    };
    let runner = TestRunner::with_style(Box::new(evaluator), ReportStyle::with_colors(false));
    (runner, calls)
}

fn suite(value: Value) -> TestSuite {
    serde_json::from_value(value).unwrap()
}

fn two_entry_point_suite() -> TestSuite {
    suite(json!({
        "source": { "rego": "policy.rego", "data": "data.json", "package": "authz" },
        "entryPoints": [
            { "var": "allow", "tests": [
                { "name": "first", "input": { "value": true }, "expected": true },
                { "name": "second", "input": { "value": 1 }, "expected": 1 }
            ] },
            { "var": "deny", "tests": [
                { "name": "third", "input": { "value": false }, "expected": false },
                { "name": "fourth", "input": { "value": "x" }, "expected": "x" }
            ] }
        ]
    }))
}

#[test]
fn all_passing_suite_runs_everything_in_order() {
    let (mut runner, calls) = runner();
    let tally = runner
        .run_suite(&two_entry_point_suite(), &RunOptions::default())
        .unwrap();

    assert_eq!(tally.total, 4);
    assert_eq!(tally.run, 4);
    assert_eq!(tally.succeeded, 4);
    assert_eq!(tally.failed, 0);
    assert!(!tally.is_failure());
    assert_eq!(
        *calls.borrow(),
        vec!["authz.allow", "authz.allow", "authz.deny", "authz.deny"]
    );
}

#[test]
fn run_always_equals_succeeded_plus_failed() {
    let (mut runner, _) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "pass", "input": { "value": 1 }, "expected": 1 },
                { "name": "fail", "input": { "value": 2 }, "expected": 3 },
                { "name": "error", "input": { "behavior": "process-error" }, "expected": 1 }
            ] }
        ]
    }));

    let tally = runner.run_suite(&suite, &RunOptions::default()).unwrap();
    assert_eq!(tally.run, tally.succeeded + tally.failed);
    assert_eq!(tally.succeeded, 1);
    assert_eq!(tally.failed, 2);
    assert!(tally.is_failure());
}

#[test]
fn only_filter_skips_without_counting() {
    let (mut runner, calls) = runner();
    let options = RunOptions {
        only: Some("third".to_string()),
        ..RunOptions::default()
    };
    let tally = runner.run_suite(&two_entry_point_suite(), &options).unwrap();

    assert_eq!(tally.total, 4);
    assert_eq!(tally.run, 1);
    assert_eq!(tally.succeeded, 1);
    assert_eq!(*calls.borrow(), vec!["authz.deny"]);
}

#[test]
fn empty_only_filter_runs_everything() {
    let (mut runner, _) = runner();
    let options = RunOptions {
        only: Some(String::new()),
        ..RunOptions::default()
    };
    let tally = runner.run_suite(&two_entry_point_suite(), &options).unwrap();
    assert_eq!(tally.run, 4);
}

#[test]
fn only_filter_matching_nothing_runs_nothing() {
    let (mut runner, calls) = runner();
    let options = RunOptions {
        only: Some("no such test".to_string()),
        ..RunOptions::default()
    };
    let tally = runner.run_suite(&two_entry_point_suite(), &options).unwrap();

    assert_eq!(tally.total, 4);
    assert_eq!(tally.run, 0);
    assert!(!tally.is_failure());
    assert!(calls.borrow().is_empty());
}

#[test]
fn bail_stops_before_the_next_case() {
    let (mut runner, calls) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "failing", "input": { "value": 1 }, "expected": 2 },
                { "name": "passing", "input": { "value": 1 }, "expected": 1 }
            ] }
        ]
    }));
    let options = RunOptions {
        bail: true,
        ..RunOptions::default()
    };

    let tally = runner.run_suite(&suite, &options).unwrap();
    assert_eq!(tally.run, 1);
    assert_eq!(tally.succeeded, 0);
    assert_eq!(tally.failed, 1);
    assert!(tally.is_failure());
    // The passing case was never evaluated.
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn type_mismatch_is_a_failure() {
    let (mut runner, _) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "number vs string", "input": { "value": 1 }, "expected": "1" }
            ] }
        ]
    }));

    let tally = runner.run_suite(&suite, &RunOptions::default()).unwrap();
    assert_eq!(tally.failed, 1);
}

#[test]
fn composite_values_compare_structurally() {
    let (mut runner, _) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "matching object",
                  "input": { "value": { "allow": true, "reasons": ["a", "b"] } },
                  "expected": { "reasons": ["a", "b"], "allow": true } },
                { "name": "mismatching list",
                  "input": { "value": ["a", "b"] },
                  "expected": ["b", "a"] }
            ] }
        ]
    }));

    let tally = runner.run_suite(&suite, &RunOptions::default()).unwrap();
    assert_eq!(tally.succeeded, 1);
    assert_eq!(tally.failed, 1);
}

#[test]
fn evaluation_error_fails_the_case_but_not_the_run() {
    let (mut runner, _) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "error", "input": { "behavior": "process-error" }, "expected": true },
                { "name": "after", "input": { "value": true }, "expected": true }
            ] }
        ]
    }));

    let tally = runner.run_suite(&suite, &RunOptions::default()).unwrap();
    assert_eq!(tally.run, 2);
    assert_eq!(tally.failed, 1);
    assert_eq!(tally.succeeded, 1);
}

#[test]
fn unparseable_evaluator_output_aborts_the_run() {
    let (mut runner, calls) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "garbled", "input": { "behavior": "garbled-output" }, "expected": true },
                { "name": "after", "input": { "value": true }, "expected": true }
            ] }
        ]
    }));

    let err = runner.run_suite(&suite, &RunOptions::default()).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, RegoTestError::NoClosingBrace));
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn null_expected_matches_null_value() {
    let (mut runner, _) = runner();
    let suite = suite(json!({
        "source": { "rego": "p.rego", "data": "d.json", "package": "p" },
        "entryPoints": [
            { "var": "v", "tests": [
                { "name": "defaults" }
            ] }
        ]
    }));

    let tally = runner.run_suite(&suite, &RunOptions::default()).unwrap();
    assert_eq!(tally.succeeded, 1);
}
