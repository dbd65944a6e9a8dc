//! Test execution engine and suite driver.
//!
//! `TestRunner` drives one case at a time through the evaluator gateway and
//! turns the outcome into a verdict; `run_suite` iterates the suite in file
//! order, applies the `--only` filter and `--bail` short-circuit, and
//! aggregates the tally. Execution is strictly sequential: one evaluator
//! process at a time, suite order, never reordered.

use std::fmt;

use crate::errors::RegoTestError;
use crate::evaluator::{EvaluationRequest, Evaluator};
use crate::report::ReportStyle;
use crate::suite::{Source, TestCase, TestSuite};

/// Run policy knobs, mapped one-to-one from the CLI flags.
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Exact-name filter; empty or unset runs everything.
    pub only: Option<String>,
    /// Stop at the first failed case.
    pub bail: bool,
    /// Echo evaluator diagnostics.
    pub verbose: bool,
}

/// Monotone run counters. `run == succeeded + failed` holds throughout;
/// `total` is the pre-filter count of every case in the suite.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub total: usize,
    pub run: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunTally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// True when the run should map to a failure exit status.
    pub fn is_failure(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tests, {} run, {} succeeded, {} failed",
            self.total, self.run, self.succeeded, self.failed
        )
    }
}

/// Outcome of one executed test case.
#[derive(Debug)]
pub struct Verdict {
    pub name: String,
    pub succeeded: bool,
}

pub struct TestRunner {
    evaluator: Box<dyn Evaluator>,
    style: ReportStyle,
}

impl TestRunner {
    /// The gateway is injected explicitly; any `Evaluator` impl will do.
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            style: ReportStyle::new(),
        }
    }

    pub fn with_style(evaluator: Box<dyn Evaluator>, style: ReportStyle) -> Self {
        Self { evaluator, style }
    }

    /// Run the whole suite, printing per-case lines and the final tally.
    ///
    /// Per-case evaluation errors become failure verdicts; fatal errors
    /// (evaluator unavailable, unparseable evaluator output) propagate and
    /// abort the run.
    pub fn run_suite(
        &mut self,
        suite: &TestSuite,
        options: &RunOptions,
    ) -> Result<RunTally, RegoTestError> {
        let mut tally = RunTally::new(suite.total_tests());

        for entry_point in &suite.entry_points {
            let query = suite.source.query(&entry_point.var);
            for case in &entry_point.tests {
                if let Some(only) = options.only.as_deref() {
                    if !only.is_empty() && case.name != only {
                        continue;
                    }
                }

                let verdict = self.run_case(case, &suite.source, &query, options.verbose)?;
                tally.run += 1;
                if verdict.succeeded {
                    tally.succeeded += 1;
                } else {
                    tally.failed += 1;
                    if options.bail {
                        println!("{}", tally);
                        return Ok(tally);
                    }
                }
            }
        }

        println!("{}", tally);
        Ok(tally)
    }

    /// Execute one case and render its verdict line.
    ///
    /// Values are compared with recursive structural equality
    /// (`serde_json::Value`'s `PartialEq`): exact on type and shape, so
    /// `1` never matches `"1"`, and composite expected values compare
    /// member-by-member.
    pub fn run_case(
        &mut self,
        case: &TestCase,
        source: &Source,
        query: &str,
        verbose: bool,
    ) -> Result<Verdict, RegoTestError> {
        if verbose {
            self.style
                .print_dimmed(&format!("> Running test '{}'", case.name));
        }

        let request = EvaluationRequest {
            rego_path: &source.rego,
            data_path: &source.data,
            query,
            input: &case.input,
        };

        let evaluation = match self.evaluator.evaluate(&request) {
            Ok(evaluation) => evaluation,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                if verbose {
                    if let Some(output) = err.captured_output() {
                        self.style.print_dimmed("> Test output:");
                        self.style.print_dimmed(output);
                    }
                }
                self.style.print_ko(&case.name);
                println!("evaluate error: {}", err);
                return Ok(Verdict {
                    name: case.name.clone(),
                    succeeded: false,
                });
            }
        };

        if verbose {
            self.style.print_dimmed("> Test output:");
            self.style.print_dimmed(&evaluation.raw_output);
        }

        if evaluation.value != case.expected {
            self.style.print_ko(&case.name);
            println!("expected: {}", case.expected);
            println!("actual: {}", evaluation.value);
            return Ok(Verdict {
                name: case.name.clone(),
                succeeded: false,
            });
        }

        self.style.print_ok(&case.name);
        Ok(Verdict {
            name: case.name.clone(),
            succeeded: true,
        })
    }
}
