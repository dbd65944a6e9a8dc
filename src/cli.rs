//! Command-line surface and wiring.
//!
//! Loads the suite, constructs the subprocess-backed evaluator, hands both
//! to the runner, and maps the tally to an exit status. Fatal errors are
//! rendered as miette reports on stderr.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::errors::RegoTestError;
use crate::evaluator::OpaEvaluator;
use crate::runner::{RunOptions, TestRunner};
use crate::suite::TestSuite;

#[derive(Debug, Parser)]
#[command(
    name = "regotest",
    version,
    about = "A declarative test harness for OPA/rego policies."
)]
pub struct RegoTestArgs {
    /// Path to the test suite JSON file.
    #[arg(required = true)]
    pub suite: PathBuf,

    /// Echo evaluator diagnostics for every test.
    #[arg(long)]
    pub verbose: bool,

    /// Exit after the first failed test.
    #[arg(long)]
    pub bail: bool,

    /// Run only the test(s) with this exact name.
    #[arg(long, value_name = "NAME")]
    pub only: Option<String>,
}

/// Main CLI entry point. Exit code 0 on all-pass, 1 on any failure,
/// bail-out, or suite/evaluator error.
pub fn run() {
    let args = RegoTestArgs::parse();

    println!("RegoTest v{}", env!("CARGO_PKG_VERSION"));

    let suite = TestSuite::load(&args.suite).unwrap_or_else(|e| {
        print_fatal(e);
        process::exit(1);
    });

    let mut runner = TestRunner::new(Box::new(OpaEvaluator::new()));
    let options = RunOptions {
        only: args.only,
        bail: args.bail,
        verbose: args.verbose,
    };

    let tally = runner.run_suite(&suite, &options).unwrap_or_else(|e| {
        print_fatal(e);
        process::exit(1);
    });

    if tally.is_failure() {
        process::exit(1);
    }
}

fn print_fatal(err: RegoTestError) {
    let report = miette::Report::new(err);
    eprintln!("{report:?}");
}
