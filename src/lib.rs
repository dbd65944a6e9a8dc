pub use crate::errors::RegoTestError;

pub mod cli;
pub mod errors;
pub mod evaluator;
pub mod extract;
pub mod provision;
pub mod report;
pub mod runner;
pub mod suite;
