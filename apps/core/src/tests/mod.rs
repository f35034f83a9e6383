//! Test Module
//!
//! Cross-module test suites for the civic triage crate.
//!
//! ## Test Categories
//! - `triage_tests`: keyword classifiers, spam heuristic, priority formula
//! - `actor_tests`: model classifier and fallback behaviour with mock LLMs
//! - `database_tests`: store operations, audit history, statistics
//! - `integration_tests`: full submission and administration workflows

pub mod database_tests;
pub mod triage_tests;
