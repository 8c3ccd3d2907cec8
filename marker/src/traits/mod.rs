//! # Traits
//!
//! Seams of the evaluation: how a report is parsed, how per-test scores are
//! combined, and how feedback is written.
//!
//! - [`report_parser`]: JSON into typed reports.
//! - [`calculator`]: per-test scores into one final score.
//! - [`feedback`]: per-test verdicts into messages.

pub mod calculator;
pub mod feedback;
pub mod report_parser;
