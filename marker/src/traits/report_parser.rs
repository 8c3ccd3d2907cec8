//! Report Parser Trait
//!
//! [`ReportParser`] turns raw JSON into a typed report, validating it on the
//! way. Implementations return a [`MarkerError`] naming what is wrong rather
//! than filling in defaults.
//!
//! # Example
//!
//! ```rust
//! use serde_json::Value;
//! use marker::error::MarkerError;
//! use marker::traits::report_parser::ReportParser;
//!
//! struct CountParser;
//!
//! impl ReportParser<usize> for CountParser {
//!     fn parse(&self, raw: &Value) -> Result<usize, MarkerError> {
//!         raw.as_array()
//!             .map(Vec::len)
//!             .ok_or_else(|| MarkerError::InvalidReport("expected an array".into()))
//!     }
//! }
//! ```

use crate::error::MarkerError;
use serde_json::Value;

/// Parses a JSON value into `T`.
pub trait ReportParser<T> {
    fn parse(&self, raw: &Value) -> Result<T, MarkerError>;
}
