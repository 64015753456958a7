//! Input adapters
//!
//! Parse heterogeneous position records into the canonical fix type. Bad
//! records are local: they are skipped and surfaced as warnings, never
//! aborting a whole file. Only a JSON document with no recognisable
//! trajectory array at all fails the call.

pub mod extended;
pub mod json;
pub mod text;
pub mod timestamp;

pub use extended::{from_extended, parse_csv, parse_csv_extended};
pub use json::{load_from_json, load_from_json_str, load_from_json_with_base};
pub use text::{parse_from_string, parse_from_string_with_base};
pub use timestamp::parse_timestamp;

use crate::core::Fix;
use std::fmt;

/// Per-record problems encountered while parsing. `record` is the 1-based
/// line number (text/CSV) or 0-based element index (JSON).
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    InvalidFormat { record: usize, details: String },
    RangeViolation { record: usize, field: &'static str, value: f64 },
    InvalidTimestamp { record: usize, token: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::InvalidFormat { record, details } => {
                write!(f, "record {}: invalid format: {}", record, details)
            }
            ParseWarning::RangeViolation { record, field, value } => {
                write!(f, "record {}: {} {} out of range", record, field, value)
            }
            ParseWarning::InvalidTimestamp { record, token } => {
                write!(f, "record {}: unparseable timestamp '{}'", record, token)
            }
        }
    }
}

impl std::error::Error for ParseWarning {}

/// Unrecoverable input problems: the document as a whole has no usable shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnsupportedStructure { details: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnsupportedStructure { details } => {
                write!(f, "unsupported input structure: {}", details)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Fixes that survived parsing plus the warnings for those that did not.
/// Every emitted fix satisfies the coordinate invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub fixes: Vec<Fix>,
    pub warnings: Vec<ParseWarning>,
}
