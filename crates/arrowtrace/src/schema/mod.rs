//! Span table column names and schema validation
//!
//! This module provides constants for the flat index columns written next to
//! each serialized span payload, and validation of the columns an operation
//! needs before any row is read.

pub mod field_paths;
pub mod validation;

pub use validation::{validate_columns, ColumnKind, ColumnRequirement};
