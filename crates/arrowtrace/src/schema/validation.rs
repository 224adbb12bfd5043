//! Schema validation for span batch files

use crate::error::{ArrowTraceError, Result};
use arrow::datatypes::{DataType, Schema};

/// The class of Arrow types a column may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Utf8, LargeUtf8 or Utf8View
    String,
    /// Any signed or unsigned integer
    Integer,
    /// A string, or an integer read as its decimal text
    Text,
}

impl ColumnKind {
    /// Returns true if the data type belongs to this kind
    pub fn accepts(&self, data_type: &DataType) -> bool {
        match self {
            ColumnKind::String => is_string(data_type),
            ColumnKind::Integer => is_integer(data_type),
            ColumnKind::Text => is_string(data_type) || is_integer(data_type),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Integer => "integer",
            ColumnKind::Text => "string or integer",
        }
    }
}

/// A column an operation reads, and whether it must be present
#[derive(Debug, Clone, Copy)]
pub struct ColumnRequirement<'a> {
    pub name: &'a str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl<'a> ColumnRequirement<'a> {
    pub fn required(name: &'a str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'a str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Validates that every required column exists and every present column has a usable type
pub fn validate_columns(schema: &Schema, requirements: &[ColumnRequirement<'_>]) -> Result<()> {
    for requirement in requirements {
        match schema.field_with_name(requirement.name) {
            Ok(field) => {
                if !requirement.kind.accepts(field.data_type()) {
                    return Err(ArrowTraceError::InvalidColumnType {
                        column: requirement.name.to_string(),
                        expected: requirement.kind.describe().to_string(),
                        actual: format!("{:?}", field.data_type()),
                    });
                }
            }
            Err(_) if requirement.required => {
                return Err(ArrowTraceError::MissingColumn(requirement.name.to_string()));
            }
            Err(_) => {}
        }
    }

    Ok(())
}

pub(crate) fn is_string(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

pub(crate) fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
