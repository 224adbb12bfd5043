//! Row iteration with named-column access

use crate::error::{ArrowTraceError, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use arrow::record_batch::RecordBatch;
use std::borrow::Cow;

/// One row of a span table
///
/// Accessors return `Ok(None)` for null cells, [`ArrowTraceError::MissingColumn`]
/// for absent columns and [`ArrowTraceError::InvalidColumnType`] for columns
/// of an unusable type.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    batch: &'a RecordBatch,
    row: usize,
    index: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(batch: &'a RecordBatch, row: usize, index: usize) -> Self {
        Self { batch, row, index }
    }

    /// Position of this row in the table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    /// Reads a string cell
    pub fn str(&self, name: &str) -> Result<Option<&'a str>> {
        let Some(column) = self.non_null_column(name)? else {
            return Ok(None);
        };

        let value = match column.data_type() {
            DataType::Utf8 => column.as_string::<i32>().value(self.row),
            DataType::LargeUtf8 => column.as_string::<i64>().value(self.row),
            DataType::Utf8View => column.as_string_view().value(self.row),
            other => return Err(invalid_type(name, "string", other)),
        };
        Ok(Some(value))
    }

    /// Reads a string cell, treating an absent column like a null cell
    pub fn str_or_none(&self, name: &str) -> Result<Option<&'a str>> {
        if self.has_column(name) {
            self.str(name)
        } else {
            Ok(None)
        }
    }

    /// Reads an integer cell of any width as i64
    pub fn int(&self, name: &str) -> Result<Option<i64>> {
        let Some(column) = self.non_null_column(name)? else {
            return Ok(None);
        };

        let row = self.row;
        let value = match column.data_type() {
            DataType::Int8 => column.as_primitive::<Int8Type>().value(row) as i64,
            DataType::Int16 => column.as_primitive::<Int16Type>().value(row) as i64,
            DataType::Int32 => column.as_primitive::<Int32Type>().value(row) as i64,
            DataType::Int64 => column.as_primitive::<Int64Type>().value(row),
            DataType::UInt8 => column.as_primitive::<UInt8Type>().value(row) as i64,
            DataType::UInt16 => column.as_primitive::<UInt16Type>().value(row) as i64,
            DataType::UInt32 => column.as_primitive::<UInt32Type>().value(row) as i64,
            DataType::UInt64 => {
                let raw = column.as_primitive::<UInt64Type>().value(row);
                i64::try_from(raw).map_err(|_| ArrowTraceError::InvalidValue {
                    column: name.to_string(),
                    row: self.index,
                    reason: format!("{} does not fit in i64", raw),
                })?
            }
            other => return Err(invalid_type(name, "integer", other)),
        };
        Ok(Some(value))
    }

    /// Reads a string or integer cell as text
    pub fn text(&self, name: &str) -> Result<Option<Cow<'a, str>>> {
        let Some(column) = self.non_null_column(name)? else {
            return Ok(None);
        };

        if matches!(
            column.data_type(),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ) {
            return Ok(self.str(name)?.map(Cow::Borrowed));
        }

        match self.int(name) {
            Ok(value) => Ok(value.map(|v| Cow::Owned(v.to_string()))),
            Err(ArrowTraceError::InvalidColumnType { actual, .. }) => Err(
                ArrowTraceError::InvalidColumnType {
                    column: name.to_string(),
                    expected: "string or integer".to_string(),
                    actual,
                },
            ),
            Err(e) => Err(e),
        }
    }

    fn non_null_column(&self, name: &str) -> Result<Option<&'a ArrayRef>> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| ArrowTraceError::MissingColumn(name.to_string()))?;

        if column.is_null(self.row) {
            Ok(None)
        } else {
            Ok(Some(column))
        }
    }
}

fn invalid_type(column: &str, expected: &str, actual: &DataType) -> ArrowTraceError {
    ArrowTraceError::InvalidColumnType {
        column: column.to_string(),
        expected: expected.to_string(),
        actual: format!("{:?}", actual),
    }
}

/// Lazy iterator over the rows of a span table, in physical order
pub struct Rows<'a> {
    batches: &'a [RecordBatch],
    current_batch: usize,
    current_row: usize,
    index: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(batches: &'a [RecordBatch]) -> Self {
        Self {
            batches,
            current_batch: 0,
            current_row: 0,
            index: 0,
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = RowView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let batch = self.batches.get(self.current_batch)?;

            if self.current_row < batch.num_rows() {
                let view = RowView::new(batch, self.current_row, self.index);
                self.current_row += 1;
                self.index += 1;
                return Some(view);
            }

            // Current batch exhausted, move to the next one
            self.current_batch += 1;
            self.current_row = 0;
        }
    }
}
