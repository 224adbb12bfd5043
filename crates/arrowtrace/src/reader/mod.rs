//! Span table reading
//!
//! A [`SpanTable`] is the row-iterable view over one or more span batch files.
//! It keeps the Arrow record batches as read and never copies column data:
//! [`SpanTable::concat`] appends batches, [`SpanTable::slice`] takes zero-copy
//! slices.

pub mod files;
pub mod ipc;

pub use files::expand_pattern;
pub use ipc::BatchFileReader;

use crate::error::{ArrowTraceError, Result};
use crate::iter::Rows;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A table of span rows backed by Arrow record batches
///
/// Columns are looked up by name, so batches coming from different files may
/// order their columns differently.
#[derive(Debug, Clone)]
pub struct SpanTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    num_rows: usize,
}

impl SpanTable {
    /// Creates a table from record batches sharing the given columns
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (index, batch) in batches.iter().enumerate() {
            check_same_columns(&schema, &batch.schema(), index)?;
        }
        let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
        Ok(Self {
            schema,
            batches,
            num_rows,
        })
    }

    /// Creates a table with no rows
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
            num_rows: 0,
        }
    }

    /// Opens one span batch file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BatchFileReader::open(path)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>>>()?;
        let table = Self::try_new(schema, batches)?;
        debug!("Loaded {} rows from {}", table.num_rows, path.display());
        Ok(table)
    }

    /// Opens every file matching a glob pattern, in sorted path order, as one table
    pub fn load_all(pattern: &str) -> Result<Self> {
        let paths = expand_pattern(pattern)?;
        info!("Found {} batch files", paths.len());

        let tables = paths
            .iter()
            .map(SpanTable::open)
            .collect::<Result<Vec<_>>>()?;
        let table = Self::concat(tables)?;

        info!("Loaded {} total spans", table.num_rows);
        Ok(table)
    }

    /// Concatenates tables, preserving their order
    ///
    /// Every table must have the same column names and types as the first.
    /// Concatenating no tables yields an empty table without columns.
    pub fn concat<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = SpanTable>,
    {
        let mut tables = tables.into_iter();
        let Some(mut combined) = tables.next() else {
            return Ok(Self::empty(Arc::new(Schema::empty())));
        };

        for (offset, table) in tables.enumerate() {
            check_same_columns(&combined.schema, &table.schema, offset + 1)?;
            combined.num_rows += table.num_rows;
            combined.batches.extend(table.batches);
        }

        Ok(combined)
    }

    /// Returns a lazy iterator over the rows in physical order
    pub fn rows(&self) -> Rows<'_> {
        Rows::new(&self.batches)
    }

    /// Returns the rows `offset..offset + length`, clamped to the table bounds
    pub fn slice(&self, offset: usize, length: usize) -> SpanTable {
        let end = offset.saturating_add(length).min(self.num_rows);
        let mut batches = Vec::new();
        let mut batch_start = 0;

        for batch in &self.batches {
            let batch_end = batch_start + batch.num_rows();
            let start = offset.max(batch_start);
            let stop = end.min(batch_end);
            if start < stop {
                batches.push(batch.slice(start - batch_start, stop - start));
            }
            batch_start = batch_end;
            if batch_start >= end {
                break;
            }
        }

        let num_rows = batches.iter().map(RecordBatch::num_rows).sum();
        SpanTable {
            schema: self.schema.clone(),
            batches,
            num_rows,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.column_with_name(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }
}

/// Checks that two schemas have the same column names with the same types
fn check_same_columns(expected: &Schema, found: &Schema, index: usize) -> Result<()> {
    let columns = |schema: &Schema| -> BTreeMap<String, String> {
        schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), format!("{:?}", f.data_type())))
            .collect()
    };

    let expected_columns = columns(expected);
    let found_columns = columns(found);
    if expected_columns == found_columns {
        return Ok(());
    }

    let describe = |columns: &BTreeMap<String, String>| {
        columns
            .iter()
            .map(|(name, data_type)| format!("{}: {}", name, data_type))
            .collect::<Vec<_>>()
            .join(", ")
    };

    Err(ArrowTraceError::SchemaMismatch {
        index,
        expected: describe(&expected_columns),
        found: describe(&found_columns),
    })
}
