//! Streaming decoded payloads from span batch files

use crate::domain::SpanPayload;
use crate::error::{ArrowTraceError, Result};
use crate::iter::RowView;
use crate::options::{DecodePolicy, ReconstructOptions};
use crate::reader::{expand_pattern, BatchFileReader};
use crate::reconstruct::decode_row;
use crate::schema::{validate_columns, ColumnKind, ColumnRequirement};
use arrow::record_batch::RecordBatch;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, warn};

/// File currently being streamed
struct OpenFile {
    path: PathBuf,
    reader: BatchFileReader,
    payload_column: String,
    batch: Option<RecordBatch>,
    row: usize,
    rows_read: usize,
}

/// Iterator over batches of decoded span payloads
///
/// Files are opened one at a time in sorted path order and read one record
/// batch at a time. Each yielded batch holds `batch_size` payloads except the
/// last batch of a file, which holds the remainder. Batches never span files.
///
/// Under [`DecodePolicy::Abort`] the first undecodable row is yielded as an
/// error and the iterator ends. Under [`DecodePolicy::Skip`] the row is logged
/// and counted in [`PayloadBatches::skipped`].
pub struct PayloadBatches {
    files: VecDeque<PathBuf>,
    current: Option<OpenFile>,
    batch_size: usize,
    options: ReconstructOptions,
    pending: Vec<SpanPayload>,
    skipped: usize,
    done: bool,
}

/// Streams decoded payloads from every file matching `pattern`
pub fn stream_batches(
    pattern: &str,
    batch_size: usize,
    options: &ReconstructOptions,
) -> Result<PayloadBatches> {
    if batch_size == 0 {
        return Err(ArrowTraceError::InvalidArgument(
            "batch size must be positive".to_string(),
        ));
    }
    let files = expand_pattern(pattern)?;
    debug!(
        "Streaming {} files in batches of {}",
        files.len(),
        batch_size
    );

    Ok(PayloadBatches {
        files: files.into(),
        current: None,
        batch_size,
        options: options.clone(),
        pending: Vec::with_capacity(batch_size),
        skipped: 0,
        done: false,
    })
}

impl PayloadBatches {
    /// Rows dropped so far because their payload could not be decoded
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn open(&self, path: PathBuf) -> Result<OpenFile> {
        let reader = BatchFileReader::open(&path)?;
        let schema = reader.schema();
        let payload_column = self.options.payload_column_in(&schema)?.to_string();
        validate_columns(
            &schema,
            &[ColumnRequirement::required(&payload_column, ColumnKind::String)],
        )?;

        Ok(OpenFile {
            path,
            reader,
            payload_column,
            batch: None,
            row: 0,
            rows_read: 0,
        })
    }

    /// Decodes rows of the current file until a batch is full
    ///
    /// Returns `Ok(false)` once the file is exhausted.
    fn fill(&mut self) -> Result<bool> {
        let Some(file) = self.current.as_mut() else {
            return Ok(false);
        };

        loop {
            if self.pending.len() >= self.batch_size {
                return Ok(true);
            }

            let exhausted = file
                .batch
                .as_ref()
                .map_or(true, |batch| file.row >= batch.num_rows());
            if exhausted {
                match file.reader.next() {
                    Some(batch) => {
                        file.batch = Some(batch?);
                        file.row = 0;
                        continue;
                    }
                    None => return Ok(false),
                }
            }

            let Some(batch) = file.batch.as_ref() else {
                return Ok(false);
            };
            let row = RowView::new(batch, file.row, file.rows_read);
            file.row += 1;
            file.rows_read += 1;

            match decode_row(&row, &file.payload_column) {
                Ok(span) => self.pending.push(span),
                Err(e @ ArrowTraceError::PayloadDecode { .. })
                    if self.options.decode_policy == DecodePolicy::Skip =>
                {
                    warn!("Skipping row in {}: {}", file.path.display(), e);
                    self.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn take_pending(&mut self) -> Vec<SpanPayload> {
        std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size))
    }

    fn fail(&mut self, error: ArrowTraceError) -> Option<Result<Vec<SpanPayload>>> {
        self.done = true;
        self.current = None;
        self.pending.clear();
        Some(Err(error))
    }
}

impl Iterator for PayloadBatches {
    type Item = Result<Vec<SpanPayload>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.current.is_none() {
                let Some(path) = self.files.pop_front() else {
                    self.done = true;
                    return None;
                };
                match self.open(path) {
                    Ok(file) => self.current = Some(file),
                    Err(e) => return self.fail(e),
                }
            }

            match self.fill() {
                Ok(true) => return Some(Ok(self.take_pending())),
                Ok(false) => {
                    if let Some(file) = self.current.take() {
                        debug!("Finished {} ({} rows)", file.path.display(), file.rows_read);
                    }
                    if !self.pending.is_empty() {
                        return Some(Ok(self.take_pending()));
                    }
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}
