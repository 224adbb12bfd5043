//! Arrow IPC batch file reader
//!
//! Span batch files are Arrow IPC files (Feather v2). Files without the
//! `ARROW1` magic are read as Arrow IPC streams.

use crate::error::{ArrowTraceError, Result};
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Leading magic bytes of the Arrow IPC file format
const ARROW_FILE_MAGIC: &[u8; 6] = b"ARROW1";

/// Reads record batches one at a time from an Arrow IPC file or stream
pub enum BatchFileReader {
    File(FileReader<BufReader<File>>),
    Stream(StreamReader<BufReader<File>>),
}

impl BatchFileReader {
    /// Opens a batch file, detecting file or stream format
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArrowTraceError::NotFound(path.display().to_string()),
            _ => ArrowTraceError::Io(e),
        })?;

        let is_file_format = has_file_magic(&mut file)?;
        file.seek(SeekFrom::Start(0))?;
        let reader = BufReader::new(file);

        if is_file_format {
            let reader = FileReader::try_new(reader, None)?;
            debug!(
                "Opened Arrow IPC file {} ({} record batches)",
                path.display(),
                reader.num_batches()
            );
            Ok(BatchFileReader::File(reader))
        } else {
            debug!("Opened Arrow IPC stream {}", path.display());
            Ok(BatchFileReader::Stream(StreamReader::try_new(reader, None)?))
        }
    }

    /// Returns the Arrow schema for the file
    pub fn schema(&self) -> SchemaRef {
        match self {
            BatchFileReader::File(reader) => reader.schema(),
            BatchFileReader::Stream(reader) => reader.schema(),
        }
    }
}

impl Iterator for BatchFileReader {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self {
            BatchFileReader::File(reader) => reader.next(),
            BatchFileReader::Stream(reader) => reader.next(),
        };
        next.map(|batch| batch.map_err(ArrowTraceError::from))
    }
}

fn has_file_magic(file: &mut File) -> Result<bool> {
    let mut magic = [0u8; 6];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == ARROW_FILE_MAGIC),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
