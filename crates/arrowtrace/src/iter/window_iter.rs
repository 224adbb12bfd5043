//! Streaming fixed-size row windows from span batch files

use crate::error::{ArrowTraceError, Result};
use crate::reader::{expand_pattern, SpanTable};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::debug;

/// Iterator over row windows of span tables
///
/// Each file is loaded when reached and cut into zero-copy slices of
/// `window` rows; the last slice of a file holds the remainder. Windows never
/// span files. A failure to open a file is yielded once and ends iteration.
pub struct TableWindows {
    files: VecDeque<PathBuf>,
    current: Option<(SpanTable, usize)>,
    window: usize,
    done: bool,
}

/// Streams row windows from every file matching `pattern`
pub fn stream_windows(pattern: &str, window: usize) -> Result<TableWindows> {
    if window == 0 {
        return Err(ArrowTraceError::InvalidArgument(
            "window size must be positive".to_string(),
        ));
    }
    let files = expand_pattern(pattern)?;

    Ok(TableWindows {
        files: files.into(),
        current: None,
        window,
        done: false,
    })
}

impl Iterator for TableWindows {
    type Item = Result<SpanTable>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some((table, offset)) = self.current.as_mut() {
                if *offset < table.num_rows() {
                    let window = table.slice(*offset, self.window);
                    *offset += window.num_rows();
                    return Some(Ok(window));
                }
                self.current = None;
            }

            let Some(path) = self.files.pop_front() else {
                self.done = true;
                return None;
            };
            match SpanTable::open(&path) {
                Ok(table) => {
                    debug!("Windowing {} ({} rows)", path.display(), table.num_rows());
                    self.current = Some((table, 0));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
