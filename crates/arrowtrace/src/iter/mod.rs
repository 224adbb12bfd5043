//! Iteration over span tables and span batch files
//!
//! - [`Rows`]: row-at-a-time named-column access over a [`SpanTable`](crate::SpanTable)
//! - [`PayloadBatches`]: fixed-size batches of decoded payloads streamed from files
//! - [`TableWindows`]: fixed-size row windows streamed from files
//!
//! # Example
//!
//! ```rust,no_run
//! use arrowtrace::{stream_batches, ReconstructOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ReconstructOptions::default();
//! for batch in stream_batches("traces_otlp.batch_*.arrow", 100, &options)? {
//!     for span in batch? {
//!         println!("{:?} {:?}", span.trace_id(), span.name());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod payload_iter;
pub mod row_iter;
pub mod window_iter;

pub use payload_iter::{stream_batches, PayloadBatches};
pub use row_iter::{RowView, Rows};
pub use window_iter::{stream_windows, TableWindows};
