//! Convenience interfaces for decoding whole documents.
//!
//! The functions in this module validate a document's framing, decode every
//! record, and assemble the messages into a [`ParsedActivity`].
//!
//! ```
//! let data = std::fs::read("ride.fit")?;
//! let Decoded { activity, errors } = freehub::avec::decode_slice(&data, &Options::default())?;
//!
//! for record in &activity.records {
//!     println!("{:?} {:?}", record.get("timestamp"), record.get("heart_rate"));
//! }
//! ```
//!
//! With [`Options::force`](crate::Options::force) set (the default), failures
//! are collected into [`Decoded::errors`] alongside a best-effort result.
//! Otherwise the first failure is returned.

pub mod activity;
pub mod reader;
pub mod slice;
#[cfg(feature = "tokio")]
pub mod task;

pub use activity::{Activity, Lap, ParsedActivity, Session};
pub use reader::{decode as decode_reader, decode_with as decode_reader_with};
pub use slice::{decode as decode_slice, decode_with as decode_slice_with};

use thiserror::Error;

use crate::sans::{header::HeaderError, record::RecordError};

/// Errors occurring while decoding a document.
#[derive(Debug, Error)]
pub enum Error {
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] HeaderError),
    /// Malformed record.
    #[error("Malformed record: {0}")]
    Record(#[from] RecordError),
    /// Calculated and found file CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) file CRC values do not match.")]
    FileCrcMismatch { found: u16, calculated: u16 },
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The decoding task panicked or was cancelled.
    ///
    /// _Requires Cargo feature `tokio`._
    #[cfg(feature = "tokio")]
    #[error("Decoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A decoded document, with any failures tolerated while decoding it.
#[derive(Debug)]
pub struct Decoded {
    pub activity: ParsedActivity,
    pub errors: Vec<Error>,
}

impl Decoded {
    /// Whether the document decoded without any failures.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
