//! Low-level building blocks for implementing decoders.
//!
//! This module is intended for applications that need fine control over
//! decoding, such as walking a document record by record. See
//! [`crate::avec`] for a complete decoder covering the common case.
//!
//! # Architecture
//!
//! A document is a [`header::FileHeader`], a run of records, and a trailing
//! CRC. Each record starts with a one-byte [`header::RecordHeader`]:
//!
//! - A definition message declares the layout of the data messages that
//!   follow it in the same local message type slot. Definitions are held in a
//!   [`definition::LocalMessageTypeTable`], which later definitions for the
//!   same slot overwrite.
//!
//! - A data message carries field values laid out as its slot's definition
//!   declares. Values are extracted per [`data::BaseType`], then formatted by
//!   their semantic type in [`crate::value`].
//!
//! [`record::RecordDecoder`] performs one of these steps per call, returning the
//! offset of the next record. Some areas of the decoding process are left to
//! the caller:
//!
//! - Ending decoding once the specified number of record bytes have been read.
//!
//! - Applying cyclic redundancy checks. Helper functions are provided in the
//!   [`check`] module.

pub mod bytes;
pub mod check;
pub mod data;
pub mod definition;
pub mod header;
pub mod record;

/// Entrypoint for decoding single records.
pub type Decoder<'p> = record::RecordDecoder<'p>;
