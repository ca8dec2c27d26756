//! Reader-based decoder implementation.
//!
//! The document is buffered in full before decoding, as the file CRC covers
//! every byte and the record section is decoded against its declared length.

use std::io::Read;

use crate::{options::Options, profile::Profile};

use super::{Decoded, Error, slice};

/// Decode a document from a reader, with the standard profile.
///
/// This method is also re-exported as `freehub::avec::decode_reader`.
pub fn decode(r: &mut impl Read, options: &Options) -> Result<Decoded, Error> {
    decode_with(r, options, Profile::standard())
}

/// Decode a document from a reader, with a custom profile.
///
/// This method is also re-exported as `freehub::avec::decode_reader_with`.
pub fn decode_with(
    r: &mut impl Read,
    options: &Options,
    profile: &Profile,
) -> Result<Decoded, Error> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;

    slice::decode_with(&buf, options, profile)
}
