//! Decoding on a blocking task of a Tokio runtime.
//!
//! _Requires Cargo feature `tokio`._

use crate::options::Options;

use super::{Decoded, Error, slice};

/// Decode an owned document on a blocking task, with the standard profile.
///
/// Decoding is CPU-bound, so it is moved off the async worker threads with
/// [`tokio::task::spawn_blocking`].
pub async fn decode(data: Vec<u8>, options: Options) -> Result<Decoded, Error> {
    tokio::task::spawn_blocking(move || slice::decode(&data, &options)).await?
}
