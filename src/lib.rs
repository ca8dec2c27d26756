//! A decoder for Garmin's Flexible and Interoperable Data Transfer activity
//! files.
//!
//! Freehub turns a FIT document into named, formatted field values: timestamps
//! become calendar times, positions become degrees, scaled integers become
//! floats in the configured units, and enumerations become their labels.
//! Messages are collected into flat lists, or a nested activity tree where
//! each session owns its laps and each lap owns its records.
//!
//! Most users should begin with [`avec::decode_slice`] or
//! [`avec::decode_reader`], configured with [`Options`]. For finer control,
//! records can be decoded one at a time with the building blocks in [`sans`].
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `tokio`: enable decoding on a blocking task of a Tokio runtime.

pub mod avec;
pub mod options;
pub mod profile;
pub mod sans;
pub mod value;

pub use options::Options;
pub use profile::Profile;
pub use value::{Fields, Value};
