//! Decoding of single records.
//!
//! A [`RecordDecoder`] reads the record at a cursor: either a definition
//! message, which is registered in the caller's [`LocalMessageTypeTable`], or a
//! data message, which is decoded against the definition in its slot into a
//! [`DecodedMessage`]. Between calls the decoder holds no state of its own.

use chrono::{DateTime, Utc};
use either::Either::{self, Left, Right};
use thiserror::Error;
use tracing::{trace, warn};

use super::{
    data::read_field,
    definition::{LocalMessageDefinition, LocalMessageTypeTable},
    header::RecordHeader,
};
use crate::{
    options::Options,
    profile::Profile,
    value::{Fields, Value, convert_units, format_by_type},
};

/// An error decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice at offset {offset}.")]
    EndOfSlice { offset: usize },
    /// A data message referenced a local message type that was never defined,
    /// and was decoded with the definition in slot 0 instead.
    #[error("Local message type {local_type} at offset {offset} was never defined.")]
    UndefinedLocalType { local_type: u8, offset: usize },
    /// A data message could not be framed, as neither its local message type
    /// nor slot 0 has been defined.
    #[error("No definition for local message type {local_type} at offset {offset}.")]
    NoDefinition { local_type: u8, offset: usize },
}

/// A decoded data message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage<'p> {
    /// Message name, if the global message number is in the dictionary.
    pub kind: Option<&'p str>,
    pub global_message: u16,
    pub local_type: u8,
    pub fields: Fields,
    /// Bytes consumed, including the record header.
    pub length: usize,
    /// Decoded with the definition in slot 0, as `local_type` was undefined.
    pub fell_back: bool,
}

/// The outcome of decoding one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<'p> {
    /// Offset of the following record.
    pub next: usize,
    /// The slot a definition message was registered in, or a data message.
    pub record: Either<u8, DecodedMessage<'p>>,
}

/// Decodes records against a dictionary and a set of options.
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'p> {
    profile: &'p Profile,
    options: &'p Options,
}

impl<'p> RecordDecoder<'p> {
    pub fn new(profile: &'p Profile, options: &'p Options) -> Self {
        Self { profile, options }
    }

    /// Decode the record at `cursor`.
    ///
    /// `first_record` is the timestamp of the first `record` message of the
    /// document, used to derive `elapsed_time` when enabled.
    pub fn decode(
        &self,
        r: &[u8],
        table: &mut LocalMessageTypeTable,
        cursor: usize,
        first_record: Option<DateTime<Utc>>,
    ) -> Result<Step<'p>, RecordError> {
        let mut next = cursor;
        let i = &mut next;

        let [header] = take(r, i)?;

        match RecordHeader::parse(header) {
            RecordHeader::Definition {
                local_type,
                developer,
            } => {
                let definition =
                    LocalMessageDefinition::parse(r, i, local_type, developer, self.profile)?;

                trace!(
                    local_type,
                    global_message = definition.global_message,
                    fields = definition.fields.len(),
                    developer_data_size = definition.developer_data_size,
                    "registered definition"
                );

                table.define(definition);

                Ok(Step {
                    next: *i,
                    record: Left(local_type),
                })
            }
            RecordHeader::Data {
                local_type,
                time_offset,
            } => {
                if let Some(time_offset) = time_offset {
                    trace!(local_type, time_offset, "ignoring compressed time offset");
                }

                let (definition, fell_back) =
                    table.resolve(local_type).ok_or(RecordError::NoDefinition {
                        local_type,
                        offset: cursor,
                    })?;

                if fell_back {
                    warn!(local_type, offset = cursor, "undefined local type, using slot 0");
                }

                let message = self.decode_data(r, i, definition, first_record)?;

                Ok(Step {
                    next: *i,
                    record: Right(DecodedMessage {
                        local_type,
                        length: *i - cursor,
                        fell_back,
                        ..message
                    }),
                })
            }
        }
    }

    fn decode_data(
        &self,
        r: &[u8],
        i: &mut usize,
        definition: &LocalMessageDefinition,
        first_record: Option<DateTime<Utc>>,
    ) -> Result<DecodedMessage<'p>, RecordError> {
        let global_message = definition.global_message;

        let kind = self
            .profile
            .message_by_number(global_message)
            .map(|m| m.name.as_str());

        if kind.is_none() {
            trace!(global_message, "message not in dictionary");
        }

        let mut fields = Fields::new();

        for field in &definition.fields {
            let bytes = take_slice(r, i, usize::from(field.size))?;

            let Some(profile) = &field.profile else {
                trace!(global_message, field = field.field_number, "field not in dictionary");
                continue;
            };

            let Some(value) = read_field(
                bytes,
                field.base_type,
                field.endian_sensitive,
                field.little_endian,
            ) else {
                continue;
            };

            let value = format_by_type(value, profile, self.profile);
            let value = convert_units(value, profile.family, self.options);

            fields.insert(profile.name.clone(), value);
        }

        take_slice(r, i, definition.developer_data_size)?;

        if kind == Some("record") && self.options.elapsed_record_field {
            let timestamp = fields.get("timestamp").and_then(Value::as_timestamp);

            if let (Some(first), Some(timestamp)) = (first_record, timestamp) {
                let elapsed = (timestamp - first).num_milliseconds() as f64 / 1000.0;
                fields.insert("elapsed_time".to_owned(), Value::Float(elapsed));
            }
        }

        Ok(DecodedMessage {
            kind,
            global_message,
            local_type: definition.local_type,
            fields,
            length: 0,
            fell_back: false,
        })
    }
}

/// Take an exact number of bytes from an offset in a slice, advancing the offset.
pub(super) fn take<const N: usize>(r: &[u8], i: &mut usize) -> Result<[u8; N], RecordError> {
    let s = *i;

    let bytes = r
        .get(s..s + N)
        .and_then(|b| b.try_into().ok())
        .ok_or(RecordError::EndOfSlice { offset: s })?;

    *i += N;

    Ok(bytes)
}

/// Take a run of bytes from an offset in a slice, advancing the offset.
pub(super) fn take_slice<'a>(
    r: &'a [u8],
    i: &mut usize,
    n: usize,
) -> Result<&'a [u8], RecordError> {
    let s = *i;

    let bytes = r
        .get(s..s + n)
        .ok_or(RecordError::EndOfSlice { offset: s })?;

    *i += n;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::fit_timestamp;

    /// A definition for `record` in slot `local`: timestamp, heart rate, and
    /// an unknown field.
    fn definition(local: u8) -> Vec<u8> {
        let mut r = vec![0x40 | local, 0, 0, 20, 0, 3];
        r.extend_from_slice(&[253, 4, 0x86, 3, 1, 0x02, 200, 1, 0x02]);
        r
    }

    fn data(header: u8, timestamp: u32, heart_rate: u8) -> Vec<u8> {
        let mut r = vec![header];
        r.extend_from_slice(&timestamp.to_le_bytes());
        r.extend_from_slice(&[heart_rate, 9]);
        r
    }

    fn decoder(options: &Options) -> RecordDecoder<'_> {
        RecordDecoder::new(Profile::standard(), options)
    }

    #[test]
    fn definition_then_data() {
        let options = Options::default();
        let mut table = LocalMessageTypeTable::default();

        let mut r = definition(1);
        r.extend(data(0x01, 1000, 140));

        let step = decoder(&options).decode(&r, &mut table, 0, None).unwrap();
        assert_eq!(step.next, 15);
        assert_eq!(step.record, Left(1));

        let step = decoder(&options)
            .decode(&r, &mut table, step.next, None)
            .unwrap();
        assert_eq!(step.next, r.len());

        let message = step.record.right().unwrap();
        assert_eq!(message.kind, Some("record"));
        assert_eq!(message.length, 7);
        assert!(!message.fell_back);
        assert_eq!(message.fields.len(), 2);
        assert_eq!(message.fields["heart_rate"], Value::Integer(140));
        assert_eq!(
            message.fields["timestamp"],
            Value::Timestamp(fit_timestamp(1000).unwrap())
        );
    }

    #[test]
    fn compressed_header_uses_slot() {
        let options = Options::default();
        let mut table = LocalMessageTypeTable::default();

        let mut r = definition(2);
        r.extend(data(0b1100_0101, 1000, 90));

        let step = decoder(&options).decode(&r, &mut table, 0, None).unwrap();
        let step = decoder(&options)
            .decode(&r, &mut table, step.next, None)
            .unwrap();

        let message = step.record.right().unwrap();
        assert_eq!(message.local_type, 2);
        assert_eq!(message.fields["heart_rate"], Value::Integer(90));
    }

    #[test]
    fn falls_back_to_slot_zero() {
        let options = Options::default();
        let mut table = LocalMessageTypeTable::default();

        let mut r = definition(0);
        r.extend(data(0x05, 1000, 90));

        let step = decoder(&options).decode(&r, &mut table, 0, None).unwrap();
        let message = decoder(&options)
            .decode(&r, &mut table, step.next, None)
            .unwrap()
            .record
            .right()
            .unwrap();

        assert!(message.fell_back);
        assert_eq!(message.local_type, 5);
    }

    #[test]
    fn no_definition() {
        let options = Options::default();
        let r = data(0x03, 1000, 90);
        let err = decoder(&options).decode(&r, &mut LocalMessageTypeTable::default(), 0, None);
        assert_eq!(
            err,
            Err(RecordError::NoDefinition {
                local_type: 3,
                offset: 0
            })
        );
    }

    #[test]
    fn truncated_data() {
        let options = Options::default();
        let mut table = LocalMessageTypeTable::default();

        let mut r = definition(0);
        r.extend(&data(0x00, 1000, 90)[..3]);

        let step = decoder(&options).decode(&r, &mut table, 0, None).unwrap();
        let err = decoder(&options).decode(&r, &mut table, step.next, None);
        assert_eq!(err, Err(RecordError::EndOfSlice { offset: 16 }));
    }

    #[test]
    fn elapsed_time() {
        let options = Options {
            elapsed_record_field: true,
            ..Options::default()
        };
        let mut table = LocalMessageTypeTable::default();

        let mut r = definition(0);
        r.extend(data(0x00, 1090, 90));

        let step = decoder(&options).decode(&r, &mut table, 0, None).unwrap();
        let message = decoder(&options)
            .decode(&r, &mut table, step.next, fit_timestamp(1000))
            .unwrap()
            .record
            .right()
            .unwrap();

        assert_eq!(message.fields["elapsed_time"], Value::Float(90.0));
    }
}
