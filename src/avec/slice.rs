//! Slice-based decoder implementation.

use either::Either::Right;
use tracing::{debug, warn};

use crate::{
    options::Options,
    profile::Profile,
    sans::{
        Decoder,
        check::checksum16,
        definition::LocalMessageTypeTable,
        header::FileHeader,
        record::RecordError,
    },
};

use super::{Decoded, Error, activity::Assembly};

/// Applies the `force` policy to failures.
struct Reporter {
    force: bool,
    errors: Vec<Error>,
}

impl Reporter {
    fn new(force: bool) -> Self {
        Self {
            force,
            errors: Vec::new(),
        }
    }

    /// Record a failure, returning it instead if decoding may not continue.
    fn report(&mut self, err: impl Into<Error>) -> Result<(), Error> {
        let err = err.into();

        if self.force {
            warn!(%err, "continuing past failure");
            self.errors.push(err);
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Record a failure that never stops decoding.
    fn note(&mut self, err: impl Into<Error>) {
        self.errors.push(err.into());
    }

    fn finish(self, assembly: Assembly, header: Option<FileHeader>) -> Decoded {
        Decoded {
            activity: assembly.finish(header),
            errors: self.errors,
        }
    }
}

/// Decode a document from a slice, with the standard profile.
///
/// This method is also re-exported as `freehub::avec::decode_slice`.
pub fn decode(r: &[u8], options: &Options) -> Result<Decoded, Error> {
    decode_with(r, options, Profile::standard())
}

/// Decode a document from a slice, with a custom profile.
///
/// This method is also re-exported as `freehub::avec::decode_slice_with`.
#[tracing::instrument(level = "debug", skip_all, fields(len = r.len()))]
pub fn decode_with(r: &[u8], options: &Options, profile: &Profile) -> Result<Decoded, Error> {
    let mut reporter = Reporter::new(options.force);
    let mut assembly = Assembly::new(options.mode);

    let header = match FileHeader::read(r) {
        Ok(header) => header,
        Err(err) => {
            reporter.report(err)?;
            return Ok(reporter.finish(assembly, None));
        }
    };

    debug!(?header, "read file header");

    if let Err(err) = header.check_size() {
        reporter.report(err)?;
    }

    if let Err(err) = header.check_tag() {
        reporter.report(err)?;
    }

    if let Err(err) = header.check_crc(r) {
        warn!(%err, "header CRC mismatch");
        if options.verify_crc {
            reporter.report(err)?;
        }
    }

    let records = header.record_range();

    check_file_crc(r, records.end, options, &mut reporter)?;

    let decoder = Decoder::new(profile, options);
    let mut table = LocalMessageTypeTable::default();
    let mut cursor = records.start;

    while cursor < records.end {
        let step = match decoder.decode(r, &mut table, cursor, assembly.first_record()) {
            Ok(step) => step,
            Err(err) => {
                reporter.report(err)?;
                break;
            }
        };

        if let Right(message) = step.record {
            if message.fell_back {
                reporter.note(RecordError::UndefinedLocalType {
                    local_type: message.local_type,
                    offset: cursor,
                });
            }

            assembly.push(message);
        }

        cursor = step.next;
    }

    Ok(reporter.finish(assembly, Some(header)))
}

/// Check the CRC following the record section against every byte before it.
fn check_file_crc(
    r: &[u8],
    end: usize,
    options: &Options,
    reporter: &mut Reporter,
) -> Result<(), Error> {
    let found = r
        .get(end..end.saturating_add(2))
        .and_then(|c| <[u8; 2]>::try_from(c).ok())
        .map(u16::from_le_bytes);

    let Some((found, calculated)) = found.zip(checksum16(r, 0..end)) else {
        warn!(end, len = r.len(), "document ends before its CRC");
        if options.verify_crc {
            reporter.report(RecordError::EndOfSlice { offset: end })?;
        }
        return Ok(());
    };

    if found != calculated {
        warn!(found, calculated, "file CRC mismatch");
        if options.verify_crc {
            reporter.report(Error::FileCrcMismatch { found, calculated })?;
        }
    }

    Ok(())
}
