//! Document and record headers.

use core::ops::Range;

use serde::Serialize;
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{U16, U32},
};

use super::check::checksum16;

/// Size of the shortest valid document header.
pub const MIN_HEADER_SIZE: usize = 12;

/// File type marker expected at bytes 8 through 11.
pub const FILE_TAG: [u8; 4] = *b".FIT";

/// An error validating a document header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Too few bytes to hold a document header.
    #[error("File too small to be a FIT file ({len} bytes).")]
    TooSmall { len: usize },
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    BadHeaderSize(u8),
    /// Incorrect file type marker.
    #[error("Missing '.FIT' file type marker (found {0:?}).")]
    MissingFileTag([u8; 4]),
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    HeaderCrcMismatch { found: u16, calculated: u16 },
}

/// A document header, extracted but not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    /// Length of the header in bytes, 12 or 14 when valid.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header.
    pub data_size: u32,
    /// File type marker, `.FIT` when valid.
    pub data_type: [u8; 4],
    /// Header CRC, present only in 14-byte headers.
    pub header_crc: Option<u16>,
}

impl FileHeader {
    /// Extract the header at the start of a document.
    ///
    /// Fails only if fewer than [`MIN_HEADER_SIZE`] bytes are available. All
    /// other checks are left to the `check_*` methods, so that callers may
    /// choose to continue past a malformed header.
    pub fn read(r: &[u8]) -> Result<Self, HeaderError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct RawHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: U16,
            data_size: U32,
            data_type: [u8; 4],
        }

        let bytes: [u8; MIN_HEADER_SIZE] = r
            .get(..MIN_HEADER_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(HeaderError::TooSmall { len: r.len() })?;

        let RawHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(bytes);

        let header_crc = if header_size == 14 {
            r.get(12..14)
                .and_then(|c| <[u8; 2]>::try_from(c).ok())
                .map(u16::from_le_bytes)
        } else {
            None
        };

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: profile_version.get(),
            data_size: data_size.get(),
            data_type,
            header_crc,
        })
    }

    /// Check the header length is one the protocol defines.
    pub fn check_size(&self) -> Result<(), HeaderError> {
        match self.header_size {
            12 | 14 => Ok(()),
            size => Err(HeaderError::BadHeaderSize(size)),
        }
    }

    /// Check the file type marker.
    pub fn check_tag(&self) -> Result<(), HeaderError> {
        if self.data_type == FILE_TAG {
            Ok(())
        } else {
            Err(HeaderError::MissingFileTag(self.data_type))
        }
    }

    /// Check the header CRC against the first twelve bytes of the document.
    ///
    /// Passes when the header carries no CRC, or a CRC of zero (which devices
    /// write when they did not compute one).
    pub fn check_crc(&self, r: &[u8]) -> Result<(), HeaderError> {
        let Some(found) = self.header_crc.filter(|c| *c != 0) else {
            return Ok(());
        };

        let calculated = checksum16(r, 0..MIN_HEADER_SIZE).unwrap_or_default();

        if found != calculated {
            Err(HeaderError::HeaderCrcMismatch { found, calculated })?;
        }

        Ok(())
    }

    /// Byte range of the record section, ending where the file CRC begins.
    pub fn record_range(&self) -> Range<usize> {
        let start = usize::from(self.header_size);
        start..start.saturating_add(self.data_size as usize)
    }
}

/// A decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHeader {
    /// A definition message follows.
    Definition {
        local_type: u8,
        /// Developer field definitions follow the standard ones.
        developer: bool,
    },
    /// A data message follows.
    Data {
        local_type: u8,
        /// Time offset carried by compressed timestamp headers.
        time_offset: Option<u8>,
    },
}

impl RecordHeader {
    /// Decode a record header byte.
    pub fn parse(r: u8) -> Self {
        bitfield! {
            struct Header(u8) {
                [7] is_compressed,
            }
        }

        if Header(r).is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(r);

            Self::Data {
                local_type: header.local_message(),
                time_offset: Some(header.time_offset()),
            }
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(r);
            let local_type = header.local_message();

            if header.is_definition() {
                Self::Definition {
                    local_type,
                    developer: header.is_developer(),
                }
            } else {
                Self::Data {
                    local_type,
                    time_offset: None,
                }
            }
        }
    }

    /// The local message type slot this record refers to.
    pub fn local_type(&self) -> u8 {
        match *self {
            Self::Definition { local_type, .. } | Self::Data { local_type, .. } => local_type,
        }
    }
}
