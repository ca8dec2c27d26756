#![allow(dead_code)]

use freehub::sans::check::checksum16;
use tracing_subscriber::EnvFilter;

pub const RECORD: u16 = 20;
pub const LAP: u16 = 19;
pub const SESSION: u16 = 18;
pub const EVENT: u16 = 21;
pub const ACTIVITY: u16 = 34;
pub const FILE_ID: u16 = 0;

pub const UINT8: u8 = 0x02;
pub const SINT8: u8 = 0x01;
pub const ENUM: u8 = 0x00;
pub const STRING: u8 = 0x07;
pub const UINT16: u8 = 0x84;
pub const SINT32: u8 = 0x85;
pub const UINT32: u8 = 0x86;

/// Install a subscriber writing to the test harness, once per binary.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Builds synthetic documents, computing sizes and CRCs.
#[derive(Debug, Clone)]
pub struct FitBuilder {
    header_size: u8,
    records: Vec<u8>,
}

impl Default for FitBuilder {
    fn default() -> Self {
        Self {
            header_size: 14,
            records: Vec::new(),
        }
    }
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a 12-byte header without a CRC.
    pub fn short_header(mut self) -> Self {
        self.header_size = 12;
        self
    }

    /// Add a little-endian definition message. Fields are `(number, size, type)`.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, &[])
    }

    /// Add a big-endian definition message.
    pub fn definition_be(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 1, global.to_be_bytes(), fields, &[])
    }

    /// Add a little-endian definition message with developer fields.
    pub fn definition_dev(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, developer)
    }

    fn definition_with(
        mut self,
        local: u8,
        architecture: u8,
        global: [u8; 2],
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        let flags = if developer.is_empty() { 0x40 } else { 0x60 };

        self.records.push(flags | local);
        self.records
            .extend_from_slice(&[0, architecture, global[0], global[1], fields.len() as u8]);
        for (number, size, base_type) in fields {
            self.records.extend_from_slice(&[*number, *size, *base_type]);
        }

        if !developer.is_empty() {
            self.records.push(developer.len() as u8);
            for (number, size, index) in developer {
                self.records.extend_from_slice(&[*number, *size, *index]);
            }
        }

        self
    }

    /// Add a data message with a normal header.
    pub fn data(self, local: u8, body: &[u8]) -> Self {
        self.raw_record(local, body)
    }

    /// Add a data message with a compressed timestamp header.
    pub fn compressed(self, local: u8, time_offset: u8, body: &[u8]) -> Self {
        self.raw_record(0x80 | (local << 5) | (time_offset & 0x1F), body)
    }

    pub fn raw_record(mut self, header: u8, body: &[u8]) -> Self {
        self.records.push(header);
        self.records.extend_from_slice(body);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut r = vec![self.header_size, 0x20];
        r.extend_from_slice(&2132u16.to_le_bytes());
        r.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        r.extend_from_slice(b".FIT");

        if self.header_size == 14 {
            let crc = checksum16(&r, 0..12).unwrap();
            r.extend_from_slice(&crc.to_le_bytes());
        }

        r.extend_from_slice(&self.records);

        let crc = checksum16(&r, 0..r.len()).unwrap();
        r.extend_from_slice(&crc.to_le_bytes());

        r
    }
}

/// Concatenate little-endian field bytes into a message body.
pub fn body(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}
