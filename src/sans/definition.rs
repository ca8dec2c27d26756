//! Definition messages, and the table of local message types they populate.

use zerocopy::FromBytes;

use super::{
    data::BaseType,
    record::{RecordError, take, take_slice},
};
use crate::profile::{FieldProfile, Profile};

/// Number of local message type slots addressable by a record header.
pub const LOCAL_TYPES: usize = 16;

/// The layout of one field within a data message.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFieldDefinition {
    pub field_number: u8,
    /// Size of the field in bytes, possibly several elements of the base type.
    pub size: u8,
    pub base_type: BaseType,
    /// Multi-byte values are stored in the owning definition's byte order.
    pub endian_sensitive: bool,
    pub little_endian: bool,
    /// Dictionary entry for the field, if it has one.
    pub profile: Option<FieldProfile>,
}

impl LocalFieldDefinition {
    pub fn name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.name.as_str())
    }

    pub fn semantic_type(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.kind.as_str())
    }
}

/// The layout of the data messages recorded in a local message type slot.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMessageDefinition {
    pub local_type: u8,
    pub little_endian: bool,
    pub global_message: u16,
    pub fields: Vec<LocalFieldDefinition>,
    /// Total size of developer fields, skipped when reading data messages.
    pub developer_data_size: usize,
}

#[repr(C, packed)]
#[derive(Debug, FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

impl LocalMessageDefinition {
    /// Parse the body of a definition message starting at `*i`, advancing it
    /// past the message.
    pub fn parse(
        r: &[u8],
        i: &mut usize,
        local_type: u8,
        developer: bool,
        profile: &Profile,
    ) -> Result<Self, RecordError> {
        let DefinitionMessage {
            architecture,
            global_message,
            fields,
            ..
        } = zerocopy::transmute!(take::<5>(r, i)?);

        let little_endian = architecture == 0;
        let global_message = if little_endian {
            u16::from_le_bytes(global_message)
        } else {
            u16::from_be_bytes(global_message)
        };

        let fields = (0..fields)
            .map(|_| -> Result<_, RecordError> {
                let FieldHeader {
                    field,
                    size,
                    base_type,
                } = zerocopy::transmute!(take::<3>(r, i)?);

                Ok(LocalFieldDefinition {
                    field_number: field,
                    size,
                    base_type: BaseType::from_code(base_type).unwrap_or(BaseType::Byte),
                    endian_sensitive: base_type & 0x80 != 0,
                    little_endian,
                    profile: profile
                        .field_by_message_and_number(global_message, field)
                        .cloned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let developer_data_size = if developer {
            let [count] = take::<1>(r, i)?;
            take_slice(r, i, 3 * usize::from(count))?
                .chunks_exact(3)
                .map(|f| usize::from(f[1]))
                .sum::<usize>()
        } else {
            0
        };

        Ok(Self {
            local_type,
            little_endian,
            global_message,
            fields,
            developer_data_size,
        })
    }

    /// Total size in bytes of a data message body using this definition.
    pub fn data_size(&self) -> usize {
        self.fields
            .iter()
            .map(|f| usize::from(f.size))
            .sum::<usize>()
            + self.developer_data_size
    }
}

/// The latest definition registered for each local message type.
#[derive(Debug, Clone, Default)]
pub struct LocalMessageTypeTable {
    slots: [Option<LocalMessageDefinition>; LOCAL_TYPES],
}

impl LocalMessageTypeTable {
    /// Register a definition, replacing any earlier one in its slot.
    pub fn define(&mut self, definition: LocalMessageDefinition) {
        let slot = usize::from(definition.local_type) % LOCAL_TYPES;
        self.slots[slot] = Some(definition);
    }

    pub fn get(&self, local_type: u8) -> Option<&LocalMessageDefinition> {
        self.slots.get(usize::from(local_type))?.as_ref()
    }

    /// The definition for a slot, falling back to slot 0 when the slot was
    /// never defined. The flag is set when the fallback was taken.
    pub fn resolve(&self, local_type: u8) -> Option<(&LocalMessageDefinition, bool)> {
        match self.get(local_type) {
            Some(definition) => Some((definition, false)),
            None => self.get(0).map(|definition| (definition, true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_definition(architecture: u8) -> Vec<u8> {
        let global: [u8; 2] = if architecture == 0 {
            20u16.to_le_bytes()
        } else {
            20u16.to_be_bytes()
        };
        let mut r = vec![0, architecture, global[0], global[1], 3];
        r.extend_from_slice(&[253, 4, 0x86]);
        r.extend_from_slice(&[3, 1, 0x02]);
        r.extend_from_slice(&[250, 2, 0x84]);
        r
    }

    #[test]
    fn parses_fields() {
        let r = record_definition(0);
        let i = &mut 0;
        let def = LocalMessageDefinition::parse(&r, i, 2, false, Profile::standard()).unwrap();

        assert_eq!(*i, r.len());
        assert_eq!(def.global_message, 20);
        assert!(def.little_endian);
        assert_eq!(def.fields.len(), 3);
        assert_eq!(def.fields[0].name(), Some("timestamp"));
        assert_eq!(def.fields[0].semantic_type(), Some("date_time"));
        assert_eq!(def.fields[0].base_type, BaseType::Uint32);
        assert!(def.fields[0].endian_sensitive);
        assert_eq!(def.fields[1].name(), Some("heart_rate"));
        assert!(!def.fields[1].endian_sensitive);
        assert_eq!(def.fields[2].name(), None);
        assert_eq!(def.data_size(), 7);
    }

    #[test]
    fn big_endian_global_number() {
        let r = record_definition(1);
        let def = LocalMessageDefinition::parse(&r, &mut 0, 0, false, Profile::standard()).unwrap();
        assert_eq!(def.global_message, 20);
        assert!(!def.little_endian);
        assert!(def.fields.iter().all(|f| !f.little_endian));
    }

    #[test]
    fn developer_fields_are_sized() {
        let mut r = record_definition(0);
        r.extend_from_slice(&[2, 0, 4, 0, 1, 2, 0]);
        let i = &mut 0;
        let def = LocalMessageDefinition::parse(&r, i, 0, true, Profile::standard()).unwrap();
        assert_eq!(*i, r.len());
        assert_eq!(def.developer_data_size, 6);
        assert_eq!(def.data_size(), 13);
    }

    #[test]
    fn truncated() {
        let r = record_definition(0);
        let err = LocalMessageDefinition::parse(&r[..9], &mut 0, 0, false, Profile::standard());
        assert_eq!(err, Err(RecordError::EndOfSlice { offset: 8 }));
    }

    #[test]
    fn table_fallback() {
        let mut table = LocalMessageTypeTable::default();
        assert!(table.resolve(3).is_none());

        let r = record_definition(0);
        let def = LocalMessageDefinition::parse(&r, &mut 0, 0, false, Profile::standard()).unwrap();
        table.define(def);

        assert!(matches!(table.resolve(0), Some((_, false))));
        assert!(matches!(table.resolve(3), Some((d, true)) if d.local_type == 0));

        let def = LocalMessageDefinition::parse(&r, &mut 0, 3, false, Profile::standard()).unwrap();
        table.define(def);
        assert!(matches!(table.resolve(3), Some((d, false)) if d.local_type == 3));
    }
}
