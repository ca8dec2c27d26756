//! The message, field and type dictionary.
//!
//! A profile maps global message numbers to message names and, per field
//! number, to the field's name, semantic type and numeric post-processing. It
//! also maps enumerated semantic types to their symbolic labels.
//!
//! The standard profile is embedded as a JSON asset and parsed once, on first
//! use. Alternative profiles can be parsed with [`Profile::from_json`] and
//! passed to [`crate::avec::decode_slice_with`].
//!
//! Offsets in the asset are additive: a scaled field decodes as
//! `raw / scale + offset`.

use std::{collections::HashMap, sync::LazyLock};

use serde::{Deserialize, Serialize};

static STANDARD: LazyLock<Profile> = LazyLock::new(|| {
    Profile::from_json(include_str!("profile/fit.json")).expect("embedded profile is valid")
});

/// A message, field and type dictionary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    messages: HashMap<u16, MessageProfile>,
    #[serde(default)]
    types: HashMap<String, EnumProfile>,
}

/// Dictionary entry for a global message number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageProfile {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<u8, FieldProfile>,
}

/// Dictionary entry for a field of a message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldProfile {
    pub name: String,
    /// Semantic type: a base type name (`uint16`), `date_time`, or the name of
    /// an enumerated type.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub family: UnitFamily,
}

/// The unit family a field belongs to, selecting which configured unit
/// conversion applies to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    Speed,
    Distance,
    Temperature,
    #[default]
    None,
}

/// Symbolic labels of an enumerated type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct EnumProfile(HashMap<u32, String>);

impl EnumProfile {
    /// The label for a raw value, if one is defined.
    pub fn label(&self, value: u32) -> Option<&str> {
        self.0.get(&value).map(String::as_str)
    }
}

impl Profile {
    /// The embedded standard profile.
    pub fn standard() -> &'static Profile {
        &STANDARD
    }

    /// Parse a profile from its JSON representation.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn message_by_number(&self, number: u16) -> Option<&MessageProfile> {
        self.messages.get(&number)
    }

    pub fn field_by_message_and_number(&self, message: u16, field: u8) -> Option<&FieldProfile> {
        self.message_by_number(message)?.fields.get(&field)
    }

    pub fn enum_by_type(&self, kind: &str) -> Option<&EnumProfile> {
        self.types.get(kind)
    }
}
