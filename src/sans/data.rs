//! Base types, and the extraction of raw field values from data messages.

use super::bytes::{assemble_wide, sign_extend};
use crate::value::Value;

/// How the bytes of a base type are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Unsigned,
    Signed,
    Float,
    Text,
}

macro_rules! base_types {
    ($($variant:ident = $code:literal, $name:literal, $width:literal, $repr:ident, $invalid:expr, $(#[$attr:meta])*;)*) => {
        /// A protocol base type, selected by the low bits of a definition
        /// field's type byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum BaseType {
            $($(#[$attr])* $variant,)*
        }

        impl BaseType {
            /// Look up a base type by type byte, ignoring the endian flag.
            pub fn from_code(code: u8) -> Option<Self> {
                match code & 0x1F {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Size of one element in bytes.
            pub fn width(self) -> usize {
                match self {
                    $(Self::$variant => $width,)*
                }
            }

            fn repr(self) -> Repr {
                match self {
                    $(Self::$variant => Repr::$repr,)*
                }
            }

            /// Bit pattern marking an element as invalid.
            pub fn invalid(self) -> u64 {
                match self {
                    $(Self::$variant => $invalid,)*
                }
            }
        }
    };
}

base_types! {
    Enum = 0x00, "enum", 1, Unsigned, 0xFF, /** `enum` */;
    Sint8 = 0x01, "sint8", 1, Signed, 0x7F, /** `sint8` */;
    Uint8 = 0x02, "uint8", 1, Unsigned, 0xFF, /** `uint8` */;
    Sint16 = 0x03, "sint16", 2, Signed, 0x7FFF, /** `sint16` */;
    Uint16 = 0x04, "uint16", 2, Unsigned, 0xFFFF, /** `uint16` */;
    Sint32 = 0x05, "sint32", 4, Signed, 0x7FFF_FFFF, /** `sint32` */;
    Uint32 = 0x06, "uint32", 4, Unsigned, 0xFFFF_FFFF, /** `uint32` */;
    String = 0x07, "string", 1, Text, 0x00, /** `string`, NUL terminated UTF-8 */;
    Float32 = 0x08, "float32", 4, Float, 0xFFFF_FFFF, /** `float32` */;
    Float64 = 0x09, "float64", 8, Float, u64::MAX, /** `float64` */;
    Uint8z = 0x0A, "uint8z", 1, Unsigned, 0x00, /** `uint8z` */;
    Uint16z = 0x0B, "uint16z", 2, Unsigned, 0x0000, /** `uint16z` */;
    Uint32z = 0x0C, "uint32z", 4, Unsigned, 0x0000_0000, /** `uint32z` */;
    Byte = 0x0D, "byte", 1, Unsigned, 0xFF, /** `byte` */;
    Sint64 = 0x0E, "sint64", 8, Signed, 0x7FFF_FFFF_FFFF_FFFF, /** `sint64` */;
    Uint64 = 0x0F, "uint64", 8, Unsigned, u64::MAX, /** `uint64` */;
    Uint64z = 0x10, "uint64z", 8, Unsigned, 0, /** `uint64z` */;
}

/// Extract the value of a field from its bytes.
///
/// Endian-sensitive fields are assembled element by element in the owning
/// definition's byte order; others are assembled little-endian. A field
/// holding more than one element becomes an array.
///
/// Returns `None` for fields holding the base type's invalid marker (in every
/// element, for arrays), and for empty strings.
pub fn read_field(
    r: &[u8],
    base_type: BaseType,
    endian_sensitive: bool,
    little_endian: bool,
) -> Option<Value> {
    if base_type.repr() == Repr::Text {
        let end = r.iter().position(|b| *b == 0).unwrap_or(r.len());
        return match String::from_utf8_lossy(&r[..end]) {
            s if s.is_empty() => None,
            s => Some(Value::Text(s.into_owned())),
        };
    }

    // Sizes that are not a multiple of the element width are read as bytes.
    let base_type = if r.is_empty() || r.len() % base_type.width() != 0 {
        BaseType::Byte
    } else {
        base_type
    };

    let little_endian = little_endian || !endian_sensitive;

    let mut any_valid = false;
    let mut elements: Vec<Value> = r
        .chunks_exact(base_type.width())
        .filter_map(|chunk| {
            let raw = assemble_wide(little_endian, chunk)?;
            any_valid |= raw != base_type.invalid();
            Some(element(raw, base_type))
        })
        .collect();

    if !any_valid {
        return None;
    }

    if elements.len() == 1 {
        elements.pop()
    } else {
        Some(Value::Array(elements))
    }
}

fn element(raw: u64, base_type: BaseType) -> Value {
    match (base_type.repr(), base_type.width()) {
        (Repr::Signed, width) => Value::Integer(sign_extend(raw, width)),
        (Repr::Float, 4) => Value::Float(f64::from(f32::from_bits(raw as u32))),
        (Repr::Float, _) => Value::Float(f64::from_bits(raw)),
        _ => i64::try_from(raw).map_or(Value::Float(raw as f64), Value::Integer),
    }
}
