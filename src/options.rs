//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::profile::UnitFamily;

/// Options controlling a decoding pass.
///
/// Every option has a default, so a partial configuration deserializes from
/// any serde format:
///
/// ```
/// let options: Options = serde_json::from_str(r#"{"lengthUnit": "km", "mode": "both"}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Report validation failures alongside a best-effort result, rather than
    /// failing on the first.
    pub force: bool,
    pub speed_unit: SpeedUnit,
    pub length_unit: LengthUnit,
    pub temperature_unit: TemperatureUnit,
    /// Add an `elapsed_time` field, in seconds since the first record, to
    /// every `record` message.
    pub elapsed_record_field: bool,
    #[serde(alias = "outputMode")]
    pub mode: OutputMode,
    /// Report header and file CRC mismatches. Mismatches are logged either way.
    pub verify_crc: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            force: true,
            speed_unit: SpeedUnit::default(),
            length_unit: LengthUnit::default(),
            temperature_unit: TemperatureUnit::default(),
            elapsed_record_field: false,
            mode: OutputMode::default(),
            verify_crc: false,
        }
    }
}

impl Options {
    /// The conversion applied to fields of a unit family.
    pub fn conversion(&self, family: UnitFamily) -> Conversion {
        match family {
            UnitFamily::Speed => self.speed_unit.conversion(),
            UnitFamily::Distance => self.length_unit.conversion(),
            UnitFamily::Temperature => self.temperature_unit.conversion(),
            UnitFamily::None => Conversion::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "m/s")]
    MetresPerSecond,
    #[serde(rename = "km/h")]
    KilometresPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl SpeedUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::MetresPerSecond => Conversion::IDENTITY,
            Self::KilometresPerHour => Conversion::scaled(3.6, 1.0),
            Self::MilesPerHour => Conversion::scaled(3.6, 1.4),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "m")]
    Metres,
    #[serde(rename = "km")]
    Kilometres,
    #[serde(rename = "mi")]
    Miles,
}

impl LengthUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::Metres => Conversion::IDENTITY,
            Self::Kilometres => Conversion::scaled(1.0, 1000.0),
            Self::Miles => Conversion::scaled(1.0, 1400.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Kelvin,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::Celsius => Conversion::IDENTITY,
            Self::Kelvin => Conversion {
                offset: -273.15,
                ..Conversion::IDENTITY
            },
            // Values pass through in Celsius.
            Self::Fahrenheit => Conversion::IDENTITY,
        }
    }
}

/// Shape of the decoded output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Flat lists of sessions, laps, records and events.
    #[default]
    List,
    /// A nested activity tree only.
    Cascade,
    /// Both flat lists and the nested tree.
    Both,
}

impl OutputMode {
    pub fn wants_list(self) -> bool {
        matches!(self, Self::List | Self::Both)
    }

    pub fn wants_cascade(self) -> bool {
        matches!(self, Self::Cascade | Self::Both)
    }
}

/// A linear unit conversion, `x * multiplier / divisor + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub multiplier: f64,
    pub divisor: f64,
    pub offset: f64,
}

impl Conversion {
    pub const IDENTITY: Self = Self {
        multiplier: 1.0,
        divisor: 1.0,
        offset: 0.0,
    };

    const fn scaled(multiplier: f64, divisor: f64) -> Self {
        Self {
            multiplier,
            divisor,
            offset: 0.0,
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        x * self.multiplier / self.divisor + self.offset
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}
