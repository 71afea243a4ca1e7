//! Colour values used by style documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A colour as one packed 32-bit ARGB value.
///
/// Parsing accepts named colours, `#RRGGBB`, `#AARRGGBB`, bare 6- or 8-digit
/// hex, and comma-separated `R,G,B` or `A,R,G,B` decimal components.
/// Six-digit and three-component forms are fully opaque.
///
/// # Example
///
/// ```
/// use plugbox_plugins::Argb;
///
/// let red: Argb = "255,0,0".parse().expect("rgb triple");
/// assert_eq!(red, "FF0000".parse().expect("bare hex"));
/// assert_eq!(red.to_string(), "#FFFF0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb(u32);

/// Error returned when a colour string matches none of the accepted forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised colour value '{input}'")]
pub struct ColorParseError {
    input: String,
}

impl ColorParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }

    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        self.input.as_str()
    }
}

const NAMED_COLOURS: &[(&str, u32)] = &[
    ("black", 0xFF00_0000),
    ("silver", 0xFFC0_C0C0),
    ("gray", 0xFF80_8080),
    ("grey", 0xFF80_8080),
    ("white", 0xFFFF_FFFF),
    ("maroon", 0xFF80_0000),
    ("red", 0xFFFF_0000),
    ("purple", 0xFF80_0080),
    ("fuchsia", 0xFFFF_00FF),
    ("magenta", 0xFFFF_00FF),
    ("green", 0xFF00_8000),
    ("lime", 0xFF00_FF00),
    ("olive", 0xFF80_8000),
    ("yellow", 0xFFFF_FF00),
    ("navy", 0xFF00_0080),
    ("blue", 0xFF00_00FF),
    ("teal", 0xFF00_8080),
    ("aqua", 0xFF00_FFFF),
    ("cyan", 0xFF00_FFFF),
    ("orange", 0xFFFF_A500),
    ("pink", 0xFFFF_C0CB),
    ("brown", 0xFFA5_2A2A),
    ("transparent", 0x0000_0000),
];

impl Argb {
    /// Builds a colour from its four channels.
    #[must_use]
    pub const fn from_channels(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(u32::from_be_bytes([alpha, red, green, blue]))
    }

    /// Builds a fully opaque colour.
    #[must_use]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::from_channels(0xFF, red, green, blue)
    }

    /// Wraps a packed `0xAARRGGBB` value.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Returns the packed `0xAARRGGBB` value.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Returns the channels as `[alpha, red, green, blue]`.
    #[must_use]
    pub const fn channels(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl FromStr for Argb {
    type Err = ColorParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if let Some(colour) = parse_named(text) {
            return Ok(colour);
        }
        if text.contains(',') {
            return parse_components(text).ok_or_else(|| ColorParseError::new(input));
        }
        parse_hex(text).ok_or_else(|| ColorParseError::new(input))
    }
}

fn parse_named(text: &str) -> Option<Argb> {
    NAMED_COLOURS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(text))
        .map(|(_, value)| Argb(*value))
}

fn parse_components(text: &str) -> Option<Argb> {
    let components = text
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    match components.as_slice() {
        [red, green, blue] => Some(Argb::opaque(*red, *green, *blue)),
        [alpha, red, green, blue] => Some(Argb::from_channels(*alpha, *red, *green, *blue)),
        _ => None,
    }
}

fn parse_hex(text: &str) -> Option<Argb> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    match digits.len() {
        6 => Some(Argb(0xFF00_0000 | value)),
        8 => Some(Argb(value)),
        _ => None,
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl Serialize for Argb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Argb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
