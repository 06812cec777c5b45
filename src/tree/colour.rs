//! Colour type and parsing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An RGBA colour value.
///
/// Defaults to opaque black, which is also the fallback the node accessors
/// use when a colour property is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Colour {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Error returned when a string is not a 6 or 8 digit hex colour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex colour '{0}': expected RRGGBB or RRGGBBAA")]
pub struct ParseColourError(pub String);

impl Colour {
    /// Create a new colour from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new opaque colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully transparent colour.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a hex colour string.
    ///
    /// Supports `RRGGBB` and `RRGGBBAA`, with an optional leading `#`.
    /// Short forms are rejected so that three and four digit numbers are not
    /// also read as colours. `#` starts a comment in source files, so values
    /// parsed from content never carry it.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            6 => Some(Self::rgb(
                parse_hex_byte(&hex[0..2])?,
                parse_hex_byte(&hex[2..4])?,
                parse_hex_byte(&hex[4..6])?,
            )),
            8 => Some(Self::new(
                parse_hex_byte(&hex[0..2])?,
                parse_hex_byte(&hex[2..4])?,
                parse_hex_byte(&hex[4..6])?,
                parse_hex_byte(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Convert to RGBA tuple.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 4] {
        self.to_rgba().map(|c| c as f32 / 255.0)
    }

    /// Check if the colour is fully transparent.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Check if the colour is fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl FromStr for Colour {
    type Err = ParseColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| ParseColourError(s.to_string()))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse a two-character hex byte. `from_str_radix` alone would accept a
/// leading `+`.
fn parse_hex_byte(s: &str) -> Option<u8> {
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}
