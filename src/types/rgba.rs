//! RGBA pixel value used as the key between painted PNGs and legacy tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGBA colour value as painted in a dungeon PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new colour from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new opaque colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a colour from up to four channel bytes.
    ///
    /// Missing channels are zero-filled and extra channels are ignored.
    pub fn from_channels(channels: &[u8]) -> Self {
        let at = |i: usize| channels.get(i).copied().unwrap_or(0);
        Self::new(at(0), at(1), at(2), at(3))
    }

    /// Convert to an RGBA array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(c: Rgba) -> Self {
        c.to_array()
    }
}

impl TryFrom<Vec<u8>> for Rgba {
    type Error = String;

    /// Legacy tile values are written as `[r, g, b]` or `[r, g, b, a]`.
    fn try_from(v: Vec<u8>) -> std::result::Result<Self, Self::Error> {
        match v.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Self::new(*r, *g, *b, *a)),
            other => Err(format!(
                "expected 3 or 4 colour components, got {}",
                other.len()
            )),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}{:02X}",
            self.r, self.g, self.b, self.a
        )
    }
}
