use std::fmt;

use serde::{Deserialize, Serialize};

/// A palette index on the board (0-15).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Color(u8);

/// Rejected palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("color index {0} is outside the 16-color palette")]
pub struct InvalidColor(pub u8);

impl Color {
    /// Highest palette index.
    pub const MAX: u8 = 15;

    pub const fn new(index: u8) -> Option<Self> {
        if index <= Self::MAX {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Map a single hex digit (`0-9`, `a-f`, either case) to its color.
    pub fn from_hex_digit(c: char) -> Option<Self> {
        c.to_digit(16).map(|d| Self(d as u8))
    }

    /// Build a color from the low nibble of `byte`, ignoring the high bits.
    pub const fn from_nibble(byte: u8) -> Self {
        Self(byte & 0x0f)
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Color {
    type Error = InvalidColor;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidColor(value))
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> u8 {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One desired write: absolute board coordinates and the color to put there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

impl Tile {
    pub const fn new(x: i32, y: i32, color: Color) -> Self {
        Self { x, y, color }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.color, self.x, self.y)
    }
}

/// A tile change observed on the live event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUpdate {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    #[serde(default)]
    pub author: String,
}

impl TileUpdate {
    pub fn tile(&self) -> Tile {
        Tile::new(self.x, self.y, self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_range() {
        assert_eq!(Color::new(0).map(Color::index), Some(0));
        assert_eq!(Color::new(15).map(Color::index), Some(15));
        assert!(Color::new(16).is_none());
        assert_eq!(Color::try_from(200), Err(InvalidColor(200)));
    }

    #[test]
    fn test_color_from_hex_digit() {
        assert_eq!(Color::from_hex_digit('0'), Color::new(0));
        assert_eq!(Color::from_hex_digit('9'), Color::new(9));
        assert_eq!(Color::from_hex_digit('a'), Color::new(10));
        assert_eq!(Color::from_hex_digit('F'), Color::new(15));
        assert!(Color::from_hex_digit('.').is_none());
        assert!(Color::from_hex_digit('g').is_none());
    }

    #[test]
    fn test_tile_update_deser() {
        let update: TileUpdate =
            serde_json::from_str(r#"{"x": 12, "y": 7, "color": 3, "author": "someone"}"#).unwrap();
        assert_eq!(update.tile(), Tile::new(12, 7, Color::new(3).unwrap()));
        assert_eq!(update.author, "someone");
    }

    #[test]
    fn test_tile_update_rejects_bad_color() {
        let result = serde_json::from_str::<TileUpdate>(r#"{"x": 1, "y": 1, "color": 99}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_tile_update_author_optional() {
        let update: TileUpdate = serde_json::from_str(r#"{"x": 0, "y": 0, "color": 0}"#).unwrap();
        assert!(update.author.is_empty());
    }
}
