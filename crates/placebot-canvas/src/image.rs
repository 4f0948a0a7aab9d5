//! Target images in the compact hex-digit text format.
//!
//! Rows are separated by whitespace. Each character is one cell: a hex
//! digit selects a palette color, anything else is transparent. Rows may
//! have different lengths; the image is as wide as its longest row.

use placebot_core::types::Color;

/// An immutable grid of desired colors. `None` cells are transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetImage {
    rows: Vec<Vec<Option<Color>>>,
    width: usize,
}

impl TargetImage {
    pub fn parse(data: &str) -> Self {
        let rows: Vec<Vec<Option<Color>>> = data
            .split_whitespace()
            .map(|line| line.chars().map(Color::from_hex_digit).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        Self { rows, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Desired color at `(x, y)`. `None` for transparent cells and for
    /// positions past the end of a short row or outside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        self.rows.get(y)?.get(x).copied().flatten()
    }

    /// Number of cells with a desired color.
    pub fn opaque_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }
}
