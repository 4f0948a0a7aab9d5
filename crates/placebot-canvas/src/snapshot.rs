//! Board bitmap decoding.
//!
//! The bitmap endpoint returns a 4-byte header followed by packed 4-bit
//! palette indices, two cells per byte (high nibble first), row-major.
//! A short body leaves the remaining cells at color 0.

use tracing::debug;

use placebot_core::error::{PlacebotError, Result};
use placebot_core::types::Color;

use crate::board::Board;

/// Length of the header that precedes the packed cells.
pub const HEADER_LEN: usize = 4;

/// Decode a full board bitmap for a square board of side `extent`.
pub fn decode(bytes: &[u8], extent: usize) -> Result<Board> {
    let Some(body) = bytes.get(HEADER_LEN..) else {
        return Err(PlacebotError::Snapshot(format!(
            "bitmap too short for its header: {} bytes",
            bytes.len()
        )));
    };

    let total = extent * extent;
    let mut cells = vec![Color::default(); total];

    for (pair, byte) in cells.chunks_mut(2).zip(body) {
        pair[0] = Color::from_nibble(byte >> 4);
        if let Some(second) = pair.get_mut(1) {
            *second = Color::from_nibble(*byte);
        }
    }

    let needed = total.div_ceil(2);
    if body.len() < needed {
        debug!(got = body.len(), needed, "Bitmap body shorter than the board, padding with 0");
    }

    Board::from_cells(extent, cells)
}
