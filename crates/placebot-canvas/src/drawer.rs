//! Drawers turn target images into a stream of needed corrections.

use placebot_core::types::Tile;

use crate::board::Board;
use crate::fill::PositionSequence;
use crate::image::TargetImage;

/// Something that can propose the next correction for the board.
pub trait Drawer: Send {
    /// The next tile whose desired color differs from `board`, or `None`
    /// if nothing needs fixing right now. Never mutates the board.
    fn next(&mut self, board: &Board) -> Option<Tile>;
}

/// One target image placed at an offset, scanned in fill order.
pub struct BitmapDrawer {
    offset: (i32, i32),
    fill: Box<dyn PositionSequence>,
    image: TargetImage,
}

impl BitmapDrawer {
    pub fn new(offset: (i32, i32), fill: Box<dyn PositionSequence>, image: TargetImage) -> Self {
        Self {
            offset,
            fill,
            image,
        }
    }

    /// The correction needed at image cell `(x, y)`, if any.
    fn check(&self, board: &Board, x: usize, y: usize) -> Option<Tile> {
        let desired = self.image.get(x, y)?;

        let abs_x = self.offset.0.checked_add(i32::try_from(x).ok()?)?;
        let abs_y = self.offset.1.checked_add(i32::try_from(y).ok()?)?;

        let current = board.get(abs_x, abs_y)?;
        (current != desired).then_some(Tile::new(abs_x, abs_y, desired))
    }
}

impl Drawer for BitmapDrawer {
    fn next(&mut self, board: &Board) -> Option<Tile> {
        self.fill.reset(self.image.width(), self.image.height());

        while let Some((x, y)) = self.fill.next() {
            if let Some(tile) = self.check(board, x, y) {
                return Some(tile);
            }
        }
        None
    }
}

/// A named zone inside a [`CompositeDrawer`].
pub struct Zone {
    pub name: String,
    pub drawer: Box<dyn Drawer>,
}

/// Zones polled in declaration order; the first pending correction wins.
///
/// An early zone with work outstanding starves every later zone.
#[derive(Default)]
pub struct CompositeDrawer {
    zones: Vec<Zone>,
}

impl CompositeDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, drawer: Box<dyn Drawer>) {
        self.zones.push(Zone {
            name: name.into(),
            drawer,
        });
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.zones.iter().map(|z| z.name.as_str()).collect()
    }

    /// Like [`Drawer::next`], also naming the zone the tile came from.
    pub fn next_with_zone(&mut self, board: &Board) -> Option<(&str, Tile)> {
        for zone in &mut self.zones {
            if let Some(tile) = zone.drawer.next(board) {
                return Some((zone.name.as_str(), tile));
            }
        }
        None
    }
}

impl Drawer for CompositeDrawer {
    fn next(&mut self, board: &Board) -> Option<Tile> {
        self.next_with_zone(board).map(|(_, tile)| tile)
    }
}
