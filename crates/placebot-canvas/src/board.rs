//! Local mirror of the remote board.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::debug;

use placebot_core::error::{PlacebotError, Result};
use placebot_core::types::{Color, Tile};

/// A square grid of palette indices, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    extent: usize,
    cells: Vec<Color>,
}

impl Board {
    /// An all-zero board.
    pub fn new(extent: usize) -> Self {
        Self {
            extent,
            cells: vec![Color::default(); extent * extent],
        }
    }

    /// Build a board from `extent * extent` row-major cells.
    pub fn from_cells(extent: usize, cells: Vec<Color>) -> Result<Self> {
        if cells.len() != extent * extent {
            return Err(PlacebotError::Snapshot(format!(
                "expected {} cells for a {extent}x{extent} board, got {}",
                extent * extent,
                cells.len()
            )));
        }
        Ok(Self { extent, cells })
    }

    pub fn extent(&self) -> usize {
        self.extent
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.extent && y < self.extent).then(|| y * self.extent + x)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Current color at `(x, y)`, or `None` outside the board.
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Overwrite one cell. Returns `false` (and writes nothing) outside the board.
    pub fn set(&mut self, x: i32, y: i32, color: Color) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = color;
                true
            }
            None => false,
        }
    }
}

/// The board shared by every agent and the maintenance task.
///
/// Starts empty; agents must wait for the first snapshot with
/// [`Canvas::wait_ready`]. Snapshots replace the whole board, so cell
/// writes that land while a snapshot is in flight are lost.
#[derive(Debug)]
pub struct Canvas {
    extent: usize,
    board: RwLock<Option<Board>>,
}

impl Canvas {
    pub fn new(extent: usize) -> Self {
        Self {
            extent,
            board: RwLock::new(None),
        }
    }

    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn is_ready(&self) -> bool {
        self.board
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Swap in a freshly fetched board.
    pub fn replace(&self, board: Board) -> Result<()> {
        if board.extent() != self.extent {
            return Err(PlacebotError::Snapshot(format!(
                "snapshot extent {} does not match canvas extent {}",
                board.extent(),
                self.extent
            )));
        }
        *self.board.write().unwrap_or_else(PoisonError::into_inner) = Some(board);
        Ok(())
    }

    /// Write one tile. Returns `false` if the canvas has no board yet or
    /// the tile lies outside it.
    pub fn set(&self, tile: &Tile) -> bool {
        self.board
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .is_some_and(|board| board.set(tile.x, tile.y, tile.color))
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.board
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|board| board.get(x, y))
    }

    /// Run `f` against the current board under a read lock.
    /// Returns `None` if no snapshot has arrived yet.
    pub fn with_board<R>(&self, f: impl FnOnce(&Board) -> R) -> Option<R> {
        self.board
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }

    /// Poll until the first snapshot has been installed.
    pub async fn wait_ready(&self, poll: Duration) {
        while !self.is_ready() {
            debug!("Waiting for the first board snapshot");
            tokio::time::sleep(poll).await;
        }
    }
}
