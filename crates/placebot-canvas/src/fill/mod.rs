//! Position sequences: the order in which a zone's cells are inspected.
//!
//! Every sequence is resumable: all traversal state lives in the
//! generator, so callers can pull one coordinate, do other work, and come
//! back for the next.

use std::str::FromStr;

use placebot_core::error::PlacebotError;

pub mod random;
pub mod row;
pub mod spiral;

pub use random::RandomFill;
pub use row::RowFill;
pub use spiral::SpiralFill;

/// A resumable traversal of the box `[0, width) x [0, height)`.
pub trait PositionSequence: Send {
    /// Drop any previous traversal and start a new one over the given box.
    fn reset(&mut self, width: usize, height: usize);

    /// The next coordinate as `(x, y)`, or `None` once the traversal is
    /// exhausted. Stays `None` until the next [`reset`](Self::reset).
    fn next(&mut self) -> Option<(usize, usize)>;
}

/// Fill strategy selector from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillKind {
    #[default]
    Spiral,
    Random,
    Row,
    RowInverted,
}

impl FillKind {
    /// Build a fresh generator for this strategy.
    pub fn build(self) -> Box<dyn PositionSequence> {
        match self {
            Self::Spiral => Box::new(SpiralFill::new()),
            Self::Random => Box::new(RandomFill::new()),
            Self::Row => Box::new(RowFill::new(false)),
            Self::RowInverted => Box::new(RowFill::new(true)),
        }
    }
}

impl FromStr for FillKind {
    type Err = PlacebotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "spiral" => Ok(Self::Spiral),
            "random" => Ok(Self::Random),
            "row" => Ok(Self::Row),
            "row-inverted" => Ok(Self::RowInverted),
            other => Err(PlacebotError::Config(format!("invalid fill type: {other}"))),
        }
    }
}

/// Pull every remaining coordinate out of a sequence.
#[cfg(test)]
pub(crate) fn drain(seq: &mut dyn PositionSequence) -> Vec<(usize, usize)> {
    std::iter::from_fn(|| seq.next()).collect()
}
