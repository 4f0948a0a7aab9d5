//! Board model and correction planning.
//!
//! The [`Canvas`] mirrors the remote board. Each zone is a [`BitmapDrawer`]
//! that walks its target image in the order produced by a
//! [`PositionSequence`] and proposes the first cell that differs from the
//! board. A [`CompositeDrawer`] polls zones in priority order.

pub mod board;
pub mod drawer;
pub mod fill;
pub mod image;
pub mod snapshot;
pub mod zone;

pub use board::{Board, Canvas};
pub use drawer::{BitmapDrawer, CompositeDrawer, Drawer};
pub use fill::{FillKind, PositionSequence};
pub use image::TargetImage;
pub use zone::{DrawKind, build_zones};
