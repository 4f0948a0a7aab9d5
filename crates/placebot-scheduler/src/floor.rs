//! State shared by every agent.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use placebot_canvas::{Canvas, CompositeDrawer};

/// The canvas plus the zone graph behind the fleet-wide drawing lock.
///
/// Holding the guard from [`DrawingFloor::lock`] is the only way to ask
/// the zone graph for a tile, so at most one agent is choosing or
/// submitting a correction at any instant. Canvas maintenance writes the
/// canvas without taking this lock.
pub struct DrawingFloor {
    canvas: Arc<Canvas>,
    drawer: Mutex<CompositeDrawer>,
}

impl DrawingFloor {
    pub fn new(canvas: Arc<Canvas>, drawer: CompositeDrawer) -> Self {
        Self {
            canvas,
            drawer: Mutex::new(drawer),
        }
    }

    pub fn canvas(&self) -> &Arc<Canvas> {
        &self.canvas
    }

    /// Acquire the drawing lock. Waiters are served in FIFO order.
    pub async fn lock(&self) -> MutexGuard<'_, CompositeDrawer> {
        self.drawer.lock().await
    }
}
