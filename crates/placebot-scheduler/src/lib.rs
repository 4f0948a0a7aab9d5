//! Drawing fleet runtime.
//!
//! One [`Agent`] task per account, one [`CanvasMaintainer`] task keeping the
//! shared board current, and a [`Fleet`] that starts the agents and
//! collects their outcomes. All agents pick and submit tiles under the
//! single lock held by [`DrawingFloor`].

pub mod agent;
pub mod fleet;
pub mod floor;
pub mod maintenance;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{Agent, AgentOutcome, AgentState, StopReason};
pub use fleet::{Fleet, FleetReport, FleetSettings};
pub use floor::DrawingFloor;
pub use maintenance::CanvasMaintainer;
