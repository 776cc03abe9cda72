//! `rail-sim` — tick loop orchestrator for the railblock simulation.
//!
//! # Three-phase tick loop
//!
//! ```text
//! for each tick:
//!   ① Move     — every train, in ascending TrainId order: decrement its
//!                switch cooldown, advance position, and on arrival issue
//!                request/release calls to the admission policy; waiting
//!                trains re-attempt their pending request instead.
//!   ② Detect   — rebuild the wait-for graph from pending requests and
//!                holders; three-color DFS for a cycle.
//!   ③ Recover  — cycle: preempt its longest-waiting member (release all,
//!                force-assign, re-place).  No cycle: advance the rolling
//!                no-progress counter and, past the stall bound, force the
//!                globally longest waiter through the same sequence.
//! ```
//!
//! Tie-breaking among competing requesters is resolved entirely by the
//! policy's queue/aging rule, never by the fixed processing order.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rail_core::WorldConfig;
//! use rail_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(WorldConfig::default())
//!     .track("A", 4)
//!     .track("B", 4)
//!     .track("C", 4)
//!     .train("T1", "A", 0.03)
//!     .train("T2", "B", 0.026)
//!     .train("T3", "C", 0.034)
//!     .build()?;
//! sim.run_ticks(1_000, &mut NoopObserver);
//! println!("{}", sim.deadlocks);
//! ```

pub mod builder;
pub mod control;
pub mod detect;
pub mod error;
pub mod observer;
pub mod recover;
pub mod sim;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use control::SimHandle;
pub use detect::WaitForGraph;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, RailObserver};
pub use sim::Sim;
pub use snapshot::{Snapshot, TrackOccupancy, TrainSnapshot};
