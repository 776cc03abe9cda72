//! The shared control handle: one exclusion boundary around the whole world.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rail_lock::PolicyMode;

use crate::sim::Sim;
use crate::snapshot::Snapshot;

struct SimCell {
    sim:     Sim,
    running: bool,
}

/// Cloneable, thread-safe handle around a [`Sim`].
///
/// Every operation acquires one mutex for its full duration, so a tick either
/// completes exclusively or has not started, and external operations
/// (pause/resume, policy switch, reset, snapshot) never interleave with an
/// in-progress tick.  Pausing only stops future [`tick`][Self::tick] calls
/// from stepping; there is never a partially applied tick to roll back.
///
/// The driver owns the cadence: it calls `tick()` on its schedule, and the
/// handle decides whether the sim actually steps.
#[derive(Clone)]
pub struct SimHandle {
    inner: Arc<Mutex<SimCell>>,
}

impl SimHandle {
    /// Wrap `sim`.  The simulation starts paused.
    pub fn new(sim: Sim) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimCell { sim, running: false })),
        }
    }

    fn cell(&self) -> MutexGuard<'_, SimCell> {
        // Poison is not propagated: every endpoint would wedge permanently,
        // and state observed between ticks is consistent regardless.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance one tick if running.  Returns whether a tick was stepped.
    pub fn tick(&self) -> bool {
        let mut cell = self.cell();
        if cell.running {
            cell.sim.step();
            true
        } else {
            false
        }
    }

    /// Allow or suppress future ticks.
    pub fn set_running(&self, running: bool) {
        self.cell().running = running;
    }

    pub fn is_running(&self) -> bool {
        self.cell().running
    }

    /// Rebuild the world from its original roster.  The running flag and
    /// policy mode are retained.
    pub fn reset(&self) {
        self.cell().sim.reset();
    }

    /// Swap the admission policy (queued-but-ungranted requests are dropped).
    pub fn set_policy(&self, mode: PolicyMode) {
        self.cell().sim.set_policy(mode);
    }

    pub fn mode(&self) -> PolicyMode {
        self.cell().sim.mode()
    }

    /// Export a consistent between-ticks view of the world.
    pub fn snapshot(&self) -> Snapshot {
        self.cell().sim.snapshot()
    }
}
