//! Simulation observer trait for progress reporting and data collection.

use rail_core::{Tick, TrainId};

use crate::Snapshot;

/// Callbacks invoked by [`Sim::run_ticks`][crate::Sim::run_ticks] at key
/// points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — deadlock logger
///
/// ```rust,ignore
/// struct DeadlockPrinter;
///
/// impl RailObserver for DeadlockPrinter {
///     fn on_deadlock(&mut self, tick: Tick, cycle: &[TrainId], victim: TrainId) {
///         println!("{tick}: cycle of {} trains, preempting {victim}", cycle.len() - 1);
///     }
/// }
/// ```
pub trait RailObserver {
    /// Called at the very start of each tick, before any train moves.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick.
    ///
    /// `waiting` is the number of trains not in the running state once the
    /// tick completed.
    fn on_tick_end(&mut self, _tick: Tick, _waiting: usize) {}

    /// Called at snapshot intervals (every `config.snapshot_interval_ticks`).
    fn on_snapshot(&mut self, _tick: Tick, _snapshot: &Snapshot) {}

    /// Called when the detector finds a wait-for cycle, before recovery runs.
    ///
    /// `cycle` is a closed walk (first and last entry coincide); `victim` is
    /// the train about to be preempted.
    fn on_deadlock(&mut self, _tick: Tick, _cycle: &[TrainId], _victim: TrainId) {}

    /// Called when the stall fallback forces the longest waiter through.
    fn on_stall_break(&mut self, _tick: Tick, _victim: TrainId) {}

    /// Called once after the final tick of a `run_ticks` batch.
    fn on_run_end(&mut self, _final_tick: Tick) {}
}

/// A [`RailObserver`] that does nothing.  Use when you need to call the tick
/// loop but don't want progress callbacks.
pub struct NoopObserver;

impl RailObserver for NoopObserver {}
