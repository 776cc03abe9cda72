//! `RailOutputObserver<W>` — bridges `RailObserver` to an `OutputWriter`.

use rail_core::{Tick, TrainId};
use rail_sim::{RailObserver, Snapshot};

use crate::row::{DeadlockEventRow, TrainSnapshotRow};
use crate::writer::OutputWriter;
use crate::OutputError;

/// A [`RailObserver`] that writes train snapshots and recovery events to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods have
/// no return value.  After the run completes, check for errors with
/// [`take_error`][Self::take_error].
pub struct RailOutputObserver<W: OutputWriter> {
    writer:      W,
    /// Train display names indexed by `TrainId`, for event rows.
    train_names: Vec<String>,
    last_error:  Option<OutputError>,
}

impl<W: OutputWriter> RailOutputObserver<W> {
    /// Create an observer backed by `writer`.  `train_names` maps `TrainId`
    /// indexes to display names for the event log.
    pub fn new(writer: W, train_names: Vec<String>) -> Self {
        Self {
            writer,
            train_names,
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after the run completes.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn name_of(&self, id: TrainId) -> String {
        match self.train_names.get(id.index()) {
            Some(name) => name.clone(),
            None       => format!("train{}", id.0),
        }
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> RailObserver for RailOutputObserver<W> {
    fn on_snapshot(&mut self, tick: Tick, snapshot: &Snapshot) {
        let rows: Vec<TrainSnapshotRow> = snapshot
            .trains
            .iter()
            .map(|t| TrainSnapshotRow {
                tick:   tick.0,
                train:  t.name.clone(),
                track:  t.track.clone(),
                pos:    t.pos,
                status: t.status.to_string(),
                wait:   t.wait,
            })
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_deadlock(&mut self, tick: Tick, cycle: &[TrainId], victim: TrainId) {
        let path: Vec<String> = cycle.iter().map(|&id| self.name_of(id)).collect();
        let row = DeadlockEventRow {
            tick:   tick.0,
            kind:   "cycle",
            victim: self.name_of(victim),
            cycle:  path.join("->"),
        };
        let result = self.writer.write_deadlock_event(&row);
        self.store_err(result);
    }

    fn on_stall_break(&mut self, tick: Tick, victim: TrainId) {
        let row = DeadlockEventRow {
            tick:   tick.0,
            kind:   "stall",
            victim: self.name_of(victim),
            cycle:  String::new(),
        };
        let result = self.writer.write_deadlock_event(&row);
        self.store_err(result);
    }

    fn on_run_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
