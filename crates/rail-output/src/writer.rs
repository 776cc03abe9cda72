//! The `OutputWriter` trait implemented by all backend writers.

use crate::{DeadlockEventRow, OutputResult, TrainSnapshotRow};

/// Trait implemented by output backends.
///
/// All methods are infallible from the observer's perspective — errors are
/// stored internally and retrieved with
/// [`RailOutputObserver::take_error`][crate::RailOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of train snapshots (one tick's worth).
    fn write_snapshots(&mut self, rows: &[TrainSnapshotRow]) -> OutputResult<()>;

    /// Write one recovery event row.
    fn write_deadlock_event(&mut self, row: &DeadlockEventRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
