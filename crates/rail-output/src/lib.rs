//! `rail-output` — persistent output for simulation runs.
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`row`]      | Plain data rows written by backends                   |
//! | [`writer`]   | The `OutputWriter` trait                              |
//! | [`csv`]      | CSV backend (`train_snapshots.csv`, `deadlock_events.csv`) |
//! | [`observer`] | `RailOutputObserver<W>` — bridges `RailObserver` to a writer |
//! | [`error`]    | `OutputError`, `OutputResult<T>`                      |
//!
//! The observer is infallible from the tick loop's perspective: write errors
//! are stashed and retrieved with
//! [`take_error`][observer::RailOutputObserver::take_error] after the run.

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::RailOutputObserver;
pub use row::{DeadlockEventRow, TrainSnapshotRow};
pub use writer::OutputWriter;
