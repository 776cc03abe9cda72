//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `train_snapshots.csv`
//! - `deadlock_events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DeadlockEventRow, OutputResult, TrainSnapshotRow};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    events:    Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("train_snapshots.csv"))?;
        snapshots.write_record(["tick", "train", "track", "pos", "status", "wait"])?;

        let mut events = Writer::from_path(dir.join("deadlock_events.csv"))?;
        events.write_record(["tick", "kind", "victim", "cycle"])?;

        Ok(Self {
            snapshots,
            events,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[TrainSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.tick.to_string(),
                row.train.clone(),
                row.track.clone(),
                row.pos.to_string(),
                row.status.clone(),
                row.wait.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_deadlock_event(&mut self, row: &DeadlockEventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.tick.to_string(),
            row.kind.to_string(),
            row.victim.clone(),
            row.cycle.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
