//! Plain data types for the exported simulation state.

use rail_fleet::TrainStatus;

/// One train's externally visible state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainSnapshot {
    /// Train display name, e.g. `"T1"`.
    pub name: String,
    /// Label of the occupied track.
    pub track: String,
    /// Position within the current block, rounded to 3 decimals.
    pub pos: f64,
    pub status: TrainStatus,
    /// Accumulated blocked time in simulated seconds, rounded to 3 decimals.
    pub wait: f64,
}

/// Ownership of one track's blocks, in traversal order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackOccupancy {
    /// Track display label.
    pub track: String,
    /// Holder name per block, or `"free"`.
    pub holders: Vec<String>,
}

/// A complete, consistent view of the world between ticks.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    /// Per-train state in roster order.
    pub trains: Vec<TrainSnapshot>,
    /// Cycles detected (and recovered from) since construction or reset.
    pub deadlocks: u64,
    /// Per-track block ownership in layout order.
    pub occupancy: Vec<TrackOccupancy>,
}

/// Round to 3 decimals for export, matching the display resolution of the
/// presentation layer.
pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
