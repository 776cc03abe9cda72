//! The per-train state record and the fleet store.

use std::fmt;

use rail_core::{BlockId, TrackId, TrainId};

// ── TrainStatus ───────────────────────────────────────────────────────────────

/// Where a train is in its request/wait state machine.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    /// Advancing through its current block.
    #[default]
    Running,
    /// Blocked on the next block of its own track.
    WaitingBlock,
    /// Blocked on the entry block of the successor track.
    WaitingHandoff,
}

impl TrainStatus {
    /// Column label used in snapshots and CSV output.
    pub fn as_str(self) -> &'static str {
        match self {
            TrainStatus::Running        => "running",
            TrainStatus::WaitingBlock   => "waiting_block",
            TrainStatus::WaitingHandoff => "waiting_handoff",
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── TrainSpec ─────────────────────────────────────────────────────────────────

/// A roster entry: the construction-time description of one train.
#[derive(Debug, Clone)]
pub struct TrainSpec {
    /// Display name, e.g. `"T1"`.
    pub name: String,
    /// Label of the track the train starts on; it is pre-granted that track's
    /// entry block.
    pub track_label: String,
    /// Position units advanced per tick while running.
    pub speed: f64,
}

// ── Train ─────────────────────────────────────────────────────────────────────

/// Mutable state of one train.
///
/// Invariants maintained by the stepper and admission policies:
/// - `held` contains a block iff that block's holder is this train;
/// - `held.len() == 1` at every tick boundary, transiently 2 only mid-tick
///   while a granted block replaces the outgoing one.
#[derive(Debug, Clone)]
pub struct Train {
    /// Display name, e.g. `"T1"`.
    pub name: String,
    /// Track the train currently occupies.
    pub track: TrackId,
    /// Zero-based block position within `track`.
    pub slot: usize,
    /// Continuous position within the current block, `[0.0, 1.0)` while
    /// running and clamped to exactly `1.0` at arrival.
    pub pos: f64,
    /// Position units advanced per tick.
    pub speed: f64,
    /// Request/wait state.
    pub status: TrainStatus,
    /// The block this train is currently blocked on, if any.
    pub requesting: Option<BlockId>,
    /// Blocks this train owns.
    pub held: Vec<BlockId>,
    /// Accumulated blocked time in simulated seconds.  Zeroed on every
    /// successful advance.
    pub wait: f64,
    /// Remaining anti-thrash ticks after a track change; any positive value
    /// blocks new grant attempts.
    pub cooldown: u32,
}

impl Train {
    /// Create a running train parked at slot 0 of `track`, holding nothing
    /// yet (the builder pre-grants the entry block).
    pub fn new(name: impl Into<String>, track: TrackId, speed: f64) -> Self {
        Self {
            name:       name.into(),
            track,
            slot:       0,
            pos:        0.0,
            speed,
            status:     TrainStatus::Running,
            requesting: None,
            held:       Vec::new(),
            wait:       0.0,
            cooldown:   0,
        }
    }

    /// `true` if this train owns `block`.
    #[inline]
    pub fn holds(&self, block: BlockId) -> bool {
        self.held.contains(&block)
    }

    /// Record ownership of `block` (idempotent).
    pub fn add_held(&mut self, block: BlockId) {
        if !self.holds(block) {
            self.held.push(block);
        }
    }

    /// Forget ownership of `block` (no-op if absent).
    pub fn remove_held(&mut self, block: BlockId) {
        self.held.retain(|&b| b != block);
    }
}

// ── TrainStore ────────────────────────────────────────────────────────────────

/// All trains of the world, keyed by `TrainId`.
///
/// Iteration order is ascending id, which is also the fixed per-tick
/// processing order.
#[derive(Debug, Clone)]
pub struct TrainStore {
    trains: Vec<Train>,
}

impl TrainStore {
    pub fn new(trains: Vec<Train>) -> Self {
        Self { trains }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.trains.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    /// All train ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TrainId> + '_ {
        (0..self.trains.len() as u32).map(TrainId)
    }

    #[inline]
    pub fn get(&self, id: TrainId) -> &Train {
        &self.trains[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TrainId) -> &mut Train {
        &mut self.trains[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Train> {
        self.trains.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Train> {
        self.trains.iter_mut()
    }
}
