//! The `LockPolicy` trait — the seam between the stepper and admission control.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use rail_core::{BlockId, TrainId};
use rail_fleet::TrainStore;
use rail_track::{BlockBoard, TrackLayout};

// ── LockCtx ───────────────────────────────────────────────────────────────────

/// Mutable world access handed to every policy call.
///
/// Policies own only their queues; block ownership lives on the board and
/// held-sets live on the trains, so each call borrows all three.  The borrows
/// last for a single call — nothing is retained across ticks.
pub struct LockCtx<'a> {
    /// Immutable topology (lane membership, ranks).
    pub layout: &'a TrackLayout,
    /// Block ownership.
    pub board: &'a mut BlockBoard,
    /// Train held-sets, `requesting` fields, and accumulated waits.
    pub fleet: &'a mut TrainStore,
}

// ── LockPolicy ────────────────────────────────────────────────────────────────

/// Admission control over exclusive blocks.
///
/// Implementations decide which waiting train may acquire a free block.  All
/// three operations keep the board and the trains' held-sets mutually
/// consistent: a train's held-set contains a block iff that block's holder is
/// the train.
///
/// Unknown block ids are non-fatal everywhere: `request` and `force_assign`
/// return `false`, `release` is a no-op.
pub trait LockPolicy: Send {
    /// Ask for `block` on behalf of `train`.
    ///
    /// Enqueues the train (idempotently) and grants iff the block is free and
    /// the train is the queue's grant target.  On a grant the block is
    /// locked, the train dequeued, its held-set extended, and its
    /// `requesting` field cleared.
    fn request(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool;

    /// Give up `block`.  Defensive: releasing a block the train does not hold
    /// leaves the board untouched but still scrubs the train's held-set.
    fn release(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId);

    /// Administrative override used only by deadlock/stall recovery:
    /// unconditionally transfer `block` to `train`, evicting any previous
    /// holder and bypassing queue order and the free-check entirely.
    ///
    /// Total over known blocks — the only `false` return is an unknown id.
    fn force_assign(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool;

    /// Which mode this policy implements.
    fn mode(&self) -> PolicyMode;
}

// ── PolicyMode ────────────────────────────────────────────────────────────────

/// Selects an admission policy implementation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// FIFO queues with anti-starvation aging; deadlocks resolved by recovery.
    #[default]
    Centralized,
    /// Centralized plus lane-local strictly-increasing-rank admission.
    Ordered,
}

impl PolicyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyMode::Centralized => "centralized",
            PolicyMode::Ordered     => "ordered",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized policy-mode string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown policy mode {0:?} (expected \"centralized\" or \"ordered\")")]
pub struct UnknownMode(pub String);

impl FromStr for PolicyMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "centralized" => Ok(PolicyMode::Centralized),
            "ordered"     => Ok(PolicyMode::Ordered),
            other         => Err(UnknownMode(other.to_owned())),
        }
    }
}
