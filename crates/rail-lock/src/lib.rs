//! `rail-lock` — pluggable admission control over the block board.
//!
//! # Crate layout
//!
//! | Module          | Contents                                             |
//! |-----------------|------------------------------------------------------|
//! | [`policy`]      | `LockPolicy` trait, `LockCtx`, `PolicyMode`          |
//! | [`centralized`] | FIFO queues + anti-starvation aging                  |
//! | [`ordered`]     | lane-local monotonic-rank admission on top           |
//!
//! # The two policies
//!
//! **Centralized** keeps one FIFO queue per block.  A freed block goes to the
//! queue head — unless some queued train has waited past the starvation
//! threshold, in which case the first such aged train is served first.
//! Deadlocks can and do form under this policy; detection and recovery live
//! in `rail-sim`.
//!
//! **Ordered** wraps the centralized policy with the classical
//! deadlock-avoidance discipline: within one track, a train may only acquire
//! blocks of strictly increasing rank (slot order).  Track transitions carry
//! no same-track holds, so they fall through to plain centralized admission.

pub mod centralized;
pub mod ordered;
pub mod policy;


pub use centralized::CentralizedPolicy;
pub use ordered::OrderedPolicy;
pub use policy::{LockCtx, LockPolicy, PolicyMode, UnknownMode};

/// Build the policy implementation for `mode`.
///
/// Queues start empty; callers switching policies mid-run must expect any
/// queued-but-ungranted request to be forgotten and re-issued.
pub fn make_policy(
    mode:                 PolicyMode,
    block_count:          usize,
    starvation_threshold: f64,
) -> Box<dyn LockPolicy> {
    match mode {
        PolicyMode::Centralized => {
            Box::new(CentralizedPolicy::new(block_count, starvation_threshold))
        }
        PolicyMode::Ordered => {
            Box::new(OrderedPolicy::new(block_count, starvation_threshold))
        }
    }
}
