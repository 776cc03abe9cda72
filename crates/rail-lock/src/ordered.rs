//! The statically-ordered variant: lane-local monotonic-rank admission.

use rail_core::{BlockId, TrainId};

use crate::centralized::CentralizedPolicy;
use crate::policy::{LockCtx, LockPolicy, PolicyMode};

/// Centralized admission behind a pre-admission rank rule.
///
/// Blocks are ranked by slot within their track.  A train already holding
/// blocks on the requested block's track may only request a strictly higher
/// rank than everything it holds there; requests that would acquire
/// out of order are rejected before they reach the queue.  Because every
/// train's same-track ranks increase monotonically, no cyclic wait can form
/// among same-track acquisitions.
///
/// A request for a block on a *different* track (a track transition) carries
/// no same-track holds and passes the rank rule vacuously — the ordering
/// context resets with the lane change.
pub struct OrderedPolicy {
    inner: CentralizedPolicy,
}

impl OrderedPolicy {
    pub fn new(block_count: usize, starvation_threshold: f64) -> Self {
        Self { inner: CentralizedPolicy::new(block_count, starvation_threshold) }
    }
}

impl LockPolicy for OrderedPolicy {
    fn request(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool {
        if !ctx.board.contains(block) {
            return false;
        }

        let req_track = ctx.layout.track_of(block);
        let req_slot  = ctx.layout.slot_of(block);
        let out_of_order = ctx.fleet.get(train).held.iter().any(|&held| {
            ctx.layout.track_of(held) == req_track && ctx.layout.slot_of(held) >= req_slot
        });
        if out_of_order {
            return false;
        }

        self.inner.request(ctx, train, block)
    }

    fn release(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) {
        self.inner.release(ctx, train, block);
    }

    fn force_assign(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool {
        // Recovery bypasses every admission rule, rank included.
        self.inner.force_assign(ctx, train, block)
    }

    fn mode(&self) -> PolicyMode {
        PolicyMode::Ordered
    }
}
