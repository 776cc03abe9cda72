//! The centralized lock manager: per-block FIFO queues with aging.

use std::collections::VecDeque;

use rail_core::{BlockId, TrainId};

use crate::policy::{LockCtx, LockPolicy, PolicyMode};

/// FIFO admission with an anti-starvation override.
///
/// Each block keeps a queue of requesters in first-request order.  When the
/// block is free, the grant target is the first queued train whose
/// accumulated wait has reached the starvation threshold; with no aged
/// candidate the queue head wins.  Note the scan takes the *first* aged
/// train in queue order, not the longest waiter among them.
pub struct CentralizedPolicy {
    queues:               Vec<VecDeque<TrainId>>,
    starvation_threshold: f64,
}

impl CentralizedPolicy {
    /// Create a policy with one empty queue per block.
    pub fn new(block_count: usize, starvation_threshold: f64) -> Self {
        Self {
            queues: (0..block_count).map(|_| VecDeque::new()).collect(),
            starvation_threshold,
        }
    }

    /// The queued requesters for `block` in first-request order (aging
    /// aside).  Empty for unknown blocks.
    pub fn queued(&self, block: BlockId) -> impl Iterator<Item = TrainId> + '_ {
        self.queues.get(block.index()).into_iter().flatten().copied()
    }
}

impl LockPolicy for CentralizedPolicy {
    fn request(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool {
        let threshold = self.starvation_threshold;
        let Some(queue) = self.queues.get_mut(block.index()) else {
            return false;
        };

        if !queue.contains(&train) {
            queue.push_back(train);
        }

        if !ctx.board.is_free(block) {
            return false;
        }

        // Aged candidates jump the queue; the first one found wins.
        let aged = queue
            .iter()
            .copied()
            .find(|&tid| ctx.fleet.get(tid).wait >= threshold);
        let Some(&head) = queue.front() else {
            return false;
        };
        let target = aged.unwrap_or(head);

        if target != train {
            return false;
        }
        if !ctx.board.lock(block, train) {
            return false;
        }

        queue.retain(|&t| t != train);
        let t = ctx.fleet.get_mut(train);
        t.add_held(block);
        t.requesting = None;
        true
    }

    fn release(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) {
        if !ctx.board.contains(block) {
            return;
        }
        ctx.board.release(block, train);
        // Scrub the held-set even if the board release was a no-op, so a
        // stale entry cannot outlive the lock.
        ctx.fleet.get_mut(train).remove_held(block);
    }

    fn force_assign(&mut self, ctx: &mut LockCtx<'_>, train: TrainId, block: BlockId) -> bool {
        let Some(queue) = self.queues.get_mut(block.index()) else {
            return false;
        };

        if let Some(prev) = ctx.board.holder(block) {
            if prev != train {
                ctx.fleet.get_mut(prev).remove_held(block);
            }
        }

        queue.retain(|&t| t != train);
        ctx.board.seize(block, train);
        let t = ctx.fleet.get_mut(train);
        t.add_held(block);
        t.requesting = None;
        true
    }

    fn mode(&self) -> PolicyMode {
        PolicyMode::Centralized
    }
}
