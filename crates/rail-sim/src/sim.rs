//! The `Sim` struct and its tick loop.

use rail_core::{BlockId, TickClock, TrackId, TrainId, WorldConfig};
use rail_fleet::{Train, TrainStatus, TrainStore};
use rail_lock::{LockCtx, LockPolicy, PolicyMode, make_policy};
use rail_track::{BlockBoard, TrackLayout};

use crate::snapshot::{Snapshot, TrackOccupancy, TrainSnapshot, round3};
use crate::{NoopObserver, RailObserver};

// ── Roster seed ───────────────────────────────────────────────────────────────

/// A validated roster entry, kept so `reset()` can rebuild the fleet without
/// re-running builder validation.
#[derive(Debug, Clone)]
pub(crate) struct SeedTrain {
    pub name:  String,
    pub track: TrackId,
    pub speed: f64,
}

/// Build a fresh board and fleet from a validated roster: every train parked
/// at slot 0 of its starting track, holding that track's entry block.
pub(crate) fn seed_world(layout: &TrackLayout, roster: &[SeedTrain]) -> (BlockBoard, TrainStore) {
    let mut board = BlockBoard::new(layout.block_count());
    let mut trains = Vec::with_capacity(roster.len());
    for (i, seed) in roster.iter().enumerate() {
        let id = TrainId(i as u32);
        let mut train = Train::new(seed.name.clone(), seed.track, seed.speed);
        let entry = layout.entry_block(seed.track);
        let granted = board.lock(entry, id);
        debug_assert!(granted, "entry-block conflicts are rejected at build time");
        train.add_held(entry);
        trains.push(train);
    }
    (board, TrainStore::new(trains))
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// One call to [`step`][Sim::step] advances every train by one tick in a
/// fixed order:
///
/// 1. **Move**: each train, in ascending `TrainId`, decrements its switch
///    cooldown, advances its position, and — on arrival at the end of its
///    block — issues request/release calls to the admission policy.  Waiting
///    trains re-attempt their pending request instead.
/// 2. **Detect**: the wait-for graph is rebuilt from the trains' pending
///    requests and searched for a cycle.
/// 3. **Recover**: a detected cycle preempts its longest-waiting member; with
///    no cycle, a rolling no-progress counter guards against livelock and
///    eventually forces the longest waiter through.
///
/// There is no internal parallelism: a tick either completes in full or has
/// not started, so snapshots taken between ticks are always consistent.
/// Create via [`SimBuilder`][crate::SimBuilder]; share behind
/// [`SimHandle`][crate::SimHandle] for external control.
pub struct Sim {
    /// Fixed world constants.
    pub config: WorldConfig,

    /// Immutable topology.
    pub layout: TrackLayout,

    /// Block ownership.
    pub board: BlockBoard,

    /// All train state.
    pub fleet: TrainStore,

    /// Current tick and tick-to-seconds mapping.
    pub clock: TickClock,

    /// Wait-for cycles detected since construction or the last reset.
    pub deadlocks: u64,

    pub(crate) policy:      Box<dyn LockPolicy>,
    pub(crate) mode:        PolicyMode,
    pub(crate) no_progress: u32,
    pub(crate) roster:      Vec<SeedTrain>,
}

impl std::fmt::Debug for Sim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `policy` is a `Box<dyn LockPolicy>` and cannot be derived; report the
        // mode instead so `Sim` is `Debug` for test assertions.
        f.debug_struct("Sim")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .field("deadlocks", &self.deadlocks)
            .field("no_progress", &self.no_progress)
            .finish_non_exhaustive()
    }
}

impl Sim {
    pub(crate) fn new(
        config: WorldConfig,
        layout: TrackLayout,
        roster: Vec<SeedTrain>,
        mode:   PolicyMode,
    ) -> Self {
        let (board, fleet) = seed_world(&layout, &roster);
        let policy = make_policy(mode, layout.block_count(), config.starvation_threshold);
        let clock = TickClock::new(config.tick_secs);
        Self {
            config,
            layout,
            board,
            fleet,
            clock,
            deadlocks: 0,
            policy,
            mode,
            no_progress: 0,
            roster,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Advance exactly one tick.
    pub fn step(&mut self) {
        self.step_with(&mut NoopObserver);
    }

    /// Advance exactly one tick, reporting through `obs`.
    pub fn step_with<O: RailObserver>(&mut self, obs: &mut O) {
        let now = self.clock.current;
        obs.on_tick_start(now);

        for i in 0..self.fleet.len() {
            self.advance_train(TrainId(i as u32));
        }

        self.resolve_contention(now, obs);

        let waiting = self
            .fleet
            .iter()
            .filter(|t| t.status != TrainStatus::Running)
            .count();
        self.clock.advance();
        obs.on_tick_end(now, waiting);
    }

    /// Run `n` ticks, emitting snapshots at the configured interval and an
    /// end-of-run callback.
    pub fn run_ticks<O: RailObserver>(&mut self, n: u64, obs: &mut O) {
        let every = self.config.snapshot_interval_ticks;
        for _ in 0..n {
            let now = self.clock.current;
            self.step_with(obs);
            if every > 0 && now.0.is_multiple_of(every) {
                let snap = self.snapshot();
                obs.on_snapshot(now, &snap);
            }
        }
        obs.on_run_end(self.clock.current);
    }

    /// The active admission policy.
    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Swap the admission policy.  The new policy starts with empty queues:
    /// any queued-but-ungranted request is forgotten and will be re-issued by
    /// the waiting train on its next tick.  Block ownership and train
    /// positions carry over untouched.
    pub fn set_policy(&mut self, mode: PolicyMode) {
        self.mode = mode;
        self.policy = make_policy(
            mode,
            self.layout.block_count(),
            self.config.starvation_threshold,
        );
    }

    /// Rebuild the board, fleet, policy, and counters from the original
    /// roster.  The policy mode is retained.
    pub fn reset(&mut self) {
        let (board, fleet) = seed_world(&self.layout, &self.roster);
        self.board = board;
        self.fleet = fleet;
        self.policy = make_policy(
            self.mode,
            self.layout.block_count(),
            self.config.starvation_threshold,
        );
        self.deadlocks = 0;
        self.no_progress = 0;
        self.clock.rewind();
    }

    /// Export a complete, consistent view of the world.
    pub fn snapshot(&self) -> Snapshot {
        let trains = self
            .fleet
            .iter()
            .map(|t| TrainSnapshot {
                name:   t.name.clone(),
                track:  self.layout.label(t.track).to_owned(),
                pos:    round3(t.pos),
                status: t.status,
                wait:   round3(t.wait),
            })
            .collect();

        let occupancy = self
            .layout
            .track_ids()
            .map(|track| TrackOccupancy {
                track: self.layout.label(track).to_owned(),
                holders: self
                    .layout
                    .blocks_of(track)
                    .iter()
                    .map(|&b| match self.board.holder(b) {
                        Some(owner) => self.fleet.get(owner).name.clone(),
                        None        => "free".to_owned(),
                    })
                    .collect(),
            })
            .collect();

        Snapshot { trains, deadlocks: self.deadlocks, occupancy }
    }

    // ── Policy plumbing ───────────────────────────────────────────────────

    pub(crate) fn request(&mut self, train: TrainId, block: BlockId) -> bool {
        let mut ctx = LockCtx {
            layout: &self.layout,
            board:  &mut self.board,
            fleet:  &mut self.fleet,
        };
        self.policy.request(&mut ctx, train, block)
    }

    pub(crate) fn release(&mut self, train: TrainId, block: BlockId) {
        let mut ctx = LockCtx {
            layout: &self.layout,
            board:  &mut self.board,
            fleet:  &mut self.fleet,
        };
        self.policy.release(&mut ctx, train, block);
    }

    pub(crate) fn force_assign(&mut self, train: TrainId, block: BlockId) -> bool {
        let mut ctx = LockCtx {
            layout: &self.layout,
            board:  &mut self.board,
            fleet:  &mut self.fleet,
        };
        self.policy.force_assign(&mut ctx, train, block)
    }

    // ── Per-train stepping ────────────────────────────────────────────────

    fn advance_train(&mut self, id: TrainId) {
        {
            let t = self.fleet.get_mut(id);
            if t.cooldown > 0 {
                t.cooldown -= 1;
            }
        }
        match self.fleet.get(id).status {
            TrainStatus::Running        => self.advance_running(id),
            TrainStatus::WaitingBlock   => self.retry_block(id),
            TrainStatus::WaitingHandoff => self.retry_handoff(id),
        }
    }

    fn advance_running(&mut self, id: TrainId) {
        let (track, slot) = {
            let t = self.fleet.get_mut(id);
            t.pos += t.speed;
            if t.pos < 1.0 {
                return;
            }
            t.pos = 1.0;
            (t.track, t.slot)
        };

        if slot + 1 >= self.layout.blocks_of(track).len() {
            self.attempt_handoff(id);
        } else {
            self.attempt_next_block(id);
        }
    }

    /// Arrival at a non-final block: request the next block on this track.
    fn attempt_next_block(&mut self, id: TrainId) {
        let (track, slot, cooldown) = {
            let t = self.fleet.get(id);
            (t.track, t.slot, t.cooldown)
        };
        let next = self.layout.block_at(track, slot + 1);
        self.fleet.get_mut(id).requesting = Some(next);

        if cooldown == 0 && self.request(id, next) {
            // Old block is released only after the new one is granted, so the
            // train is never blockless mid-move.
            let old = self.layout.block_at(track, slot);
            if self.fleet.get(id).holds(old) {
                self.release(id, old);
            }
            let t = self.fleet.get_mut(id);
            t.slot = slot + 1;
            t.pos = 0.0;
            t.wait = 0.0;
            t.status = TrainStatus::Running;
        } else {
            let tick_secs = self.config.tick_secs;
            let t = self.fleet.get_mut(id);
            t.status = TrainStatus::WaitingBlock;
            t.wait += tick_secs;
        }
    }

    /// Arrival at the final block: request the entry block of the cyclic
    /// successor track, guarded by the safety predicate.
    fn attempt_handoff(&mut self, id: TrainId) {
        let (track, slot, cooldown) = {
            let t = self.fleet.get(id);
            (t.track, t.slot, t.cooldown)
        };
        let next_track = self.layout.next_track(track);
        let entry = self.layout.entry_block(next_track);

        if cooldown == 0 && self.safe_to_enter(id, next_track) && self.request(id, entry) {
            let last = self.layout.block_at(track, slot);
            if self.fleet.get(id).holds(last) {
                self.release(id, last);
            }
            let cd = self.config.switch_cooldown_ticks;
            let t = self.fleet.get_mut(id);
            t.track = next_track;
            t.slot = 0;
            t.pos = 0.0;
            t.wait = 0.0;
            t.status = TrainStatus::Running;
            t.cooldown = cd;
        } else {
            let tick_secs = self.config.tick_secs;
            let t = self.fleet.get_mut(id);
            t.status = TrainStatus::WaitingHandoff;
            t.requesting = Some(entry);
            t.wait += tick_secs;
        }
    }

    /// Waiting on the next same-track block: re-attempt each tick.
    fn retry_block(&mut self, id: TrainId) {
        let Some(wanted) = self.fleet.get(id).requesting else {
            return;
        };
        let cooldown = self.fleet.get(id).cooldown;

        if cooldown == 0 && self.request(id, wanted) {
            self.adopt_granted(id, wanted, 0);
        } else {
            let tick_secs = self.config.tick_secs;
            self.fleet.get_mut(id).wait += tick_secs;
        }
    }

    /// Waiting on another track's entry block: re-check safety, then
    /// re-attempt.
    fn retry_handoff(&mut self, id: TrainId) {
        let Some(wanted) = self.fleet.get(id).requesting else {
            return;
        };
        let target = self.layout.track_of(wanted);
        let cooldown = self.fleet.get(id).cooldown;

        if cooldown == 0 && self.safe_to_enter(id, target) && self.request(id, wanted) {
            self.adopt_granted(id, wanted, self.config.switch_cooldown_ticks);
        } else {
            let tick_secs = self.config.tick_secs;
            self.fleet.get_mut(id).wait += tick_secs;
        }
    }

    /// After a grant from a waiting state: drop every other held block and
    /// re-place the train on the granted one.
    fn adopt_granted(&mut self, id: TrainId, granted: BlockId, cooldown: u32) {
        let extra: Vec<BlockId> = self
            .fleet
            .get(id)
            .held
            .iter()
            .copied()
            .filter(|&b| b != granted)
            .collect();
        for block in extra {
            self.release(id, block);
        }

        let track = self.layout.track_of(granted);
        let slot = self.layout.slot_of(granted);
        let t = self.fleet.get_mut(id);
        t.track = track;
        t.slot = slot;
        t.pos = 0.0;
        t.wait = 0.0;
        t.status = TrainStatus::Running;
        t.cooldown = cooldown;
    }

    /// Conservative check whether `id` may enter `target`'s entry block.
    ///
    /// The entry block must be free, and the resident train nearest the track
    /// start, projected one transfer duration ahead, must sit beyond the
    /// safety margin.
    fn safe_to_enter(&self, id: TrainId, target: TrackId) -> bool {
        let entry = self.layout.entry_block(target);
        if !self.board.is_free(entry) {
            return false;
        }

        let mut nearest: Option<&Train> = None;
        for other in self.fleet.ids().filter(|&tid| tid != id) {
            let t = self.fleet.get(other);
            if t.track != target {
                continue;
            }
            if nearest.is_none_or(|n| t.pos < n.pos) {
                nearest = Some(t);
            }
        }
        let Some(resident) = nearest else {
            return true;
        };

        let projected = resident.pos + resident.speed * self.config.transfer_secs;
        projected + self.config.entry_slack >= self.config.safety_margin
    }
}
