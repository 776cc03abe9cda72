//! Deadlock and stall recovery: victim selection and forced preemption.

use rail_core::{BlockId, Tick, TrainId};
use rail_fleet::{TrainStatus, TrainStore};

use crate::detect::WaitForGraph;
use crate::sim::Sim;
use crate::RailObserver;

impl Sim {
    /// End-of-tick contention resolution: detect a wait-for cycle and preempt
    /// its victim, or track global stall and eventually force the longest
    /// waiter through.
    pub(crate) fn resolve_contention<O: RailObserver>(&mut self, now: Tick, obs: &mut O) {
        let graph = WaitForGraph::build(&self.fleet, &self.board);

        if let Some(cycle) = graph.find_cycle() {
            self.deadlocks += 1;
            if let Some(victim) = pick_victim(&self.fleet, &cycle) {
                obs.on_deadlock(now, &cycle, victim);
                self.preempt(victim);
            }
            return;
        }

        // No cycle.  The no-progress counter resets whenever any train is
        // carrying positive wait this tick, and grows only through all-quiet
        // ticks; past the bound, break the stall by force.
        if self.fleet.iter().any(|t| t.wait > 0.0) {
            self.no_progress = 0;
        } else {
            self.no_progress += 1;
        }
        if self.no_progress > self.config.stall_bound {
            if let Some(victim) = longest_waiter(&self.fleet) {
                if self.fleet.get(victim).requesting.is_some() {
                    obs.on_stall_break(now, victim);
                    self.preempt(victim);
                }
            }
            self.no_progress = 0;
        }
    }

    /// Force `victim`'s pending request through: drop every held block,
    /// force-assign the wanted one, and re-place the train on it, running,
    /// with zeroed wait and a fresh switch cooldown.
    ///
    /// A victim with no pending request is left untouched.
    fn preempt(&mut self, victim: TrainId) {
        let Some(wanted) = self.fleet.get(victim).requesting else {
            return;
        };

        let held: Vec<BlockId> = self.fleet.get(victim).held.clone();
        for block in held {
            self.release(victim, block);
        }
        self.force_assign(victim, wanted);

        let track = self.layout.track_of(wanted);
        let slot = self.layout.slot_of(wanted);
        let cd = self.config.switch_cooldown_ticks;
        let t = self.fleet.get_mut(victim);
        t.track = track;
        t.slot = slot;
        t.pos = 0.0;
        t.wait = 0.0;
        t.status = TrainStatus::Running;
        t.cooldown = cd;
    }
}

/// The cycle member with the greatest accumulated wait; ties go to the
/// earliest appearance in the cycle sequence.
fn pick_victim(fleet: &TrainStore, cycle: &[TrainId]) -> Option<TrainId> {
    let mut best: Option<TrainId> = None;
    for &id in cycle {
        match best {
            None => best = Some(id),
            Some(b) if fleet.get(id).wait > fleet.get(b).wait => best = Some(id),
            _ => {}
        }
    }
    best
}

/// The globally longest-waiting train; ties go to the lowest id.
fn longest_waiter(fleet: &TrainStore) -> Option<TrainId> {
    let mut best: Option<TrainId> = None;
    for id in fleet.ids() {
        match best {
            None => best = Some(id),
            Some(b) if fleet.get(id).wait > fleet.get(b).wait => best = Some(id),
            _ => {}
        }
    }
    best
}
