//! Integration tests for rail-sim.

use rail_core::{Tick, TrainId, WorldConfig};
use rail_fleet::TrainStatus;
use rail_lock::PolicyMode;

use crate::detect::WaitForGraph;
use crate::{NoopObserver, RailObserver, Sim, SimBuilder, SimError};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The canonical world: three 4-block tracks, one train per track at fixed
/// distinct speeds.
fn three_track_sim() -> Sim {
    SimBuilder::new(WorldConfig::default())
        .track("A", 4)
        .track("B", 4)
        .track("C", 4)
        .train("T1", "A", 0.03)
        .train("T2", "B", 0.026)
        .train("T3", "C", 0.034)
        .build()
        .unwrap()
}

fn block(sim: &Sim, name: &str) -> rail_core::BlockId {
    sim.layout.block_by_name(name).unwrap()
}

/// Holder/held-set mutual consistency, plus the boundary bound on held-set
/// size (exactly one block per train, except a train robbed by recovery,
/// which holds none until re-granted).
fn assert_ownership_consistent(sim: &Sim) {
    for id in sim.fleet.ids() {
        let t = sim.fleet.get(id);
        assert!(
            t.held.len() <= 1,
            "{} holds {} blocks at a tick boundary",
            t.name,
            t.held.len()
        );
        for &b in &t.held {
            assert_eq!(
                sim.board.holder(b),
                Some(id),
                "{} claims {} but the board disagrees",
                t.name,
                sim.layout.name_of(b)
            );
        }
    }
    for i in 0..sim.layout.block_count() as u32 {
        let b = rail_core::BlockId(i);
        if let Some(owner) = sim.board.holder(b) {
            assert!(
                sim.fleet.get(owner).holds(b),
                "board says {} owns {} but its held-set disagrees",
                sim.fleet.get(owner).name,
                sim.layout.name_of(b)
            );
        }
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_pre_granted_entry_blocks() {
        let sim = three_track_sim();
        assert_eq!(sim.fleet.len(), 3);
        for id in sim.fleet.ids() {
            let t = sim.fleet.get(id);
            assert_eq!(t.held.len(), 1);
            assert_eq!(sim.board.holder(t.held[0]), Some(id));
            assert_eq!(sim.layout.slot_of(t.held[0]), 0);
        }
        assert_ownership_consistent(&sim);
    }

    #[test]
    fn unknown_starting_track_rejected() {
        let err = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "Z", 0.03)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownTrack { .. }), "{err}");
    }

    #[test]
    fn duplicate_train_name_rejected() {
        let err = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .track("B", 4)
            .train("T1", "A", 0.03)
            .train("T1", "B", 0.026)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::DuplicateTrain(_)), "{err}");
    }

    #[test]
    fn shared_starting_track_rejected() {
        let err = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.03)
            .train("T2", "A", 0.026)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::EntryTaken { .. }), "{err}");
    }

    #[test]
    fn empty_track_rejected() {
        let err = SimBuilder::new(WorldConfig::default())
            .track("A", 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Layout(_)), "{err}");
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

mod step_tests {
    use super::*;

    #[test]
    fn running_train_advances_by_speed() {
        let mut sim = three_track_sim();
        sim.step();
        let t1 = sim.fleet.get(TrainId(0));
        assert_eq!(t1.status, TrainStatus::Running);
        assert!((t1.pos - 0.03).abs() < 1e-12);
        assert_eq!(t1.wait, 0.0);
    }

    #[test]
    fn arrival_acquires_next_block_and_releases_old() {
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.5)
            .build()
            .unwrap();
        let a1 = block(&sim, "A1");
        let a2 = block(&sim, "A2");

        sim.step(); // pos 0.5
        sim.step(); // pos 1.0 → arrival → grant A2, release A1
        let t = sim.fleet.get(TrainId(0));
        assert_eq!(t.slot, 1);
        assert_eq!(t.pos, 0.0);
        assert_eq!(t.status, TrainStatus::Running);
        assert_eq!(t.held, vec![a2]);
        assert!(sim.board.is_free(a1));
        assert_ownership_consistent(&sim);
    }

    #[test]
    fn blocked_train_accrues_wait_then_advances() {
        // T2 reaches the end of its 1-block track B while T1 still holds A1;
        // it must wait out the handoff until T1 moves up.
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .track("B", 1)
            .train("T1", "A", 0.25)
            .train("T2", "B", 0.5)
            .build()
            .unwrap();
        let a1 = block(&sim, "A1");

        // Ticks 0–2: T2 arrives at tick 1 and is refused (A1 held, entry not
        // free), then keeps retrying.
        for _ in 0..3 {
            sim.step();
        }
        let t2 = sim.fleet.get(TrainId(1));
        assert_eq!(t2.status, TrainStatus::WaitingHandoff);
        assert_eq!(t2.requesting, Some(a1));
        assert!((t2.wait - 0.2).abs() < 1e-9, "wait = {}", t2.wait);

        // Tick 3: T1 arrives, takes A2, frees A1; T2 (processed after) gets
        // the handoff the same tick.
        sim.step();
        let t2 = sim.fleet.get(TrainId(1));
        assert_eq!(t2.status, TrainStatus::Running);
        assert_eq!(sim.layout.label(t2.track), "A");
        assert_eq!(t2.slot, 0);
        assert_eq!(t2.pos, 0.0);
        assert_eq!(t2.wait, 0.0);
        assert_eq!(t2.cooldown, 2);
        assert_eq!(sim.board.holder(a1), Some(TrainId(1)));
        assert_ownership_consistent(&sim);
    }

    #[test]
    fn positive_cooldown_blocks_any_grant() {
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.0)
            .build()
            .unwrap();
        let a2 = block(&sim, "A2");

        {
            let t = sim.fleet.get_mut(TrainId(0));
            t.status = TrainStatus::WaitingBlock;
            t.requesting = Some(a2);
            t.cooldown = 2;
        }

        // Tick 0: cooldown 2 → 1, grant attempt suppressed despite A2 free.
        sim.step();
        let t = sim.fleet.get(TrainId(0));
        assert_eq!(t.status, TrainStatus::WaitingBlock);
        assert!(sim.board.is_free(a2));
        assert!((t.wait - 0.1).abs() < 1e-9);

        // Tick 1: cooldown 1 → 0, grant goes through.
        sim.step();
        let t = sim.fleet.get(TrainId(0));
        assert_eq!(t.status, TrainStatus::Running);
        assert_eq!(t.held, vec![a2]);
        assert_eq!(t.wait, 0.0);
    }

    #[test]
    fn handoff_waits_for_resident_clearance() {
        // Entry block of A is free, but T1 sits early on A2 — too close to
        // the track start for a safe transfer.
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .track("B", 1)
            .train("T1", "A", 0.01)
            .train("T2", "B", 0.0)
            .build()
            .unwrap();
        let a1 = block(&sim, "A1");
        let a2 = block(&sim, "A2");
        let b1 = block(&sim, "B1");

        // Re-place T1 on A2 near the track start.
        sim.board.release(a1, TrainId(0));
        sim.board.lock(a2, TrainId(0));
        {
            let t = sim.fleet.get_mut(TrainId(0));
            t.slot = 1;
            t.pos = 0.05;
            t.held = vec![a2];
        }
        // T2 is parked waiting for the handoff onto A.
        {
            let t = sim.fleet.get_mut(TrainId(1));
            t.status = TrainStatus::WaitingHandoff;
            t.requesting = Some(a1);
        }

        // projected = 0.05 + 0.01·0.8 + 0.05 ≈ 0.108 < 0.18 → unsafe.
        sim.step();
        let t2 = sim.fleet.get(TrainId(1));
        assert_eq!(t2.status, TrainStatus::WaitingHandoff);
        assert!(sim.board.is_free(a1), "A1 stays free while unsafe");

        // Move the resident clear of the margin; now the handoff lands.
        sim.fleet.get_mut(TrainId(0)).pos = 0.5;
        sim.step();
        let t2 = sim.fleet.get(TrainId(1));
        assert_eq!(t2.status, TrainStatus::Running);
        assert_eq!(sim.board.holder(a1), Some(TrainId(1)));
        assert_eq!(t2.held, vec![a1], "old block dropped, entry adopted");
        assert!(sim.board.is_free(b1));
    }

    #[test]
    fn ownership_stays_consistent_over_long_run() {
        let mut sim = three_track_sim();
        for _ in 0..500 {
            sim.step();
            assert_ownership_consistent(&sim);
        }
    }
}

// ── Wait-for graph ────────────────────────────────────────────────────────────

mod detect_tests {
    use super::*;

    #[test]
    fn three_train_cycle_found() {
        let mut sim = three_track_sim();
        let a1 = block(&sim, "A1");
        let b1 = block(&sim, "B1");
        let c1 = block(&sim, "C1");

        // T1 holds A1 wants B1; T2 holds B1 wants C1; T3 holds C1 wants A1.
        sim.fleet.get_mut(TrainId(0)).requesting = Some(b1);
        sim.fleet.get_mut(TrainId(1)).requesting = Some(c1);
        sim.fleet.get_mut(TrainId(2)).requesting = Some(a1);

        let graph = WaitForGraph::build(&sim.fleet, &sim.board);
        assert_eq!(graph.edges_from(TrainId(0)), &[TrainId(1)]);
        assert_eq!(graph.edges_from(TrainId(1)), &[TrainId(2)]);
        assert_eq!(graph.edges_from(TrainId(2)), &[TrainId(0)]);

        let cycle = graph.find_cycle().expect("cycle expected");
        assert_eq!(cycle.first(), cycle.last());
        let mut members: Vec<TrainId> = cycle[..cycle.len() - 1].to_vec();
        members.sort();
        assert_eq!(members, vec![TrainId(0), TrainId(1), TrainId(2)]);
    }

    #[test]
    fn chain_without_back_edge_is_acyclic() {
        let mut sim = three_track_sim();
        let b1 = block(&sim, "B1");
        let c1 = block(&sim, "C1");

        // T1 → T2 → T3, and T3 wants nothing.
        sim.fleet.get_mut(TrainId(0)).requesting = Some(b1);
        sim.fleet.get_mut(TrainId(1)).requesting = Some(c1);

        let graph = WaitForGraph::build(&sim.fleet, &sim.board);
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn request_for_free_block_adds_no_edge() {
        let mut sim = three_track_sim();
        let a3 = block(&sim, "A3");
        sim.fleet.get_mut(TrainId(0)).requesting = Some(a3);

        let graph = WaitForGraph::build(&sim.fleet, &sim.board);
        assert!(graph.edges_from(TrainId(0)).is_empty());
        assert!(graph.find_cycle().is_none());
    }
}

// ── Recovery ──────────────────────────────────────────────────────────────────

mod recovery_tests {
    use super::*;

    /// Observer that records deadlock and stall callbacks.
    #[derive(Default)]
    struct RecoveryLog {
        deadlocks:    Vec<(Tick, Vec<TrainId>, TrainId)>,
        stall_breaks: Vec<(Tick, TrainId)>,
    }

    impl RailObserver for RecoveryLog {
        fn on_deadlock(&mut self, tick: Tick, cycle: &[TrainId], victim: TrainId) {
            self.deadlocks.push((tick, cycle.to_vec(), victim));
        }
        fn on_stall_break(&mut self, tick: Tick, victim: TrainId) {
            self.stall_breaks.push((tick, victim));
        }
    }

    /// Hand-wire the classic three-way cycle over the entry blocks.
    fn wire_cycle(sim: &mut Sim) {
        let a1 = block(sim, "A1");
        let b1 = block(sim, "B1");
        let c1 = block(sim, "C1");
        for (id, wanted) in [(TrainId(0), b1), (TrainId(1), c1), (TrainId(2), a1)] {
            let t = sim.fleet.get_mut(id);
            t.status = TrainStatus::WaitingBlock;
            t.requesting = Some(wanted);
        }
    }

    #[test]
    fn cycle_recovery_frees_the_longest_waiter() {
        let mut sim = three_track_sim();
        wire_cycle(&mut sim);
        sim.fleet.get_mut(TrainId(1)).wait = 3.0; // T2 waited longest

        let mut log = RecoveryLog::default();
        sim.step_with(&mut log);

        assert_eq!(sim.deadlocks, 1);
        assert_eq!(log.deadlocks.len(), 1);
        let (_, ref cycle, victim) = log.deadlocks[0];
        assert_eq!(victim, TrainId(1));
        assert_eq!(cycle.first(), cycle.last());

        // The victim owns its requested block, re-placed and running.
        let c1 = block(&sim, "C1");
        let t2 = sim.fleet.get(TrainId(1));
        assert_eq!(sim.board.holder(c1), Some(TrainId(1)));
        assert_eq!(t2.held, vec![c1]);
        assert_eq!(t2.status, TrainStatus::Running);
        assert_eq!(sim.layout.label(t2.track), "C");
        assert_eq!(t2.pos, 0.0);
        assert_eq!(t2.wait, 0.0);
        assert_eq!(t2.cooldown, 2);

        // The robbed train lost its block and keeps waiting.
        let t3 = sim.fleet.get(TrainId(2));
        assert!(t3.held.is_empty());
        assert!(t3.requesting.is_some());

        // The victim's old block was freed on the way out.
        let b1 = block(&sim, "B1");
        assert!(sim.board.is_free(b1));
    }

    #[test]
    fn victim_ties_go_to_earliest_cycle_position() {
        let mut sim = three_track_sim();
        wire_cycle(&mut sim);
        // All waits equal: the first cycle member wins.  The DFS from T1
        // yields the closed walk starting at T1.
        let mut log = RecoveryLog::default();
        sim.step_with(&mut log);
        let (_, ref cycle, victim) = log.deadlocks[0];
        assert_eq!(victim, cycle[0]);
    }

    #[test]
    fn stall_fallback_forces_pending_request() {
        // A single parked train with a pending request for a free block, but
        // a speed of zero: no waits ever accrue, so only the stall fallback
        // can move it.
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.0)
            .build()
            .unwrap();
        let a1 = block(&sim, "A1");
        let a3 = block(&sim, "A3");
        sim.fleet.get_mut(TrainId(0)).requesting = Some(a3);

        let mut log = RecoveryLog::default();
        for _ in 0..60 {
            sim.step_with(&mut log);
        }

        assert_eq!(log.stall_breaks.len(), 1, "exactly one forced break");
        assert_eq!(log.stall_breaks[0].1, TrainId(0));
        assert_eq!(sim.deadlocks, 0, "stall breaks are not deadlocks");

        let t = sim.fleet.get(TrainId(0));
        assert_eq!(t.held, vec![a3]);
        assert_eq!(t.slot, 2);
        assert!(sim.board.is_free(a1));
        assert!(t.requesting.is_none());
    }

    #[test]
    fn stall_fallback_without_pending_request_only_resets() {
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.0)
            .build()
            .unwrap();

        let mut log = RecoveryLog::default();
        for _ in 0..200 {
            sim.step_with(&mut log);
        }
        // Nothing to force: no callbacks, no ownership changes.
        assert!(log.stall_breaks.is_empty());
        let a1 = block(&sim, "A1");
        assert_eq!(sim.board.holder(a1), Some(TrainId(0)));
    }
}

// ── Policies at the sim level ─────────────────────────────────────────────────

mod policy_tests {
    use super::*;

    #[test]
    fn same_track_acquisitions_under_ordered_policy_never_deadlock() {
        // 100 ticks is well short of any train reaching its track's end, so
        // every acquisition is a same-track, rank-increasing one.
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .track("B", 4)
            .track("C", 4)
            .train("T1", "A", 0.03)
            .train("T2", "B", 0.026)
            .train("T3", "C", 0.034)
            .policy(PolicyMode::Ordered)
            .build()
            .unwrap();

        for _ in 0..100 {
            sim.step();
            assert_eq!(sim.deadlocks, 0);
        }
        for id in sim.fleet.ids() {
            assert_eq!(sim.fleet.get(id).held.len(), 1);
        }
        assert_ownership_consistent(&sim);
    }

    #[test]
    fn policy_switch_preserves_ownership_and_positions() {
        let mut sim = three_track_sim();
        sim.run_ticks(137, &mut NoopObserver);
        let before = sim.snapshot();

        sim.set_policy(PolicyMode::Ordered);
        assert_eq!(sim.mode(), PolicyMode::Ordered);
        let after = sim.snapshot();
        assert_eq!(before.occupancy, after.occupancy);
        assert_eq!(before.trains, after.trains);
    }

    #[test]
    fn simulation_survives_mid_run_policy_switches() {
        let mut sim = three_track_sim();
        for round in 0..6 {
            let mode = if round % 2 == 0 { PolicyMode::Ordered } else { PolicyMode::Centralized };
            sim.set_policy(mode);
            for _ in 0..50 {
                sim.step();
                assert_ownership_consistent(&sim);
            }
        }
    }
}

// ── Snapshots, reset, determinism ─────────────────────────────────────────────

mod snapshot_tests {
    use super::*;

    #[test]
    fn initial_snapshot_shape() {
        let sim = three_track_sim();
        let snap = sim.snapshot();

        assert_eq!(snap.deadlocks, 0);
        assert_eq!(snap.trains.len(), 3);
        for t in &snap.trains {
            assert_eq!(t.pos, 0.0);
            assert_eq!(t.wait, 0.0);
            assert_eq!(t.status, TrainStatus::Running);
        }

        let holders: Vec<(&str, &[String])> = snap
            .occupancy
            .iter()
            .map(|o| (o.track.as_str(), o.holders.as_slice()))
            .collect();
        assert_eq!(holders.len(), 3);
        assert_eq!(snap.occupancy[0].holders, vec!["T1", "free", "free", "free"]);
        assert_eq!(snap.occupancy[1].holders, vec!["T2", "free", "free", "free"]);
        assert_eq!(snap.occupancy[2].holders, vec!["T3", "free", "free", "free"]);
    }

    #[test]
    fn snapshot_positions_are_rounded() {
        let mut sim = SimBuilder::new(WorldConfig::default())
            .track("A", 4)
            .train("T1", "A", 0.0123456)
            .build()
            .unwrap();
        sim.step();
        let snap = sim.snapshot();
        assert_eq!(snap.trains[0].pos, 0.012);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let sim = three_track_sim();
        let json = serde_json::to_string(&sim.snapshot()).unwrap();
        assert!(json.contains("\"status\":\"running\""));
        assert!(json.contains("\"deadlocks\":0"));
        let back: crate::Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sim.snapshot());
    }

    #[test]
    fn reset_reproduces_initial_snapshot() {
        let mut sim = three_track_sim();
        let initial = sim.snapshot();

        sim.run_ticks(777, &mut NoopObserver);
        assert_ne!(sim.snapshot(), initial, "the run must have changed something");

        sim.reset();
        assert_eq!(sim.snapshot(), initial);
        assert_eq!(sim.clock.current, Tick(0));
        assert_eq!(sim.deadlocks, 0);
    }

    #[test]
    fn reset_keeps_selected_policy() {
        let mut sim = three_track_sim();
        sim.set_policy(PolicyMode::Ordered);
        sim.run_ticks(50, &mut NoopObserver);
        sim.reset();
        assert_eq!(sim.mode(), PolicyMode::Ordered);
    }

    #[test]
    fn identical_constructions_run_identically() {
        let mut a = three_track_sim();
        let mut b = three_track_sim();
        a.run_ticks(1_000, &mut NoopObserver);
        b.run_ticks(1_000, &mut NoopObserver);
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.deadlocks, b.deadlocks);
    }
}

// ── Observer plumbing ─────────────────────────────────────────────────────────

mod observer_tests {
    use super::*;

    #[derive(Default)]
    struct TickCounter {
        starts:    usize,
        ends:      usize,
        snapshots: usize,
        run_ends:  usize,
    }

    impl RailObserver for TickCounter {
        fn on_tick_start(&mut self, _t: Tick) {
            self.starts += 1;
        }
        fn on_tick_end(&mut self, _t: Tick, _waiting: usize) {
            self.ends += 1;
        }
        fn on_snapshot(&mut self, _t: Tick, _s: &crate::Snapshot) {
            self.snapshots += 1;
        }
        fn on_run_end(&mut self, _t: Tick) {
            self.run_ends += 1;
        }
    }

    #[test]
    fn hooks_fire_once_per_tick() {
        let mut sim = three_track_sim();
        let mut obs = TickCounter::default();
        sim.run_ticks(7, &mut obs);
        assert_eq!(obs.starts, 7);
        assert_eq!(obs.ends, 7);
        assert_eq!(obs.snapshots, 7, "interval 1 → every tick");
        assert_eq!(obs.run_ends, 1);
    }

    #[test]
    fn snapshot_interval_thins_callbacks() {
        let mut sim = SimBuilder::new(WorldConfig {
            snapshot_interval_ticks: 5,
            ..WorldConfig::default()
        })
        .track("A", 4)
        .train("T1", "A", 0.03)
        .build()
        .unwrap();

        let mut obs = TickCounter::default();
        sim.run_ticks(11, &mut obs);
        // Ticks 0, 5, 10.
        assert_eq!(obs.snapshots, 3);
    }
}

// ── Control handle ────────────────────────────────────────────────────────────

mod handle_tests {
    use super::*;
    use crate::SimHandle;

    #[test]
    fn paused_handle_does_not_step() {
        let handle = SimHandle::new(three_track_sim());
        let before = handle.snapshot();
        assert!(!handle.tick());
        assert_eq!(handle.snapshot(), before);
    }

    #[test]
    fn running_handle_steps() {
        let handle = SimHandle::new(three_track_sim());
        handle.set_running(true);
        assert!(handle.is_running());
        assert!(handle.tick());
        let snap = handle.snapshot();
        assert_eq!(snap.trains[0].pos, 0.03);
    }

    #[test]
    fn clones_share_one_world() {
        let handle = SimHandle::new(three_track_sim());
        let other = handle.clone();
        other.set_running(true);
        assert!(handle.tick());
        assert_eq!(other.snapshot(), handle.snapshot());
    }

    #[test]
    fn reset_and_policy_through_handle() {
        let handle = SimHandle::new(three_track_sim());
        let initial = handle.snapshot();

        handle.set_running(true);
        for _ in 0..300 {
            handle.tick();
        }
        handle.set_policy(PolicyMode::Ordered);
        assert_eq!(handle.mode(), PolicyMode::Ordered);

        handle.reset();
        assert_eq!(handle.snapshot(), initial);
        assert!(handle.is_running(), "reset does not pause the driver");
    }
}
