//! World configuration.

/// Fixed constants of the simulated world, supplied once at construction and
/// never re-derived at runtime.
///
/// All durations are in simulated seconds; positions and distances are in
/// track-relative units where one block spans `[0.0, 1.0]`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Simulated seconds per tick.  Wait times accumulate by this amount for
    /// every tick a train spends blocked.  Default: 0.1.
    pub tick_secs: f64,

    /// A queued train whose accumulated wait reaches this many simulated
    /// seconds is granted a freed block ahead of younger requesters.
    /// Default: 5.0.
    pub starvation_threshold: f64,

    /// Consecutive all-quiet ticks (no train carrying positive wait) before
    /// the stall fallback forces the longest waiter through.  Default: 50.
    pub stall_bound: u32,

    /// Ticks a train must sit out after a track change before any new grant
    /// can succeed.  Default: 2.
    pub switch_cooldown_ticks: u32,

    /// Minimum projected clearance (in block-position units) a resident train
    /// must have from the track start before a handoff onto that track is
    /// considered safe.  Default: 0.18.
    pub safety_margin: f64,

    /// Simulated seconds a track transfer is assumed to take; the safety
    /// predicate projects resident trains forward by this much.  Default: 0.8.
    pub transfer_secs: f64,

    /// Slack added to the projected clearance before comparing against
    /// `safety_margin`.  Default: 0.05.
    pub entry_slack: f64,

    /// Emit a snapshot to observers every N ticks during `run_ticks`.
    /// 0 disables snapshot callbacks.  Default: 1.
    pub snapshot_interval_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_secs:               0.1,
            starvation_threshold:    5.0,
            stall_bound:             50,
            switch_cooldown_ticks:   2,
            safety_margin:           0.18,
            transfer_secs:           0.8,
            entry_slack:             0.05,
            snapshot_interval_ticks: 1,
        }
    }
}
