//! Fluent builder for constructing a [`Sim`].

use rail_core::WorldConfig;
use rail_fleet::TrainSpec;
use rail_lock::PolicyMode;
use rail_track::TrackLayoutBuilder;

use crate::sim::{SeedTrain, Sim};
use crate::{SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// Tracks and trains are declared up front; all topology misconfiguration is
/// rejected by [`build`][Self::build], never at step time.
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimBuilder::new(WorldConfig::default())
///     .track("A", 4)
///     .track("B", 4)
///     .track("C", 4)
///     .train("T1", "A", 0.03)
///     .train("T2", "B", 0.026)
///     .train("T3", "C", 0.034)
///     .build()?;
/// ```
pub struct SimBuilder {
    config: WorldConfig,
    tracks: Vec<(String, usize)>,
    roster: Vec<TrainSpec>,
    mode:   PolicyMode,
}

impl SimBuilder {
    /// Create a builder with the given world constants.  The policy defaults
    /// to centralized; override with [`policy`][Self::policy].
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            roster: Vec::new(),
            mode:   PolicyMode::default(),
        }
    }

    /// Append a cyclic track with `block_count` auto-named blocks.
    pub fn track(mut self, label: impl Into<String>, block_count: usize) -> Self {
        self.tracks.push((label.into(), block_count));
        self
    }

    /// Append a train starting on `track_label` at the given speed
    /// (position units per tick).  It is pre-granted that track's entry
    /// block.
    pub fn train(
        mut self,
        name:        impl Into<String>,
        track_label: impl Into<String>,
        speed:       f64,
    ) -> Self {
        self.roster.push(TrainSpec {
            name:        name.into(),
            track_label: track_label.into(),
            speed,
        });
        self
    }

    /// Select the initial admission policy.
    pub fn policy(mut self, mode: PolicyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate everything and return a ready-to-step [`Sim`].
    ///
    /// # Errors
    ///
    /// - [`SimError::Layout`] — empty track, duplicate labels, or colliding
    ///   block names.
    /// - [`SimError::UnknownTrack`] — a train's starting track does not exist.
    /// - [`SimError::DuplicateTrain`] — two trains share a name.
    /// - [`SimError::EntryTaken`] — two trains start on the same track; only
    ///   one can hold its entry block.
    pub fn build(self) -> SimResult<Sim> {
        let mut layout_builder = TrackLayoutBuilder::new();
        for (label, block_count) in self.tracks {
            layout_builder = layout_builder.track(label, block_count);
        }
        let layout = layout_builder.build()?;

        let mut roster: Vec<SeedTrain> = Vec::with_capacity(self.roster.len());
        for spec in self.roster {
            if roster.iter().any(|s| s.name == spec.name) {
                return Err(SimError::DuplicateTrain(spec.name));
            }
            let Some(track) = layout.track_by_label(&spec.track_label) else {
                return Err(SimError::UnknownTrack {
                    train: spec.name,
                    label: spec.track_label,
                });
            };
            if let Some(earlier) = roster.iter().find(|s| s.track == track) {
                return Err(SimError::EntryTaken {
                    train:  spec.name,
                    label:  spec.track_label,
                    holder: earlier.name.clone(),
                });
            }
            roster.push(SeedTrain {
                name: spec.name,
                track,
                speed: spec.speed,
            });
        }

        Ok(Sim::new(self.config, layout, roster, self.mode))
    }
}
