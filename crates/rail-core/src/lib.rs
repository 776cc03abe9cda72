//! `rail-core` — foundational types for the `railblock` contention simulation.
//!
//! This crate is a dependency of every other `rail-*` crate.  It intentionally
//! has no `rail-*` dependencies and no required external ones (only optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                  |
//! |------------|-------------------------------------------|
//! | [`ids`]    | `TrainId`, `BlockId`, `TrackId`           |
//! | [`time`]   | `Tick`, `TickClock`                       |
//! | [`config`] | `WorldConfig`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod config;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::WorldConfig;
pub use ids::{BlockId, TrackId, TrainId};
pub use time::{Tick, TickClock};
