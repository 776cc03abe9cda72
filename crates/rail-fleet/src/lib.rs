//! `rail-fleet` — per-train state and the fleet store.
//!
//! A train is a moving entity with a continuous position inside its current
//! block, a held-block set, and a small request/wait state machine.  The
//! stepper in `rail-sim` drives these fields; the admission policies in
//! `rail-lock` mutate `held` and `requesting` as grants happen.

pub mod train;


pub use train::{Train, TrainSpec, TrainStatus, TrainStore};
