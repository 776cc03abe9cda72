//! `rail-track` — the exclusive-ownership block primitive and the fixed track
//! topology.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`block`]   | `Block` — single-holder cell; `BlockBoard` — all blocks   |
//! | [`layout`]  | `TrackLayout` — cyclic tracks, block metadata, name index |
//! | [`builder`] | `TrackLayoutBuilder` — validated construction             |
//! | [`error`]   | `LayoutError`                                             |
//!
//! # Ownership model
//!
//! A block is held by at most one train at a time.  `Block::lock` succeeds
//! only on a free block and `Block::release` only clears a holder that
//! matches the caller, so stale or duplicate calls are harmless.  The single
//! unconditional path is [`BlockBoard::seize`], reserved for deadlock
//! recovery's force-assign.

pub mod block;
pub mod builder;
pub mod error;
pub mod layout;


pub use block::{Block, BlockBoard};
pub use builder::TrackLayoutBuilder;
pub use error::LayoutError;
pub use layout::TrackLayout;
