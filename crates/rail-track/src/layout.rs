//! The fixed track topology: cyclic tracks, per-block metadata, name index.

use rustc_hash::FxHashMap;

use rail_core::{BlockId, TrackId};

/// One track: an ordered run of blocks a train traverses front to back.
#[derive(Debug, Clone)]
pub struct TrackSpan {
    /// Display label, e.g. `"A"`.
    pub label: String,
    /// Blocks in traversal order.  Never empty (builder-enforced).
    pub blocks: Vec<BlockId>,
}

/// Per-block placement metadata.
#[derive(Debug, Clone)]
pub struct BlockMeta {
    /// Display name, e.g. `"A3"`.
    pub name: String,
    /// Owning track.
    pub track: TrackId,
    /// Zero-based position within the owning track; doubles as the block's
    /// rank for ordered-admission checks.
    pub slot: u16,
}

/// The immutable world topology.
///
/// Built once by [`TrackLayoutBuilder`][crate::TrackLayoutBuilder]; tracks and
/// blocks are never created or destroyed afterwards, only re-owned.  All
/// accessors taking an id expect a valid one (ids originate from this layout)
/// and index directly.
#[derive(Debug, Clone)]
pub struct TrackLayout {
    tracks:  Vec<TrackSpan>,
    blocks:  Vec<BlockMeta>,
    by_name: FxHashMap<String, BlockId>,
}

impl TrackLayout {
    pub(crate) fn new(
        tracks:  Vec<TrackSpan>,
        blocks:  Vec<BlockMeta>,
        by_name: FxHashMap<String, BlockId>,
    ) -> Self {
        Self { tracks, blocks, by_name }
    }

    // ── Counts and iteration ──────────────────────────────────────────────

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// All track ids in layout order.
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        (0..self.tracks.len() as u16).map(TrackId)
    }

    // ── Track accessors ───────────────────────────────────────────────────

    /// Display label of `track`.
    pub fn label(&self, track: TrackId) -> &str {
        &self.tracks[track.index()].label
    }

    /// Blocks of `track` in traversal order.
    pub fn blocks_of(&self, track: TrackId) -> &[BlockId] {
        &self.tracks[track.index()].blocks
    }

    /// First block of `track` — where handoffs from other tracks land.
    pub fn entry_block(&self, track: TrackId) -> BlockId {
        self.tracks[track.index()].blocks[0]
    }

    /// The successor of `track` under the fixed cyclic rotation.
    pub fn next_track(&self, track: TrackId) -> TrackId {
        TrackId(((track.index() + 1) % self.tracks.len()) as u16)
    }

    /// Resolve a track by its display label.
    pub fn track_by_label(&self, label: &str) -> Option<TrackId> {
        self.tracks
            .iter()
            .position(|t| t.label == label)
            .map(|i| TrackId(i as u16))
    }

    // ── Block accessors ───────────────────────────────────────────────────

    /// The track `block` belongs to.
    pub fn track_of(&self, block: BlockId) -> TrackId {
        self.blocks[block.index()].track
    }

    /// Zero-based position of `block` within its track.
    pub fn slot_of(&self, block: BlockId) -> usize {
        self.blocks[block.index()].slot as usize
    }

    /// Display name of `block`.
    pub fn name_of(&self, block: BlockId) -> &str {
        &self.blocks[block.index()].name
    }

    /// The block at `slot` on `track`.
    pub fn block_at(&self, track: TrackId, slot: usize) -> BlockId {
        self.tracks[track.index()].blocks[slot]
    }

    /// Resolve a block by its display name.
    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }
}
