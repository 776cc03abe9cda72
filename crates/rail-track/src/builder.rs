//! Validated construction of a [`TrackLayout`].

use rustc_hash::FxHashMap;

use rail_core::{BlockId, TrackId};

use crate::error::LayoutError;
use crate::layout::{BlockMeta, TrackLayout, TrackSpan};

/// Builder for [`TrackLayout`].
///
/// Blocks are auto-named `<label><1-based slot>`, so `.track("A", 4)` yields
/// `A1..A4`.  All topology misconfiguration is rejected at [`build`] time,
/// never at step time.
///
/// # Example
///
/// ```rust,ignore
/// let layout = TrackLayoutBuilder::new()
///     .track("A", 4)
///     .track("B", 4)
///     .track("C", 4)
///     .build()?;
/// ```
#[derive(Default)]
pub struct TrackLayoutBuilder {
    tracks: Vec<(String, usize)>,
}

impl TrackLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track with `block_count` auto-named blocks.
    pub fn track(mut self, label: impl Into<String>, block_count: usize) -> Self {
        self.tracks.push((label.into(), block_count));
        self
    }

    /// Validate and build the immutable layout.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::EmptyTrack`] — a track with zero blocks.
    /// - [`LayoutError::DuplicateTrack`] — two tracks share a label.
    /// - [`LayoutError::DuplicateBlock`] — two generated block names collide
    ///   (possible when one label is a prefix of another, e.g. `"A"` and
    ///   `"A1"`).
    pub fn build(self) -> Result<TrackLayout, LayoutError> {
        let mut spans:   Vec<TrackSpan> = Vec::with_capacity(self.tracks.len());
        let mut blocks:  Vec<BlockMeta> = Vec::new();
        let mut by_name: FxHashMap<String, BlockId> = FxHashMap::default();

        for (track_idx, (label, block_count)) in self.tracks.into_iter().enumerate() {
            if block_count == 0 {
                return Err(LayoutError::EmptyTrack(label));
            }
            if spans.iter().any(|s| s.label == label) {
                return Err(LayoutError::DuplicateTrack(label));
            }

            let track = TrackId(track_idx as u16);
            let mut span_blocks = Vec::with_capacity(block_count);
            for slot in 0..block_count {
                let name = format!("{label}{}", slot + 1);
                let id = BlockId(blocks.len() as u32);
                if by_name.insert(name.clone(), id).is_some() {
                    return Err(LayoutError::DuplicateBlock(name));
                }
                blocks.push(BlockMeta { name, track, slot: slot as u16 });
                span_blocks.push(id);
            }
            spans.push(TrackSpan { label, blocks: span_blocks });
        }

        Ok(TrackLayout::new(spans, blocks, by_name))
    }
}
