//! Layered highlight regions.
//!
//! A [`HighlightLayerEngine`] owns the highlight regions of one buffer. Each region is a pair of
//! [`Anchor`]s plus a [`Painter`], so regions follow buffer edits without any bookkeeping here.
//!
//! # Stacking
//!
//! The region list is ordered front (topmost) to back. Regions are grouped by
//! [`PainterCategory::layer`]:
//!
//! | layer | categories          |
//! |-------|---------------------|
//! | 0     | `Selection`         |
//! | 1     | `Result`, `Generic` |
//! | 2     | `Frame`             |
//!
//! A new region is inserted at the front of its layer group, just behind every region of a lower
//! layer. [`HighlightLayerEngine::paint`] walks the list back to front, so selection is always
//! drawn last (on top) and, within a layer, newer regions are drawn over older ones.
//!
//! # Repaint
//!
//! Every mutation reports the affected area to the engine's [`RepaintScheduler`] (if any). Layered
//! painters remember the pixel bounds of their last paint, which are reported instead of offsets.

use crate::buffer::{Anchor, AnchoredText, BufferId};
use crate::error::{HighlightError, PaintError};
use crate::geometry::Rect;
use crate::repaint::{Damage, RepaintScheduler};
use crate::style::HighlightStyle;
use std::fmt;
use std::ops::Range;

/// Stacking class of a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PainterCategory {
    /// Native text selection; always on top.
    Selection,
    /// The selected derived result.
    Result,
    /// Outlined regions.
    Frame,
    /// Everything else (search matches, bracket matches).
    Generic,
}

impl PainterCategory {
    /// Stacking layer (lower is nearer the front).
    pub const fn layer(self) -> u8 {
        match self {
            PainterCategory::Selection => 0,
            PainterCategory::Result | PainterCategory::Generic => 1,
            PainterCategory::Frame => 2,
        }
    }

    /// Returns `true` if both categories stack in the same group.
    pub const fn is_compatible_with(self, other: PainterCategory) -> bool {
        self.layer() == other.layer()
    }
}

/// How a region is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    /// Stacking class.
    pub category: PainterCategory,
    /// Color and weight.
    pub style: HighlightStyle,
    /// Layered painters report the pixel bounds they paint.
    pub layered: bool,
}

impl Painter {
    /// Create a non-layered painter.
    pub const fn new(category: PainterCategory, style: HighlightStyle) -> Self {
        Self {
            category,
            style,
            layered: false,
        }
    }

    /// The same painter, tracking pixel bounds.
    pub const fn layered(mut self) -> Self {
        self.layered = true;
        self
    }
}

/// Identifies a region within its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionHandle(u64);

/// A highlighted span of a buffer.
#[derive(Debug, Clone)]
pub struct HighlightRegion {
    handle: RegionHandle,
    start: Anchor,
    end: Anchor,
    painter: Painter,
    insertion_seq: u64,
    painted_bounds: Option<Rect>,
}

impl HighlightRegion {
    /// Region handle.
    pub fn handle(&self) -> RegionHandle {
        self.handle
    }

    /// Painter used for this region.
    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    /// Current extent. Collapses to zero width if edits moved the end before the start.
    pub fn range(&self) -> Range<usize> {
        let start = self.start.offset();
        start..self.end.offset().max(start)
    }

    /// Monotonic sequence number assigned when the region was added.
    pub fn insertion_seq(&self) -> u64 {
        self.insertion_seq
    }

    /// Pixel bounds from the last paint (layered painters only).
    pub fn painted_bounds(&self) -> Option<Rect> {
        self.painted_bounds
    }

    fn damage(&self) -> Option<Damage> {
        if self.painter.layered
            && let Some(rect) = self.painted_bounds
        {
            return Some(Damage::Pixels(rect));
        }
        let range = self.range();
        (!range.is_empty()).then(|| Damage::offsets(range.start, range.end))
    }
}

/// A rendering surface for highlights.
pub trait PaintSurface {
    /// Paint `start..end` with `painter`.
    ///
    /// Returns the painted pixel bounds when known. An error means the offsets could not be mapped
    /// to the view this cycle; the region is skipped.
    fn paint(
        &mut self,
        start: usize,
        end: usize,
        painter: &Painter,
    ) -> Result<Option<Rect>, PaintError>;
}

/// Ordered, layered highlight regions of one buffer.
///
/// UI-thread only; worker threads reach the view through the [`RepaintScheduler`].
pub struct HighlightLayerEngine {
    buffer: BufferId,
    regions: Vec<HighlightRegion>,
    next_seq: u64,
    scheduler: Option<RepaintScheduler>,
}

impl HighlightLayerEngine {
    /// Create an engine for `buffer` without repaint notifications.
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            regions: Vec::new(),
            next_seq: 0,
            scheduler: None,
        }
    }

    /// Create an engine for `buffer` that reports damage to `scheduler`.
    pub fn with_scheduler(buffer: BufferId, scheduler: RepaintScheduler) -> Self {
        Self {
            scheduler: Some(scheduler),
            ..Self::new(buffer)
        }
    }

    /// The buffer this engine paints.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if there are no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions from front (topmost) to back.
    pub fn regions(&self) -> &[HighlightRegion] {
        &self.regions
    }

    /// Regions in paint order (back to front).
    pub fn paint_order(&self) -> impl Iterator<Item = &HighlightRegion> {
        self.regions.iter().rev()
    }

    /// Region for `handle`, if it is still present.
    pub fn region(&self, handle: RegionHandle) -> Option<&HighlightRegion> {
        self.regions.iter().find(|r| r.handle == handle)
    }

    /// Number of regions of `category`.
    pub fn count_of(&self, category: PainterCategory) -> usize {
        self.regions
            .iter()
            .filter(|r| r.painter.category == category)
            .count()
    }

    /// Add a region between two anchors of this engine's buffer.
    pub fn add_region(
        &mut self,
        start: Anchor,
        end: Anchor,
        painter: Painter,
    ) -> Result<RegionHandle, HighlightError> {
        self.check_anchor(&start)?;
        self.check_anchor(&end)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        let region = HighlightRegion {
            handle: RegionHandle(seq),
            start,
            end,
            painter,
            insertion_seq: seq,
            painted_bounds: None,
        };

        let layer = painter.category.layer();
        let pos = self
            .regions
            .iter()
            .position(|r| r.painter.category.layer() >= layer)
            .unwrap_or(self.regions.len());
        self.report(region.damage());
        self.regions.insert(pos, region);
        Ok(RegionHandle(seq))
    }

    /// Anchor `start..end` in `doc` and add a region for it.
    pub fn add_highlight(
        &mut self,
        doc: &dyn AnchoredText,
        start: usize,
        end: usize,
        painter: Painter,
    ) -> Result<RegionHandle, HighlightError> {
        let (start, end) = (start.min(end), start.max(end));
        let start = doc.create_anchor(start)?;
        let end = doc.create_anchor(end)?;
        self.add_region(start, end, painter)
    }

    /// Move a region to new anchors, keeping its stacking position.
    ///
    /// Returns `Ok(false)` if the handle is unknown.
    pub fn change_region(
        &mut self,
        handle: RegionHandle,
        start: Anchor,
        end: Anchor,
    ) -> Result<bool, HighlightError> {
        self.check_anchor(&start)?;
        self.check_anchor(&end)?;
        let Some(pos) = self.position(handle) else {
            return Ok(false);
        };

        let old = self.regions[pos].damage();
        let region = &mut self.regions[pos];
        region.start = start;
        region.end = end;
        region.painted_bounds = None;
        let new = region.damage();
        self.report(old);
        self.report(new);
        Ok(true)
    }

    /// Remove a region. Unknown handles are ignored.
    pub fn remove_region(&mut self, handle: RegionHandle) -> bool {
        let Some(pos) = self.position(handle) else {
            log::trace!("remove of unknown region {handle:?} ignored");
            return false;
        };
        let region = self.regions.remove(pos);
        self.report(region.damage());
        true
    }

    /// Remove every region.
    pub fn remove_all(&mut self) {
        for region in std::mem::take(&mut self.regions) {
            self.report(region.damage());
        }
    }

    /// Paint every region intersecting `visible`, back to front. Returns the number painted.
    ///
    /// Regions the surface cannot map are skipped for this cycle.
    pub fn paint(&mut self, surface: &mut dyn PaintSurface, visible: Range<usize>) -> usize {
        let mut painted = 0;
        for region in self.regions.iter_mut().rev() {
            let range = region.range();
            if range.is_empty() || range.end <= visible.start || range.start >= visible.end {
                continue;
            }
            match surface.paint(range.start, range.end, &region.painter) {
                Ok(bounds) => {
                    if region.painter.layered {
                        region.painted_bounds = bounds;
                    }
                    painted += 1;
                }
                Err(err) => log::debug!("skipping region {:?}: {err}", region.handle),
            }
        }
        painted
    }

    fn position(&self, handle: RegionHandle) -> Option<usize> {
        self.regions.iter().position(|r| r.handle == handle)
    }

    fn check_anchor(&self, anchor: &Anchor) -> Result<(), HighlightError> {
        if anchor.buffer() != self.buffer {
            return Err(HighlightError::ForeignAnchor {
                anchor: anchor.buffer(),
                engine: self.buffer,
            });
        }
        Ok(())
    }

    fn report(&self, damage: Option<Damage>) {
        if let (Some(scheduler), Some(damage)) = (&self.scheduler, damage) {
            scheduler.request(self.buffer, damage);
        }
    }
}

impl fmt::Debug for HighlightLayerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightLayerEngine")
            .field("buffer", &self.buffer)
            .field("regions", &self.regions)
            .finish_non_exhaustive()
    }
}
