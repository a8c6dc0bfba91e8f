//! Pixel geometry for layered highlights.
//!
//! Layered painters report the pixel bounds they painted so that later removals can repaint just
//! that rectangle. [`CellGeometry`] computes those bounds for hosts that draw text on a
//! monospace cell grid (wide CJK characters occupy two cells, tabs advance to the next stop).
//! [`CellCanvas`] is a headless paint surface built on that geometry.

use crate::error::PaintError;
use crate::highlight::{PaintSurface, Painter};
use unicode_width::UnicodeWidthChar;

/// A pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width as i32
            && other.x < self.x + self.width as i32
            && self.y < other.y + other.height as i32
            && other.y < self.y + self.height as i32
    }

    /// Smallest rectangle containing both rectangles (empty rectangles are ignored).
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width as i32).max(other.x + other.width as i32);
        let bottom = (self.y + self.height as i32).max(other.y + other.height as i32);
        Rect::new(left, top, (right - left) as u32, (bottom - top) as u32)
    }
}

/// Monospace cell grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGeometry {
    /// Width of one cell in pixels.
    pub cell_width: u32,
    /// Height of one line in pixels.
    pub line_height: u32,
    /// Tab stop width in cells.
    pub tab_width: usize,
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self {
            cell_width: 8,
            line_height: 16,
            tab_width: 4,
        }
    }
}

impl CellGeometry {
    /// Bounding rectangle of the character range `start..end` of `text`.
    ///
    /// Single-line ranges cover exactly their cells; multi-line ranges cover full width from the
    /// left edge to the widest spanned line. Returns `None` when the range is inverted or extends
    /// past the end of the text.
    pub fn rect_for_range(&self, text: &str, start: usize, end: usize) -> Option<Rect> {
        if start > end {
            return None;
        }

        let mut line = 0usize;
        let mut cells = 0usize;
        let mut start_pos: Option<(usize, usize)> = None;
        let mut end_pos: Option<(usize, usize)> = None;
        let mut widest = 0usize;
        let mut count = 0usize;

        for (offset, ch) in text.chars().enumerate() {
            if offset == start {
                start_pos = Some((line, cells));
            }
            if offset == end {
                end_pos = Some((line, cells));
                break;
            }
            if start_pos.is_some() {
                widest = widest.max(cells);
            }
            if ch == '\n' {
                line += 1;
                cells = 0;
            } else {
                cells = self.advance(cells, ch);
                if start_pos.is_some() {
                    widest = widest.max(cells);
                }
            }
            count = offset + 1;
        }
        if end_pos.is_none() && end == count {
            start_pos.get_or_insert((line, cells));
            end_pos = Some((line, cells));
        }

        let (start_line, start_cells) = start_pos?;
        let (end_line, end_cells) = end_pos?;
        let height = (end_line - start_line + 1) as u32 * self.line_height;
        let y = (start_line as u32 * self.line_height) as i32;

        if start_line == end_line {
            let width = (end_cells - start_cells) as u32 * self.cell_width;
            let x = (start_cells as u32 * self.cell_width) as i32;
            return Some(Rect::new(x, y, width, height));
        }

        let width = widest.max(end_cells) as u32 * self.cell_width;
        Some(Rect::new(0, y, width, height))
    }

    fn advance(&self, cells: usize, ch: char) -> usize {
        if ch == '\t' {
            let tab = self.tab_width.max(1);
            return (cells / tab + 1) * tab;
        }
        cells + ch.width().unwrap_or(0)
    }
}

/// One recorded paint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintOp {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
    /// Painter used.
    pub painter: Painter,
    /// Painted bounds.
    pub rect: Rect,
}

/// A headless [`PaintSurface`] that lays text out on a [`CellGeometry`] grid and records the
/// paint calls it receives, in order.
#[derive(Debug, Clone)]
pub struct CellCanvas {
    text: String,
    geometry: CellGeometry,
    ops: Vec<PaintOp>,
}

impl CellCanvas {
    /// Create a canvas showing `text`.
    pub fn new(text: impl Into<String>, geometry: CellGeometry) -> Self {
        Self {
            text: text.into(),
            geometry,
            ops: Vec::new(),
        }
    }

    /// Replace the displayed text (after an edit).
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Paint calls since the last [`CellCanvas::clear`].
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Forget recorded paint calls.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl PaintSurface for CellCanvas {
    fn paint(
        &mut self,
        start: usize,
        end: usize,
        painter: &Painter,
    ) -> Result<Option<Rect>, PaintError> {
        let rect = self
            .geometry
            .rect_for_range(&self.text, start, end)
            .ok_or(PaintError::Unmappable { start, end })?;
        self.ops.push(PaintOp {
            start,
            end,
            painter: *painter,
            rect,
        });
        Ok(Some(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_range() {
        let geometry = CellGeometry::default();
        let rect = geometry.rect_for_range("abc\ndef", 5, 7).unwrap();
        assert_eq!(rect, Rect::new(8, 16, 16, 16));
    }

    #[test]
    fn test_wide_characters_take_two_cells() {
        let geometry = CellGeometry::default();
        let rect = geometry.rect_for_range("a中b", 1, 2).unwrap();
        assert_eq!(rect, Rect::new(8, 0, 16, 16));
    }

    #[test]
    fn test_multi_line_range_spans_full_width() {
        let geometry = CellGeometry::default();
        let rect = geometry.rect_for_range("ab\nlonger\nc", 1, 10).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 48, 48));
    }

    #[test]
    fn test_out_of_range_is_unmappable() {
        let geometry = CellGeometry::default();
        assert_eq!(geometry.rect_for_range("abc", 2, 9), None);
        assert_eq!(geometry.rect_for_range("abc", 2, 1), None);
        assert_eq!(
            geometry.rect_for_range("abc", 3, 3),
            Some(Rect::new(24, 0, 0, 16))
        );
    }

    #[test]
    fn test_canvas_records_and_rejects() {
        use crate::highlight::PainterCategory;
        use crate::style::StyleSheet;

        let painter = Painter::new(PainterCategory::Frame, StyleSheet::default().frame);
        let mut canvas = CellCanvas::new("abc", CellGeometry::default());
        assert_eq!(
            canvas.paint(0, 2, &painter),
            Ok(Some(Rect::new(0, 0, 16, 16)))
        );
        assert_eq!(
            canvas.paint(1, 9, &painter),
            Err(PaintError::Unmappable { start: 1, end: 9 })
        );
        assert_eq!(canvas.ops().len(), 1);
        canvas.clear();
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 20, 10, 5);
        assert_eq!(a.union(b), Rect::new(0, 0, 15, 25));
        assert_eq!(a.union(Rect::default()), a);
    }

    #[test]
    fn test_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(!a.intersects(&Rect::new(2, 2, 0, 5)));
    }
}
