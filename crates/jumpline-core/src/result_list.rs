//! The results list pane.
//!
//! The pane renders a [`ResultIndex`] into its own [`TextBuffer`]: a header line followed by one
//! block per result in display order. Each block is tracked by a pair of anchors so the selected
//! item can be highlighted (and hit-tested) as a text run, the same way document highlights work.

use crate::buffer::{Anchor, AnchoredText, BufferId, TextBuffer};
use crate::error::BufferError;
use crate::highlight::{HighlightLayerEngine, Painter, RegionHandle};
use crate::repaint::RepaintScheduler;
use crate::result::{DerivedResult, ResultLabels};
use crate::result_index::ResultIndex;
use std::ops::Range;

/// Rendered list of results with a single selected-item highlight.
#[derive(Debug)]
pub struct ResultListPane {
    buffer: TextBuffer,
    items: Vec<(Anchor, Anchor)>,
    engine: HighlightLayerEngine,
    highlight: Option<(usize, RegionHandle)>,
}

impl ResultListPane {
    /// Create an empty pane backed by a buffer with id `id`.
    pub fn new(id: BufferId, scheduler: Option<RepaintScheduler>) -> Self {
        let engine = match scheduler {
            Some(scheduler) => HighlightLayerEngine::with_scheduler(id, scheduler),
            None => HighlightLayerEngine::new(id),
        };
        Self {
            buffer: TextBuffer::new(id, None, ""),
            items: Vec::new(),
            engine,
            highlight: None,
        }
    }

    /// Replace the pane contents with `index`. Clears the highlight.
    pub fn render(&mut self, index: &ResultIndex, labels: &ResultLabels) -> Result<(), BufferError> {
        self.clear_highlight();

        let mut text = index.header_text(labels);
        let mut spans = Vec::with_capacity(index.len());
        let mut offset = text.chars().count();
        for result in index.iter() {
            let block = item_text(result);
            text.push('\n');
            offset += 1;
            let len = block.chars().count();
            spans.push(offset..offset + len);
            text.push_str(&block);
            offset += len;
        }

        let len = self.buffer.char_count();
        self.buffer.replace(0..len, &text)?;
        self.items = spans
            .into_iter()
            .map(|span| {
                Ok((
                    self.buffer.create_anchor(span.start)?,
                    self.buffer.create_anchor(span.end)?,
                ))
            })
            .collect::<Result<_, BufferError>>()?;
        Ok(())
    }

    /// Rendered text.
    pub fn text(&self) -> String {
        self.buffer.text().unwrap_or_default()
    }

    /// The pane's buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Number of rendered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no items are rendered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Text range of the item at `display_index`.
    pub fn item_range(&self, display_index: usize) -> Option<Range<usize>> {
        self.items
            .get(display_index)
            .map(|(start, end)| start.offset()..end.offset())
    }

    /// Item containing `offset` (e.g. a click in the pane).
    pub fn item_at_offset(&self, offset: usize) -> Option<usize> {
        self.items
            .iter()
            .position(|(start, end)| start.offset() <= offset && offset <= end.offset())
    }

    /// Highlight the item at `display_index`, replacing any previous highlight.
    ///
    /// Returns the highlighted range, or `None` if the item does not exist.
    pub fn highlight_item(&mut self, display_index: usize, painter: Painter) -> Option<Range<usize>> {
        self.clear_highlight();
        let (start, end) = self.items.get(display_index)?.clone();
        let range = start.offset()..end.offset();
        match self.engine.add_region(start, end, painter) {
            Ok(handle) => {
                self.highlight = Some((display_index, handle));
                Some(range)
            }
            Err(err) => {
                log::debug!("cannot highlight list item {display_index}: {err}");
                None
            }
        }
    }

    /// Remove the item highlight, if any.
    pub fn clear_highlight(&mut self) {
        if let Some((_, handle)) = self.highlight.take() {
            self.engine.remove_region(handle);
        }
    }

    /// Display index of the highlighted item.
    pub fn highlighted_item(&self) -> Option<usize> {
        self.highlight.map(|(index, _)| index)
    }

    /// Highlight regions of the pane.
    pub fn engine(&self) -> &HighlightLayerEngine {
        &self.engine
    }

    /// Mutable access to the pane's highlight regions (for painting).
    pub fn engine_mut(&mut self) -> &mut HighlightLayerEngine {
        &mut self.engine
    }
}

fn item_text(result: &DerivedResult) -> String {
    let location = match (&result.file, result.line) {
        (Some(file), Some(line)) => format!("File: {file}  [line: {}]", line + 1),
        (Some(file), None) => format!("File: {file}"),
        _ => "[no source location]".to_string(),
    };
    format!("{location}\n{}: {}", result.severity.label(), result.message)
}
