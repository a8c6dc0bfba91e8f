//! Result navigation.
//!
//! [`NavigationController`] owns "which result is selected" and keeps three views of that choice
//! in sync: the caret in the document, a RESULT highlight in the document and a RESULT highlight
//! on the item in the [`ResultListPane`].
//!
//! Selection changes come from three places:
//!
//! - explicit selection ([`select_item`](NavigationController::select_item),
//!   [`select_nothing`](NavigationController::select_nothing), a click in the list);
//! - stepping ([`next`](NavigationController::next), [`previous`](NavigationController::previous));
//! - caret movement ([`on_caret_moved`](NavigationController::on_caret_moved)), which selects the
//!   result on the caret's line without moving the caret or scrolling the document.
//!
//! The editor side is reached through [`NavigationHost`]. Jumping to a result in a file that is not
//! active asks the host to switch buffers; the caret and highlight are applied once the host
//! reports completion through [`on_switch_completed`](NavigationController::on_switch_completed).

use crate::buffer::{AnchoredText, DocumentSource, FileRef};
use crate::error::NavError;
use crate::highlight::{HighlightLayerEngine, PainterCategory, RegionHandle};
use crate::result::{DerivedResult, ResultLabels};
use crate::result_index::{IndexOptions, ResultIndex};
use crate::result_list::ResultListPane;
use crate::style::StyleRegistry;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Editor operations used by the navigation controller.
pub trait NavigationHost: DocumentSource {
    /// File of the active editor, if any.
    fn active_file(&self) -> Option<FileRef>;

    /// Highlight engine of the open buffer for `file`.
    fn highlighter(&mut self, file: &FileRef) -> Option<&mut HighlightLayerEngine>;

    /// Open (if needed) and activate `file`.
    ///
    /// Completion is reported later through [`NavigationController::on_switch_completed`].
    fn request_switch(&mut self, file: &FileRef) -> Result<(), NavError>;

    /// Move the caret of `file`'s editor.
    fn set_caret(&mut self, file: &FileRef, offset: usize);

    /// Scroll `file`'s editor so `range` is visible.
    fn scroll_to_visible(&mut self, file: &FileRef, range: Range<usize>);

    /// Scroll the results list so `range` of its text is visible.
    fn scroll_list_to_visible(&mut self, range: Range<usize>);
}

/// Enable state of the stepping controls and the header text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlState {
    /// "Next" is enabled.
    pub next_enabled: bool,
    /// "Previous" is enabled.
    pub previous_enabled: bool,
    /// Results header (e.g. `"2 errors found:"`).
    pub header: String,
}

/// Notifications sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The selected display index changed.
    SelectionChanged(Option<usize>),
    /// The stepping controls changed.
    ControlsChanged(ControlState),
}

/// Subscriber callback.
pub type NavigationCallback = Box<dyn FnMut(&NavigationEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Explicit,
    Caret,
}

#[derive(Debug)]
struct DocumentHighlight {
    file: FileRef,
    handle: RegionHandle,
}

#[derive(Debug)]
struct PendingJump {
    file: FileRef,
    display: usize,
}

/// Keeps the selected result, the caret and both RESULT highlights in sync.
///
/// UI-thread only.
pub struct NavigationController {
    index: ResultIndex,
    options: IndexOptions,
    labels: ResultLabels,
    list: ResultListPane,
    styles: Arc<StyleRegistry>,
    selected: Option<usize>,
    document_highlight: Option<DocumentHighlight>,
    pending: Option<PendingJump>,
    controls: ControlState,
    subscribers: Vec<NavigationCallback>,
}

impl NavigationController {
    /// Create a controller rendering into `list`.
    pub fn new(list: ResultListPane, styles: Arc<StyleRegistry>, labels: ResultLabels) -> Self {
        let mut controller = Self {
            index: ResultIndex::empty(),
            options: IndexOptions::default(),
            labels,
            list,
            styles,
            selected: None,
            document_highlight: None,
            pending: None,
            controls: ControlState::default(),
            subscribers: Vec::new(),
        };
        if let Err(err) = controller.list.render(&controller.index, &controller.labels) {
            log::warn!("cannot render results list: {err}");
        }
        controller.controls = controller.compute_controls();
        controller
    }

    /// Use `options` for indexes built from now on.
    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the result set. Clears the selection and both highlights.
    pub fn set_results<H>(&mut self, host: &mut H, results: impl IntoIterator<Item = DerivedResult>)
    where
        H: NavigationHost + ?Sized,
    {
        self.pending = None;
        self.clear_highlights(host);
        self.index = ResultIndex::build_with_options(results, &*host, self.options);
        if let Err(err) = self.list.render(&self.index, &self.labels) {
            log::warn!("cannot render results list: {err}");
        }
        log::debug!("navigating {} result(s)", self.index.len());

        if self.selected.take().is_some() {
            self.emit(NavigationEvent::SelectionChanged(None));
        }
        self.update_controls();
    }

    /// Replace the header nouns and re-render the list. Clears the list highlight.
    pub fn set_labels(&mut self, labels: ResultLabels) {
        self.labels = labels;
        if let Err(err) = self.list.render(&self.index, &self.labels) {
            log::warn!("cannot render results list: {err}");
        }
        if let Some(display) = self.selected
            && self.list.highlight_item(display, self.styles.list_painter()).is_none()
        {
            log::debug!("list item {display} not re-highlighted");
        }
        self.update_controls();
    }

    /// Select the result at `display_index`: highlight it in the list and the document, move the
    /// caret to it and scroll it into view.
    pub fn select_item<H>(&mut self, host: &mut H, display_index: usize) -> Result<(), NavError>
    where
        H: NavigationHost + ?Sized,
    {
        let len = self.index.len();
        if display_index >= len {
            return Err(NavError::IndexOutOfRange {
                index: display_index,
                len,
            });
        }
        self.select(host, display_index, Origin::Explicit);
        Ok(())
    }

    /// Select the list item at `offset` of the list text (a click in the pane).
    pub fn select_list_offset<H>(&mut self, host: &mut H, offset: usize) -> Option<usize>
    where
        H: NavigationHost + ?Sized,
    {
        let display = self.list.item_at_offset(offset)?;
        self.select(host, display, Origin::Explicit);
        Some(display)
    }

    /// Clear the selection and both highlights.
    pub fn select_nothing<H>(&mut self, host: &mut H)
    where
        H: NavigationHost + ?Sized,
    {
        self.pending = None;
        self.clear_highlights(host);
        if self.selected.take().is_some() {
            self.emit(NavigationEvent::SelectionChanged(None));
            self.update_controls();
        }
    }

    /// React to the caret moving to `caret` in the active editor.
    ///
    /// Selects the result on the caret's line (or nothing). Does nothing if that result is already
    /// selected, or while a jump is waiting for a buffer switch. Returns the selection.
    pub fn on_caret_moved<H>(&mut self, host: &mut H, caret: usize) -> Option<usize>
    where
        H: NavigationHost + ?Sized,
    {
        if self.pending.is_some() {
            log::trace!("caret event ignored while switching buffers");
            return self.selected;
        }

        let enclosing = host.active_file().and_then(|file| {
            let doc = host.document(&file)?;
            self.index.enclosing_display_index(doc, caret)
        });
        if enclosing == self.selected {
            return self.selected;
        }

        match enclosing {
            Some(display) => self.select(host, display, Origin::Caret),
            None => self.select_nothing(host),
        }
        self.selected
    }

    /// Select the next result (the first one if nothing is selected).
    pub fn next<H>(&mut self, host: &mut H) -> Result<usize, NavError>
    where
        H: NavigationHost + ?Sized,
    {
        let len = self.index.len();
        let target = self.selected.map_or(0, |current| current + 1);
        if target >= len {
            return Err(NavError::IndexOutOfRange { index: target, len });
        }
        self.select(host, target, Origin::Explicit);
        Ok(target)
    }

    /// Select the previous result.
    pub fn previous<H>(&mut self, host: &mut H) -> Result<usize, NavError>
    where
        H: NavigationHost + ?Sized,
    {
        let current = self.selected.ok_or(NavError::NothingSelected)?;
        let target = current.checked_sub(1).ok_or(NavError::AtFirstResult)?;
        self.select(host, target, Origin::Explicit);
        Ok(target)
    }

    /// Returns `true` if [`next`](Self::next) would succeed.
    pub fn can_step_forward(&self) -> bool {
        match self.selected {
            Some(current) => current + 1 < self.index.len(),
            None => !self.index.is_empty(),
        }
    }

    /// Returns `true` if [`previous`](Self::previous) would succeed.
    pub fn can_step_back(&self) -> bool {
        self.selected.is_some_and(|current| current > 0)
    }

    /// The host finished activating `file`. Applies a deferred jump into it.
    ///
    /// Returns `true` if a jump was applied.
    pub fn on_switch_completed<H>(&mut self, host: &mut H, file: &FileRef) -> bool
    where
        H: NavigationHost + ?Sized,
    {
        let Some(pending) = self.pending.take_if(|p| &p.file == file) else {
            return false;
        };
        if self.selected != Some(pending.display) {
            return false;
        }
        self.highlight_document(host, pending.display, file, true);
        true
    }

    /// The host could not activate `file`. The list selection stays; the document is untouched.
    pub fn on_switch_failed(&mut self, file: &FileRef, message: &str) {
        if self.pending.take_if(|p| &p.file == file).is_some() {
            log::warn!("cannot open {file}: {message}");
        }
    }

    /// Subscribe to navigation events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&NavigationEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Current control state.
    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Selected display index.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// File a deferred jump is waiting for.
    pub fn pending_switch(&self) -> Option<&FileRef> {
        self.pending.as_ref().map(|p| &p.file)
    }

    /// The result index.
    pub fn index(&self) -> &ResultIndex {
        &self.index
    }

    /// The results list pane.
    pub fn list(&self) -> &ResultListPane {
        &self.list
    }

    /// Mutable access to the results list pane (for painting).
    pub fn list_mut(&mut self) -> &mut ResultListPane {
        &mut self.list
    }

    fn select<H>(&mut self, host: &mut H, display: usize, origin: Origin)
    where
        H: NavigationHost + ?Sized,
    {
        self.pending = None;
        self.clear_highlights(host);
        self.selected = Some(display);

        if let Some(range) = self.list.highlight_item(display, self.styles.list_painter()) {
            host.scroll_list_to_visible(range);
        }

        let file = self.index.get(display).and_then(|r| r.file.clone());
        if let Some(file) = file {
            match origin {
                Origin::Caret => self.highlight_document(host, display, &file, false),
                Origin::Explicit if host.active_file().as_ref() == Some(&file) => {
                    self.highlight_document(host, display, &file, true);
                }
                Origin::Explicit => match host.request_switch(&file) {
                    Ok(()) => self.pending = Some(PendingJump { file, display }),
                    Err(err) => log::warn!("cannot jump to result {display}: {err}"),
                },
            }
        }

        self.emit(NavigationEvent::SelectionChanged(Some(display)));
        self.update_controls();
    }

    /// Highlight the result from its anchor to the next anchored result in the same file (or the
    /// end of the buffer), and optionally move the caret there.
    fn highlight_document<H>(&mut self, host: &mut H, display: usize, file: &FileRef, jump: bool)
    where
        H: NavigationHost + ?Sized,
    {
        let Some(located) = self.index.display_to_located(display) else {
            return;
        };
        if let Some(doc) = host.document(file) {
            self.index.anchor_document(doc);
        }
        let Some(start) = self.index.located_anchor(located).cloned() else {
            log::debug!("result {display} has no anchor in {file}");
            return;
        };
        let end = match self.index.next_anchor_in_file(located) {
            Some(next) => Some(next.clone()),
            None => host
                .document(file)
                .and_then(|doc| doc.create_anchor(doc.char_count()).ok()),
        };
        let range = start.offset()..end.as_ref().map_or(start.offset(), |e| e.offset());

        if let Some(end) = end {
            let painter = self.styles.painter(PainterCategory::Result);
            match host.highlighter(file).map(|engine| engine.add_region(start, end, painter)) {
                Some(Ok(handle)) => {
                    self.document_highlight = Some(DocumentHighlight {
                        file: file.clone(),
                        handle,
                    });
                }
                Some(Err(err)) => log::debug!("cannot highlight result {display}: {err}"),
                None => log::debug!("no highlighter for {file}"),
            }
        }

        if jump {
            host.set_caret(file, range.start);
            host.scroll_to_visible(file, range);
        }
    }

    fn clear_highlights<H>(&mut self, host: &mut H)
    where
        H: NavigationHost + ?Sized,
    {
        self.list.clear_highlight();
        if let Some(highlight) = self.document_highlight.take()
            && let Some(engine) = host.highlighter(&highlight.file)
        {
            engine.remove_region(highlight.handle);
        }
    }

    fn compute_controls(&self) -> ControlState {
        ControlState {
            next_enabled: self.can_step_forward(),
            previous_enabled: self.can_step_back(),
            header: self.index.header_text(&self.labels),
        }
    }

    fn update_controls(&mut self) {
        let controls = self.compute_controls();
        if controls != self.controls {
            self.controls = controls.clone();
            self.emit(NavigationEvent::ControlsChanged(controls));
        }
    }

    fn emit(&mut self, event: NavigationEvent) {
        for callback in &mut self.subscribers {
            callback(&event);
        }
    }
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("results", &self.index.len())
            .field("selected", &self.selected)
            .field("pending", &self.pending)
            .field("controls", &self.controls)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
