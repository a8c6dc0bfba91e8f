#![warn(missing_docs)]
//! Jumpline Core - headless result navigation for text editors
//!
//! # Overview
//!
//! `jumpline-core` connects *derived results* (compiler errors, test failures, search matches) to
//! live, mutating source text. It does not render anything; hosts plug in their view through a
//! few small traits and receive paint calls, repaint batches and caret/scroll requests.
//!
//! # Core Features
//!
//! - **Stable anchors**: positions that follow edits ([`Anchor`], [`TextBuffer`])
//! - **Result index**: located/unlocated partitioning, position ordering and one anchor per
//!   located result, built with a single walk over each file ([`ResultIndex`])
//! - **Layered highlights**: category-grouped regions painted back to front so selection is
//!   always on top ([`HighlightLayerEngine`])
//! - **Coalesced repaint**: damage merged into one UI-thread task per displayed buffer
//!   ([`RepaintScheduler`])
//! - **Navigation**: caret/list/document selection sync with next/previous stepping
//!   ([`NavigationController`])
//! - **Find/replace**: wrap-around search over one or many buffers with snapshot/restore bulk
//!   operations ([`SearchCursor`])
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  NavigationController / SearchCursor        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  ResultListPane                             │  ← Results list
//! ├─────────────────────────────────────────────┤
//! │  HighlightLayerEngine + RepaintScheduler    │  ← Highlights
//! ├─────────────────────────────────────────────┤
//! │  ResultIndex                                │  ← Result ordering
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer / Anchor (Rope-based)           │  ← Text + anchors
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use jumpline_core::{DerivedResult, DocumentSet, FileRef, ResultIndex};
//!
//! let mut docs = DocumentSet::new();
//! let file = FileRef::new("Main.java");
//! let id = docs
//!     .open(Some(file.clone()), "class Main {\n  int x = ;\n}\n")
//!     .unwrap();
//!
//! let index = ResultIndex::build(
//!     vec![DerivedResult::error("illegal start of expression")
//!         .in_file(file)
//!         .at(1, 10)],
//!     &docs,
//! );
//! let anchor = index.anchor(0).unwrap().clone();
//! assert_eq!(anchor.offset(), 23);
//!
//! // Edits before the result move its anchor.
//! docs.buffer_mut(id).unwrap().insert(0, "// header\n").unwrap();
//! assert_eq!(anchor.offset(), 33);
//!
//! // A caret on the same line finds the result again.
//! let buffer = docs.buffer(id).unwrap();
//! assert_eq!(index.find_enclosing(buffer, 30), Some(0));
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Text buffers, anchors and the buffer traits the core consumes
//! - [`delta`] - Edit records and anchor shifting
//! - [`workspace`] - Open buffers and the active buffer
//! - [`result`] - Derived results and header labels
//! - [`result_index`] - Result ordering, anchoring and caret lookup
//! - [`highlight`] - Layered highlight regions
//! - [`geometry`] - Cell-grid geometry and a recording paint surface
//! - [`repaint`] - Coalesced, UI-thread repaint scheduling
//! - [`result_list`] - Rendered results list
//! - [`navigation`] - Selection state machine
//! - [`search`] - Query compilation and match scanning
//! - [`find_replace`] - Find/replace cursor
//! - [`style`] - Highlight colors
//! - [`config`] - TOML preferences
//! - [`error`] - Error types
//!
//! # Threading
//!
//! Highlight engines, the navigation controller and search cursors are UI-thread objects. Worker
//! threads only touch the [`RepaintScheduler`], which is `Clone + Send + Sync` and marshals
//! repaints onto the UI thread through a [`UiExecutor`].
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade; the crate never installs a logger.

pub mod buffer;
pub mod config;
pub mod delta;
pub mod error;
pub mod find_replace;
pub mod geometry;
pub mod highlight;
pub mod navigation;
pub mod repaint;
pub mod result;
pub mod result_index;
pub mod result_list;
pub mod search;
pub mod style;
pub mod workspace;

pub use buffer::{Anchor, AnchoredText, BufferId, DocumentSource, FileRef, TextBuffer};
pub use config::{ColorConfig, IndexConfig, NavConfig, SearchConfig, StyleEntry};
pub use delta::{TextDelta, TextDeltaEdit};
pub use error::{BufferError, ConfigError, HighlightError, NavError, PaintError, WorkspaceError};
pub use find_replace::{
    ActiveMatchHighlight, Direction, FindFlags, FindResult, FoundMatch, SearchCursor,
    SearchCursorState,
};
pub use geometry::{CellCanvas, CellGeometry, PaintOp, Rect};
pub use highlight::{
    HighlightLayerEngine, HighlightRegion, PaintSurface, Painter, PainterCategory, RegionHandle,
};
pub use navigation::{
    ControlState, NavigationCallback, NavigationController, NavigationEvent, NavigationHost,
};
pub use repaint::{Damage, ManualExecutor, RepaintScheduler, RepaintTarget, UiExecutor, UiTask};
pub use result::{DerivedResult, ResultLabels, Severity};
pub use result_index::{IndexOptions, LinePolicy, ResultIndex};
pub use result_list::ResultListPane;
pub use search::{Haystack, SearchError, SearchMatch, SearchOptions, SearchQuery};
pub use style::{HighlightStyle, Rgba, StyleRegistry, StyleSheet};
pub use workspace::DocumentSet;
