//! Error types shared across the crate.
//!
//! Most failure paths in this crate are recovered locally (a region is not painted, a lookup
//! falls back to "no selection"). The types here cover contract violations that the caller is
//! expected to handle.

use crate::buffer::{BufferId, FileRef};
use thiserror::Error;

/// Errors produced by text buffers and anchor creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// An offset lies outside the buffer.
    #[error("offset {offset} is out of bounds (buffer length {len})")]
    OffsetOutOfBounds {
        /// Requested character offset.
        offset: usize,
        /// Buffer length in characters.
        len: usize,
    },

    /// A range is inverted or extends past the end of the buffer.
    #[error("invalid range {start}..{end} (buffer length {len})")]
    InvalidRange {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
        /// Buffer length in characters.
        len: usize,
    },

    /// The buffer contents could not be read.
    #[error("buffer {0:?} is unreadable: {1}")]
    Unreadable(BufferId, String),
}

/// Errors returned when a highlight cannot be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// The requested offsets could not be anchored in the buffer.
    #[error("bad highlight location: {0}")]
    BadLocation(#[from] BufferError),

    /// The anchors belong to a different buffer than the engine.
    #[error("anchor belongs to buffer {anchor:?}, engine paints buffer {engine:?}")]
    ForeignAnchor {
        /// Buffer the anchor was created in.
        anchor: BufferId,
        /// Buffer the engine is bound to.
        engine: BufferId,
    },

    /// A single-instance highlight is still shown in another buffer and must be cleared there.
    #[error("highlight is still shown in buffer {0:?}")]
    ShownElsewhere(BufferId),
}

/// A rendering surface failed to map offsets to the view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaintError {
    /// The offsets are not (or no longer) mappable to view coordinates.
    #[error("cannot map offsets {start}..{end} to view coordinates")]
    Unmappable {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
}

/// Errors from the document collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// A buffer for this file is already open.
    #[error("file already open: {0}")]
    FileAlreadyOpen(FileRef),

    /// A buffer id was not found.
    #[error("buffer not found: {0:?}")]
    BufferNotFound(BufferId),
}

/// Errors returned by the navigation controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// A display index was outside `0..len`.
    #[error("result index {index} out of range (have {len} results)")]
    IndexOutOfRange {
        /// Requested display index.
        index: usize,
        /// Number of results in the index.
        len: usize,
    },

    /// Stepping backward requires a current selection.
    #[error("no result is selected")]
    NothingSelected,

    /// The first result is selected; there is nothing before it.
    #[error("already at the first result")]
    AtFirstResult,

    /// The host could not open or activate the file a result lives in.
    #[error("cannot open {file}: {message}")]
    FileOpen {
        /// File that failed to open.
        file: FileRef,
        /// Host-provided reason.
        message: String,
    },

    /// A document collection operation failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid TOML (or has the wrong shape).
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A color value is not a `#rrggbb` / `#rrggbbaa` hex string.
    #[error("invalid color '{0}'")]
    InvalidColor(String),
}
