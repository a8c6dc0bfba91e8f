//! Text buffers and stable anchors.
//!
//! The navigation core never edits text; it only reads buffer contents and creates [`Anchor`]s.
//! Those two capabilities are described by the [`AnchoredText`] trait so hosts can plug in their
//! own document model. [`TextBuffer`] is the rope-backed implementation used by the rest of the
//! crate and by headless hosts.
//!
//! # Anchor semantics
//!
//! An anchor is bound to a character offset and shifts as the buffer is edited:
//!
//! - an edit starting at or before the anchor moves it by the net length change;
//! - a deletion covering the anchor collapses it to the start of the deleted span;
//! - an edit starting after the anchor leaves it unchanged.
//!
//! Anchors are shared handles: cloning an anchor yields another handle to the same position.
//! The buffer keeps weak references only, so dropping every handle releases the anchor.

use crate::delta::{TextDelta, TextDeltaEdit, map_offset};
use crate::error::BufferError;
use ropey::Rope;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Buffer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Create a buffer id from a raw numeric identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A reference to a source file, as reported by result producers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRef(Arc<Path>);

impl FileRef {
    /// Create a file reference from a path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    /// The referenced path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` if the file stem ends with `suffix` (e.g. `FooTest.java` for `"Test"`).
    pub fn is_test_case(&self, suffix: &str) -> bool {
        if suffix.is_empty() {
            return false;
        }
        self.0
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.len() > suffix.len() && stem.ends_with(suffix))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug)]
struct AnchorCell {
    offset: AtomicUsize,
}

/// A position in a buffer that follows edits.
#[derive(Clone)]
pub struct Anchor {
    cell: Arc<AnchorCell>,
    buffer: BufferId,
}

impl Anchor {
    /// Current character offset of the anchor.
    pub fn offset(&self) -> usize {
        self.cell.offset.load(Ordering::Acquire)
    }

    /// The buffer this anchor was created in.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Returns `true` if both handles refer to the same anchor.
    pub fn same_anchor(&self, other: &Anchor) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("buffer", &self.buffer)
            .field("offset", &self.offset())
            .finish()
    }
}

/// The buffer capabilities the navigation core consumes.
pub trait AnchoredText {
    /// Buffer identity.
    fn id(&self) -> BufferId;

    /// The file this buffer was loaded from, if any.
    fn file(&self) -> Option<&FileRef>;

    /// Full current text.
    fn text(&self) -> Result<String, BufferError>;

    /// Length of the buffer in characters.
    fn char_count(&self) -> usize;

    /// Create an anchor at `offset` (`0..=char_count()`).
    fn create_anchor(&self, offset: usize) -> Result<Anchor, BufferError>;
}

/// Resolves the open buffer for a file.
pub trait DocumentSource {
    /// The open buffer for `file`, if any.
    fn document(&self, file: &FileRef) -> Option<&dyn AnchoredText>;
}

/// A rope-backed text buffer that owns its anchors.
pub struct TextBuffer {
    id: BufferId,
    file: Option<FileRef>,
    rope: Rope,
    anchors: Mutex<Vec<Weak<AnchorCell>>>,
    version: u64,
}

impl TextBuffer {
    /// Create a buffer with the given identity and contents.
    pub fn new(id: BufferId, file: Option<FileRef>, text: &str) -> Self {
        Self {
            id,
            file,
            rope: Rope::from_str(text),
            anchors: Mutex::new(Vec::new()),
            version: 0,
        }
    }

    /// Number of edits applied since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Line count (N newlines => N+1 lines). Only `\n` ends a line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Character offset of the first character of `line`.
    pub fn line_to_char(&self, line: usize) -> Option<usize> {
        (line < self.rope.len_lines()).then(|| self.rope.line_to_char(line))
    }

    /// Line containing `offset` (clamped to the end of the buffer).
    pub fn char_to_line(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Text of `line` without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Text in `range` (character offsets).
    pub fn slice(&self, range: Range<usize>) -> Result<String, BufferError> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).to_string())
    }

    /// Returns `true` if the buffer's file is a test case (see [`FileRef::is_test_case`]).
    pub fn is_test_case(&self, suffix: &str) -> bool {
        self.file.as_ref().is_some_and(|f| f.is_test_case(suffix))
    }

    /// Number of anchors still referenced by at least one handle.
    pub fn live_anchor_count(&self) -> usize {
        self.lock_anchors()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<TextDelta, BufferError> {
        self.replace(offset..offset, text)
    }

    /// Delete `len` characters starting at `start`.
    pub fn delete(&mut self, start: usize, len: usize) -> Result<TextDelta, BufferError> {
        self.replace(start..start.saturating_add(len), "")
    }

    /// Replace the characters in `range` with `text`, shifting every live anchor.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<TextDelta, BufferError> {
        self.check_range(&range)?;
        let before_char_count = self.rope.len_chars();

        let deleted_text = self.rope.slice(range.clone()).to_string();
        if !range.is_empty() {
            self.rope.remove(range.clone());
        }
        if !text.is_empty() {
            self.rope.insert(range.start, text);
        }

        let edit = TextDeltaEdit {
            start: range.start,
            deleted_text,
            inserted_text: text.to_string(),
        };
        self.shift_anchors(&edit);
        self.version = self.version.saturating_add(1);

        Ok(TextDelta {
            before_char_count,
            after_char_count: self.rope.len_chars(),
            edits: vec![edit],
        })
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), BufferError> {
        let len = self.rope.len_chars();
        if range.start > range.end || range.end > len {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(())
    }

    fn shift_anchors(&self, edit: &TextDeltaEdit) {
        let mut anchors = self.lock_anchors();
        anchors.retain(|weak| match weak.upgrade() {
            Some(cell) => {
                let offset = cell.offset.load(Ordering::Acquire);
                cell.offset
                    .store(map_offset(offset, edit), Ordering::Release);
                true
            }
            None => false,
        });
    }

    fn lock_anchors(&self) -> std::sync::MutexGuard<'_, Vec<Weak<AnchorCell>>> {
        self.anchors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnchoredText for TextBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    fn text(&self) -> Result<String, BufferError> {
        Ok(self.rope.to_string())
    }

    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn create_anchor(&self, offset: usize) -> Result<Anchor, BufferError> {
        let len = self.rope.len_chars();
        if offset > len {
            return Err(BufferError::OffsetOutOfBounds { offset, len });
        }

        let cell = Arc::new(AnchorCell {
            offset: AtomicUsize::new(offset),
        });
        self.lock_anchors().push(Arc::downgrade(&cell));
        Ok(Anchor {
            cell,
            buffer: self.id,
        })
    }
}

impl DocumentSource for TextBuffer {
    fn document(&self, file: &FileRef) -> Option<&dyn AnchoredText> {
        (self.file.as_ref() == Some(file)).then_some(self as &dyn AnchoredText)
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("id", &self.id)
            .field("file", &self.file)
            .field("char_count", &self.rope.len_chars())
            .field("version", &self.version)
            .finish()
    }
}

/// Returns `true` if `text` contains a `'\n'` between the two character offsets (in any order).
pub(crate) fn has_newline_between(text: &str, a: usize, b: usize) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    text.chars().skip(lo).take(hi - lo).any(|ch| ch == '\n')
}
