//! A collection of open buffers.
//!
//! [`DocumentSet`] owns every open [`TextBuffer`] in open order, maps files to buffers and tracks
//! which buffer is active. It is the [`DocumentSource`] used to anchor results and the scope that
//! [`SearchCursor`](crate::SearchCursor) searches when "all documents" is enabled.

use crate::buffer::{AnchoredText, BufferId, DocumentSource, FileRef, TextBuffer};
use crate::error::WorkspaceError;
use std::collections::{BTreeMap, HashMap};

/// Open buffers, in open order.
#[derive(Default)]
pub struct DocumentSet {
    next_buffer_id: u64,
    buffers: BTreeMap<BufferId, TextBuffer>,
    order: Vec<BufferId>,
    file_to_buffer: HashMap<FileRef, BufferId>,
    active: Option<BufferId>,
}

impl std::fmt::Debug for DocumentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSet")
            .field("buffer_count", &self.buffers.len())
            .field("file_count", &self.file_to_buffer.len())
            .field("active", &self.active)
            .finish()
    }
}

impl DocumentSet {
    /// Create an empty document set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if no buffers are open.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Reserve a fresh buffer id that no open buffer uses (e.g. for a results list pane).
    pub fn allocate_id(&mut self) -> BufferId {
        self.next_buffer_id = self.next_buffer_id.saturating_add(1);
        BufferId::new(self.next_buffer_id)
    }

    /// Open a buffer. The first opened buffer becomes active.
    pub fn open(&mut self, file: Option<FileRef>, text: &str) -> Result<BufferId, WorkspaceError> {
        if let Some(file) = &file
            && self.file_to_buffer.contains_key(file)
        {
            return Err(WorkspaceError::FileAlreadyOpen(file.clone()));
        }

        let id = self.allocate_id();
        if let Some(file) = &file {
            self.file_to_buffer.insert(file.clone(), id);
        }
        self.buffers.insert(id, TextBuffer::new(id, file, text));
        self.order.push(id);
        if self.active.is_none() {
            self.active = Some(id);
        }
        Ok(id)
    }

    /// Close a buffer. If it was active, the next buffer in open order (if any) becomes active.
    pub fn close(&mut self, id: BufferId) -> Result<(), WorkspaceError> {
        let Some(buffer) = self.buffers.remove(&id) else {
            return Err(WorkspaceError::BufferNotFound(id));
        };
        if let Some(file) = buffer.file() {
            self.file_to_buffer.remove(file);
        }

        let position = self.order.iter().position(|b| *b == id);
        self.order.retain(|b| *b != id);
        if self.active == Some(id) {
            self.active = position
                .and_then(|p| self.order.get(p).or_else(|| self.order.last()))
                .copied();
        }
        Ok(())
    }

    /// Get a buffer.
    pub fn buffer(&self, id: BufferId) -> Option<&TextBuffer> {
        self.buffers.get(&id)
    }

    /// Get a buffer mutably (for edits).
    pub fn buffer_mut(&mut self, id: BufferId) -> Option<&mut TextBuffer> {
        self.buffers.get_mut(&id)
    }

    /// The buffer opened for `file`.
    pub fn buffer_for_file(&self, file: &FileRef) -> Option<BufferId> {
        self.file_to_buffer.get(file).copied()
    }

    /// Buffer ids in open order.
    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.order.iter().copied()
    }

    /// The active buffer id.
    pub fn active(&self) -> Option<BufferId> {
        self.active
    }

    /// The active buffer.
    pub fn active_buffer(&self) -> Option<&TextBuffer> {
        self.active.and_then(|id| self.buffers.get(&id))
    }

    /// Make `id` the active buffer.
    pub fn set_active(&mut self, id: BufferId) -> Result<(), WorkspaceError> {
        if !self.buffers.contains_key(&id) {
            return Err(WorkspaceError::BufferNotFound(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Buffers after `id` in open order, wrapping around, excluding `id` itself.
    pub fn ids_after(&self, id: BufferId) -> Vec<BufferId> {
        let Some(position) = self.order.iter().position(|b| *b == id) else {
            return self.order.clone();
        };
        self.order[position + 1..]
            .iter()
            .chain(self.order[..position].iter())
            .copied()
            .collect()
    }

    /// Buffers before `id` in reverse open order, wrapping around, excluding `id` itself.
    pub fn ids_before(&self, id: BufferId) -> Vec<BufferId> {
        let mut ids = self.ids_after(id);
        ids.reverse();
        ids
    }
}

impl DocumentSource for DocumentSet {
    fn document(&self, file: &FileRef) -> Option<&dyn AnchoredText> {
        let id = self.file_to_buffer.get(file)?;
        self.buffers.get(id).map(|b| b as &dyn AnchoredText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close_tracks_active_buffer() {
        let mut docs = DocumentSet::new();
        let a = docs.open(Some(FileRef::new("A.java")), "a").unwrap();
        let b = docs.open(Some(FileRef::new("B.java")), "b").unwrap();
        let c = docs.open(None, "c").unwrap();
        assert_eq!(docs.active(), Some(a));

        docs.set_active(b).unwrap();
        docs.close(b).unwrap();
        assert_eq!(docs.active(), Some(c));
        assert_eq!(docs.ids().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(docs.buffer_for_file(&FileRef::new("B.java")), None);
    }

    #[test]
    fn test_duplicate_file_is_rejected() {
        let mut docs = DocumentSet::new();
        docs.open(Some(FileRef::new("A.java")), "a").unwrap();
        assert_eq!(
            docs.open(Some(FileRef::new("A.java")), "again"),
            Err(WorkspaceError::FileAlreadyOpen(FileRef::new("A.java")))
        );
    }

    #[test]
    fn test_cyclic_order_helpers() {
        let mut docs = DocumentSet::new();
        let a = docs.open(None, "").unwrap();
        let b = docs.open(None, "").unwrap();
        let c = docs.open(None, "").unwrap();

        assert_eq!(docs.ids_after(b), vec![c, a]);
        assert_eq!(docs.ids_before(b), vec![a, c]);
        assert_eq!(docs.ids_after(c), vec![a, b]);
    }

    #[test]
    fn test_document_source_resolves_files() {
        let mut docs = DocumentSet::new();
        let id = docs.open(Some(FileRef::new("A.java")), "text").unwrap();
        let doc = docs.document(&FileRef::new("A.java")).unwrap();
        assert_eq!(doc.id(), id);
        assert!(docs.document(&FileRef::new("Missing.java")).is_none());
    }
}
