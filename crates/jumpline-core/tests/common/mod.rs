#![allow(dead_code)]

use jumpline_core::{
    AnchoredText, BufferId, DocumentSet, DocumentSource, FileRef, HighlightLayerEngine, NavError,
    NavigationHost,
};
use std::collections::HashMap;
use std::ops::Range;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A headless editor: open buffers, one highlight engine per buffer, and a log of every view
/// request the navigation controller makes.
#[derive(Default)]
pub struct Editor {
    pub docs: DocumentSet,
    pub engines: HashMap<BufferId, HighlightLayerEngine>,
    pub unopenable: Vec<FileRef>,
    pub switch_requests: Vec<FileRef>,
    pub carets: Vec<(FileRef, usize)>,
    pub scrolls: Vec<(FileRef, Range<usize>)>,
    pub list_scrolls: Vec<Range<usize>>,
}

impl Editor {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    pub fn open(&mut self, path: &str, text: &str) -> BufferId {
        let id = self.docs.open(Some(FileRef::new(path)), text).unwrap();
        self.engines.insert(id, HighlightLayerEngine::new(id));
        id
    }

    pub fn activate(&mut self, path: &str) {
        let id = self.docs.buffer_for_file(&FileRef::new(path)).unwrap();
        self.docs.set_active(id).unwrap();
    }

    pub fn engine(&self, path: &str) -> &HighlightLayerEngine {
        let id = self.docs.buffer_for_file(&FileRef::new(path)).unwrap();
        &self.engines[&id]
    }
}

impl DocumentSource for Editor {
    fn document(&self, file: &FileRef) -> Option<&dyn AnchoredText> {
        self.docs.document(file)
    }
}

impl NavigationHost for Editor {
    fn active_file(&self) -> Option<FileRef> {
        self.docs.active_buffer()?.file().cloned()
    }

    fn highlighter(&mut self, file: &FileRef) -> Option<&mut HighlightLayerEngine> {
        let id = self.docs.buffer_for_file(file)?;
        self.engines.get_mut(&id)
    }

    fn request_switch(&mut self, file: &FileRef) -> Result<(), NavError> {
        if self.unopenable.contains(file) {
            return Err(NavError::FileOpen {
                file: file.clone(),
                message: "permission denied".to_string(),
            });
        }
        self.switch_requests.push(file.clone());
        Ok(())
    }

    fn set_caret(&mut self, file: &FileRef, offset: usize) {
        self.carets.push((file.clone(), offset));
    }

    fn scroll_to_visible(&mut self, file: &FileRef, range: Range<usize>) {
        self.scrolls.push((file.clone(), range));
    }

    fn scroll_list_to_visible(&mut self, range: Range<usize>) {
        self.list_scrolls.push(range);
    }
}
