//! Find/replace cursor over one or many buffers.
//!
//! A [`SearchCursor`] holds its whole observable state in a plain [`SearchCursorState`] value:
//! position, direction, flags and the find/replace terms. Bulk operations
//! ([`process_all`](SearchCursor::process_all), [`replace_all`](SearchCursor::replace_all)) snapshot
//! that value before running and restore it afterwards, except for the find/replace terms, which
//! keep pointing at the bulk operation's terms.
//!
//! # Wrapping
//!
//! `find_next`/`find_previous` search from the cursor to the end (start) of the current buffer,
//! then, in all-documents mode, through the other buffers in open order, and finally from the
//! other end of the starting buffer back to the cursor. [`FindResult::wrapped`] reports that last
//! step; [`FindResult::all_documents_wrapped`] additionally reports that every other buffer was
//! searched first.

use crate::buffer::{AnchoredText, BufferId, FileRef, TextBuffer};
use crate::error::HighlightError;
use crate::highlight::{HighlightLayerEngine, Painter, RegionHandle};
use crate::result::DerivedResult;
use crate::search::{Haystack, SearchError, SearchMatch, SearchOptions, SearchQuery};
use crate::workspace::DocumentSet;
use std::ops::Range;

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Toward the end of the buffer.
    #[default]
    Forward,
    /// Toward the start of the buffer.
    Backward,
}

/// Find/replace option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindFlags {
    /// Case-sensitive matching.
    pub match_case: bool,
    /// Whole-word matching.
    pub whole_word: bool,
    /// Treat the find term as a regex.
    pub regex: bool,
    /// Continue into the other open buffers.
    pub all_documents: bool,
    /// Restrict searching to [`SearchCursorState::selection`].
    pub selection_only: bool,
    /// Skip matches inside comments and string literals.
    pub ignore_comments_and_strings: bool,
    /// Skip test-case buffers in all-documents mode.
    pub ignore_test_cases: bool,
}

impl Default for FindFlags {
    fn default() -> Self {
        Self {
            match_case: true,
            whole_word: false,
            regex: false,
            all_documents: false,
            selection_only: false,
            ignore_comments_and_strings: false,
            ignore_test_cases: false,
        }
    }
}

impl FindFlags {
    /// Options for compiling the find term.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.match_case,
            whole_word: self.whole_word,
            regex: self.regex,
        }
    }
}

/// Everything a [`SearchCursor`] remembers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursorState {
    /// Buffer the cursor is in (`None` = the active buffer).
    pub buffer: Option<BufferId>,
    /// Cursor offset in characters.
    pub offset: usize,
    /// Direction of the last search.
    pub direction: Direction,
    /// Option flags.
    pub flags: FindFlags,
    /// Find term.
    pub find_term: String,
    /// Replacement term.
    pub replace_term: String,
    /// Region searched when [`FindFlags::selection_only`] is set.
    pub selection: Option<Range<usize>>,
    /// The match found by the last search, if it is still current.
    pub last_match: Option<SearchMatch>,
    /// File-stem suffix that marks a test case.
    pub test_case_suffix: String,
}

impl Default for SearchCursorState {
    fn default() -> Self {
        Self {
            buffer: None,
            offset: 0,
            direction: Direction::Forward,
            flags: FindFlags::default(),
            find_term: String::new(),
            replace_term: String::new(),
            selection: None,
            last_match: None,
            test_case_suffix: "Test".to_string(),
        }
    }
}

/// Outcome of a single find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindResult {
    /// Buffer of the match.
    pub buffer: Option<BufferId>,
    /// The match, if any.
    pub found: Option<SearchMatch>,
    /// The search passed the starting offset of the starting buffer.
    pub wrapped: bool,
    /// All-documents mode only: the search went through every other buffer and came back to the
    /// starting buffer.
    pub all_documents_wrapped: bool,
}

impl FindResult {
    fn not_found(buffer: Option<BufferId>) -> Self {
        Self {
            buffer,
            found: None,
            wrapped: false,
            all_documents_wrapped: false,
        }
    }
}

/// A match reported by [`SearchCursor::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMatch {
    /// Buffer of the match.
    pub buffer: BufferId,
    /// File of the buffer, if any.
    pub file: Option<FileRef>,
    /// Match range.
    pub range: SearchMatch,
    /// Zero-based line of the match start.
    pub line: usize,
    /// Zero-based column of the match start.
    pub column: usize,
    /// Text of the line containing the match.
    pub line_text: String,
}

impl FoundMatch {
    /// The match as an informational result for the results list.
    pub fn to_result(&self) -> DerivedResult {
        let result = DerivedResult::info(self.line_text.trim());
        match &self.file {
            Some(file) => result
                .in_file(file.clone())
                .at(self.line as i64, self.column as i64),
            None => result,
        }
    }
}

/// Saveable/restorable find/replace cursor.
#[derive(Debug, Clone, Default)]
pub struct SearchCursor {
    state: SearchCursorState,
}

impl SearchCursor {
    /// A cursor with default flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor with the given flags.
    pub fn with_flags(flags: FindFlags) -> Self {
        Self {
            state: SearchCursorState {
                flags,
                ..SearchCursorState::default()
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> &SearchCursorState {
        &self.state
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SearchCursorState {
        self.state.clone()
    }

    /// Replace the current state.
    pub fn restore(&mut self, state: SearchCursorState) {
        self.state = state;
    }

    /// Set the find term.
    pub fn set_find_term(&mut self, term: impl Into<String>) {
        self.state.find_term = term.into();
        self.state.last_match = None;
    }

    /// Set the replacement term.
    pub fn set_replace_term(&mut self, term: impl Into<String>) {
        self.state.replace_term = term.into();
    }

    /// Set the option flags.
    pub fn set_flags(&mut self, flags: FindFlags) {
        self.state.flags = flags;
        self.state.last_match = None;
    }

    /// Set the test-case file-stem suffix.
    pub fn set_test_case_suffix(&mut self, suffix: impl Into<String>) {
        self.state.test_case_suffix = suffix.into();
    }

    /// Set the region searched in selection-only mode.
    pub fn set_selection(&mut self, selection: Option<Range<usize>>) {
        self.state.selection = selection;
    }

    /// Move the cursor (e.g. to the caret).
    pub fn set_position(&mut self, buffer: BufferId, offset: usize) {
        self.state.buffer = Some(buffer);
        self.state.offset = offset;
        self.state.last_match = None;
    }

    /// Find the next match.
    pub fn find_next(&mut self, docs: &DocumentSet) -> Result<FindResult, SearchError> {
        self.find(docs, Direction::Forward)
    }

    /// Find the previous match.
    pub fn find_previous(&mut self, docs: &DocumentSet) -> Result<FindResult, SearchError> {
        self.find(docs, Direction::Backward)
    }

    /// Replace the current match.
    ///
    /// Returns `Ok(false)` if there is no current match or the text at the cursor no longer
    /// matches the find term (e.g. it was edited since the find).
    pub fn replace_current(&mut self, docs: &mut DocumentSet) -> Result<bool, SearchError> {
        let (Some(id), Some(current)) = (self.state.buffer, self.state.last_match) else {
            return Ok(false);
        };
        let query = self.query()?;
        let Some(buffer) = docs.buffer_mut(id) else {
            return Ok(false);
        };

        let text = buffer.text()?;
        let hay = self.haystack(&text);
        if !query.is_match_exact(&hay, current) {
            log::debug!("stale match {current:?} in {id:?}; not replaced");
            return Ok(false);
        }
        let replacement = query.expand_replacement(&hay, current, &self.state.replace_term);
        buffer.replace(current.range(), &replacement)?;

        self.state.offset = match self.state.direction {
            Direction::Forward => current.start + replacement.chars().count(),
            Direction::Backward => current.start,
        };
        self.state.last_match = None;
        Ok(true)
    }

    /// Replace the current match (if still valid), then find the next one.
    pub fn replace_and_find_next(
        &mut self,
        docs: &mut DocumentSet,
    ) -> Result<FindResult, SearchError> {
        self.state.direction = Direction::Forward;
        self.replace_current(docs)?;
        self.find_next(docs)
    }

    /// Replace the current match (if still valid), then find the previous one.
    pub fn replace_and_find_previous(
        &mut self,
        docs: &mut DocumentSet,
    ) -> Result<FindResult, SearchError> {
        self.state.direction = Direction::Backward;
        self.replace_current(docs)?;
        self.find_previous(docs)
    }

    /// Visit every non-overlapping match inside `region` of the current buffer, or (with no
    /// region) every match in the searched buffers. Returns the number of matches visited.
    ///
    /// The cursor state is left as it was.
    pub fn process_all<F>(
        &mut self,
        docs: &DocumentSet,
        region: Option<Range<usize>>,
        mut visitor: F,
    ) -> Result<usize, SearchError>
    where
        F: FnMut(&TextBuffer, SearchMatch),
    {
        let saved = self.snapshot();
        let result = self.collect_matches(docs, region);
        self.restore(saved);

        let mut visited = 0;
        for (id, matches) in result? {
            let Some(buffer) = docs.buffer(id) else { continue };
            for m in matches {
                visitor(buffer, m);
                visited += 1;
            }
        }
        Ok(visited)
    }

    /// Find every match of `term`. The cursor keeps `term` as its find term.
    pub fn find_all(
        &mut self,
        docs: &DocumentSet,
        term: &str,
        region: Option<Range<usize>>,
    ) -> Result<Vec<FoundMatch>, SearchError> {
        self.set_find_term(term);
        let mut found = Vec::new();
        self.process_all(docs, region, |buffer, m| {
            let line = buffer.char_to_line(m.start);
            let line_start = buffer.line_to_char(line).unwrap_or(0);
            found.push(FoundMatch {
                buffer: buffer.id(),
                file: buffer.file().cloned(),
                range: m,
                line,
                column: m.start - line_start,
                line_text: buffer.line_text(line).unwrap_or_default(),
            });
        })?;
        log::debug!("find all '{term}': {} match(es)", found.len());
        Ok(found)
    }

    /// Count the matches of the current find term.
    pub fn count_all(
        &mut self,
        docs: &DocumentSet,
        region: Option<Range<usize>>,
    ) -> Result<usize, SearchError> {
        self.process_all(docs, region, |_, _| {})
    }

    /// Replace every match of `find` with `replace`. Returns the number of replacements.
    ///
    /// The cursor position is restored afterwards; the find/replace terms stay set to `find` and
    /// `replace`.
    pub fn replace_all(
        &mut self,
        docs: &mut DocumentSet,
        find: &str,
        replace: &str,
        region: Option<Range<usize>>,
    ) -> Result<usize, SearchError> {
        let mut saved = self.snapshot();
        self.state.find_term = find.to_string();
        self.state.replace_term = replace.to_string();
        saved.find_term = self.state.find_term.clone();
        saved.replace_term = self.state.replace_term.clone();
        saved.last_match = None;

        let result = self.replace_collected(docs, region);
        self.restore(saved);
        let replaced = result?;
        log::debug!("replaced {replaced} occurrence(s) of '{find}'");
        Ok(replaced)
    }

    fn replace_collected(
        &self,
        docs: &mut DocumentSet,
        region: Option<Range<usize>>,
    ) -> Result<usize, SearchError> {
        let query = self.query()?;
        let collected = self.collect_matches(docs, region)?;

        let mut replaced = 0;
        for (id, matches) in collected {
            let Some(buffer) = docs.buffer_mut(id) else { continue };
            let text = buffer.text()?;
            let hay = self.haystack(&text);
            // Back to front so earlier offsets stay valid.
            for m in matches.iter().rev() {
                let replacement = query.expand_replacement(&hay, *m, &self.state.replace_term);
                buffer.replace(m.range(), &replacement)?;
                replaced += 1;
            }
        }
        Ok(replaced)
    }

    fn collect_matches(
        &self,
        docs: &DocumentSet,
        region: Option<Range<usize>>,
    ) -> Result<Vec<(BufferId, Vec<SearchMatch>)>, SearchError> {
        let query = self.query()?;
        let region = region.or_else(|| self.selection_scope());

        let ids: Vec<BufferId> = match (&region, self.origin(docs)) {
            (Some(_), Some(origin)) => vec![origin],
            (Some(_), None) => Vec::new(),
            (None, origin) if self.state.flags.all_documents => docs
                .ids()
                .filter(|id| Some(*id) == origin || !self.skips(docs, *id))
                .collect(),
            (None, origin) => origin.into_iter().collect(),
        };

        let mut collected = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(buffer) = docs.buffer(id) else { continue };
            let text = buffer.text()?;
            let hay = self.haystack(&text);
            let matches = match &region {
                Some(region) => query.find_in(&hay, region.clone()),
                None => query.find_all(&hay),
            };
            if !matches.is_empty() {
                collected.push((id, matches));
            }
        }
        Ok(collected)
    }

    fn find(
        &mut self,
        docs: &DocumentSet,
        direction: Direction,
    ) -> Result<FindResult, SearchError> {
        let query = self.query()?;
        self.state.direction = direction;
        let Some(origin) = self.origin(docs) else {
            return Ok(FindResult::not_found(None));
        };
        // Reversing direction must step over the current match, not find it again.
        let from = match (direction, self.state.last_match) {
            (Direction::Forward, Some(m)) if self.state.buffer == Some(origin) => {
                self.state.offset.max(m.end)
            }
            (Direction::Backward, Some(m)) if self.state.buffer == Some(origin) => {
                self.state.offset.min(m.start)
            }
            _ => self.state.offset,
        };
        let scope = self.selection_scope();

        let ahead = self.search_buffer(&query, docs, origin, scope.clone(), direction, Some(from))?;
        if let Some(m) = ahead {
            return Ok(self.found(origin, m, false, false));
        }

        let all_documents = self.state.flags.all_documents && scope.is_none();
        if all_documents {
            let others = match direction {
                Direction::Forward => docs.ids_after(origin),
                Direction::Backward => docs.ids_before(origin),
            };
            for id in others {
                if self.skips(docs, id) {
                    log::trace!("skipping test case buffer {id:?}");
                    continue;
                }
                if let Some(m) = self.search_buffer(&query, docs, id, None, direction, None)? {
                    return Ok(self.found(id, m, false, false));
                }
            }
        }

        if let Some(m) = self.search_buffer(&query, docs, origin, scope, direction, None)? {
            return Ok(self.found(origin, m, true, all_documents));
        }
        Ok(FindResult::not_found(Some(origin)))
    }

    /// Search one buffer. `from = None` searches the whole scope from its start (forward) or end
    /// (backward).
    fn search_buffer(
        &self,
        query: &SearchQuery,
        docs: &DocumentSet,
        id: BufferId,
        scope: Option<Range<usize>>,
        direction: Direction,
        from: Option<usize>,
    ) -> Result<Option<SearchMatch>, SearchError> {
        let Some(buffer) = docs.buffer(id) else {
            return Ok(None);
        };
        let text = buffer.text()?;
        let hay = self.haystack(&text);
        let scope = scope.unwrap_or(0..hay.char_count());

        let found = match direction {
            Direction::Forward => {
                let from = from.map_or(scope.start, |f| f.max(scope.start));
                query
                    .find_next(&hay, from)
                    .filter(|m| m.end <= scope.end)
            }
            Direction::Backward => {
                let before = from.map_or(scope.end, |f| f.min(scope.end));
                query
                    .find_prev(&hay, before)
                    .filter(|m| m.start >= scope.start)
            }
        };
        Ok(found)
    }

    fn found(
        &mut self,
        id: BufferId,
        m: SearchMatch,
        wrapped: bool,
        all_documents_wrapped: bool,
    ) -> FindResult {
        self.state.buffer = Some(id);
        self.state.offset = match self.state.direction {
            Direction::Forward => m.end,
            Direction::Backward => m.start,
        };
        self.state.last_match = Some(m);
        FindResult {
            buffer: Some(id),
            found: Some(m),
            wrapped,
            all_documents_wrapped,
        }
    }

    fn query(&self) -> Result<SearchQuery, SearchError> {
        SearchQuery::new(&self.state.find_term, self.state.flags.search_options())
    }

    fn haystack<'a>(&self, text: &'a str) -> Haystack<'a> {
        let hay = Haystack::new(text);
        if self.state.flags.ignore_comments_and_strings {
            hay.excluding_comments_and_strings()
        } else {
            hay
        }
    }

    fn origin(&self, docs: &DocumentSet) -> Option<BufferId> {
        self.state
            .buffer
            .filter(|id| docs.buffer(*id).is_some())
            .or_else(|| docs.active())
    }

    fn selection_scope(&self) -> Option<Range<usize>> {
        if self.state.flags.selection_only {
            self.state.selection.clone()
        } else {
            None
        }
    }

    fn skips(&self, docs: &DocumentSet, id: BufferId) -> bool {
        self.state.flags.ignore_test_cases
            && docs
                .buffer(id)
                .is_some_and(|b| b.is_test_case(&self.state.test_case_suffix))
    }
}

/// The GENERIC highlight showing the active match.
#[derive(Debug, Default)]
pub struct ActiveMatchHighlight {
    current: Option<(BufferId, RegionHandle)>,
}

impl ActiveMatchHighlight {
    /// Create an empty highlight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight `m` in `doc`, replacing the previous match highlight.
    ///
    /// The previous highlight is removed when it lives in `engine`. A highlight in another buffer
    /// must be cleared with [`ActiveMatchHighlight::clear`] and that buffer's engine first;
    /// until then `show` fails with [`HighlightError::ShownElsewhere`] and changes nothing.
    pub fn show(
        &mut self,
        engine: &mut HighlightLayerEngine,
        doc: &dyn AnchoredText,
        m: SearchMatch,
        painter: Painter,
    ) -> Result<RegionHandle, HighlightError> {
        if let Some((buffer, _)) = self.current
            && buffer != engine.buffer()
        {
            return Err(HighlightError::ShownElsewhere(buffer));
        }
        self.clear(engine);
        let handle = engine.add_highlight(doc, m.start, m.end, painter)?;
        self.current = Some((engine.buffer(), handle));
        Ok(handle)
    }

    /// Remove the highlight if it lives in `engine`. Returns `true` if a region was removed.
    pub fn clear(&mut self, engine: &mut HighlightLayerEngine) -> bool {
        match self.current {
            Some((buffer, handle)) if buffer == engine.buffer() => {
                self.current = None;
                engine.remove_region(handle)
            }
            _ => false,
        }
    }

    /// Buffer showing the highlight.
    pub fn buffer(&self) -> Option<BufferId> {
        self.current.map(|(buffer, _)| buffer)
    }
}
