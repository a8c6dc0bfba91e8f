//! Result index: display ordering and stable anchors for derived results.
//!
//! [`ResultIndex::build`] partitions results into *unlocated* and *located*, sorts the located
//! ones by position and creates one [`Anchor`] per located result by walking each file's text
//! once. Results are presented in display order `unlocated ++ located`.
//!
//! Located results are grouped per file (in order of each file's first appearance among the
//! producer's results) and stable-sorted by `(line, column)` inside a group. Anchors are created
//! when the index is built and never re-created; afterwards they only move with buffer edits.

use crate::buffer::{Anchor, AnchoredText, DocumentSource, FileRef, has_newline_between};
use crate::result::{DerivedResult, ResultLabels, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// What to do with a located result whose line is past the end of its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinePolicy {
    /// The result gets no anchor; it stays in display order but is never found by position.
    #[default]
    Drop,
    /// The result is anchored at the end of the buffer.
    #[serde(rename = "clamp")]
    ClampToEnd,
}

/// Options for [`ResultIndex::build_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexOptions {
    /// Policy for lines past the end of the buffer.
    pub line_policy: LinePolicy,
}

#[derive(Debug, Clone)]
struct FileGroup {
    file: FileRef,
    /// Range into `located` / `anchors`.
    located: Range<usize>,
}

/// Ordered, anchored view of a result set.
#[derive(Debug, Clone, Default)]
pub struct ResultIndex {
    unlocated: Vec<DerivedResult>,
    located: Vec<DerivedResult>,
    /// Parallel to `located`.
    anchors: Vec<Option<Anchor>>,
    groups: Vec<FileGroup>,
    options: IndexOptions,
}

impl ResultIndex {
    /// An index with no results.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index with default options.
    pub fn build<S>(results: impl IntoIterator<Item = DerivedResult>, docs: &S) -> Self
    where
        S: DocumentSource + ?Sized,
    {
        Self::build_with_options(results, docs, IndexOptions::default())
    }

    /// Build an index.
    ///
    /// Never fails: results whose file is not open, whose buffer cannot be read, or whose line is
    /// past the end of the buffer (under [`LinePolicy::Drop`]) are kept without an anchor.
    pub fn build_with_options<S>(
        results: impl IntoIterator<Item = DerivedResult>,
        docs: &S,
        options: IndexOptions,
    ) -> Self
    where
        S: DocumentSource + ?Sized,
    {
        let mut unlocated = Vec::new();
        let mut located = Vec::new();
        for result in results {
            if result.is_located() {
                located.push(result);
            } else {
                unlocated.push(result);
            }
        }

        let mut file_rank: HashMap<FileRef, usize> = HashMap::new();
        for result in &located {
            if let Some(file) = &result.file {
                let next = file_rank.len();
                file_rank.entry(file.clone()).or_insert(next);
            }
        }
        // `sort_by_key` is stable: equal positions keep producer order.
        located.sort_by_key(|r| {
            let rank = r.file.as_ref().and_then(|f| file_rank.get(f)).copied();
            (rank, r.position())
        });

        let mut groups: Vec<FileGroup> = Vec::new();
        for (idx, result) in located.iter().enumerate() {
            let Some(file) = &result.file else { continue };
            match groups.last_mut() {
                Some(group) if &group.file == file => group.located.end = idx + 1,
                _ => groups.push(FileGroup {
                    file: file.clone(),
                    located: idx..idx + 1,
                }),
            }
        }

        let mut anchors: Vec<Option<Anchor>> = Vec::with_capacity(located.len());
        for group in &groups {
            let results = &located[group.located.clone()];
            match docs.document(&group.file) {
                Some(doc) => anchors.extend(anchor_group(doc, results, options.line_policy)),
                None => {
                    log::debug!(
                        "no open buffer for {}; {} result(s) left unanchored",
                        group.file,
                        results.len()
                    );
                    anchors.extend(std::iter::repeat_n(None, results.len()));
                }
            }
        }

        Self {
            unlocated,
            located,
            anchors,
            groups,
            options,
        }
    }

    /// Anchor the still-unanchored results of `doc`'s file, e.g. after that file was opened.
    ///
    /// Existing anchors are kept as they are. Returns the number of anchors created.
    pub fn anchor_document(&mut self, doc: &dyn AnchoredText) -> usize {
        let Some(file) = doc.file() else { return 0 };
        let Some(range) = self
            .groups
            .iter()
            .find(|g| &g.file == file)
            .map(|g| g.located.clone())
        else {
            return 0;
        };
        if self.anchors[range.clone()].iter().all(Option::is_some) {
            return 0;
        }

        let fresh = anchor_group(doc, &self.located[range.clone()], self.options.line_policy);
        let mut created = 0;
        for (slot, anchor) in self.anchors[range].iter_mut().zip(fresh) {
            if slot.is_none() && anchor.is_some() {
                *slot = anchor;
                created += 1;
            }
        }
        log::debug!("anchored {created} late result(s) in {file}");
        created
    }

    /// Total number of results.
    pub fn len(&self) -> usize {
        self.unlocated.len() + self.located.len()
    }

    /// Returns `true` if the index has no results.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unlocated results, in producer order.
    pub fn unlocated(&self) -> &[DerivedResult] {
        &self.unlocated
    }

    /// Located results, in position order.
    pub fn located(&self) -> &[DerivedResult] {
        &self.located
    }

    /// Result at `display_index` (`unlocated ++ located`).
    pub fn get(&self, display_index: usize) -> Option<&DerivedResult> {
        match self.display_to_located(display_index) {
            Some(located) => self.located.get(located),
            None => self.unlocated.get(display_index),
        }
    }

    /// Results in display order.
    pub fn iter(&self) -> impl Iterator<Item = &DerivedResult> {
        self.unlocated.iter().chain(self.located.iter())
    }

    /// Display index of the located result at `located_index`.
    pub fn located_display_index(&self, located_index: usize) -> usize {
        self.unlocated.len() + located_index
    }

    /// Located index for `display_index`, if it refers to a located result.
    pub fn display_to_located(&self, display_index: usize) -> Option<usize> {
        display_index
            .checked_sub(self.unlocated.len())
            .filter(|located| *located < self.located.len())
    }

    /// Anchor of the result at `display_index`, if it has one.
    pub fn anchor(&self, display_index: usize) -> Option<&Anchor> {
        let located = self.display_to_located(display_index)?;
        self.located_anchor(located)
    }

    /// Anchor of the located result at `located_index`, if it has one.
    pub fn located_anchor(&self, located_index: usize) -> Option<&Anchor> {
        self.anchors.get(located_index)?.as_ref()
    }

    /// The first anchored result after `located_index` in the same file.
    pub fn next_anchor_in_file(&self, located_index: usize) -> Option<&Anchor> {
        let group = self.group_of(located_index)?;
        self.anchors[located_index + 1..group.located.end]
            .iter()
            .flatten()
            .next()
    }

    /// Find the located result on the same line as `caret` in `doc`.
    ///
    /// Prefers the result whose anchor is the greatest offset `<= caret` with no newline between
    /// the anchor and the caret; otherwise the least anchor offset `>= caret` under the same
    /// condition. Ties on the same offset resolve to the earlier result. Returns a located index.
    pub fn find_enclosing(&self, doc: &dyn AnchoredText, caret: usize) -> Option<usize> {
        let file = doc.file()?;
        let group = self.groups.iter().find(|g| &g.file == file)?;

        let mut before: Option<(usize, usize)> = None;
        let mut after: Option<(usize, usize)> = None;
        for idx in group.located.clone() {
            let Some(anchor) = &self.anchors[idx] else {
                continue;
            };
            if anchor.buffer() != doc.id() {
                continue;
            }
            let offset = anchor.offset();
            if offset <= caret && before.is_none_or(|(_, best)| offset > best) {
                before = Some((idx, offset));
            }
            if offset >= caret && after.is_none_or(|(_, best)| offset < best) {
                after = Some((idx, offset));
            }
        }
        if before.is_none() && after.is_none() {
            return None;
        }

        let text = match doc.text() {
            Ok(text) => text,
            Err(err) => {
                log::debug!("enclosing lookup skipped: {err}");
                return None;
            }
        };

        [before, after]
            .into_iter()
            .flatten()
            .find(|(_, offset)| !has_newline_between(&text, *offset, caret))
            .map(|(idx, _)| idx)
    }

    /// Display index of the result enclosing `caret` (see [`ResultIndex::find_enclosing`]).
    pub fn enclosing_display_index(&self, doc: &dyn AnchoredText, caret: usize) -> Option<usize> {
        self.find_enclosing(doc, caret)
            .map(|located| self.located_display_index(located))
    }

    /// Number of results with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.iter().filter(|r| r.severity == severity).count()
    }

    /// Number of error results.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning results.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of informational results.
    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Returns `true` if every result is a warning (and there is at least one).
    pub fn has_only_warnings(&self) -> bool {
        !self.is_empty() && self.warning_count() == self.len()
    }

    /// Header for the results list (e.g. `"2 errors found:"`).
    pub fn header_text(&self, labels: &ResultLabels) -> String {
        labels.header(self.error_count(), self.warning_count(), self.info_count())
    }

    fn group_of(&self, located_index: usize) -> Option<&FileGroup> {
        self.groups
            .iter()
            .find(|g| g.located.contains(&located_index))
    }
}

/// Anchor every result of one file (sorted by position) with a single walk over its text.
fn anchor_group(
    doc: &dyn AnchoredText,
    results: &[DerivedResult],
    policy: LinePolicy,
) -> Vec<Option<Anchor>> {
    let text = match doc.text() {
        Ok(text) => text,
        Err(err) => {
            log::warn!("cannot read buffer {:?}, results left unanchored: {err}", doc.id());
            return vec![None; results.len()];
        }
    };
    let char_count = doc.char_count();

    let mut chars = text.chars();
    let mut offset = 0usize;
    let mut current_line = 0usize;
    let mut line_start = 0usize;

    let mut anchors = Vec::with_capacity(results.len());
    for result in results {
        let Some((line, column)) = result.position() else {
            anchors.push(None);
            continue;
        };

        while current_line < line {
            match chars.next() {
                Some('\n') => {
                    offset += 1;
                    current_line += 1;
                    line_start = offset;
                }
                Some(_) => offset += 1,
                None => break,
            }
        }

        let target = if current_line == line {
            line_start.saturating_add(column)
        } else {
            match policy {
                LinePolicy::Drop => {
                    log::debug!(
                        "line {line} is past the end of {:?} ({} lines); no anchor",
                        doc.id(),
                        current_line + 1
                    );
                    anchors.push(None);
                    continue;
                }
                LinePolicy::ClampToEnd => char_count,
            }
        };

        match doc.create_anchor(target.min(char_count)) {
            Ok(anchor) => anchors.push(Some(anchor)),
            Err(err) => {
                log::debug!("cannot anchor result at line {line}: {err}");
                anchors.push(None);
            }
        }
    }
    anchors
}
