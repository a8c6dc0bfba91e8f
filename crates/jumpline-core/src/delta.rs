//! Buffer edit records and anchor shifting.
//!
//! Every edit applied to a [`TextBuffer`](crate::TextBuffer) is reported as a [`TextDelta`] in
//! character offsets. The buffer moves its anchors with [`map_offset`]; hosts that cache their own
//! offsets (caret, scroll position) can run them through the same function.

/// One replacement: `deleted_text` at `start` was replaced by `inserted_text`.
///
/// `start` refers to the buffer as it was just before this edit. Edits of one [`TextDelta`] are
/// applied one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDeltaEdit {
    /// Character offset where the replacement starts.
    pub start: usize,
    /// Text that was removed (empty for a pure insertion).
    pub deleted_text: String,
    /// Text that was added (empty for a pure deletion).
    pub inserted_text: String,
}

impl TextDeltaEdit {
    /// Characters removed.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Characters added.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// End of the removed range, in pre-edit offsets.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len())
    }
}

/// The edits produced by one buffer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDelta {
    /// Buffer length before the operation.
    pub before_char_count: usize,
    /// Buffer length after the operation.
    pub after_char_count: usize,
    /// Edits in application order.
    pub edits: Vec<TextDeltaEdit>,
}

impl TextDelta {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Map a pre-edit character offset through every edit of this delta.
    pub fn map_offset(&self, offset: usize) -> usize {
        self.edits
            .iter()
            .fold(offset, |offset, edit| map_offset(offset, edit))
    }
}

/// Map a character offset through a single edit.
///
/// - Offsets before the edit are unchanged.
/// - Offsets inside the replaced range collapse to the edit start, then move past the inserted
///   text.
/// - Offsets at or after the end of the replaced range shift by the net length change. An offset
///   sitting exactly at the start of a pure insertion therefore moves forward.
pub fn map_offset(offset: usize, edit: &TextDeltaEdit) -> usize {
    let start = edit.start;
    let end = edit.end();
    let deleted_len = edit.deleted_len();
    let inserted_len = edit.inserted_len();

    if offset < start {
        return offset;
    }

    if offset < end {
        return start.saturating_add(inserted_len);
    }

    if inserted_len >= deleted_len {
        offset.saturating_add(inserted_len - deleted_len)
    } else {
        offset.saturating_sub(deleted_len - inserted_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(start: usize, deleted: &str, inserted: &str) -> TextDeltaEdit {
        TextDeltaEdit {
            start,
            deleted_text: deleted.to_string(),
            inserted_text: inserted.to_string(),
        }
    }

    #[test]
    fn test_insertion_pushes_offsets_at_or_after_start() {
        let insert = edit(5, "", "abc");
        assert_eq!(map_offset(4, &insert), 4);
        assert_eq!(map_offset(5, &insert), 8);
        assert_eq!(map_offset(9, &insert), 12);
    }

    #[test]
    fn test_deletion_collapses_covered_offsets() {
        let delete = edit(2, "xyz", "");
        assert_eq!(map_offset(1, &delete), 1);
        assert_eq!(map_offset(2, &delete), 2);
        assert_eq!(map_offset(4, &delete), 2);
        assert_eq!(map_offset(5, &delete), 2);
        assert_eq!(map_offset(7, &delete), 4);
    }

    #[test]
    fn test_delta_maps_edits_in_order() {
        let delta = TextDelta {
            before_char_count: 10,
            after_char_count: 10,
            edits: vec![edit(0, "", "ab"), edit(4, "cd", "")],
        };
        assert_eq!(delta.map_offset(3), 4);
        assert_eq!(delta.map_offset(8), 8);
    }
}
