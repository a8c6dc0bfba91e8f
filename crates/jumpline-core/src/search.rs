//! Text search primitives.
//!
//! All public inputs/outputs are **character offsets** (not byte offsets) with half-open ranges.
//! A [`SearchQuery`] is compiled once (plain text is escaped into a regex) and run against a
//! [`Haystack`], which carries the char/byte mapping for one text and an optional list of
//! excluded ranges (comments and string literals, see [`comment_and_string_ranges`]).
//!
//! Matches never overlap: after an accepted match the scan resumes at its end. A candidate that is
//! rejected (not a whole word, or inside an excluded range) only advances the scan by one
//! character, so a later match starting inside it can still be found.

use crate::error::BufferError;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use thiserror::Error;

/// How a find term is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Match letter case exactly.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// Compile the term as a regular expression.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// A match, expressed as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchMatch {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl SearchMatch {
    /// Length of the match in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` for a zero-width match.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The match as a range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Search errors.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The find term is not a valid regular expression.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// The find term is empty.
    #[error("empty search term")]
    EmptyQuery,

    /// A searched buffer could not be read or edited.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[derive(Debug)]
struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .copied()
            .unwrap_or(self.text_len)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) | Err(idx) => idx,
        }
    }

    fn char_at(&self, text: &str, char_offset: usize) -> Option<char> {
        if char_offset >= self.char_count() {
            return None;
        }
        let start = self.char_to_byte[char_offset];
        let end = self.char_to_byte[char_offset + 1];
        text.get(start..end)?.chars().next()
    }
}

/// A text prepared for searching.
#[derive(Debug)]
pub struct Haystack<'a> {
    text: &'a str,
    index: CharIndex,
    excluded: Vec<Range<usize>>,
}

impl<'a> Haystack<'a> {
    /// Prepare `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: CharIndex::new(text),
            excluded: Vec::new(),
        }
    }

    /// Reject matches overlapping any of `ranges` (character offsets).
    pub fn excluding(mut self, ranges: Vec<Range<usize>>) -> Self {
        self.excluded = ranges;
        self
    }

    /// Reject matches inside comments and string literals.
    pub fn excluding_comments_and_strings(self) -> Self {
        let ranges = comment_and_string_ranges(self.text);
        self.excluding(ranges)
    }

    /// The searched text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.index.char_count()
    }

    /// Text in `range` (character offsets, clamped).
    pub fn slice(&self, range: Range<usize>) -> &'a str {
        let start = self.index.char_to_byte(range.start);
        let end = self.index.char_to_byte(range.end).max(start);
        &self.text[start..end]
    }

    fn is_excluded(&self, m: SearchMatch) -> bool {
        self.excluded
            .iter()
            .any(|r| r.start < m.end && m.start < r.end)
    }
}

/// A compiled find term.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    regex: Regex,
    whole_word: bool,
    expand_groups: bool,
}

impl SearchQuery {
    /// Compile `query`.
    pub fn new(query: &str, options: SearchOptions) -> Result<Self, SearchError> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let pattern = if options.regex {
            query.to_string()
        } else {
            regex::escape(query)
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .multi_line(true)
            .build()?;
        Ok(Self {
            regex,
            whole_word: options.whole_word,
            expand_groups: options.regex,
        })
    }

    /// First match starting at or after `from`.
    pub fn find_next(&self, hay: &Haystack<'_>, from: usize) -> Option<SearchMatch> {
        self.matches_from(hay, from).next()
    }

    /// Last match ending at or before `before`.
    pub fn find_prev(&self, hay: &Haystack<'_>, before: usize) -> Option<SearchMatch> {
        self.matches_from(hay, 0)
            .take_while(|m| m.end <= before)
            .last()
    }

    /// Every match in the text.
    pub fn find_all(&self, hay: &Haystack<'_>) -> Vec<SearchMatch> {
        self.matches_from(hay, 0).collect()
    }

    /// Every match lying entirely inside `region`.
    pub fn find_in(&self, hay: &Haystack<'_>, region: Range<usize>) -> Vec<SearchMatch> {
        self.matches_from(hay, region.start)
            .take_while(|m| m.end <= region.end)
            .collect()
    }

    /// Returns `true` if `range` is exactly a match.
    pub fn is_match_exact(&self, hay: &Haystack<'_>, range: SearchMatch) -> bool {
        !range.is_empty() && self.find_next(hay, range.start) == Some(range)
    }

    /// Expand `replacement` for the match at `range`.
    ///
    /// In regex mode `$1`-style group references are substituted; otherwise the replacement is
    /// used literally.
    pub fn expand_replacement(
        &self,
        hay: &Haystack<'_>,
        range: SearchMatch,
        replacement: &str,
    ) -> String {
        if !self.expand_groups {
            return replacement.to_string();
        }
        let start = hay.index.char_to_byte(range.start);
        let end = hay.index.char_to_byte(range.end);
        match self.regex.captures_at(hay.text, start) {
            Some(caps) if caps.get(0).is_some_and(|m| m.start() == start && m.end() == end) => {
                let mut out = String::new();
                caps.expand(replacement, &mut out);
                out
            }
            _ => replacement.to_string(),
        }
    }

    fn matches_from<'h>(
        &'h self,
        hay: &'h Haystack<'_>,
        from: usize,
    ) -> impl Iterator<Item = SearchMatch> + 'h {
        let mut next = from.min(hay.char_count());
        let mut done = false;
        std::iter::from_fn(move || {
            while !done {
                let Some(m) = self.regex.find_at(hay.text, hay.index.char_to_byte(next)) else {
                    done = true;
                    break;
                };
                let candidate = SearchMatch {
                    start: hay.index.byte_to_char(m.start()),
                    end: hay.index.byte_to_char(m.end()),
                };
                if candidate.is_empty() || !self.accepts(hay, candidate) {
                    next = candidate.start + 1;
                    done = next > hay.char_count();
                    continue;
                }
                next = candidate.end;
                return Some(candidate);
            }
            None
        })
    }

    fn accepts(&self, hay: &Haystack<'_>, m: SearchMatch) -> bool {
        if self.whole_word && !is_whole_word(hay, m) {
            return false;
        }
        !hay.is_excluded(m)
    }
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(hay: &Haystack<'_>, m: SearchMatch) -> bool {
    let before = m
        .start
        .checked_sub(1)
        .and_then(|prev| hay.index.char_at(hay.text, prev));
    let after = hay.index.char_at(hay.text, m.end);
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Character ranges of `//` and `/* */` comments and of `"..."` / `'.'` literals.
///
/// Literals honor backslash escapes and end at an unescaped newline; an unterminated block
/// comment runs to the end of the text.
pub fn comment_and_string_ranges(text: &str) -> Vec<Range<usize>> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < len {
        let start = i;
        match (chars[i], chars.get(i + 1)) {
            ('/', Some('/')) => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < len && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            (quote @ ('"' | '\''), _) => {
                i += 1;
                while i < len {
                    match chars[i] {
                        '\\' => i += 2,
                        '\n' => break,
                        ch if ch == quote => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                i = i.min(len);
            }
            _ => {
                i += 1;
                continue;
            }
        }
        ranges.push(start..i);
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(term: &str, options: SearchOptions) -> SearchQuery {
        SearchQuery::new(term, options).unwrap()
    }

    #[test]
    fn test_find_next_and_prev() {
        let hay = Haystack::new("Hello hello HELLO");
        let exact = query("hello", SearchOptions::default());
        assert_eq!(exact.find_next(&hay, 0), Some(SearchMatch { start: 6, end: 11 }));
        assert_eq!(exact.find_next(&hay, 7), None);

        let any_case = query(
            "hello",
            SearchOptions {
                case_sensitive: false,
                ..SearchOptions::default()
            },
        );
        assert_eq!(any_case.find_prev(&hay, 6), Some(SearchMatch { start: 0, end: 5 }));
        assert_eq!(any_case.find_all(&hay).len(), 3);
    }

    #[test]
    fn test_whole_word_skips_partial_candidates() {
        let hay = Haystack::new("foobar foo barfoo foo");
        let words = query(
            "foo",
            SearchOptions {
                whole_word: true,
                ..SearchOptions::default()
            },
        );
        let starts: Vec<usize> = words.find_all(&hay).iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![7, 18]);
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let hay = Haystack::new("héllo wörld wörld");
        let q = query("wörld", SearchOptions::default());
        assert_eq!(q.find_next(&hay, 0), Some(SearchMatch { start: 6, end: 11 }));
        assert_eq!(q.find_in(&hay, 0..11), vec![SearchMatch { start: 6, end: 11 }]);
        assert_eq!(hay.slice(12..17), "wörld");
    }

    #[test]
    fn test_regex_and_replacement_expansion() {
        let hay = Haystack::new("let x = foo(1); let y = foo(22);");
        let q = query(
            r"foo\((\d+)\)",
            SearchOptions {
                regex: true,
                ..SearchOptions::default()
            },
        );
        let found = q.find_all(&hay);
        assert_eq!(found.len(), 2);
        assert_eq!(q.expand_replacement(&hay, found[1], "bar[$1]"), "bar[22]");
        assert!(q.is_match_exact(&hay, found[0]));
        assert!(!q.is_match_exact(&hay, SearchMatch { start: 0, end: 3 }));
    }

    #[test]
    fn test_invalid_and_empty_queries() {
        let regex = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        assert!(matches!(
            SearchQuery::new("(", regex),
            Err(SearchError::InvalidRegex(_))
        ));
        assert!(matches!(
            SearchQuery::new("", SearchOptions::default()),
            Err(SearchError::EmptyQuery)
        ));
    }

    #[test]
    fn test_comment_and_string_ranges() {
        let text = "a // x\nb /* y */ c \"s\\\"t\" 'q' d";
        let ranges = comment_and_string_ranges(text);
        let pieces: Vec<String> = ranges
            .iter()
            .map(|r| text.chars().skip(r.start).take(r.len()).collect())
            .collect();
        assert_eq!(pieces, vec!["// x", "/* y */", "\"s\\\"t\"", "'q'"]);
    }

    #[test]
    fn test_excluded_ranges_hide_matches() {
        let text = "x = 1; // x\nprint(\"x\"); x";
        let hay = Haystack::new(text).excluding_comments_and_strings();
        let starts: Vec<usize> = query("x", SearchOptions::default())
            .find_all(&hay)
            .iter()
            .map(|m| m.start)
            .collect();
        assert_eq!(starts, vec![0, 24]);
    }
}
