//! Navigation preferences.
//!
//! Preferences are plain serde structs loaded from TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! [colors.result]
//! color = "#ffff80"
//!
//! [search]
//! match_case = false
//! ignore_test_cases = true
//!
//! [index]
//! line_policy = "clamp"
//! ```

use crate::error::ConfigError;
use crate::find_replace::{FindFlags, SearchCursor};
use crate::result::ResultLabels;
use crate::result_index::{IndexOptions, LinePolicy};
use crate::style::StyleSheet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A color preference for one highlight kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleEntry {
    /// `#rrggbb` or `#rrggbbaa`.
    pub color: String,
    /// Bold text.
    #[serde(default)]
    pub bold: bool,
}

impl StyleEntry {
    fn new(color: &str, bold: bool) -> Self {
        Self {
            color: color.to_string(),
            bold,
        }
    }
}

/// Color preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Native text selection.
    pub selection: StyleEntry,
    /// Selected result in a document.
    pub result: StyleEntry,
    /// Frame highlights.
    pub frame: StyleEntry,
    /// Generic highlights (search matches).
    pub generic: StyleEntry,
    /// Selected item in the results list.
    pub list_result: StyleEntry,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            selection: StyleEntry::new("#b4d5fe", false),
            result: StyleEntry::new("#ffff80", false),
            frame: StyleEntry::new("#ff0000", false),
            generic: StyleEntry::new("#e0e0e0", false),
            list_result: StyleEntry::new("#ffff80", true),
        }
    }
}

/// Default find/replace options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Case-sensitive matching.
    pub match_case: bool,
    /// Whole-word matching.
    pub whole_word: bool,
    /// Search every open document.
    pub all_documents: bool,
    /// Skip matches inside comments and string literals.
    pub ignore_comments_and_strings: bool,
    /// Skip test-case documents when searching all documents.
    pub ignore_test_cases: bool,
    /// File-stem suffix that marks a test case.
    pub test_case_suffix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_case: true,
            whole_word: false,
            all_documents: false,
            ignore_comments_and_strings: false,
            ignore_test_cases: false,
            test_case_suffix: "Test".to_string(),
        }
    }
}

/// Result index options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Policy for results whose line is past the end of the buffer.
    pub line_policy: LinePolicy,
}

/// All navigation preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Highlight colors.
    pub colors: ColorConfig,
    /// Find/replace defaults.
    pub search: SearchConfig,
    /// Result index options.
    pub index: IndexConfig,
    /// Results header nouns.
    pub labels: ResultLabels,
}

impl NavConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded navigation config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Build the highlight style sheet.
    pub fn style_sheet(&self) -> Result<StyleSheet, ConfigError> {
        StyleSheet::from_config(&self.colors)
    }

    /// Options for building result indexes.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            line_policy: self.index.line_policy,
        }
    }

    /// Default find flags.
    pub fn find_flags(&self) -> FindFlags {
        FindFlags {
            match_case: self.search.match_case,
            whole_word: self.search.whole_word,
            all_documents: self.search.all_documents,
            ignore_comments_and_strings: self.search.ignore_comments_and_strings,
            ignore_test_cases: self.search.ignore_test_cases,
            ..FindFlags::default()
        }
    }

    /// A search cursor with the configured flags and test-case suffix.
    pub fn search_cursor(&self) -> SearchCursor {
        let mut cursor = SearchCursor::with_flags(self.find_flags());
        cursor.set_test_case_suffix(self.search.test_case_suffix.clone());
        cursor
    }
}
