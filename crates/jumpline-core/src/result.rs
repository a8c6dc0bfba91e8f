//! Derived results (diagnostics, test failures, search matches).
//!
//! Results are produced outside this crate (compiler, test runner, search engine) and are
//! immutable once produced. A result is *located* when it names a file and a line; otherwise it
//! is *unlocated* and is only shown in the results list.

use crate::buffer::FileRef;
use serde::{Deserialize, Serialize};

/// Result severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Error results.
    Error,
    /// Warning results.
    Warning,
    /// Informational results (e.g. search matches).
    Info,
}

impl Severity {
    /// Human-readable label used in the results list.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

/// A single derived result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedResult {
    /// Result severity.
    pub severity: Severity,
    /// Message shown in the results list.
    pub message: String,
    /// Source file, if the producer knows it.
    pub file: Option<FileRef>,
    /// Zero-based line, or `None` for "no location".
    pub line: Option<usize>,
    /// Zero-based column in characters, if known.
    pub column: Option<usize>,
}

impl DerivedResult {
    /// Create a result without a location.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning result.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational result.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Attach the source file.
    pub fn in_file(mut self, file: FileRef) -> Self {
        self.file = Some(file);
        self
    }

    /// Attach a zero-based position as reported by producers.
    ///
    /// Producers report "no location" with a negative line (conventionally `-1`); a negative
    /// column is treated as "unknown column".
    pub fn at(mut self, line: i64, column: i64) -> Self {
        self.line = usize::try_from(line).ok();
        self.column = usize::try_from(column).ok();
        self
    }

    /// Returns `true` if the result names both a file and a line.
    pub fn is_located(&self) -> bool {
        self.file.is_some() && self.line.is_some()
    }

    /// `(line, column)` for located results; an unknown column is column `0`.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.line.map(|line| (line, self.column.unwrap_or(0)))
    }
}

/// Nouns used to build the results header (e.g. `"2 errors and 1 warning found:"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultLabels {
    /// Singular noun for errors.
    pub error: String,
    /// Plural noun for errors.
    pub errors: String,
    /// Singular noun for warnings.
    pub warning: String,
    /// Plural noun for warnings.
    pub warnings: String,
    /// Singular noun for informational results.
    pub info: String,
    /// Plural noun for informational results.
    pub infos: String,
    /// Header shown when there are no results.
    pub empty: String,
}

impl Default for ResultLabels {
    fn default() -> Self {
        Self {
            error: "error".to_string(),
            errors: "errors".to_string(),
            warning: "warning".to_string(),
            warnings: "warnings".to_string(),
            info: "message".to_string(),
            infos: "messages".to_string(),
            empty: "No errors found.".to_string(),
        }
    }
}

impl ResultLabels {
    /// Labels for test-runner results.
    pub fn test_failures() -> Self {
        Self {
            error: "test failure".to_string(),
            errors: "test failures".to_string(),
            empty: "All tests passed.".to_string(),
            ..Self::default()
        }
    }

    /// Labels for find-all results.
    pub fn matches() -> Self {
        Self {
            info: "match".to_string(),
            infos: "matches".to_string(),
            empty: "No matches found.".to_string(),
            ..Self::default()
        }
    }

    /// Build the header for the given counts.
    pub fn header(&self, errors: usize, warnings: usize, infos: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (count, singular, plural) in [
            (errors, &self.error, &self.errors),
            (warnings, &self.warning, &self.warnings),
            (infos, &self.info, &self.infos),
        ] {
            if count > 0 {
                let noun = if count == 1 { singular } else { plural };
                parts.push(format!("{count} {noun}"));
            }
        }

        match parts.as_slice() {
            [] => self.empty.clone(),
            [only] => format!("{only} found:"),
            [init @ .., last] => format!("{} and {last} found:", init.join(", ")),
        }
    }
}
