use serde::Serialize;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Optional file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Create a source location with file information
    pub fn with_file(file: String, line: usize, column: usize) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }

    /// Computes the 1-indexed line and column of a byte offset in `text`.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to the
    /// end of the text.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self::new(line, column)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Errors that can occur while loading or rendering exercise content.
#[derive(Debug, Error)]
pub enum TaskviewError {
    /// IO error while reading content or configuration.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// JSON error while reading a catalogue or configuration.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// Invalid catalogue definition (duplicate names, empty labels).
    #[error("Invalid catalogue: {0}")]
    InvalidCatalogue(String),
}

impl TaskviewError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }
}
