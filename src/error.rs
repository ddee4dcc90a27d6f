//! Error types for the Quickserve HMR engine

use std::fmt;
use thiserror::Error;

/// Source location in a scanned module source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Byte offset in source
    pub offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Compute the line/column location of a byte offset within `source`.
///
/// Offsets past the end of the source clamp to the last position.
pub fn location_at(source: &str, offset: usize) -> SourceLocation {
    let offset = offset.min(source.len());
    let mut line = 1u32;
    let mut column = 1u32;
    for (pos, c) in source.char_indices() {
        if pos >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    SourceLocation {
        line,
        column,
        offset,
    }
}

/// Format a source context with caret pointer for errors
pub fn format_error_context(source: &str, location: &SourceLocation) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = (location.line.saturating_sub(1)) as usize;

    if line_idx >= lines.len() {
        return String::new();
    }

    let mut result = String::new();
    let line_num_width = format!("{}", location.line + 1).len().max(3);

    if line_idx > 0 {
        result.push_str(&format!(
            "{:>width$} | {}\n",
            location.line - 1,
            lines[line_idx - 1],
            width = line_num_width
        ));
    }

    result.push_str(&format!(
        "{:>width$} | {}\n",
        location.line,
        lines[line_idx],
        width = line_num_width
    ));

    let pointer_offset = (location.column.saturating_sub(1)) as usize;
    result.push_str(&format!(
        "{:>width$} | {}^\n",
        "",
        " ".repeat(pointer_offset),
        width = line_num_width
    ));

    result
}

/// Main error type for Quickserve
#[derive(Error, Debug)]
pub enum Error {
    /// Lexer error - unsupported construct in an accept dependency list
    #[error("SyntaxError: {message} at {location}{}", if source_context.is_empty() { String::new() } else { format!("\n{}", source_context) })]
    LexerError {
        message: String,
        location: SourceLocation,
        source_context: String,
    },

    /// Module graph lookup or bookkeeping error
    #[error("ModuleError: {0}")]
    ModuleError(String),

    /// A plugin hook failed; the whole update is abandoned
    #[error("PluginError: {plugin}: {message}")]
    PluginError { plugin: String, message: String },

    /// Client transport failed to deliver a payload
    #[error("TransportError: {0}")]
    TransportError(String),

    /// IO error
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Internal invariant violation
    #[error("InternalError: {0}")]
    InternalError(String),
}

impl Error {
    /// Create a new lexer error
    pub fn lexer_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Error::LexerError {
            message: message.into(),
            location,
            source_context: String::new(),
        }
    }

    /// Create a new lexer error with source context
    pub fn lexer_error_with_context(
        message: impl Into<String>,
        location: SourceLocation,
        source: &str,
    ) -> Self {
        Error::LexerError {
            message: message.into(),
            source_context: format_error_context(source, &location),
            location,
        }
    }

    /// Create a module graph error
    pub fn module_error(message: impl Into<String>) -> Self {
        Error::ModuleError(message.into())
    }

    /// Create a plugin hook error
    pub fn plugin_error(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PluginError {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport_error(message: impl Into<String>) -> Self {
        Error::TransportError(message.into())
    }

    /// Create an internal invariant violation error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::InternalError(message.into())
    }

    /// Byte offset carried by this error, if it points into a source text
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::LexerError { location, .. } => Some(location.offset),
            _ => None,
        }
    }
}

/// Result type alias for Quickserve
pub type Result<T> = std::result::Result<T, Error>;
