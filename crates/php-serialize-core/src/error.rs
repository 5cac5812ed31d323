//! Error types for PHP serialize encoding and decoding.
//!
//! This module provides detailed error types with context information
//! to help debug malformed payloads and unsupported values.

use std::fmt;
use thiserror::Error;

/// The main error type for the PHP serialize codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct PhpSerializeError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The byte position where the error occurred, when decoding.
    /// Encode-side and helper errors carry no position.
    pub position: Option<usize>,
    /// Optional context about what was being processed.
    pub context: Option<String>,
    /// Preview of input around the error position for debugging.
    pub input_preview: Option<String>,
}

impl fmt::Display for PhpSerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(position) = self.position {
            write!(f, " at position {}", position)?;
        }
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        if let Some(ref preview) = self.input_preview {
            write!(f, "\n{}", preview)?;
        }
        Ok(())
    }
}

/// Specific kinds of codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Expected a specific character but found something else.
    #[error("expected '{expected}', found '{found}'")]
    UnexpectedChar {
        /// The character that was expected.
        expected: char,
        /// The character that was found.
        found: char,
    },

    /// Unknown type tag at the start of a node.
    #[error("unknown type tag '{0}'")]
    UnknownTag(char),

    /// Invalid integer payload.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid float payload.
    #[error("invalid float: {0}")]
    InvalidFloat(String),

    /// Invalid boolean payload.
    #[error("invalid boolean value: {0}")]
    InvalidBoolean(String),

    /// Declared byte length exceeds the remaining input.
    #[error("string length mismatch: expected {expected} bytes, found {found}")]
    StringLengthMismatch {
        /// The declared payload length in bytes.
        expected: usize,
        /// The actual number of bytes available.
        found: usize,
    },

    /// Invalid UTF-8 sequence where text was requested.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,

    /// Invalid array key type.
    #[error("invalid array key type: expected a scalar")]
    InvalidArrayKey,

    /// Fewer key/value pairs than the declared count.
    #[error("pair count mismatch: declared {declared}, found {found}")]
    PairCountMismatch {
        /// The count declared in the prefix.
        declared: usize,
        /// The number of pairs actually present.
        found: usize,
    },

    /// Invalid object member name type.
    #[error("invalid object member name: expected string")]
    InvalidMemberName,

    /// Input continues after a complete top-level node.
    #[error("unconsumed trailing data ({remaining} bytes)")]
    TrailingData {
        /// Number of bytes left over after the node.
        remaining: usize,
    },

    /// Encode-side: no grammar mapping for the given value and no hook took it.
    #[error("cannot encode value of type {0}")]
    UnsupportedType(&'static str),

    /// Coercion helper: array keys are not a contiguous zero-based range.
    #[error("array keys are not exactly 0..{len}")]
    KeyRange {
        /// Number of entries in the array.
        len: usize,
    },

    /// Generic object member lookup miss.
    #[error("object '{class}' has no member '{member}'")]
    MissingMember {
        /// Class name of the object.
        class: String,
        /// The member that was requested.
        member: String,
    },

    /// An underlying read or write failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl PhpSerializeError {
    /// Create a new decode error with the given kind and byte position.
    #[inline]
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position: Some(position),
            context: None,
            input_preview: None,
        }
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a pre-rendered input preview.
    #[inline]
    pub fn with_preview(mut self, preview: Option<String>) -> Self {
        self.input_preview = preview;
        self
    }
}

impl From<ErrorKind> for PhpSerializeError {
    /// Build a position-less error, used on the encode side and in helpers.
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
            context: None,
            input_preview: None,
        }
    }
}

impl From<std::io::Error> for PhpSerializeError {
    fn from(err: std::io::Error) -> Self {
        ErrorKind::Io(err.to_string()).into()
    }
}

/// Render a preview of the input around the error position.
///
/// Shows up to 20 bytes before and after the position, with a caret
/// marking the offending byte.
#[cold]
pub(crate) fn input_preview(data: &[u8], error_pos: usize) -> Option<String> {
    let start = error_pos.saturating_sub(20);
    let end = (error_pos + 20).min(data.len());
    if start >= end {
        return None;
    }

    let preview = String::from_utf8_lossy(&data[start..end]);
    let relative_pos = error_pos.saturating_sub(start);
    let mut result = String::with_capacity(preview.len() + relative_pos + 2);
    result.push_str(&preview);
    result.push('\n');
    result.push_str(&" ".repeat(relative_pos));
    result.push('^');
    Some(result)
}

/// Result type alias for the PHP serialize codec.
pub type Result<T> = std::result::Result<T, PhpSerializeError>;
