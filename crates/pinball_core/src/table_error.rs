//! Table error types
//!
//! Errors raised while loading, saving or instantiating a table.

use std::fmt;
use std::io;

/// Error type for table operations
#[derive(Debug)]
pub enum TableError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax or unknown fields)
    Parse(ron::error::SpannedError),
    /// Serialization error
    Serialize(ron::Error),
    /// A mesh references missing vertices or has no usable triangles
    InvalidMesh(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io(err) => write!(f, "Table IO error: {}", err),
            TableError::Parse(err) => write!(f, "Table parse error: {}", err),
            TableError::Serialize(err) => write!(f, "Table serialize error: {}", err),
            TableError::InvalidMesh(msg) => write!(f, "Invalid mesh: {}", msg),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Io(err) => Some(err),
            TableError::Parse(err) => Some(err),
            TableError::Serialize(err) => Some(err),
            TableError::InvalidMesh(_) => None,
        }
    }
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> Self {
        TableError::Io(err)
    }
}

impl From<ron::error::SpannedError> for TableError {
    fn from(err: ron::error::SpannedError) -> Self {
        TableError::Parse(err)
    }
}

impl From<ron::Error> for TableError {
    fn from(err: ron::Error) -> Self {
        TableError::Serialize(err)
    }
}
