// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for element loading and lookup

use crate::ElementRef;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while loading or looking up elements
///
/// Missing references inside the graph are not errors; resolution skips
/// them. These variants cover the explicit lookups and the input seams.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Element not found in the pool
    #[error("Element {0} not found")]
    ElementNotFound(ElementRef),

    /// Duplicate id while building a pool
    #[error("Duplicate element {0}")]
    Duplicate(ElementRef),

    /// Tag value that could not be interpreted
    #[error("Invalid value for tag {key}: {value:?}")]
    InvalidTag { key: String, value: String },

    /// Malformed input document
    #[error("Invalid input: {0}")]
    InvalidFormat(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ModelError::InvalidFormat(msg.into())
    }

    /// Create a new tag error
    pub fn invalid_tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        ModelError::InvalidTag {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a JSON error
    pub fn json(msg: impl std::fmt::Display) -> Self {
        ModelError::Json(msg.to_string())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ModelError::Other(msg.into())
    }
}
