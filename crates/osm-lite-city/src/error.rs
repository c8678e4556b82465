// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for building generation

use osm_lite_model::ModelError;
use thiserror::Error;

/// Result type alias for city operations
pub type Result<T> = std::result::Result<T, CityError>;

/// Errors raised at the seams of the city pipeline
///
/// Per-building geometry problems never surface here; a building that
/// cannot be meshed keeps an empty mesh and the failure is logged.
#[derive(Error, Debug)]
pub enum CityError {
    /// Element pool or prediction table error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Geometry error
    #[error("Geometry error: {0}")]
    Geometry(#[from] osm_lite_geometry::Error),

    /// Configuration that could not be decoded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CityError {
    /// Create a configuration error
    pub fn config(msg: impl std::fmt::Display) -> Self {
        CityError::Config(msg.to_string())
    }
}
