// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator traits for height prediction
//!
//! Buildings without a usable `height` tag can take their height from an
//! external source. Neither the regression model nor the pixel scanner is
//! part of this workspace; they plug in through these traits.

use crate::{ElementId, Rgba};
use serde::{Deserialize, Serialize};

/// Height lookup produced by an external regression model
pub trait HeightPredictor: Send + Sync {
    /// Predicted height in meters, or `None` if the model has no value
    fn predict_height(&self, id: ElementId) -> Option<f64>;
}

/// How a picture is scanned for the building's extent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Bounding box of every pixel matching a marker colour
    Marker,
    /// Vertical runs of at least `min_pixels` matching pixels
    Edges { min_pixels: u32 },
}

/// Measures a building facade in a photograph
///
/// Implementations own the pixel data; the core only consumes the measured
/// extent in pixels.
pub trait PictureSource: Send + Sync {
    /// Pixel `(width, height)` of the matched region for one building
    ///
    /// Returns `None` when no picture is available or nothing matched.
    fn measure(
        &self,
        id: ElementId,
        target: Rgba,
        tolerance: f32,
        mode: ScanMode,
    ) -> Option<(u32, u32)>;
}
