// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof shape engine
//!
//! Parametric roofs are generated in a local frame centred on their bounding
//! box: `x` spans the roof width, `z` runs along the ridge (length) and `y`
//! spans `[-height / 2, height / 2]`. Placement then rotates the mesh about
//! `y` and moves it onto the building.
//!
//! Prism-based shapes (gabled, pyramidal, hipped, half-hipped, gambrel,
//! mansard) share one base prism and differ only in the sequence of
//! transforms applied to it; see [`RoofPrism`]. The other shapes are built
//! directly by the functions in `shapes`.

mod placement;
mod router;
mod shapes;
mod transforms;

pub use placement::{pre_angle, RoofPlacement};
pub use router::{
    DomeRoofProcessor, FlatRoofProcessor, PrismRoofProcessor, RoofProcessor, RoofRouter,
    RoundRoofProcessor, SkillionRoofProcessor,
};
pub use shapes::{dome, flat, round, skillion, FLAT_ROOF_HEIGHT};
pub use transforms::{RoofPrism, VertexLevel};

use osm_lite_model::RoofOrientation;
use std::fmt;

/// Roof shapes understood by the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoofShape {
    /// No roof; the extrusion ceiling is the top
    #[default]
    None,
    Gabled,
    Pyramidal,
    Hipped,
    HalfHipped,
    Skillion,
    Gambrel,
    Mansard,
    Round,
    Dome,
    Flat,
}

impl RoofShape {
    /// Parse a `roof:shape` value
    ///
    /// `pitched` is an alias of `gabled`. Unknown values give `None` so the
    /// caller can log them.
    pub fn parse(value: &str) -> Option<Self> {
        let shape = match value.trim().to_ascii_lowercase().as_str() {
            "none" => RoofShape::None,
            "gabled" | "pitched" => RoofShape::Gabled,
            "pyramidal" => RoofShape::Pyramidal,
            "hipped" => RoofShape::Hipped,
            "half-hipped" | "half_hipped" => RoofShape::HalfHipped,
            "skillion" => RoofShape::Skillion,
            "gambrel" => RoofShape::Gambrel,
            "mansard" => RoofShape::Mansard,
            "round" => RoofShape::Round,
            "dome" => RoofShape::Dome,
            "flat" => RoofShape::Flat,
            _ => return None,
        };
        Some(shape)
    }

    /// Tag value for this shape
    pub fn as_str(&self) -> &'static str {
        match self {
            RoofShape::None => "none",
            RoofShape::Gabled => "gabled",
            RoofShape::Pyramidal => "pyramidal",
            RoofShape::Hipped => "hipped",
            RoofShape::HalfHipped => "half-hipped",
            RoofShape::Skillion => "skillion",
            RoofShape::Gambrel => "gambrel",
            RoofShape::Mansard => "mansard",
            RoofShape::Round => "round",
            RoofShape::Dome => "dome",
            RoofShape::Flat => "flat",
        }
    }

    /// Shapes derived from the shared base prism
    pub fn is_prism_based(&self) -> bool {
        matches!(
            self,
            RoofShape::Gabled
                | RoofShape::Pyramidal
                | RoofShape::Hipped
                | RoofShape::HalfHipped
                | RoofShape::Gambrel
                | RoofShape::Mansard
        )
    }
}

impl fmt::Display for RoofShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roof extent derived from the footprint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoofFrame {
    /// Extent across the ridge
    pub width: f64,
    /// Extent along the ridge
    pub length: f64,
    /// The ridge follows the footprint's `x` span
    pub ridge_along_x: bool,
}

impl RoofFrame {
    /// Choose width and length from the footprint spans
    ///
    /// `along` puts the ridge on the longer side, `across` on the shorter.
    /// Equal spans count as a ridge along `x`.
    pub fn new(x_span: f64, z_span: f64, orientation: RoofOrientation) -> Self {
        let (width, length) = match orientation {
            RoofOrientation::Along => (x_span.min(z_span), x_span.max(z_span)),
            RoofOrientation::Across => (x_span.max(z_span), x_span.min(z_span)),
        };
        Self {
            width,
            length,
            ridge_along_x: length == x_span,
        }
    }
}

/// Roof height from tags, in scene units
///
/// Precedence: an explicit positive `roof:height` (scaled by `y_scale`),
/// then a non-zero slope angle (`|tan(angle)| * width / 2`), then
/// `level_height * levels` scaled by `y_scale`.
pub fn roof_height(
    explicit: Option<f64>,
    angle_deg: Option<f64>,
    levels: i32,
    width: f64,
    y_scale: f64,
    level_height: f64,
) -> f64 {
    if let Some(h) = explicit.filter(|h| *h > 0.0) {
        return h * y_scale;
    }
    if let Some(angle) = angle_deg.filter(|a| *a != 0.0) {
        return angle.to_radians().tan().abs() * width / 2.0;
    }
    level_height * y_scale * levels as f64
}

/// Everything a roof processor needs
#[derive(Clone, Debug, PartialEq)]
pub struct RoofParams {
    pub shape: RoofShape,
    /// Extent across the ridge
    pub width: f64,
    /// Extent along the ridge
    pub length: f64,
    /// Height from [`roof_height`]; round, dome and flat override it
    pub height: f64,
    /// Footprint `x` span, used by flat roofs
    pub footprint_x: f64,
    /// Footprint `z` span, used by flat roofs
    pub footprint_z: f64,
    /// Ridge shortening at each end; shape default when `None`
    pub hip_length: Option<f64>,
    /// Height of the eave break above the base; `height / 2` when `None`
    pub hip_height: Option<f64>,
    /// Outward push of the eave break across the ridge; `0.1 * width` when `None`
    pub mid_width: Option<f64>,
    /// Outward push of the eave break along the ridge; `0.1 * width` when `None`
    pub mid_length: Option<f64>,
    pub arch_segments_per_meter: f64,
    pub dome_subdivisions: u32,
}

impl RoofParams {
    pub fn new(shape: RoofShape, width: f64, length: f64, height: f64) -> Self {
        Self {
            shape,
            width,
            length,
            height,
            footprint_x: width,
            footprint_z: length,
            hip_length: None,
            hip_height: None,
            mid_width: None,
            mid_length: None,
            arch_segments_per_meter: 10.0,
            dome_subdivisions: 3,
        }
    }

    /// Height the generated mesh actually has
    pub fn effective_height(&self) -> f64 {
        match self.shape {
            RoofShape::Flat => FLAT_ROOF_HEIGHT,
            RoofShape::Round | RoofShape::Dome => self.width / 2.0,
            _ => self.height,
        }
    }

    /// Hip length, defaulting per shape
    pub fn hip_length(&self) -> f64 {
        if let Some(w) = self.hip_length {
            return w;
        }
        let half = self.width.min(self.length) / 2.0;
        match self.shape {
            RoofShape::Gabled | RoofShape::Gambrel => 0.0,
            RoofShape::Pyramidal => self.length / 2.0,
            RoofShape::HalfHipped | RoofShape::Mansard => half / 2.0,
            _ => half,
        }
    }

    pub fn hip_height(&self) -> f64 {
        self.hip_height.unwrap_or(self.height / 2.0)
    }

    pub fn mid_width(&self) -> f64 {
        self.mid_width.unwrap_or(0.1 * self.width)
    }

    pub fn mid_length(&self) -> f64 {
        self.mid_length.unwrap_or(0.1 * self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_shape() {
        assert_eq!(RoofShape::parse("pitched"), Some(RoofShape::Gabled));
        assert_eq!(RoofShape::parse("Half-Hipped"), Some(RoofShape::HalfHipped));
        assert_eq!(RoofShape::parse("dome"), Some(RoofShape::Dome));
        assert_eq!(RoofShape::parse("onion"), None);
        assert_eq!(RoofShape::Mansard.to_string(), "mansard");
        assert!(RoofShape::Gambrel.is_prism_based());
        assert!(!RoofShape::Skillion.is_prism_based());
    }

    #[test]
    fn test_frame_orientation() {
        let along = RoofFrame::new(20.0, 10.0, RoofOrientation::Along);
        assert_eq!((along.width, along.length), (10.0, 20.0));
        assert!(along.ridge_along_x);

        let across = RoofFrame::new(20.0, 10.0, RoofOrientation::Across);
        assert_eq!((across.width, across.length), (20.0, 10.0));
        assert!(!across.ridge_along_x);

        assert!(RoofFrame::new(5.0, 5.0, RoofOrientation::Across).ridge_along_x);
    }

    #[test]
    fn test_roof_height_precedence() {
        assert_relative_eq!(roof_height(Some(3.0), Some(45.0), 2, 10.0, 2.0, 1.0), 6.0);
        assert_relative_eq!(
            roof_height(Some(0.0), Some(45.0), 2, 10.0, 2.0, 1.0),
            5.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            roof_height(None, Some(-45.0), 2, 10.0, 2.0, 1.0),
            5.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(roof_height(None, None, 2, 10.0, 2.0, 1.0), 4.0);
    }

    #[test]
    fn test_param_defaults() {
        let mut p = RoofParams::new(RoofShape::Hipped, 8.0, 20.0, 4.0);
        assert_eq!(p.hip_length(), 4.0);
        assert_eq!(p.hip_height(), 2.0);
        p.shape = RoofShape::Pyramidal;
        assert_eq!(p.hip_length(), 10.0);
        p.shape = RoofShape::Gabled;
        assert_eq!(p.hip_length(), 0.0);
        p.shape = RoofShape::Dome;
        assert_eq!(p.effective_height(), 4.0);
        p.hip_length = Some(1.5);
        assert_eq!(p.hip_length(), 1.5);
    }
}
