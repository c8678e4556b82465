// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration
//!
//! Every field has a default, so a JSON document only needs the values it
//! changes:
//!
//! ```json
//! { "y_meter_scale": 2.0, "prediction_method": "text", "heights_file": "heights.txt" }
//! ```

use crate::error::{CityError, Result};
use osm_lite_geometry::{EquirectangularProjector, NodePrimitive, PrimitiveSize};
use osm_lite_model::{Rgba, ScanMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest usable meter scale; non-positive scales are raised to it
pub const MIN_METER_SCALE: f64 = 0.001;

/// Where a building without a `height` tag gets its height from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    /// Floors times floor height
    #[default]
    None,
    /// External regression table, see [`osm_lite_model::HeightPredictor`]
    Text,
    /// Facade measured on a picture, see [`osm_lite_model::PictureSource`]
    Picture,
}

/// Primitive emitted for node buildings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Box,
    Cylinder,
}

impl From<NodeShape> for NodePrimitive {
    fn from(shape: NodeShape) -> Self {
        match shape {
            NodeShape::Box => NodePrimitive::Box,
            NodeShape::Cylinder => NodePrimitive::Cylinder,
        }
    }
}

/// Picture scan settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureOptions {
    /// Scan for a painted marker instead of facade edges
    pub use_marker: bool,
    /// The measured pixel width spans the building width (else its length)
    pub is_width: bool,
    /// Per-channel colour tolerance
    pub tolerance: f32,
    pub marker_color: Rgba,
    pub edge_color: Rgba,
    /// Shortest vertical run that counts as an edge
    pub min_edge_pixels: u32,
}

impl Default for PictureOptions {
    fn default() -> Self {
        Self {
            use_marker: true,
            is_width: true,
            tolerance: 0.1,
            marker_color: Rgba::rgb(1.0, 0.0, 0.0),
            edge_color: Rgba::rgb(1.0, 1.0, 1.0),
            min_edge_pixels: 20,
        }
    }
}

impl PictureOptions {
    /// Colour and scan mode handed to the picture source
    pub fn scan(&self) -> (Rgba, ScanMode) {
        if self.use_marker {
            (self.marker_color, ScanMode::Marker)
        } else {
            (
                self.edge_color,
                ScanMode::Edges {
                    min_pixels: self.min_edge_pixels,
                },
            )
        }
    }
}

/// Settings shared by every building of a load
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub x_meter_scale: f64,
    pub y_meter_scale: f64,
    pub z_meter_scale: f64,
    /// Terrain centre as `[lat, lon]`; the loader uses the pool's centre when unset
    pub origin: Option<[f64; 2]>,
    /// Height of one storey (meters)
    pub floor_height: f64,
    /// Width of node buildings and zero-span footprints (meters)
    pub default_width: f64,
    /// Length of node buildings and zero-span footprints (meters)
    pub default_length: f64,
    /// Height of one roof level (meters)
    pub roof_level_height: f64,
    pub node_shape: NodeShape,
    pub prediction_method: PredictionMethod,
    /// `id: height` table read by the loader for [`PredictionMethod::Text`]
    pub heights_file: Option<PathBuf>,
    pub picture: PictureOptions,
    pub dome_subdivisions: u32,
    pub arch_segments_per_meter: f64,
    /// Neighbour search radius (meters)
    pub neighbor_radius: f64,
    /// Number of buildings around each one searched for neighbours; negative searches all
    pub neighbor_window: i32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            x_meter_scale: 1.0,
            y_meter_scale: 1.0,
            z_meter_scale: 1.0,
            origin: None,
            floor_height: 3.0,
            default_width: 3.0,
            default_length: 3.0,
            roof_level_height: 1.0,
            node_shape: NodeShape::Box,
            prediction_method: PredictionMethod::None,
            heights_file: None,
            picture: PictureOptions::default(),
            dome_subdivisions: 3,
            arch_segments_per_meter: 10.0,
            neighbor_radius: 50.0,
            neighbor_window: 100,
        }
    }
}

impl CityConfig {
    /// Decode a JSON configuration and sanitize it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CityConfig = serde_json::from_str(json).map_err(CityError::config)?;
        Ok(config.sanitized())
    }

    /// Replace non-positive meter scales by [`MIN_METER_SCALE`]
    pub fn sanitized(mut self) -> Self {
        for (name, scale) in [
            ("x_meter_scale", &mut self.x_meter_scale),
            ("y_meter_scale", &mut self.y_meter_scale),
            ("z_meter_scale", &mut self.z_meter_scale),
        ] {
            if !(*scale > 0.0) {
                log::warn!("{} = {} is not positive, using {}", name, scale, MIN_METER_SCALE);
                *scale = MIN_METER_SCALE;
            }
        }
        self
    }

    /// Projector mirroring the x/z scales and the origin
    pub fn projector(&self) -> EquirectangularProjector {
        let projector = EquirectangularProjector::new(self.x_meter_scale, self.z_meter_scale);
        match self.origin {
            Some([lat, lon]) => projector.with_center(lat, lon),
            None => projector,
        }
    }

    /// Default building width in scene units
    pub fn scaled_default_width(&self) -> f64 {
        self.default_width * self.z_meter_scale
    }

    /// Default building length in scene units
    pub fn scaled_default_length(&self) -> f64 {
        self.default_length * self.x_meter_scale
    }

    pub fn primitive_size(&self) -> PrimitiveSize {
        PrimitiveSize {
            length: self.scaled_default_length(),
            width: self.scaled_default_width(),
            kind: self.node_shape.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use osm_lite_geometry::Projector;

    #[test]
    fn test_defaults() {
        let config = CityConfig::default();
        assert_eq!(config.floor_height, 3.0);
        assert_eq!(config.roof_level_height, 1.0);
        assert_eq!(config.prediction_method, PredictionMethod::None);
        assert_eq!(config.dome_subdivisions, 3);
        assert_eq!(config.primitive_size().kind, NodePrimitive::Box);
    }

    #[test]
    fn test_partial_json() {
        let config = CityConfig::from_json_str(
            r#"{"y_meter_scale": 2.0, "prediction_method": "picture",
                "picture": {"use_marker": false, "min_edge_pixels": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.y_meter_scale, 2.0);
        assert_eq!(config.x_meter_scale, 1.0);
        assert_eq!(config.prediction_method, PredictionMethod::Picture);
        assert!(config.picture.is_width);
        assert_eq!(
            config.picture.scan(),
            (Rgba::rgb(1.0, 1.0, 1.0), ScanMode::Edges { min_pixels: 5 })
        );
    }

    #[test]
    fn test_non_positive_scales_are_raised() {
        let config =
            CityConfig::from_json_str(r#"{"x_meter_scale": 0.0, "z_meter_scale": -3}"#).unwrap();
        assert_eq!(config.x_meter_scale, MIN_METER_SCALE);
        assert_eq!(config.z_meter_scale, MIN_METER_SCALE);
        assert_eq!(config.y_meter_scale, 1.0);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            CityConfig::from_json_str("{\"floor_height\": \"tall\"}"),
            Err(CityError::Config(_))
        ));
    }

    #[test]
    fn test_projector_mirrors_config() {
        let config = CityConfig {
            x_meter_scale: 2.0,
            origin: Some([48.0, 2.0]),
            ..CityConfig::default()
        };
        let projector = config.projector();
        assert_eq!(projector.x_scale(), 2.0);
        let p = projector.project(48.0, 2.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scaled_defaults() {
        let config = CityConfig {
            x_meter_scale: 2.0,
            z_meter_scale: 0.5,
            ..CityConfig::default()
        };
        assert_eq!(config.scaled_default_length(), 6.0);
        assert_eq!(config.scaled_default_width(), 1.5);
    }
}
