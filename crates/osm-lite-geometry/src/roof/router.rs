// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof Router - Dynamic dispatch to roof processors
//!
//! Routes a roof shape to the processor registered for it. Processors build
//! the roof in its local frame; placement is the caller's business.

use super::shapes::{dome, flat, round, skillion};
use super::transforms::RoofPrism;
use super::{RoofParams, RoofShape};
use crate::{Error, Mesh, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Roof processor trait
///
/// Each processor handles one or more roof shapes.
pub trait RoofProcessor: Send + Sync {
    /// Build the roof mesh in its local frame
    fn process(&self, params: &RoofParams) -> Result<Mesh>;

    /// Get supported roof shapes
    fn supported_shapes(&self) -> Vec<RoofShape>;
}

/// Shapes derived from the base prism by a sequence of transforms
pub struct PrismRoofProcessor;

impl PrismRoofProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PrismRoofProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoofProcessor for PrismRoofProcessor {
    fn process(&self, params: &RoofParams) -> Result<Mesh> {
        let mut prism = RoofPrism::new(params.width, params.height, params.length);
        let hip_length = params.hip_length();

        let applied = match params.shape {
            RoofShape::Gabled => true,
            RoofShape::Pyramidal | RoofShape::Hipped => prism.to_hipped(hip_length),
            RoofShape::HalfHipped => {
                prism.create_mid_vertices(0.0, params.hip_height())
                    && prism.to_hipped(hip_length)
            }
            RoofShape::Gambrel => {
                prism.create_mid_vertices(0.0, params.hip_height())
                    && prism.translate_mid_vertices(0.0, params.mid_width(), 0.0)
            }
            RoofShape::Mansard => {
                prism.to_hipped(hip_length)
                    && prism.create_mid_vertices(hip_length, params.hip_height())
                    && prism.translate_mid_vertices(
                        hip_length,
                        params.mid_width(),
                        params.mid_length(),
                    )
            }
            other => return Err(Error::unsupported_shape(other.as_str())),
        };
        if !applied {
            log::debug!(
                "{} roof left partially transformed ({} x {} x {})",
                params.shape,
                params.width,
                params.height,
                params.length
            );
        }

        Ok(prism.into_mesh())
    }

    fn supported_shapes(&self) -> Vec<RoofShape> {
        vec![
            RoofShape::Gabled,
            RoofShape::Pyramidal,
            RoofShape::Hipped,
            RoofShape::HalfHipped,
            RoofShape::Gambrel,
            RoofShape::Mansard,
        ]
    }
}

/// Single-slope roofs
pub struct SkillionRoofProcessor;

impl SkillionRoofProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SkillionRoofProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoofProcessor for SkillionRoofProcessor {
    fn process(&self, params: &RoofParams) -> Result<Mesh> {
        Ok(skillion(params.width, params.height, params.length))
    }

    fn supported_shapes(&self) -> Vec<RoofShape> {
        vec![RoofShape::Skillion]
    }
}

/// Flat roofs: a plane over the footprint extent
pub struct FlatRoofProcessor;

impl FlatRoofProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FlatRoofProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoofProcessor for FlatRoofProcessor {
    fn process(&self, params: &RoofParams) -> Result<Mesh> {
        Ok(flat(params.footprint_x, params.footprint_z))
    }

    fn supported_shapes(&self) -> Vec<RoofShape> {
        vec![RoofShape::Flat]
    }
}

/// Barrel roofs
pub struct RoundRoofProcessor;

impl RoundRoofProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RoundRoofProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoofProcessor for RoundRoofProcessor {
    fn process(&self, params: &RoofParams) -> Result<Mesh> {
        if !(params.width > 0.0) {
            return Err(Error::geometry(format!(
                "round roof needs a positive width, got {}",
                params.width
            )));
        }
        Ok(round(
            params.width,
            params.length,
            params.arch_segments_per_meter,
        ))
    }

    fn supported_shapes(&self) -> Vec<RoofShape> {
        vec![RoofShape::Round]
    }
}

/// Hemispherical roofs
pub struct DomeRoofProcessor;

impl DomeRoofProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DomeRoofProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoofProcessor for DomeRoofProcessor {
    fn process(&self, params: &RoofParams) -> Result<Mesh> {
        if !(params.width > 0.0) {
            return Err(Error::geometry(format!(
                "dome needs a positive width, got {}",
                params.width
            )));
        }
        Ok(dome(params.width / 2.0, params.dome_subdivisions))
    }

    fn supported_shapes(&self) -> Vec<RoofShape> {
        vec![RoofShape::Dome]
    }
}

/// Roof router - routes shapes to processors
pub struct RoofRouter {
    /// Registered processors by shape
    processors: HashMap<RoofShape, Arc<dyn RoofProcessor>>,
}

impl RoofRouter {
    /// Create new router without any processors registered
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Create router with default processors registered
    ///
    /// Registers the following processors:
    /// - `PrismRoofProcessor` (gabled, pyramidal, hipped, half-hipped, gambrel, mansard)
    /// - `SkillionRoofProcessor` (skillion)
    /// - `FlatRoofProcessor` (flat)
    /// - `RoundRoofProcessor` (round)
    /// - `DomeRoofProcessor` (dome)
    pub fn with_default_processors() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(PrismRoofProcessor::new()));
        router.register(Arc::new(SkillionRoofProcessor::new()));
        router.register(Arc::new(FlatRoofProcessor::new()));
        router.register(Arc::new(RoundRoofProcessor::new()));
        router.register(Arc::new(DomeRoofProcessor::new()));
        router
    }

    /// Register a roof processor
    pub fn register(&mut self, processor: Arc<dyn RoofProcessor>) {
        for shape in processor.supported_shapes() {
            self.processors.insert(shape, Arc::clone(&processor));
        }
    }

    /// Check if a shape has a registered processor
    pub fn has_processor(&self, shape: &RoofShape) -> bool {
        self.processors.contains_key(shape)
    }

    /// Build the roof for `params` in its local frame
    pub fn build(&self, params: &RoofParams) -> Result<Mesh> {
        let processor = self
            .processors
            .get(&params.shape)
            .ok_or_else(|| Error::unsupported_shape(params.shape.as_str()))?;
        processor.process(params)
    }
}

impl Default for RoofRouter {
    fn default() -> Self {
        Self::with_default_processors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceRole;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_processors() {
        let router = RoofRouter::with_default_processors();
        assert!(router.has_processor(&RoofShape::Mansard));
        assert!(router.has_processor(&RoofShape::Dome));
        assert!(!router.has_processor(&RoofShape::None));
        assert!(!RoofRouter::new().has_processor(&RoofShape::Gabled));
    }

    #[test]
    fn test_none_is_unsupported() {
        let router = RoofRouter::with_default_processors();
        let params = RoofParams::new(RoofShape::None, 6.0, 10.0, 2.0);
        assert!(matches!(
            router.build(&params),
            Err(Error::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_gabled_equals_hipped_without_hip() {
        let router = RoofRouter::with_default_processors();
        let gabled = router
            .build(&RoofParams::new(RoofShape::Gabled, 6.0, 10.0, 2.0))
            .unwrap();
        let mut hipped = RoofParams::new(RoofShape::Hipped, 6.0, 10.0, 2.0);
        hipped.hip_length = Some(0.0);
        assert_eq!(router.build(&hipped).unwrap(), gabled);
        assert_eq!(gabled.faces_with_role(FaceRole::Wall).count(), 2);
    }

    #[test]
    fn test_hipped_has_no_gable_walls() {
        let router = RoofRouter::with_default_processors();
        let mesh = router
            .build(&RoofParams::new(RoofShape::Hipped, 6.0, 10.0, 2.0))
            .unwrap();
        assert_eq!(mesh.faces_with_role(FaceRole::Wall).count(), 0);
        assert_eq!(mesh.faces_with_role(FaceRole::Roof).count(), 4);
        // ridge shortened by min(w, l) / 2 = 3 at each end
        let ridge: Vec<f64> = mesh
            .positions
            .iter()
            .filter(|p| (p.y - 1.0).abs() < 1e-9)
            .map(|p| p.z)
            .collect();
        assert_eq!(ridge.len(), 2);
        assert_relative_eq!(ridge[0].abs(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pyramidal_apex() {
        let router = RoofRouter::with_default_processors();
        let mesh = router
            .build(&RoofParams::new(RoofShape::Pyramidal, 8.0, 8.0, 3.0))
            .unwrap();
        for p in mesh.positions.iter().filter(|p| p.y > 0.0) {
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
            assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_every_shape_builds() {
        let router = RoofRouter::with_default_processors();
        for shape in [
            RoofShape::Gabled,
            RoofShape::Pyramidal,
            RoofShape::Hipped,
            RoofShape::HalfHipped,
            RoofShape::Skillion,
            RoofShape::Gambrel,
            RoofShape::Mansard,
            RoofShape::Round,
            RoofShape::Dome,
            RoofShape::Flat,
        ] {
            let params = RoofParams::new(shape, 6.0, 10.0, 2.0);
            let mesh = router.build(&params).unwrap();
            assert!(!mesh.is_empty(), "{} produced no geometry", shape);
            if shape == RoofShape::Flat {
                continue;
            }
            let (min, max) = mesh.bounds().unwrap();
            assert_relative_eq!(max.y - min.y, params.effective_height(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_round_rejects_zero_width() {
        let router = RoofRouter::with_default_processors();
        let params = RoofParams::new(RoofShape::Round, 0.0, 10.0, 2.0);
        assert!(router.build(&params).is_err());
    }
}
