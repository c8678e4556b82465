// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::RoofShape;
use crate::extrusion::apply_transform;
use crate::{Mesh, Point3, Vector3};
use nalgebra::{Matrix4, Rotation3, Translation3};

/// Base yaw that aligns the local ridge (`z`) with the building
///
/// 90 degrees when the ridge runs along the footprint's `x` span, except for
/// shapes without a ridge.
pub fn pre_angle(shape: RoofShape, ridge_along_x: bool) -> f64 {
    match shape {
        RoofShape::Flat | RoofShape::Dome => 0.0,
        _ if ridge_along_x => 90.0,
        _ => 0.0,
    }
}

/// Where a locally built roof goes on its building
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoofPlacement {
    /// Centre of the roof's bounding box in the building frame
    pub position: Point3<f64>,
    /// Rotation about `+y`, degrees
    pub yaw_deg: f64,
}

impl RoofPlacement {
    /// Place a roof of `roof_height` on a building of `building_height`
    ///
    /// The roof's top touches the building height; `direction` (degrees) is
    /// added to the shape's [`pre_angle`].
    pub fn new(
        center_x: f64,
        center_z: f64,
        building_height: f64,
        roof_height: f64,
        shape: RoofShape,
        ridge_along_x: bool,
        direction: Option<f64>,
    ) -> Self {
        Self {
            position: Point3::new(
                center_x,
                building_height - roof_height / 2.0,
                center_z,
            ),
            yaw_deg: pre_angle(shape, ridge_along_x) + direction.unwrap_or(0.0),
        }
    }

    /// Local-to-building transform: rotate, then translate
    pub fn matrix(&self) -> Matrix4<f64> {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), self.yaw_deg.to_radians());
        Translation3::from(self.position.coords).to_homogeneous() * rotation.to_homogeneous()
    }

    pub fn apply(&self, mesh: &mut Mesh) {
        apply_transform(mesh, &self.matrix());
    }
}
