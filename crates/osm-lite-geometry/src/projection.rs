// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geographic to planar projection
//!
//! Geometry is built in a local metric frame: `x` grows east, `z` grows
//! north, `y` is up. A [`Projector`] maps latitude/longitude into the
//! `(x, z)` plane; the returned `Point2` stores `z` in its `y` field.

use crate::Point2;

/// Earth circumference at the equator (meters)
const EQUATOR_LENGTH: f64 = 40_075_017.0;

/// Length of one degree of latitude (meters), sampled every 15 degrees
const LAT_DEG_DIST: [i64; 7] = [110_574, 110_649, 110_852, 111_132, 111_412, 111_618, 111_694];

/// Maps geographic coordinates to the planar `(x, z)` frame
pub trait Projector: Send + Sync {
    /// Project a (lat, lon) pair; the result's `y` is the planar `z`
    fn project(&self, lat: f64, lon: f64) -> Point2<f64>;
}

/// Meters per degree of latitude at a whole-degree latitude
///
/// Linear interpolation of [`LAT_DEG_DIST`] in integer arithmetic; 90 and
/// above return the polar value.
pub fn lat_deg_dist(lat: i64) -> i64 {
    let lat = lat.clamp(0, 90);
    let ind = (lat * 6 / 90) as usize;
    if ind + 1 >= LAT_DEG_DIST.len() {
        return LAT_DEG_DIST[LAT_DEG_DIST.len() - 1];
    }
    let d = LAT_DEG_DIST[ind + 1] - LAT_DEG_DIST[ind];
    LAT_DEG_DIST[ind] + (lat - ind as i64 * 15) * d / 15
}

/// Mean meters per degree between the equator and `lat`
fn mean_lat_deg_dist(lat: f64) -> f64 {
    let upper = lat.abs().round().min(90.0) as i64;
    let sum: i64 = (0..=upper).map(lat_deg_dist).sum();
    sum as f64 / (upper + 1) as f64
}

/// Equirectangular projection with per-axis meter scales
///
/// `z = lat * mean(lat_deg_dist(0..=|lat|))`, `x = lon * 40075017 / 360`.
/// Both are multiplied by their scale and shifted so that the configured
/// terrain centre lands on the origin.
#[derive(Clone, Debug)]
pub struct EquirectangularProjector {
    x_scale: f64,
    z_scale: f64,
    origin: Point2<f64>,
}

impl EquirectangularProjector {
    pub fn new(x_scale: f64, z_scale: f64) -> Self {
        Self {
            x_scale,
            z_scale,
            origin: Point2::origin(),
        }
    }

    /// Place the origin at the projection of `(lat, lon)`
    pub fn with_center(mut self, lat: f64, lon: f64) -> Self {
        self.origin = Point2::origin();
        self.origin = self.project(lat, lon);
        self
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }

    pub fn z_scale(&self) -> f64 {
        self.z_scale
    }
}

impl Default for EquirectangularProjector {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Projector for EquirectangularProjector {
    fn project(&self, lat: f64, lon: f64) -> Point2<f64> {
        let z = lat * mean_lat_deg_dist(lat);
        let x = lon * EQUATOR_LENGTH / 360.0;
        Point2::new(
            x * self.x_scale - self.origin.x,
            z * self.z_scale - self.origin.y,
        )
    }
}
