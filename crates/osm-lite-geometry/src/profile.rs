// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D footprint profiles in the (x, z) plane

use crate::error::{Error, Result};
use crate::triangulation::triangulate_polygon_with_holes;
use nalgebra::Point2;
use std::f64::consts::PI;

/// 2D profile with optional holes
///
/// Points are `(x, z)` with `z` stored in the `y` field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile2D {
    /// Outer boundary
    pub outer: Vec<Point2<f64>>,
    /// Inner rings (courtyards)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Triangle indices into outer followed by each hole
    pub fn triangulate(&self) -> Result<Vec<usize>> {
        if self.outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 vertices"));
        }
        triangulate_polygon_with_holes(&self.outer, &self.holes)
    }

    /// Rectangle centered at the origin
    pub fn rectangle(width: f64, length: f64) -> Self {
        let half_w = width / 2.0;
        let half_l = length / 2.0;

        Self::new(vec![
            Point2::new(-half_w, -half_l),
            Point2::new(half_w, -half_l),
            Point2::new(half_w, half_l),
            Point2::new(-half_w, half_l),
        ])
    }

    /// Circle centered at the origin
    pub fn circle(radius: f64, segments: Option<usize>) -> Self {
        let segments = segments.unwrap_or_else(|| calculate_circle_segments(radius));
        let outer = (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * (i as f64) / (segments as f64);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(outer)
    }

    /// Upper half-disk from angle 0 to PI, both ends included
    ///
    /// Used as the cross-section of a round (barrel) roof.
    pub fn half_disk(radius: f64, segments: usize) -> Self {
        let segments = segments.max(1);
        let outer = (0..=segments)
            .map(|i| {
                let angle = PI * (i as f64) / (segments as f64);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(outer)
    }

    /// Signed area of the outer ring (shoelace; positive when counter-clockwise)
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.outer)
    }
}

/// Shoelace signed area of an open ring
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Calculate adaptive number of segments for a circle
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    let segments = (radius.sqrt() * 8.0).ceil() as usize;
    segments.clamp(8, 32)
}
