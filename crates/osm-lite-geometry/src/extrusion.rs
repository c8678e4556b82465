// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - turning footprints into building prisms
//!
//! Footprints live in the `(x, z)` plane and are extruded along `+y`. The
//! resulting faces carry [`FaceRole::Ground`], [`FaceRole::Ceiling`] and
//! [`FaceRole::Wall`] so a roof can later find and move the ceiling.

use crate::error::{Error, Result};
use crate::mesh::{Face, FaceRole, Mesh};
use crate::profile::{calculate_circle_segments, signed_area, Profile2D};
use nalgebra::{Matrix4, Point2, Point3};

/// Shape emitted for buildings that have no usable polygon
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodePrimitive {
    #[default]
    Box,
    Cylinder,
}

/// Extrude a profile (with holes) from `base_y` up by `height`
///
/// Outer rings are normalised to counter-clockwise and holes to clockwise,
/// so ground faces point down, ceilings up and walls outward. Bottom rings
/// come first in the vertex list, then the top rings in the same order.
pub fn extrude_profile(profile: &Profile2D, base_y: f64, height: f64) -> Result<Mesh> {
    if profile.outer.len() < 3 {
        return Err(Error::profile(format!(
            "cannot extrude a ring of {} points",
            profile.outer.len()
        )));
    }
    if !(height > 0.0) {
        return Err(Error::geometry(format!(
            "extrusion height must be positive, got {}",
            height
        )));
    }

    let mut rings: Vec<Vec<Point2<f64>>> = Vec::with_capacity(1 + profile.holes.len());
    rings.push(oriented(&profile.outer, true));
    for hole in profile.holes.iter().filter(|h| h.len() >= 3) {
        rings.push(oriented(hole, false));
    }

    let total: usize = rings.iter().map(Vec::len).sum();
    let mut mesh = Mesh::with_capacity(total * 2, 2 + total);

    let mut loops: Vec<Vec<usize>> = Vec::with_capacity(rings.len());
    for ring in &rings {
        let start = mesh.vertex_count();
        for p in ring {
            mesh.add_vertex(Point3::new(p.x, base_y, p.y));
        }
        loops.push((start..mesh.vertex_count()).collect());
    }
    for ring in &rings {
        for p in ring {
            mesh.add_vertex(Point3::new(p.x, base_y + height, p.y));
        }
    }

    // Ground keeps the ring order (faces down), ceiling reverses it
    let ground_outer = loops[0].clone();
    let ground_holes: Vec<Vec<usize>> = loops[1..].to_vec();
    let top = |l: &Vec<usize>| -> Vec<usize> { l.iter().rev().map(|i| i + total).collect() };
    let ceiling_outer = top(&loops[0]);
    let ceiling_holes: Vec<Vec<usize>> = loops[1..].iter().map(top).collect();

    mesh.faces
        .push(Face::with_holes(ground_outer, ground_holes, FaceRole::Ground));
    mesh.faces
        .push(Face::with_holes(ceiling_outer, ceiling_holes, FaceRole::Ceiling));

    for ring in &loops {
        let n = ring.len();
        for k in 0..n {
            let b0 = ring[k];
            let b1 = ring[(k + 1) % n];
            mesh.add_face(vec![b0, b0 + total, b1 + total, b1], FaceRole::Wall);
        }
    }

    Ok(mesh)
}

fn oriented(ring: &[Point2<f64>], ccw: bool) -> Vec<Point2<f64>> {
    let mut ring = ring.to_vec();
    if (signed_area(&ring) > 0.0) != ccw {
        ring.reverse();
    }
    ring
}

/// Box of size `(length, height, width)` standing on `base`
///
/// `length` runs along `x` and `width` along `z`; the box is centred on
/// `(base.x, base.y + height / 2, base.z)`.
pub fn box_primitive(base: Point3<f64>, length: f64, height: f64, width: f64) -> Result<Mesh> {
    let mut profile = Profile2D::rectangle(length, width);
    shift(&mut profile, base);
    extrude_profile(&profile, base.y, height)
}

/// Upright cylinder of `radius` standing on `base`
pub fn cylinder_primitive(base: Point3<f64>, radius: f64, height: f64) -> Result<Mesh> {
    let mut profile = Profile2D::circle(radius, Some(calculate_circle_segments(radius)));
    shift(&mut profile, base);
    extrude_profile(&profile, base.y, height)
}

fn shift(profile: &mut Profile2D, base: Point3<f64>) {
    for p in &mut profile.outer {
        p.x += base.x;
        p.y += base.z;
    }
}

/// Dimensions used when a footprint degrades to primitives
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimitiveSize {
    pub length: f64,
    pub width: f64,
    pub kind: NodePrimitive,
}

impl Default for PrimitiveSize {
    fn default() -> Self {
        Self {
            length: 3.0,
            width: 3.0,
            kind: NodePrimitive::Box,
        }
    }
}

impl PrimitiveSize {
    fn build(&self, base: Point3<f64>, height: f64) -> Result<Mesh> {
        match self.kind {
            NodePrimitive::Box => box_primitive(base, self.length, height, self.width),
            NodePrimitive::Cylinder => {
                cylinder_primitive(base, self.length.min(self.width) / 2.0, height)
            }
        }
    }
}

/// Extrude a resolved footprint ring
///
/// - 3 or more points: a prism
/// - 2 points: one primitive at each endpoint
/// - 1 point: a single primitive
/// - no points: an empty mesh
pub fn extrude_footprint(
    ring: &[Point2<f64>],
    base_y: f64,
    height: f64,
    primitive: PrimitiveSize,
) -> Result<Mesh> {
    match ring.len() {
        0 => Ok(Mesh::new()),
        1 | 2 => {
            let mut mesh = Mesh::new();
            for p in ring {
                mesh.merge(&primitive.build(Point3::new(p.x, base_y, p.y), height)?);
            }
            Ok(mesh)
        }
        _ => extrude_profile(&Profile2D::new(ring.to_vec()), base_y, height),
    }
}

/// Apply a transformation matrix to every vertex
#[inline]
pub fn apply_transform(mesh: &mut Mesh, transform: &Matrix4<f64>) {
    for p in &mut mesh.positions {
        *p = transform.transform_point(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    const BOX: PrimitiveSize = PrimitiveSize {
        length: 3.0,
        width: 3.0,
        kind: NodePrimitive::Box,
    };

    #[test]
    fn test_prism_roles_and_normals() {
        let mesh = extrude_footprint(&unit_square(), 0.0, 9.0, BOX).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);

        let ground = mesh.ground_face().unwrap();
        let ceiling = mesh.ceiling_face().unwrap();
        assert_relative_eq!(mesh.face_normal(ground).y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.face_normal(ceiling).y, 1.0, epsilon = 1e-12);
        assert!(mesh.face_points(ceiling).iter().all(|p| p.y == 9.0));
        assert_relative_eq!(mesh.area_of_role(FaceRole::Ground), 1.0, epsilon = 1e-12);

        // walls face away from the footprint centre
        for wall in mesh.faces_with_role(FaceRole::Wall) {
            let pts = mesh.face_points(wall);
            let mid = pts.iter().fold(nalgebra::Vector3::zeros(), |a, p| a + p.coords) / 4.0;
            let out = mid - nalgebra::Vector3::new(0.5, mid.y, 0.5);
            assert!(mesh.face_normal(wall).dot(&out) > 0.0);
        }
    }

    #[test]
    fn test_clockwise_ring_is_normalised() {
        let mut ring = unit_square();
        ring.reverse();
        let mesh = extrude_footprint(&ring, 0.0, 1.0, BOX).unwrap();
        let ceiling = mesh.ceiling_face().unwrap();
        assert_relative_eq!(mesh.face_normal(ceiling).y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prism_with_hole() {
        let mut profile = Profile2D::rectangle(4.0, 4.0);
        profile.add_hole(Profile2D::rectangle(2.0, 2.0).outer);
        let mesh = extrude_profile(&profile, 0.0, 3.0).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.faces_with_role(FaceRole::Wall).count(), 8);
        assert_relative_eq!(mesh.area_of_role(FaceRole::Ground), 12.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.area_of_role(FaceRole::Ceiling), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_points_become_two_boxes() {
        let ring = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)];
        let mesh = extrude_footprint(&ring, 0.0, 6.0, BOX).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.faces_with_role(FaceRole::Ceiling).count(), 2);
    }

    #[test]
    fn test_single_point_box_centered() {
        let ring = vec![Point2::new(5.0, -2.0)];
        let mesh = extrude_footprint(&ring, 0.0, 6.0, BOX).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!((min.x + max.x) / 2.0, 5.0);
        assert_relative_eq!((min.y + max.y) / 2.0, 3.0);
        assert_relative_eq!((min.z + max.z) / 2.0, -2.0);
        assert_relative_eq!(max.x - min.x, 3.0);
    }

    #[test]
    fn test_cylinder_primitive() {
        let size = PrimitiveSize {
            kind: NodePrimitive::Cylinder,
            ..BOX
        };
        let mesh = extrude_footprint(&[Point2::new(0.0, 0.0)], 0.0, 2.0, size).unwrap();
        assert!(mesh.vertex_count() >= 16);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x, 1.5, epsilon = 1e-9);
        assert_relative_eq!(min.y, 0.0);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(extrude_footprint(&[], 0.0, 3.0, BOX).unwrap().is_empty());
        assert!(extrude_footprint(&unit_square(), 0.0, 0.0, BOX).is_err());
    }

    #[test]
    fn test_apply_transform() {
        let mut mesh = extrude_footprint(&unit_square(), 0.0, 1.0, BOX).unwrap();
        let m = Matrix4::new_translation(&nalgebra::Vector3::new(1.0, 2.0, 3.0));
        apply_transform(&mut mesh, &m);
        assert_eq!(mesh.positions[0], Point3::new(1.0, 2.0, 3.0));
    }
}
