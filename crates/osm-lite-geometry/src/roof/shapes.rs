// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof shapes built directly rather than from the base prism

use crate::mesh::{FaceRole, Mesh};
use crate::profile::Profile2D;
use crate::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Thickness given to flat roofs
pub const FLAT_ROOF_HEIGHT: f64 = 0.01;

/// Single-slope wedge of size `(width, height, length)`, centred
///
/// The high edge runs along `z` at `x = -width / 2`, the low edge at
/// `x = +width / 2`.
pub fn skillion(width: f64, height: f64, length: f64) -> Mesh {
    let pivot = Vector3::new(width / 2.0, height / 2.0, length / 2.0);
    let mut mesh = Mesh::with_capacity(6, 5);
    for p in [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(width, 0.0, 0.0),
        Point3::new(0.0, height, 0.0),
        Point3::new(width, 0.0, length),
        Point3::new(0.0, height, length),
        Point3::new(0.0, 0.0, length),
    ] {
        mesh.add_vertex(p - pivot);
    }
    mesh.add_face(vec![0, 1, 2], FaceRole::Wall);
    mesh.add_face(vec![3, 4, 5], FaceRole::Wall);
    mesh.add_face(vec![1, 2, 4, 3], FaceRole::Roof);
    mesh.add_face(vec![0, 2, 4, 5], FaceRole::Wall);
    mesh.add_face(vec![3, 1, 0, 5], FaceRole::Cap);
    mesh
}

/// Horizontal plane covering `x_span` by `z_span`, centred
pub fn flat(x_span: f64, z_span: f64) -> Mesh {
    let (x, z) = (x_span / 2.0, z_span / 2.0);
    let mut mesh = Mesh::with_capacity(4, 1);
    for p in [
        Point3::new(-x, 0.0, -z),
        Point3::new(-x, 0.0, z),
        Point3::new(x, 0.0, z),
        Point3::new(x, 0.0, -z),
    ] {
        mesh.add_vertex(p);
    }
    mesh.add_face(vec![0, 1, 2, 3], FaceRole::Roof);
    mesh
}

/// Barrel roof: a solid half-cylinder of radius `width / 2` along `z`
///
/// The curve gets `max(3, radius * segments_per_meter)` segments. The mesh
/// is centred, so it spans `[-radius / 2, radius / 2]` in `y`.
pub fn round(width: f64, length: f64, segments_per_meter: f64) -> Mesh {
    let radius = width / 2.0;
    let segments = ((radius * segments_per_meter) as usize).max(3);
    let arc = Profile2D::half_disk(radius, segments).outer;
    let n = arc.len();
    let (zf, zb) = (-length / 2.0, length / 2.0);
    let dy = -radius / 2.0;

    let mut mesh = Mesh::with_capacity(n * 2, n + 3);
    for z in [zf, zb] {
        for p in &arc {
            mesh.add_vertex(Point3::new(p.x, p.y + dy, z));
        }
    }

    // End caps: half-disks, closed by the diameter
    mesh.add_face((0..n).rev().collect(), FaceRole::Cap);
    mesh.add_face((n..2 * n).collect(), FaceRole::Cap);
    for i in 0..n - 1 {
        mesh.add_face(vec![i, i + 1, n + i + 1, n + i], FaceRole::Roof);
    }
    mesh.add_face(vec![0, n, 2 * n - 1, n - 1], FaceRole::Cap);
    mesh
}

/// Hemispherical dome of `radius`, centred
///
/// An icosphere is subdivided `subdivisions` times, faces entirely at or
/// below the equator are dropped and the remaining vertices below it are
/// lifted onto it. The equator vertices, ordered by azimuth, close the base.
/// The mesh spans `[-radius / 2, radius / 2]` in `y`.
pub fn dome(radius: f64, subdivisions: u32) -> Mesh {
    let (positions, triangles) = icosphere(subdivisions);
    let eps = 1e-9;

    let mut mesh = Mesh::with_capacity(positions.len(), triangles.len());
    mesh.positions = positions.iter().map(|p| p * radius).collect();
    let flat_eps = eps * radius.abs().max(1.0);
    for t in triangles {
        if t.iter().all(|&i| mesh.positions[i].y <= flat_eps) {
            continue;
        }
        mesh.add_face(t.to_vec(), FaceRole::Roof);
    }
    mesh.compact();

    // only vertices already on the equator bound the base
    let mut rim: Vec<usize> = (0..mesh.vertex_count())
        .filter(|&i| mesh.positions[i].y.abs() <= flat_eps)
        .collect();
    for p in &mut mesh.positions {
        if p.y < 0.0 {
            p.y = 0.0;
        }
    }
    rim.sort_by(|&a, &b| {
        let pa = mesh.positions[a];
        let pb = mesh.positions[b];
        pa.z.atan2(pa.x).total_cmp(&pb.z.atan2(pb.x))
    });
    if rim.len() >= 3 {
        mesh.add_face(rim, FaceRole::Cap);
    }

    mesh.translate(Vector3::new(0.0, -radius / 2.0, 0.0));
    mesh
}

/// Unit icosphere with outward-wound triangles
fn icosphere(subdivisions: u32) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let t = (1.0 + 5f64.sqrt()) / 2.0;
    let mut positions: Vec<Point3<f64>> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::from(Vector3::new(x, y, z).normalize()))
    .collect();

    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for [a, b, c] in triangles {
            let ab = midpoint(&mut positions, &mut midpoints, a, b);
            let bc = midpoint(&mut positions, &mut midpoints, b, c);
            let ca = midpoint(&mut positions, &mut midpoints, c, a);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    (positions, triangles)
}

fn midpoint(
    positions: &mut Vec<Point3<f64>>,
    cache: &mut FxHashMap<(usize, usize), usize>,
    a: usize,
    b: usize,
) -> usize {
    let key = (a.min(b), a.max(b));
    if let Some(&i) = cache.get(&key) {
        return i;
    }
    let m = (positions[a].coords + positions[b].coords).normalize();
    positions.push(Point3::from(m));
    let i = positions.len() - 1;
    cache.insert(key, i);
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_centered(mesh: &Mesh, w: f64, h: f64, l: f64) {
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x - min.x, w, epsilon = 1e-9);
        assert_relative_eq!(max.y - min.y, h, epsilon = 1e-9);
        assert_relative_eq!(max.z - min.z, l, epsilon = 1e-9);
        assert_relative_eq!(max.y + min.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_skillion() {
        let mesh = skillion(6.0, 2.0, 10.0);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 5);
        assert_centered(&mesh, 6.0, 2.0, 10.0);
        let slope = mesh.faces_with_role(FaceRole::Roof).next().unwrap();
        let n = mesh.face_normal(slope);
        assert!(n.x.abs() > 0.0 && n.y.abs() > 0.0);
    }

    #[test]
    fn test_flat() {
        let mesh = flat(12.0, 8.0);
        assert_eq!(mesh.face_count(), 1);
        assert_relative_eq!(mesh.area_of_role(FaceRole::Roof), 96.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.face_normal(&mesh.faces[0]).y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round() {
        let mesh = round(6.0, 10.0, 10.0);
        // radius 3 at 10 segments per meter
        assert_eq!(mesh.vertex_count(), 2 * 31);
        assert_eq!(mesh.faces_with_role(FaceRole::Roof).count(), 30);
        assert_centered(&mesh, 6.0, 3.0, 10.0);
        // curved faces point away from the barrel axis
        let axis_y = -1.5;
        for face in mesh.faces_with_role(FaceRole::Roof) {
            let pts = mesh.face_points(face);
            let c = pts.iter().fold(Vector3::zeros(), |a, p| a + p.coords) / 4.0;
            let radial = Vector3::new(c.x, c.y - axis_y, 0.0);
            assert!(mesh.face_normal(face).dot(&radial) > 0.0);
        }
    }

    #[test]
    fn test_round_minimum_segments() {
        let mesh = round(0.2, 1.0, 10.0);
        assert_eq!(mesh.faces_with_role(FaceRole::Roof).count(), 3);
    }

    #[test]
    fn test_dome() {
        let mesh = dome(5.0, 2);
        assert_centered(&mesh, 10.0, 5.0, 10.0);
        let base = mesh.faces_with_role(FaceRole::Cap).next().unwrap();
        let pts = mesh.face_points(base);
        assert!(pts.len() >= 8);
        assert!(pts.iter().all(|p| (p.y + 2.5).abs() < 1e-9));
        let (min, _) = mesh.bounds().unwrap();
        assert_relative_eq!(min.y, -2.5, epsilon = 1e-9);
        // every vertex is used
        let mut used = vec![false; mesh.vertex_count()];
        for f in &mesh.faces {
            for i in f.all_indices() {
                used[i] = true;
            }
        }
        assert!(used.into_iter().all(|u| u));
    }
}
