// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint metrics
//!
//! Pure functions over projected rings and meshes. Rings are open: the
//! closing node of a closed way is dropped before projection, so a ring of
//! `n` points has `n` edges.

use crate::mesh::{FaceRole, Mesh};
use crate::projection::Projector;
use crate::triangulation::heron_area;
use crate::{Point2, Point3};
use osm_lite_model::{GeoBounds, Node};
use std::sync::Arc;

/// Tolerance for comparing projected coordinates
const COORD_EPS: f64 = 1e-9;

/// Nodes of a way without its closing duplicate
///
/// The last node is dropped when there is more than one node and the first
/// and last ids match.
pub fn open_ring(nodes: &[Arc<Node>]) -> &[Arc<Node>] {
    match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) if nodes.len() > 1 && first.id == last.id => {
            &nodes[..nodes.len() - 1]
        }
        _ => nodes,
    }
}

/// Projected position of a node, if it has coordinates
#[inline]
pub fn node_position(node: &Node, projector: &dyn Projector) -> Option<Point2<f64>> {
    node.coords()
        .map(|(lat, lon)| projector.project(lat, lon))
}

/// Projected open ring of a node sequence; nodes without coordinates are skipped
pub fn ring_positions(nodes: &[Arc<Node>], projector: &dyn Projector) -> Vec<Point2<f64>> {
    open_ring(nodes)
        .iter()
        .filter_map(|n| node_position(n, projector))
        .collect()
}

/// Axis-aligned bounds of a ring as `(min, max)`
pub fn bounding_box(ring: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = *ring.first()?;
    Some(ring[1..].iter().fold((first, first), |(min, max), p| {
        (
            Point2::new(min.x.min(p.x), min.y.min(p.y)),
            Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

/// Area of a ring by fan triangulation from its first point
///
/// Exact for convex rings; returns 0 below 3 points.
pub fn ring_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let p = |q: &Point2<f64>| Point3::new(q.x, 0.0, q.y);
    let origin = p(&ring[0]);
    ring.windows(2)
        .skip(1)
        .map(|w| heron_area(&origin, &p(&w[0]), &p(&w[1])))
        .sum()
}

/// Area of the mesh's ground faces, 0 when there is none
pub fn ground_area(mesh: &Mesh) -> f64 {
    if mesh.ground_face().is_none() {
        return 0.0;
    }
    mesh.area_of_role(FaceRole::Ground).max(0.0)
}

/// Length of the closed ring through all points
pub fn perimeter(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (ring[(i + 1) % n] - ring[i]).norm())
        .sum()
}

/// Isoperimetric ratio `2 * sqrt(pi * area) / perimeter`; 1 for a circle
pub fn compactness_index(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    2.0 * (std::f64::consts::PI * area.max(0.0)).sqrt() / perimeter
}

/// Projection of the mean (lat, lon) of the nodes
///
/// Averaging happens in geographic space. Nodes without coordinates add
/// nothing to the sums but still count in the divisor.
pub fn barycenter(nodes: &[Arc<Node>], projector: &dyn Projector) -> Option<Point2<f64>> {
    if nodes.is_empty() {
        return None;
    }
    let (s_lat, s_lon) = nodes
        .iter()
        .filter_map(|n| n.coords())
        .fold((0.0, 0.0), |(a, b), (lat, lon)| (a + lat, b + lon));
    let count = nodes.len() as f64;
    Some(projector.project(s_lat / count, s_lon / count))
}

/// Projected spans of geographic bounds as `(x_span, z_span)`
pub fn projected_spans(bounds: &GeoBounds, projector: &dyn Projector) -> (f64, f64) {
    let max = projector.project(bounds.max_lat, bounds.max_lon);
    let min = projector.project(bounds.min_lat, bounds.min_lon);
    (max.x - min.x, max.y - min.y)
}

/// Orientation of a footprint relative to its south-west bounds corner (degrees)
///
/// Returns 0 when a footprint point sits on the corner. Otherwise the last
/// point sharing the corner's `x` gives the `z` offset, the last point
/// sharing its `z` gives the `x` offset (each defaulting to 1), and the
/// result is the angle of that offset pair.
pub fn orientation_deg(ring: &[Point2<f64>], corner: Point2<f64>) -> f64 {
    let mut l = 1.0;
    let mut w = 1.0;
    for p in ring {
        let same_x = (p.x - corner.x).abs() < COORD_EPS;
        let same_z = (p.y - corner.y).abs() < COORD_EPS;
        if same_x && same_z {
            return 0.0;
        }
        if same_x {
            w = p.y - corner.y;
        } else if same_z {
            l = p.x - corner.x;
        }
    }
    f64::atan2(w, l).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrusion::{extrude_footprint, NodePrimitive, PrimitiveSize};
    use crate::projection::EquirectangularProjector;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_open_ring_drops_closing_node() {
        let nodes: Vec<Arc<Node>> = [(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 1.0, 1.0), (1, 0.0, 0.0)]
            .iter()
            .map(|&(id, lat, lon)| Arc::new(Node::new(id, lat, lon)))
            .collect();
        assert_eq!(open_ring(&nodes).len(), 3);
        assert_eq!(open_ring(&nodes[..1]).len(), 1);
        assert_eq!(open_ring(&nodes[..3]).len(), 3);

        let proj = EquirectangularProjector::default();
        assert_eq!(ring_positions(&nodes, &proj).len(), 3);
    }

    #[test]
    fn test_ring_skips_nodes_without_coords() {
        let mut lost = Node::new(9, 0.0, 0.0);
        lost.lon = None;
        let nodes = vec![Arc::new(Node::new(1, 0.0, 0.0)), Arc::new(lost)];
        let proj = EquirectangularProjector::default();
        assert_eq!(ring_positions(&nodes, &proj).len(), 1);
    }

    #[test]
    fn test_unit_square_area() {
        assert_relative_eq!(ring_area(&square()), 1.0, epsilon = 1e-12);
        let size = PrimitiveSize {
            length: 3.0,
            width: 3.0,
            kind: NodePrimitive::Box,
        };
        let mesh = extrude_footprint(&square(), 0.0, 3.0, size).unwrap();
        assert_relative_eq!(ground_area(&mesh), 1.0, epsilon = 1e-12);
        assert_eq!(ground_area(&Mesh::new()), 0.0);
        assert_eq!(ring_area(&square()[..2]), 0.0);
    }

    #[test]
    fn test_perimeter() {
        assert_relative_eq!(perimeter(&square()), 4.0);
        let tri = [
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 4.0),
        ];
        assert_relative_eq!(perimeter(&tri), 12.0);
        assert_eq!(perimeter(&[]), 0.0);
    }

    #[test]
    fn test_compactness_of_circle() {
        let n = 72;
        let r = 10.0;
        let ring: Vec<Point2<f64>> = (0..n)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                Point2::new(r * a.cos(), r * a.sin())
            })
            .collect();
        let index = compactness_index(ring_area(&ring), perimeter(&ring));
        assert!(index < 1.0);
        assert_relative_eq!(index, 1.0, epsilon = 1e-3);
        // square is less compact
        let sq = compactness_index(1.0, 4.0);
        assert_relative_eq!(sq, (std::f64::consts::PI).sqrt() / 2.0, epsilon = 1e-12);
        assert_eq!(compactness_index(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_barycenter_in_geographic_space() {
        let nodes = vec![
            Arc::new(Node::new(1, 0.0, 0.0)),
            Arc::new(Node::new(2, 0.0, 2.0)),
            Arc::new(Node::new(3, 2.0, 1.0)),
        ];
        let proj = EquirectangularProjector::default();
        let b = barycenter(&nodes, &proj).unwrap();
        let expected = proj.project(2.0 / 3.0, 1.0);
        assert_relative_eq!(b.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(b.y, expected.y, epsilon = 1e-9);
        assert!(barycenter(&[], &proj).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let (min, max) = bounding_box(&square()).unwrap();
        assert_eq!(min, Point2::new(0.0, 0.0));
        assert_eq!(max, Point2::new(1.0, 1.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_orientation() {
        // a corner point on the bounds corner
        assert_eq!(orientation_deg(&square(), Point2::new(0.0, 0.0)), 0.0);
        // rotated square: the corner itself is not a vertex
        let diamond = vec![
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 1.0),
        ];
        let deg = orientation_deg(&diamond, Point2::new(0.0, 0.0));
        assert_relative_eq!(deg, 45.0, epsilon = 1e-9);
    }
}
