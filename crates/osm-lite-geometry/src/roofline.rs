// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roofs rebuilt from tagged ridge and edge ways
//!
//! A roofline relation lists its ridge ways (`roof:ridge`), edge ways
//! (`roof:edge`) running from a ridge node down to an outline corner, and
//! the plain outline ways of the building. Faces are created greedily: when
//! an edge reaches an outline node next to one already reached by a visited
//! edge, the two edges and the ridge between them bound a face.
//!
//! Outline adjacency wraps around, and each outline segment yields at most
//! one face. Edges that find no visited neighbour yet produce nothing, so
//! the result depends on member order.

use crate::footprint::{node_position, open_ring};
use crate::mesh::{FaceRole, Mesh};
use crate::projection::Projector;
use crate::Point3;
use osm_lite_model::keys::{BUILDING_ROOF_EDGE, BUILDING_ROOF_RIDGE, ROOF_EDGE, ROOF_RIDGE};
use osm_lite_model::{ElementId, ElementResolver, ElementResolverExt, ElementType, Node, Relation, Way};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Tolerance for matching outline nodes to ceiling vertices
const MATCH_EPS: f64 = 1e-6;

/// Member ways of a roofline relation, by kind
#[derive(Clone, Debug, Default)]
pub struct RooflineWays {
    pub ridges: Vec<Arc<Way>>,
    pub edges: Vec<Arc<Way>>,
    /// Outline nodes in member order, without repeats
    pub outline: Vec<Arc<Node>>,
}

impl RooflineWays {
    /// Sort the way members of `relation`
    ///
    /// Returns `None` unless ridges, edges and outline nodes are all present.
    pub fn classify(relation: &Relation, resolver: &dyn ElementResolver) -> Option<Self> {
        let mut lines = RooflineWays::default();
        let mut seen = FxHashSet::default();
        for member in relation.members.iter().filter(|m| m.kind == ElementType::Way) {
            let Some(way) = resolver.way(member.id) else {
                continue;
            };
            if is_ridge(&way) {
                lines.ridges.push(way);
            } else if is_edge(&way) {
                lines.edges.push(way);
            } else {
                let nodes = resolver.way_nodes(&way);
                for node in open_ring(&nodes) {
                    if seen.insert(node.id) {
                        lines.outline.push(Arc::clone(node));
                    }
                }
            }
        }

        if lines.ridges.is_empty() || lines.edges.is_empty() || lines.outline.is_empty() {
            return None;
        }
        Some(lines)
    }

    fn outline_index(&self, id: ElementId) -> Option<usize> {
        self.outline.iter().position(|n| n.id == id)
    }
}

fn is_ridge(way: &Way) -> bool {
    way.tags.contains(ROOF_RIDGE) || way.tags.contains(BUILDING_ROOF_RIDGE)
}

fn is_edge(way: &Way) -> bool {
    way.tags.contains(ROOF_EDGE) || way.tags.contains(BUILDING_ROOF_EDGE)
}

/// The way is tagged as a roof ridge or roof edge
pub fn is_roof_line(way: &Way) -> bool {
    is_ridge(way) || is_edge(way)
}

struct Builder {
    mesh: Mesh,
    index_of: FxHashMap<ElementId, usize>,
}

impl Builder {
    fn face(&mut self, e1: ElementId, e2: ElementId, r1: ElementId, r2: ElementId) {
        let lookup = |id: ElementId| self.index_of.get(&id).copied();
        let (Some(e1), Some(e2), Some(r1), Some(r2)) = (lookup(e1), lookup(e2), lookup(r1), lookup(r2))
        else {
            log::debug!("[Roofline] face skipped, vertex without position");
            return;
        };
        let mut loop_ = if r1 == r2 {
            vec![e1, e2, r1]
        } else {
            vec![e1, e2, r2, r1]
        };
        let face_up = {
            let pts: Vec<Point3<f64>> = loop_.iter().map(|&i| self.mesh.positions[i]).collect();
            crate::triangulation::calculate_polygon_normal(&pts).y >= 0.0
        };
        if !face_up {
            loop_.reverse();
        }
        self.mesh.add_face(loop_, FaceRole::Roof);
    }
}

/// Rebuild a roof from its ridge and edge ways
///
/// `ceiling` holds the building's ceiling vertices, already lowered by the
/// roof height; outline nodes are matched to them by `(x, z)`. Ridge nodes
/// are placed at `building_height`. The mesh is in the building frame and
/// holds every seeded vertex, used or not.
pub fn build_from_roof_lines(
    lines: &RooflineWays,
    resolver: &dyn ElementResolver,
    projector: &dyn Projector,
    ceiling: &[Point3<f64>],
    building_height: f64,
) -> Mesh {
    let mut builder = Builder {
        mesh: Mesh::with_capacity(ceiling.len() + 2 * lines.ridges.len(), lines.edges.len()),
        index_of: FxHashMap::default(),
    };
    for &p in ceiling {
        builder.mesh.add_vertex(p);
    }

    for node in &lines.outline {
        let Some(pos) = node_position(node, projector) else {
            continue;
        };
        let matched = ceiling
            .iter()
            .position(|c| (c.x - pos.x).abs() < MATCH_EPS && (c.z - pos.y).abs() < MATCH_EPS);
        if let Some(i) = matched {
            builder.index_of.insert(node.id, i);
        }
    }

    let n = lines.outline.len();
    let mut visited: Vec<(ElementId, Vec<ElementId>)> = Vec::new();
    let mut used_segments: FxHashSet<(ElementId, ElementId)> = FxHashSet::default();

    for ridge in &lines.ridges {
        let ridge_nodes = resolver.way_nodes(ridge);
        for node in &ridge_nodes {
            if let Some(pos) = node_position(node, projector) {
                let i = builder
                    .mesh
                    .add_vertex(Point3::new(pos.x, building_height, pos.y));
                builder.index_of.insert(node.id, i);
            }
        }

        for ridge_node in &ridge_nodes {
            for edge in &lines.edges {
                if visited.iter().any(|(id, _)| *id == edge.id) {
                    continue;
                }
                if !edge.nodes.contains(&ridge_node.id) {
                    continue;
                }
                let mut sorted = vec![ridge_node.id];
                sorted.extend(
                    edge.nodes
                        .iter()
                        .copied()
                        .filter(|&id| id != ridge_node.id && lines.outline_index(id).is_some()),
                );
                if sorted.len() < 2 {
                    continue;
                }

                for &corner in &sorted[1..] {
                    let Some(i) = lines.outline_index(corner) else {
                        continue;
                    };
                    let neighbours = [lines.outline[(i + n - 1) % n].id, lines.outline[(i + 1) % n].id];
                    for (_, other) in &visited {
                        for &reached in &other[1..] {
                            if !neighbours.contains(&reached) || reached == corner {
                                continue;
                            }
                            let segment = (corner.min(reached), corner.max(reached));
                            if used_segments.insert(segment) {
                                builder.face(reached, corner, other[0], ridge_node.id);
                            }
                        }
                    }
                }
                visited.push((edge.id, sorted));
            }
        }
    }

    log::debug!(
        "[Roofline] {} faces from {} ridges and {} edges",
        builder.mesh.face_count(),
        lines.ridges.len(),
        lines.edges.len()
    );
    builder.mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrusion::{extrude_footprint, NodePrimitive, PrimitiveSize};
    use crate::Point2;
    use osm_lite_model::RelationMember;
    use std::collections::HashMap;

    struct FlatProjector;

    impl Projector for FlatProjector {
        fn project(&self, lat: f64, lon: f64) -> Point2<f64> {
            Point2::new(lon, lat)
        }
    }

    #[derive(Default)]
    struct MapResolver {
        nodes: HashMap<ElementId, Arc<Node>>,
        ways: HashMap<ElementId, Arc<Way>>,
    }

    impl ElementResolver for MapResolver {
        fn node(&self, id: ElementId) -> Option<Arc<Node>> {
            self.nodes.get(&id).cloned()
        }
        fn way(&self, id: ElementId) -> Option<Arc<Way>> {
            self.ways.get(&id).cloned()
        }
        fn relation(&self, _id: ElementId) -> Option<Arc<Relation>> {
            None
        }
        fn count(&self, kind: ElementType) -> usize {
            match kind {
                ElementType::Node => self.nodes.len(),
                ElementType::Way => self.ways.len(),
                ElementType::Relation => 0,
            }
        }
    }

    const A: ElementId = 1;
    const B: ElementId = 2;
    const C: ElementId = 3;
    const D: ElementId = 4;
    const R1: ElementId = 5;
    const R2: ElementId = 6;

    /// Square A B C D with a ridge R1 R2 along x and four corner edges
    fn hipped_square() -> (MapResolver, Relation) {
        let mut r = MapResolver::default();
        for (id, x, z) in [
            (A, 0.0, 0.0),
            (B, 10.0, 0.0),
            (C, 10.0, 10.0),
            (D, 0.0, 10.0),
            (R1, 3.0, 5.0),
            (R2, 7.0, 5.0),
        ] {
            r.nodes.insert(id, Arc::new(Node::new(id, z, x)));
        }
        let mut way = |id: ElementId, nodes: Vec<ElementId>, tag: Option<&str>| {
            let mut w = Way::new(id, nodes);
            if let Some(key) = tag {
                w.tags.insert(key, "yes");
            }
            r.ways.insert(id, Arc::new(w));
        };
        way(10, vec![A, B, C, D, A], None);
        way(11, vec![R1, R2], Some(ROOF_RIDGE));
        way(12, vec![A, R1], Some(ROOF_EDGE));
        way(13, vec![B, R2], Some(ROOF_EDGE));
        way(14, vec![C, R2], Some(BUILDING_ROOF_EDGE));
        way(15, vec![D, R1], Some(ROOF_EDGE));

        let members = (10..=15)
            .map(|id| RelationMember::new(ElementType::Way, id, ""))
            .collect();
        (r, Relation::new(100, members))
    }

    fn ceiling(r: &MapResolver) -> Vec<Point3<f64>> {
        let ring: Vec<Point2<f64>> = [A, B, C, D]
            .iter()
            .filter_map(|id| node_position(&r.nodes[id], &FlatProjector))
            .collect();
        let size = PrimitiveSize {
            length: 3.0,
            width: 3.0,
            kind: NodePrimitive::Box,
        };
        let mesh = extrude_footprint(&ring, 0.0, 6.0, size).unwrap();
        mesh.face_points(mesh.ceiling_face().unwrap())
    }

    #[test]
    fn test_classify() {
        let (r, rel) = hipped_square();
        let lines = RooflineWays::classify(&rel, &r).unwrap();
        assert_eq!(lines.ridges.len(), 1);
        assert_eq!(lines.edges.len(), 4);
        let ids: Vec<_> = lines.outline.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![A, B, C, D]);
    }

    #[test]
    fn test_classify_needs_all_kinds() {
        let (r, mut rel) = hipped_square();
        rel.members.retain(|m| m.id != 11);
        assert!(RooflineWays::classify(&rel, &r).is_none());
    }

    #[test]
    fn test_square_gives_four_faces() {
        let (r, rel) = hipped_square();
        let lines = RooflineWays::classify(&rel, &r).unwrap();
        let mesh = build_from_roof_lines(&lines, &r, &FlatProjector, &ceiling(&r), 9.0);

        assert_eq!(mesh.face_count(), 4);
        let ridge: Vec<usize> = (0..mesh.vertex_count())
            .filter(|&i| mesh.positions[i].y == 9.0)
            .collect();
        assert_eq!(ridge.len(), 2);

        let mut triangles = 0;
        for face in &mesh.faces {
            let on_ridge = face.vertices.iter().filter(|i| ridge.contains(i)).count();
            let on_ceiling = face.vertices.len() - on_ridge;
            assert_eq!(on_ceiling, 2);
            if face.vertices.len() == 3 {
                triangles += 1;
                assert_eq!(on_ridge, 1);
            }
            assert!(mesh.face_normal(face).y > 0.0);
        }
        assert_eq!(triangles, 2);
        // every ridge vertex is shared by three faces
        for r in ridge {
            let count = mesh.faces.iter().filter(|f| f.vertices.contains(&r)).count();
            assert_eq!(count, 3);
        }
    }

    #[test]
    fn test_unmatched_outline_gives_no_faces() {
        let (r, rel) = hipped_square();
        let lines = RooflineWays::classify(&rel, &r).unwrap();
        let mesh = build_from_roof_lines(&lines, &r, &FlatProjector, &[], 9.0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.vertex_count(), 2);
    }
}
