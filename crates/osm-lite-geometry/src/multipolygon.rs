// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multipolygon assembly
//!
//! Relation members are scattered way fragments. Outer ways are grouped by
//! a running ring index that advances whenever an outer way follows an inner
//! one; inner ways join the current group. Each group's fragments are then
//! stitched into rings by matching endpoint node ids.

use crate::error::Result;
use crate::extrusion::{extrude_footprint, extrude_profile, PrimitiveSize};
use crate::footprint::node_position;
use crate::profile::Profile2D;
use crate::projection::Projector;
use crate::roofline::is_roof_line;
use crate::{Mesh, Point2};
use osm_lite_model::{ElementId, ElementResolver, ElementType, Node, Relation, Way};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// One ring stitched from way fragments
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StitchedRing {
    /// Node ids along the path; a closed ring repeats its first id at the end
    pub nodes: Vec<ElementId>,
    /// The path came back to its start
    pub closed: bool,
}

impl StitchedRing {
    /// Node ids without the closing duplicate
    pub fn open_nodes(&self) -> &[ElementId] {
        if self.closed && self.nodes.len() > 1 {
            &self.nodes[..self.nodes.len() - 1]
        } else {
            &self.nodes
        }
    }
}

/// Outer and inner rings sharing one ring index
#[derive(Clone, Debug, Default)]
pub struct PolygonGroup {
    pub outer_ways: Vec<Arc<Way>>,
    pub inner_ways: Vec<Arc<Way>>,
}

impl PolygonGroup {
    pub fn outer_rings(&self) -> Vec<StitchedRing> {
        stitch_ways(&self.outer_ways)
    }

    pub fn inner_rings(&self) -> Vec<StitchedRing> {
        stitch_ways(&self.inner_ways)
    }
}

/// Everything a multipolygon relation contributes to a building
#[derive(Clone, Debug, Default)]
pub struct Multipolygon {
    pub groups: Vec<PolygonGroup>,
    /// Node members, rendered as primitives
    pub points: Vec<Arc<Node>>,
}

impl Multipolygon {
    /// Group the members of `relation`, descending into nested relations
    pub fn assemble(relation: &Relation, resolver: &dyn ElementResolver) -> Self {
        let mut mp = Multipolygon::default();
        let mut visited = FxHashSet::default();
        mp.collect(relation, resolver, &mut visited);
        mp
    }

    fn collect(
        &mut self,
        relation: &Relation,
        resolver: &dyn ElementResolver,
        visited: &mut FxHashSet<ElementId>,
    ) {
        if !visited.insert(relation.id) {
            return;
        }
        let mut after_inner = true;
        for member in &relation.members {
            match member.kind {
                ElementType::Node => {
                    if let Some(node) = resolver.node(member.id) {
                        self.points.push(node);
                    }
                }
                ElementType::Way => {
                    let Some(way) = resolver.way(member.id) else {
                        continue;
                    };
                    if is_roof_line(&way) {
                        continue;
                    }
                    match member.role.as_str() {
                        "inner" => {
                            if self.groups.is_empty() {
                                self.groups.push(PolygonGroup::default());
                            }
                            if let Some(group) = self.groups.last_mut() {
                                group.inner_ways.push(way);
                            }
                            after_inner = true;
                        }
                        "outer" | "" => {
                            if after_inner || self.groups.is_empty() {
                                self.groups.push(PolygonGroup::default());
                            }
                            if let Some(group) = self.groups.last_mut() {
                                group.outer_ways.push(way);
                            }
                            after_inner = false;
                        }
                        role => {
                            log::debug!("r{}: ignoring w{} with role '{}'", relation.id, way.id, role);
                        }
                    }
                }
                ElementType::Relation => {
                    if let Some(nested) = resolver.relation(member.id) {
                        self.collect(&nested, resolver, visited);
                        after_inner = true;
                    }
                }
            }
        }
    }

    /// Extrude every group into a prism with holes and every point into a primitive
    ///
    /// Rings that failed to close are logged and still extruded when they
    /// have at least 3 positioned nodes. Each inner ring goes to the outer
    /// ring of its group that contains it, or to the first one.
    pub fn extrude(
        &self,
        resolver: &dyn ElementResolver,
        projector: &dyn Projector,
        base_y: f64,
        height: f64,
        primitive: PrimitiveSize,
    ) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        let positions = |ring: &StitchedRing| -> Vec<Point2<f64>> {
            ring.open_nodes()
                .iter()
                .filter_map(|&id| resolver.node(id))
                .filter_map(|n| node_position(&n, projector))
                .collect()
        };

        for group in &self.groups {
            let mut profiles: Vec<Profile2D> = Vec::new();
            for ring in group.outer_rings() {
                if !ring.closed {
                    log::warn!("outer ring {:?} does not close", ring.nodes);
                }
                let outer = positions(&ring);
                if outer.len() >= 3 {
                    profiles.push(Profile2D::new(outer));
                }
            }
            if profiles.is_empty() {
                continue;
            }
            for ring in group.inner_rings() {
                if !ring.closed {
                    log::warn!("inner ring {:?} does not close", ring.nodes);
                }
                let hole = positions(&ring);
                if hole.len() < 3 {
                    continue;
                }
                let target = profiles
                    .iter()
                    .position(|p| contains_point(&p.outer, &hole[0]))
                    .unwrap_or(0);
                profiles[target].add_hole(hole);
            }
            for profile in &profiles {
                mesh.merge(&extrude_profile(profile, base_y, height)?);
            }
        }

        let points: Vec<Point2<f64>> = self
            .points
            .iter()
            .filter_map(|n| node_position(n, projector))
            .collect();
        for p in points {
            mesh.merge(&extrude_footprint(&[p], base_y, height, primitive)?);
        }
        Ok(mesh)
    }
}

/// Stitch way fragments into rings
///
/// Repeatedly takes the first unused fragment and appends any unused
/// fragment whose start or end matches the path's tail, reversing it when
/// needed, until the path closes or nothing matches.
pub fn stitch_ways(ways: &[Arc<Way>]) -> Vec<StitchedRing> {
    let segments: Vec<&[ElementId]> = ways
        .iter()
        .map(|w| w.nodes.as_slice())
        .filter(|nodes| nodes.len() >= 2)
        .collect();
    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut path = segments[start].to_vec();

        let closed = loop {
            if path.len() >= 4 && path.first() == path.last() {
                break true;
            }
            let Some(&tail) = path.last() else {
                break false;
            };
            let next = (0..segments.len()).find(|&i| {
                !used[i] && (segments[i].first() == Some(&tail) || segments[i].last() == Some(&tail))
            });
            let Some(i) = next else {
                break false;
            };
            used[i] = true;
            if segments[i][0] == tail {
                path.extend_from_slice(&segments[i][1..]);
            } else {
                path.extend(segments[i].iter().rev().skip(1));
            }
        };

        rings.push(StitchedRing {
            nodes: path,
            closed,
        });
    }
    rings
}

/// Even-odd point in polygon test
fn contains_point(ring: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
