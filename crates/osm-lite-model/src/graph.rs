// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transitive element graph resolution
//!
//! A building is described by one element, but its geometry lives in the
//! nodes reachable from it. [`resolve_graph`] walks ways and relations and
//! collects everything they reference; [`ResolvedElement`] caches that walk
//! together with the element's geographic bounds.
//!
//! Unknown ids are skipped. Relations may reference each other in cycles, so
//! the walk keeps the set of relations on the current path and ignores a
//! member that would re-enter one of them.

use crate::{Element, ElementResolver, ElementResolverExt, GeoBounds, Node, Relation, Tags, Way};
use crate::{ElementId, ElementType};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// Everything reachable from one element
#[derive(Clone, Debug, Default)]
pub struct SubGraph {
    /// Nodes of all member ways and nested relations, in member order
    pub sub_nodes: Vec<Arc<Node>>,
    /// Ways that are members of this relation or of nested relations
    pub sub_ways: Vec<Arc<Way>>,
    /// Nested relations, each listed before its own descendants
    pub sub_relations: Vec<Arc<Relation>>,
    /// Nodes that are relation members themselves, not reached through a way
    pub direct_sub_nodes: Vec<Arc<Node>>,
}

impl SubGraph {
    pub fn is_empty(&self) -> bool {
        self.sub_nodes.is_empty() && self.sub_ways.is_empty() && self.sub_relations.is_empty()
    }

    /// Find a resolved way by id
    pub fn way(&self, id: ElementId) -> Option<&Arc<Way>> {
        self.sub_ways.iter().find(|w| w.id == id)
    }

    /// Find a resolved relation by id
    pub fn relation(&self, id: ElementId) -> Option<&Arc<Relation>> {
        self.sub_relations.iter().find(|r| r.id == id)
    }
}

/// Resolve the transitive closure of an element
///
/// - Node: empty graph
/// - Way: `sub_nodes` are its nodes in order, unknown ids skipped
/// - Relation: members are walked in declared order; node members go to both
///   `sub_nodes` and `direct_sub_nodes`, way members contribute their nodes,
///   relation members contribute their whole closure and themselves
pub fn resolve_graph(element: &Element, resolver: &dyn ElementResolver) -> SubGraph {
    let mut graph = SubGraph::default();
    match element {
        Element::Node(_) => {}
        Element::Way(way) => {
            graph.sub_nodes = resolver.way_nodes(way);
        }
        Element::Relation(relation) => {
            let mut path = HashSet::new();
            path.insert(relation.id);
            collect_relation(relation, resolver, &mut path, &mut graph);
        }
    }
    graph
}

fn collect_relation(
    relation: &Relation,
    resolver: &dyn ElementResolver,
    path: &mut HashSet<ElementId>,
    graph: &mut SubGraph,
) {
    for member in &relation.members {
        match member.kind {
            ElementType::Node => {
                if let Some(node) = resolver.node(member.id) {
                    graph.direct_sub_nodes.push(Arc::clone(&node));
                    graph.sub_nodes.push(node);
                }
            }
            ElementType::Way => {
                if let Some(way) = resolver.way(member.id) {
                    graph.sub_nodes.extend(resolver.way_nodes(&way));
                    graph.sub_ways.push(way);
                }
            }
            ElementType::Relation => {
                if path.contains(&member.id) {
                    log::debug!(
                        "relation r{} re-enters r{}, skipping member",
                        relation.id,
                        member.id
                    );
                    continue;
                }
                if let Some(nested) = resolver.relation(member.id) {
                    graph.sub_relations.push(Arc::clone(&nested));
                    path.insert(nested.id);
                    collect_relation(&nested, resolver, path, graph);
                    path.remove(&nested.id);
                }
            }
        }
    }
}

/// One element together with its lazily resolved graph
///
/// The graph and the bounds are computed on first access and cached for the
/// lifetime of the value. The pool behind the resolver is expected to be
/// frozen, so the cache never goes stale.
pub struct ResolvedElement {
    element: Element,
    resolver: Arc<dyn ElementResolver>,
    graph: OnceLock<SubGraph>,
    bounds: OnceLock<GeoBounds>,
}

impl ResolvedElement {
    pub fn new(element: Element, resolver: Arc<dyn ElementResolver>) -> Self {
        Self {
            element,
            resolver,
            graph: OnceLock::new(),
            bounds: OnceLock::new(),
        }
    }

    #[inline]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.element.id()
    }

    #[inline]
    pub fn kind(&self) -> ElementType {
        self.element.kind()
    }

    #[inline]
    pub fn tags(&self) -> &Tags {
        self.element.tags()
    }

    pub fn resolver(&self) -> &dyn ElementResolver {
        self.resolver.as_ref()
    }

    /// Resolved closure, computed once
    pub fn graph(&self) -> &SubGraph {
        self.graph
            .get_or_init(|| resolve_graph(&self.element, self.resolver.as_ref()))
    }

    pub fn sub_nodes(&self) -> &[Arc<Node>] {
        &self.graph().sub_nodes
    }

    pub fn sub_ways(&self) -> &[Arc<Way>] {
        &self.graph().sub_ways
    }

    pub fn sub_relations(&self) -> &[Arc<Relation>] {
        &self.graph().sub_relations
    }

    pub fn direct_sub_nodes(&self) -> &[Arc<Node>] {
        &self.graph().direct_sub_nodes
    }

    /// Nodes describing the element's extent: itself for a node, the
    /// resolved sub-nodes otherwise
    pub fn extent_nodes(&self) -> Vec<Arc<Node>> {
        match &self.element {
            Element::Node(node) => vec![Arc::clone(node)],
            _ => self.sub_nodes().to_vec(),
        }
    }

    /// Geographic bounds, computed once
    pub fn bounds(&self) -> GeoBounds {
        *self.bounds.get_or_init(|| match &self.element {
            Element::Node(node) => {
                let lat = node.lat.unwrap_or(0.0);
                let lon = node.lon.unwrap_or(0.0);
                GeoBounds {
                    min_lat: lat,
                    max_lat: lat,
                    min_lon: lon,
                    max_lon: lon,
                }
            }
            _ => GeoBounds::from_nodes(self.sub_nodes().iter().map(|n| n.as_ref())),
        })
    }
}

impl std::fmt::Debug for ResolvedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedElement")
            .field("element", &self.element.element_ref())
            .field("resolved", &self.graph.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationMember;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapResolver {
        nodes: HashMap<ElementId, Arc<Node>>,
        ways: HashMap<ElementId, Arc<Way>>,
        relations: HashMap<ElementId, Arc<Relation>>,
    }

    impl MapResolver {
        fn with_square() -> Self {
            let mut r = MapResolver::default();
            for (id, lat, lon) in [(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 1.0, 1.0), (4, 1.0, 0.0)] {
                r.nodes.insert(id, Arc::new(Node::new(id, lat, lon)));
            }
            r.ways
                .insert(10, Arc::new(Way::new(10, vec![1, 2, 3, 4, 1])));
            r
        }
    }

    impl ElementResolver for MapResolver {
        fn node(&self, id: ElementId) -> Option<Arc<Node>> {
            self.nodes.get(&id).cloned()
        }
        fn way(&self, id: ElementId) -> Option<Arc<Way>> {
            self.ways.get(&id).cloned()
        }
        fn relation(&self, id: ElementId) -> Option<Arc<Relation>> {
            self.relations.get(&id).cloned()
        }
        fn count(&self, kind: ElementType) -> usize {
            match kind {
                ElementType::Node => self.nodes.len(),
                ElementType::Way => self.ways.len(),
                ElementType::Relation => self.relations.len(),
            }
        }
    }

    #[test]
    fn test_node_has_empty_graph() {
        let r = MapResolver::with_square();
        let node = Element::Node(r.node(1).unwrap());
        assert!(resolve_graph(&node, &r).is_empty());
    }

    #[test]
    fn test_way_skips_missing_nodes() {
        let r = MapResolver::with_square();
        let way = Element::from(Way::new(11, vec![1, 99, 2]));
        let graph = resolve_graph(&way, &r);
        let ids: Vec<_> = graph.sub_nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(graph.sub_ways.is_empty());
    }

    #[test]
    fn test_relation_members() {
        let mut r = MapResolver::with_square();
        r.relations.insert(
            20,
            Arc::new(Relation::new(
                20,
                vec![
                    RelationMember::new(ElementType::Way, 10, "outer"),
                    RelationMember::new(ElementType::Node, 3, ""),
                    RelationMember::new(ElementType::Way, 404, "outer"),
                ],
            )),
        );
        let rel = Element::Relation(r.relation(20).unwrap());
        let graph = resolve_graph(&rel, &r);
        assert_eq!(graph.sub_nodes.len(), 6);
        assert_eq!(graph.sub_ways.len(), 1);
        assert_eq!(graph.direct_sub_nodes.len(), 1);
        assert_eq!(graph.direct_sub_nodes[0].id, 3);
    }

    #[test]
    fn test_cyclic_relations_terminate() {
        let mut r = MapResolver::with_square();
        r.relations.insert(
            30,
            Arc::new(Relation::new(
                30,
                vec![
                    RelationMember::new(ElementType::Relation, 31, ""),
                    RelationMember::new(ElementType::Node, 1, ""),
                ],
            )),
        );
        r.relations.insert(
            31,
            Arc::new(Relation::new(
                31,
                vec![
                    RelationMember::new(ElementType::Relation, 30, ""),
                    RelationMember::new(ElementType::Relation, 31, ""),
                    RelationMember::new(ElementType::Way, 10, ""),
                ],
            )),
        );
        let rel = Element::Relation(r.relation(30).unwrap());
        let graph = resolve_graph(&rel, &r);
        let rel_ids: Vec<_> = graph.sub_relations.iter().map(|r| r.id).collect();
        assert_eq!(rel_ids, vec![31]);
        assert_eq!(graph.sub_ways.len(), 1);
        // 5 way nodes from r31 plus the direct node of r30
        assert_eq!(graph.sub_nodes.len(), 6);
    }

    #[test]
    fn test_shared_relation_visited_twice() {
        let mut r = MapResolver::with_square();
        r.relations.insert(
            41,
            Arc::new(Relation::new(
                41,
                vec![RelationMember::new(ElementType::Node, 2, "")],
            )),
        );
        r.relations.insert(
            40,
            Arc::new(Relation::new(
                40,
                vec![
                    RelationMember::new(ElementType::Relation, 41, ""),
                    RelationMember::new(ElementType::Relation, 41, ""),
                ],
            )),
        );
        let rel = Element::Relation(r.relation(40).unwrap());
        let graph = resolve_graph(&rel, &r);
        assert_eq!(graph.sub_relations.len(), 2);
        assert_eq!(graph.direct_sub_nodes.len(), 2);
    }

    #[test]
    fn test_resolved_element_caches() {
        let r: Arc<dyn ElementResolver> = Arc::new(MapResolver::with_square());
        let way = Element::Way(r.way(10).unwrap());
        let resolved = ResolvedElement::new(way, Arc::clone(&r));
        let first = resolved.sub_nodes().as_ptr();
        let second = resolved.sub_nodes().as_ptr();
        assert_eq!(first, second);
        let b = resolved.bounds();
        assert_eq!((b.min_lat, b.max_lat, b.min_lon, b.max_lon), (0.0, 1.0, 0.0, 1.0));
    }
}
