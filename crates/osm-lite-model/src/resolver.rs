// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element lookup trait

use crate::{Element, ElementId, ElementRef, ElementType, ModelError, Node, Relation, Way};
use std::sync::Arc;

/// Element lookup by typed id
///
/// This trait provides the core functionality for dereferencing the node ids
/// of ways and the members of relations. Implementations should provide O(1)
/// lookup and must be safe to share across worker threads once populated.
///
/// # Example
///
/// ```ignore
/// use osm_lite_model::{ElementResolver, ElementResolverExt};
///
/// fn print_way(resolver: &dyn ElementResolver, way_id: i64) {
///     if let Some(way) = resolver.way(way_id) {
///         for node in resolver.way_nodes(&way) {
///             println!("{:?}", node.coords());
///         }
///     }
/// }
/// ```
pub trait ElementResolver: Send + Sync {
    /// Get node by id
    fn node(&self, id: ElementId) -> Option<Arc<Node>>;

    /// Get way by id
    fn way(&self, id: ElementId) -> Option<Arc<Way>>;

    /// Get relation by id
    fn relation(&self, id: ElementId) -> Option<Arc<Relation>>;

    /// Get any element by typed reference
    fn element(&self, element_ref: ElementRef) -> Option<Element> {
        match element_ref.kind {
            ElementType::Node => self.node(element_ref.id).map(Element::Node),
            ElementType::Way => self.way(element_ref.id).map(Element::Way),
            ElementType::Relation => self.relation(element_ref.id).map(Element::Relation),
        }
    }

    /// Number of elements of one type
    fn count(&self, kind: ElementType) -> usize;
}

/// Extension methods for ElementResolver
pub trait ElementResolverExt: ElementResolver {
    /// Dereference the node ids of a way, in order, skipping unknown ids
    fn way_nodes(&self, way: &Way) -> Vec<Arc<Node>> {
        way.nodes.iter().filter_map(|&id| self.node(id)).collect()
    }

    /// Check if an element exists
    fn exists(&self, element_ref: ElementRef) -> bool {
        self.element(element_ref).is_some()
    }

    /// Get element or return error
    fn get_or_err(&self, element_ref: ElementRef) -> crate::Result<Element> {
        self.element(element_ref)
            .ok_or(ModelError::ElementNotFound(element_ref))
    }
}

// Blanket implementation for all ElementResolver types
impl<T: ElementResolver + ?Sized> ElementResolverExt for T {}
