// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for OSM element data
//!
//! Nodes, ways and relations as they come out of an OSM extract. Elements are
//! immutable once parsed and are shared through `Arc` by the element pool.

use crate::Tags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// OSM element identifier
///
/// Ids are only unique within one element type, so lookups always go through
/// an [`ElementRef`] or a type-specific resolver method.
pub type ElementId = i64;

/// OSM element type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[serde(alias = "Node")]
    Node,
    #[serde(alias = "Way")]
    Way,
    #[serde(alias = "Relation")]
    Relation,
}

impl ElementType {
    /// Single-letter prefix used in OSM shorthand (`n123`, `w45`, `r6`)
    pub fn prefix(&self) -> char {
        match self {
            ElementType::Node => 'n',
            ElementType::Way => 'w',
            ElementType::Relation => 'r',
        }
    }
}

/// Typed reference to an element
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ElementType,
    pub id: ElementId,
}

impl ElementRef {
    pub fn node(id: ElementId) -> Self {
        Self {
            kind: ElementType::Node,
            id,
        }
    }

    pub fn way(id: ElementId) -> Self {
        Self {
            kind: ElementType::Way,
            id,
        }
    }

    pub fn relation(id: ElementId) -> Self {
        Self {
            kind: ElementType::Relation,
            id,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

/// Audit metadata carried through unchanged
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

/// A single point with optional coordinates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: ElementId,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(flatten)]
    pub meta: Metadata,
}

impl Node {
    pub fn new(id: ElementId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat: Some(lat),
            lon: Some(lon),
            tags: Tags::default(),
            meta: Metadata::default(),
        }
    }

    /// Latitude and longitude, if both are known
    #[inline]
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Ordered list of node references
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: ElementId,
    #[serde(rename = "nodeIds", alias = "nodes")]
    pub nodes: Vec<ElementId>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(flatten)]
    pub meta: Metadata,
}

impl Way {
    pub fn new(id: ElementId, nodes: Vec<ElementId>) -> Self {
        Self {
            id,
            nodes,
            tags: Tags::default(),
            meta: Metadata::default(),
        }
    }

    /// A way whose first and last node ids match describes a closed ring
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }

    /// First and last node ids
    pub fn endpoints(&self) -> Option<(ElementId, ElementId)> {
        Some((*self.nodes.first()?, *self.nodes.last()?))
    }
}

/// Relation member with its role
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    pub id: ElementId,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type")]
    pub kind: ElementType,
}

impl RelationMember {
    pub fn new(kind: ElementType, id: ElementId, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
            kind,
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef { kind: self.kind, id: self.id }
    }
}

/// Relation grouping other elements
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: ElementId,
    pub members: Vec<RelationMember>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(flatten)]
    pub meta: Metadata,
}

impl Relation {
    pub fn new(id: ElementId, members: Vec<RelationMember>) -> Self {
        Self {
            id,
            members,
            tags: Tags::default(),
            meta: Metadata::default(),
        }
    }
}

/// Any of the three element kinds, shared from the pool
#[derive(Clone, Debug)]
pub enum Element {
    Node(Arc<Node>),
    Way(Arc<Way>),
    Relation(Arc<Relation>),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Node(n) => n.id,
            Element::Way(w) => w.id,
            Element::Relation(r) => r.id,
        }
    }

    pub fn kind(&self) -> ElementType {
        match self {
            Element::Node(_) => ElementType::Node,
            Element::Way(_) => ElementType::Way,
            Element::Relation(_) => ElementType::Relation,
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef {
            kind: self.kind(),
            id: self.id(),
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Element::Node(n) => &n.tags,
            Element::Way(w) => &w.tags,
            Element::Relation(r) => &r.tags,
        }
    }

    pub fn meta(&self) -> &Metadata {
        match self {
            Element::Node(n) => &n.meta,
            Element::Way(w) => &w.meta,
            Element::Relation(r) => &r.meta,
        }
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Element::Node(Arc::new(node))
    }
}

impl From<Way> for Element {
    fn from(way: Way) -> Self {
        Element::Way(Arc::new(way))
    }
}

impl From<Relation> for Element {
    fn from(relation: Relation) -> Self {
        Element::Relation(Arc::new(relation))
    }
}

/// Geographic bounding box
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Bounds of a set of nodes, ignoring nodes without coordinates
    ///
    /// Returns all-zero bounds when no node carries coordinates.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut bounds: Option<GeoBounds> = None;
        for (lat, lon) in nodes.into_iter().filter_map(Node::coords) {
            bounds = Some(match bounds {
                None => GeoBounds {
                    min_lat: lat,
                    max_lat: lat,
                    min_lon: lon,
                    max_lon: lon,
                },
                Some(b) => GeoBounds {
                    min_lat: b.min_lat.min(lat),
                    max_lat: b.max_lat.max(lat),
                    min_lon: b.min_lon.min(lon),
                    max_lon: b.max_lon.max(lon),
                },
            });
        }
        bounds.unwrap_or_default()
    }

    /// Midpoint as (lat, lon)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}
