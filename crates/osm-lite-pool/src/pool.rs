// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ElementResolver trait implementation

use osm_lite_model::{
    ElementId, ElementRef, ElementResolver, ElementType, ModelError, Node, Relation, Result, Way,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serialized pool layout: `{nodes: [...], ways: [...], relations: [...]}`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub ways: Vec<Way>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Frozen, thread-safe element pool
///
/// Elements are indexed by id per type and kept in insertion order so that
/// iteration is deterministic. Once built the pool is never mutated, which
/// makes it safe to share across building workers without locking.
#[derive(Default)]
pub struct ElementPool {
    nodes: FxHashMap<ElementId, Arc<Node>>,
    ways: FxHashMap<ElementId, Arc<Way>>,
    relations: FxHashMap<ElementId, Arc<Relation>>,
    /// Element order as inserted
    order: Vec<ElementRef>,
}

impl ElementPool {
    /// Start building a pool
    pub fn builder() -> ElementPoolBuilder {
        ElementPoolBuilder::default()
    }

    /// Decode a pool from its JSON document form
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: PoolDocument = serde_json::from_str(json).map_err(ModelError::json)?;
        Self::from_document(doc)
    }

    /// Build a pool from a decoded document
    pub fn from_document(doc: PoolDocument) -> Result<Self> {
        let mut builder = ElementPoolBuilder::with_capacity(
            doc.nodes.len(),
            doc.ways.len(),
            doc.relations.len(),
        );
        for node in doc.nodes {
            builder.add_node(node)?;
        }
        for way in doc.ways {
            builder.add_way(way)?;
        }
        for relation in doc.relations {
            builder.add_relation(relation)?;
        }
        let pool = builder.build();
        log::info!(
            "[Pool] Loaded {} nodes, {} ways, {} relations",
            pool.nodes.len(),
            pool.ways.len(),
            pool.relations.len()
        );
        Ok(pool)
    }

    /// All element references in insertion order
    pub fn element_refs(&self) -> &[ElementRef] {
        &self.order
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.iter_kind(ElementType::Node)
            .filter_map(|id| self.nodes.get(&id))
    }

    /// Ways in insertion order
    pub fn ways(&self) -> impl Iterator<Item = &Arc<Way>> {
        self.iter_kind(ElementType::Way)
            .filter_map(|id| self.ways.get(&id))
    }

    /// Relations in insertion order
    pub fn relations(&self) -> impl Iterator<Item = &Arc<Relation>> {
        self.iter_kind(ElementType::Relation)
            .filter_map(|id| self.relations.get(&id))
    }

    fn iter_kind(&self, kind: ElementType) -> impl Iterator<Item = ElementId> + '_ {
        self.order
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.id)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

impl ElementResolver for ElementPool {
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

/// Mutable staging area for an [`ElementPool`]
///
/// All elements must be added before `build()`; the resulting pool is the
/// single happens-before barrier for every building that reads it.
#[derive(Default)]
pub struct ElementPoolBuilder {
    pool: ElementPool,
}

impl ElementPoolBuilder {
    pub fn with_capacity(nodes: usize, ways: usize, relations: usize) -> Self {
        let mut pool = ElementPool::default();
        pool.nodes.reserve(nodes);
        pool.ways.reserve(ways);
        pool.relations.reserve(relations);
        pool.order.reserve(nodes + ways + relations);
        Self { pool }
    }

    /// Add a node, rejecting a duplicate id
    pub fn add_node(&mut self, node: Node) -> Result<&mut Self> {
        let r = ElementRef::node(node.id);
        if self.pool.nodes.contains_key(&node.id) {
            return Err(ModelError::Duplicate(r));
        }
        self.pool.nodes.insert(node.id, Arc::new(node));
        self.pool.order.push(r);
        Ok(self)
    }

    /// Add a way, rejecting a duplicate id
    pub fn add_way(&mut self, way: Way) -> Result<&mut Self> {
        let r = ElementRef::way(way.id);
        if self.pool.ways.contains_key(&way.id) {
            return Err(ModelError::Duplicate(r));
        }
        self.pool.ways.insert(way.id, Arc::new(way));
        self.pool.order.push(r);
        Ok(self)
    }

    /// Add a relation, rejecting a duplicate id
    pub fn add_relation(&mut self, relation: Relation) -> Result<&mut Self> {
        let r = ElementRef::relation(relation.id);
        if self.pool.relations.contains_key(&relation.id) {
            return Err(ModelError::Duplicate(r));
        }
        self.pool.relations.insert(relation.id, Arc::new(relation));
        self.pool.order.push(r);
        Ok(self)
    }

    /// Freeze the pool
    pub fn build(self) -> ElementPool {
        self.pool
    }
}
