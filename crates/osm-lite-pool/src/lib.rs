// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OSM-Lite Pool - In-memory element pool
//!
//! This crate provides the element store behind every building: a frozen,
//! hash-indexed pool of nodes, ways and relations that implements the
//! `ElementResolver` trait from `osm-lite-model`.
//!
//! # Features
//!
//! - **O(1) lookups** through per-type `FxHashMap` indexes
//! - **Deterministic iteration** in insertion order
//! - **Lock-free sharing** - the pool is immutable once built
//! - **JSON loading** of the `{nodes, ways, relations}` document form
//! - **Predicted heights** parsed from `id: height` tables
//!
//! # Example
//!
//! ```ignore
//! use osm_lite_pool::ElementPool;
//! use osm_lite_model::ElementResolver;
//!
//! let pool = ElementPool::from_json_str(json)?;
//! let way = pool.way(42).expect("way 42");
//! println!("{} node refs", way.nodes.len());
//! ```

mod heights;
mod pool;

pub use heights::PredictedHeights;
pub use pool::{ElementPool, ElementPoolBuilder, PoolDocument};
