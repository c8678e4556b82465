// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OSM-Lite Model - Element types and graph resolution for OSM building data
//!
//! This crate provides the shared vocabulary of the workspace: nodes, ways
//! and relations with their tags, the [`ElementResolver`] lookup trait that
//! element pools implement, and the transitive graph walk that turns one
//! building element into the set of nodes, ways and relations it depends on.
//!
//! # Architecture
//!
//! - [`Element`], [`Node`], [`Way`], [`Relation`] - immutable parsed elements
//! - [`Tags`] and the `parse_*` helpers - lenient tag value parsing
//! - [`ElementResolver`] - O(1) element lookup implemented by a pool
//! - [`resolve_graph`] / [`ResolvedElement`] - cycle-safe graph closure
//! - [`HeightPredictor`] / [`PictureSource`] - external height estimators
//!
//! # Example
//!
//! ```ignore
//! use osm_lite_model::{ElementRef, ElementResolver, ResolvedElement};
//!
//! let pool: Arc<dyn ElementResolver> = load_pool();
//! let way = pool.element(ElementRef::way(42)).unwrap();
//! let resolved = ResolvedElement::new(way, pool);
//! println!("{} nodes", resolved.sub_nodes().len());
//! ```

pub mod error;
pub mod graph;
pub mod resolver;
pub mod tags;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use graph::*;
pub use resolver::*;
pub use tags::{
    keys, parse_angle, parse_color, parse_direction, parse_float, parse_height, parse_levels,
    RoofOrientation, Rgba, Tags,
};
pub use traits::*;
pub use types::*;
