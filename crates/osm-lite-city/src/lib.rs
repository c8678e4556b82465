// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # OSM-Lite City
//!
//! Turns the buildings of an element pool into meshes and feature records.
//!
//! ## Overview
//!
//! - **Config**: meter scales, floor height, prediction method, roof detail
//! - **Building**: height resolution, body and roof meshes, cached metrics,
//!   address and material attributes, neighbour search
//! - **Loader**: candidate selection and parallel building generation
//! - **Features**: one CSV row per building for the height regression
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use osm_lite_city::{BuildingLoader, CityConfig};
//! use osm_lite_pool::ElementPool;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(ElementPool::from_json_str(json)?);
//! let loader = BuildingLoader::new(pool, CityConfig::default())?;
//! let buildings = loader.load();
//! for row in loader.features(&buildings) {
//!     println!("{}", row.to_csv_row());
//! }
//! ```

pub mod building;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod loader;

pub use building::{
    estimate_height_from_image, Building, BuildingRoof, HeightEstimate, HeightSource,
    RoofSource, DEFAULT_BUILDING_TYPE,
};
pub use config::{CityConfig, NodeShape, PictureOptions, PredictionMethod, MIN_METER_SCALE};
pub use context::CityContext;
pub use error::{CityError, Result};
pub use features::{to_csv, BuildingFeatures, CSV_HEADER};
pub use loader::{mesh_data, neighbor_window, BuildingLoader};
