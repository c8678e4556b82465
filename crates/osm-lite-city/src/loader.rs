// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel building loader
//!
//! The pool is frozen before any building is resolved; afterwards every
//! building runs its resolve, extrude and roof pipeline on its own rayon
//! worker, sharing only the read-only [`CityContext`].

use crate::building::Building;
use crate::config::{CityConfig, PredictionMethod};
use crate::context::CityContext;
use crate::error::Result;
use crate::features::BuildingFeatures;
use osm_lite_geometry::MeshData;
use osm_lite_model::keys::{BUILDING, BUILDING_PART};
use osm_lite_model::{Element, ElementId, ElementRef, ElementResolver, GeoBounds, Tags};
use osm_lite_pool::{ElementPool, PredictedHeights};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::ops::Range;
use std::sync::Arc;

fn is_building(tags: &Tags) -> bool {
    tags.contains(BUILDING) || tags.contains(BUILDING_PART)
}

/// Indices searched for neighbours of the building at `index`
///
/// About `window / 2` buildings on each side, shifted to stay inside
/// `0..len`. A negative window, or one covering everything, searches all.
pub fn neighbor_window(index: usize, len: usize, window: i32) -> Range<usize> {
    if window < 0 || window as usize >= len {
        return 0..len;
    }
    let n = window as usize;
    let begin = if index + n / 2 > len - 1 {
        len - 1 - n
    } else {
        index.saturating_sub(n.div_ceil(2))
    };
    begin..(begin + n + 1).min(len)
}

/// Builds every tagged building of a pool
pub struct BuildingLoader {
    pool: Arc<ElementPool>,
    context: Arc<CityContext>,
}

impl BuildingLoader {
    /// Loader over a frozen pool
    ///
    /// Without a configured origin the projection is centred on the pool's
    /// node bounds. Under [`PredictionMethod::Text`] the `heights_file` is
    /// read here; a missing or unreadable file is an error.
    pub fn new(pool: Arc<ElementPool>, config: CityConfig) -> Result<Self> {
        let mut config = config.sanitized();
        if config.origin.is_none() {
            let (lat, lon) = GeoBounds::from_nodes(pool.nodes().map(|n| n.as_ref())).center();
            config.origin = Some([lat, lon]);
        }

        let resolver: Arc<dyn ElementResolver> = pool.clone();
        let mut context = CityContext::new(config, resolver);
        if context.config.prediction_method == PredictionMethod::Text {
            if let Some(path) = context.config.heights_file.clone() {
                let heights = PredictedHeights::load(&path)?;
                log::info!(
                    "[Loader] {} predicted heights from {}",
                    heights.len(),
                    path.display()
                );
                context = context.with_predictor(Arc::new(heights));
            }
        }

        Ok(Self {
            pool,
            context: Arc::new(context),
        })
    }

    /// Loader with a ready-made context
    ///
    /// The context's resolver is expected to serve the same pool.
    pub fn with_context(pool: Arc<ElementPool>, context: CityContext) -> Self {
        Self {
            pool,
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &Arc<CityContext> {
        &self.context
    }

    /// Elements that become buildings, in build order
    ///
    /// Relations, then ways, carrying `building` or `building:part`, then
    /// tagged nodes that no candidate way references.
    pub fn candidates(&self) -> Vec<Element> {
        let mut candidates: Vec<Element> = self
            .pool
            .relations()
            .filter(|r| is_building(&r.tags))
            .cloned()
            .map(Element::Relation)
            .collect();

        let ways: Vec<_> = self
            .pool
            .ways()
            .filter(|w| is_building(&w.tags))
            .cloned()
            .collect();
        let referenced: FxHashSet<ElementId> =
            ways.iter().flat_map(|w| w.nodes.iter().copied()).collect();
        candidates.extend(ways.into_iter().map(Element::Way));

        candidates.extend(
            self.pool
                .nodes()
                .filter(|n| is_building(&n.tags) && !referenced.contains(&n.id))
                .cloned()
                .map(Element::Node),
        );
        candidates
    }

    /// Build every candidate in parallel
    ///
    /// Buildings whose body could not be meshed are kept with an empty mesh
    /// and counted in the summary.
    pub fn load(&self) -> Vec<Building> {
        let candidates = self.candidates();
        log::debug!("[Loader] {} candidates", candidates.len());

        let buildings: Vec<Building> = candidates
            .into_par_iter()
            .map(|element| Building::new(element, Arc::clone(&self.context)))
            .collect();

        let failed = buildings.iter().filter(|b| b.mesh().is_empty()).count();
        log::info!(
            "[Loader] {} buildings, {} without geometry",
            buildings.len(),
            failed
        );
        buildings
    }

    /// Feature records with neighbours counted inside each building's window
    pub fn features(&self, buildings: &[Building]) -> Vec<BuildingFeatures> {
        let config = &self.context.config;
        let (radius, window) = (config.neighbor_radius, config.neighbor_window);
        buildings
            .par_iter()
            .enumerate()
            .map(|(index, building)| {
                let range = neighbor_window(index, buildings.len(), window);
                let neighbors = buildings[range]
                    .iter()
                    .filter(|other| building.is_neighbor_of(other, radius))
                    .count();
                building.features(neighbors)
            })
            .collect()
    }
}

/// Renderer-ready buffers for every non-empty building, body and roof merged
pub fn mesh_data(buildings: &[Building], double_sided: bool) -> Vec<(ElementRef, MeshData)> {
    buildings
        .par_iter()
        .filter_map(|building| {
            let mesh = building.combined_mesh();
            if mesh.is_empty() {
                return None;
            }
            let element_ref = building.element().element().element_ref();
            Some((element_ref, mesh.to_mesh_data(double_sided)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CityError;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use osm_lite_geometry::Projector;
    use osm_lite_model::{ElementType, ModelError};

    struct FlatProjector;

    impl Projector for FlatProjector {
        fn project(&self, lat: f64, lon: f64) -> Point2<f64> {
            Point2::new(lon, lat)
        }
    }

    const TOWN: &str = r#"{
        "nodes": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.0, "lon": 10.0},
            {"id": 3, "lat": 10.0, "lon": 10.0},
            {"id": 4, "lat": 10.0, "lon": 0.0, "tags": {"building": "yes"}},
            {"id": 5, "lat": 0.0, "lon": 14.0},
            {"id": 6, "lat": 0.0, "lon": 24.0},
            {"id": 7, "lat": 10.0, "lon": 24.0},
            {"id": 8, "lat": 10.0, "lon": 14.0},
            {"id": 9, "lat": 50.0, "lon": 50.0, "tags": {"building": "kiosk"}},
            {"id": 11, "lat": 3.0, "lon": 3.0},
            {"id": 12, "lat": 3.0, "lon": 7.0},
            {"id": 13, "lat": 7.0, "lon": 7.0},
            {"id": 14, "lat": 7.0, "lon": 3.0}
        ],
        "ways": [
            {"id": 100, "nodeIds": [1, 2, 3, 4, 1], "tags": {"building": "yes"}},
            {"id": 101, "nodeIds": [5, 6, 7, 8, 5], "tags": {"building:part": "yes"}},
            {"id": 102, "nodeIds": [11, 12, 13, 14, 11]},
            {"id": 103, "nodeIds": [1, 5], "tags": {"highway": "footway"}}
        ],
        "relations": [
            {"id": 200, "members": [
                {"id": 100, "role": "outer", "type": "way"},
                {"id": 102, "role": "inner", "type": "way"}
             ],
             "tags": {"type": "multipolygon", "building": "yes", "building:levels": "2"}}
        ]
    }"#;

    fn loader() -> BuildingLoader {
        let pool = Arc::new(ElementPool::from_json_str(TOWN).unwrap());
        let context = CityContext::new(CityConfig::default(), pool.clone())
            .with_projector(Arc::new(FlatProjector));
        BuildingLoader::with_context(pool, context)
    }

    #[test]
    fn test_candidates_order() {
        let refs: Vec<ElementRef> = loader()
            .candidates()
            .iter()
            .map(Element::element_ref)
            .collect();
        assert_eq!(
            refs,
            vec![
                ElementRef::relation(200),
                ElementRef::way(100),
                ElementRef::way(101),
                // node 4 belongs to way 100
                ElementRef::node(9),
            ]
        );
    }

    #[test]
    fn test_load_builds_everything() {
        let buildings = loader().load();
        assert_eq!(buildings.len(), 4);
        assert!(buildings.iter().all(|b| !b.mesh().is_empty()));

        let courtyard = &buildings[0];
        assert_eq!(courtyard.kind(), ElementType::Relation);
        assert_relative_eq!(courtyard.height(), 6.0);
        assert_relative_eq!(courtyard.ground_area(), 100.0 - 16.0, epsilon = 1e-9);

        let part = &buildings[2];
        assert_eq!(part.building_type(), "yes");
        assert_relative_eq!(part.ground_area(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_features_count_neighbors() {
        let loader = loader();
        let buildings = loader.load();
        let features = loader.features(&buildings);
        assert_eq!(features.len(), 4);
        // the relation and the two ways share type and elevation, the kiosk is alone
        assert_eq!(features[0].neighbors, 2);
        assert_eq!(features[3].neighbors, 0);
        assert_eq!(features[3].building_type, "kiosk");
    }

    #[test]
    fn test_mesh_data_export() {
        let buildings = loader().load();
        let single = mesh_data(&buildings, false);
        let double = mesh_data(&buildings, true);
        assert_eq!(single.len(), 4);
        assert_eq!(single[0].0, ElementRef::relation(200));
        assert_eq!(
            double[1].1.triangle_count(),
            2 * single[1].1.triangle_count()
        );
    }

    #[test]
    fn test_neighbor_window() {
        assert_eq!(neighbor_window(0, 10, 4), 0..5);
        assert_eq!(neighbor_window(5, 10, 4), 3..8);
        assert_eq!(neighbor_window(9, 10, 4), 5..10);
        assert_eq!(neighbor_window(3, 10, -1), 0..10);
        assert_eq!(neighbor_window(3, 10, 20), 0..10);
        assert_eq!(neighbor_window(0, 0, 100), 0..0);
    }

    #[test]
    fn test_origin_defaults_to_pool_center() {
        let pool = Arc::new(ElementPool::from_json_str(TOWN).unwrap());
        let loader = BuildingLoader::new(pool, CityConfig::default()).unwrap();
        assert_eq!(loader.context().config.origin, Some([25.0, 25.0]));
        let p = loader.context().projector.project(25.0, 25.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_heights_file() {
        let pool = Arc::new(ElementPool::from_json_str(TOWN).unwrap());
        let config = CityConfig {
            prediction_method: PredictionMethod::Text,
            heights_file: Some("/nonexistent/heights.txt".into()),
            ..CityConfig::default()
        };
        assert!(matches!(
            BuildingLoader::new(pool, config),
            Err(CityError::Model(ModelError::Io(_)))
        ));
    }
}
