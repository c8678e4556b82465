// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only state shared by every building of a load

use crate::config::CityConfig;
use osm_lite_geometry::{Projector, RoofRouter};
use osm_lite_model::{ElementResolver, HeightPredictor, PictureSource};
use std::sync::Arc;

/// Collaborators a building needs to resolve and mesh itself
///
/// Everything here is shared behind `Arc` and never mutated, so one context
/// serves all building workers at once.
#[derive(Clone)]
pub struct CityContext {
    pub config: CityConfig,
    pub resolver: Arc<dyn ElementResolver>,
    pub projector: Arc<dyn Projector>,
    pub router: Arc<RoofRouter>,
    pub predictor: Option<Arc<dyn HeightPredictor>>,
    pub picture: Option<Arc<dyn PictureSource>>,
    /// The projector came from [`CityContext::with_projector`]
    injected_projector: bool,
}

impl CityContext {
    /// Context with the config's projector and the default roof processors
    pub fn new(config: CityConfig, resolver: Arc<dyn ElementResolver>) -> Self {
        let config = config.sanitized();
        let projector: Arc<dyn Projector> = Arc::new(config.projector());
        Self {
            config,
            resolver,
            projector,
            router: Arc::new(RoofRouter::with_default_processors()),
            predictor: None,
            picture: None,
            injected_projector: false,
        }
    }

    /// Replace the config's projector
    ///
    /// An injected projector is kept by [`CityContext::with_config`].
    pub fn with_projector(mut self, projector: Arc<dyn Projector>) -> Self {
        self.projector = projector;
        self.injected_projector = true;
        self
    }

    pub fn with_router(mut self, router: RoofRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn HeightPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_picture_source(mut self, picture: Arc<dyn PictureSource>) -> Self {
        self.picture = Some(picture);
        self
    }

    /// Same collaborators under a new config
    ///
    /// A config without an origin inherits the current one. The projector
    /// is rebuilt from the new scales and origin, unless it was injected.
    pub fn with_config(&self, config: CityConfig) -> Self {
        let mut config = config.sanitized();
        if config.origin.is_none() {
            config.origin = self.config.origin;
        }
        let projector: Arc<dyn Projector> = if self.injected_projector {
            Arc::clone(&self.projector)
        } else {
            Arc::new(config.projector())
        };
        Self {
            projector,
            config,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use osm_lite_pool::ElementPool;

    struct FlatProjector;

    impl Projector for FlatProjector {
        fn project(&self, lat: f64, lon: f64) -> Point2<f64> {
            Point2::new(lon, lat)
        }
    }

    fn resolver() -> Arc<dyn ElementResolver> {
        Arc::new(ElementPool::default())
    }

    #[test]
    fn test_with_config_keeps_origin() {
        let config = CityConfig {
            origin: Some([48.0, 2.0]),
            ..CityConfig::default()
        };
        let context = CityContext::new(config, resolver()).with_config(CityConfig {
            floor_height: 4.0,
            ..CityConfig::default()
        });
        assert_eq!(context.config.origin, Some([48.0, 2.0]));
        assert_eq!(context.config.floor_height, 4.0);
        let p = context.projector.project(48.0, 2.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_with_config_keeps_injected_projector() {
        let context = CityContext::new(CityConfig::default(), resolver())
            .with_projector(Arc::new(FlatProjector))
            .with_config(CityConfig {
                x_meter_scale: 2.0,
                ..CityConfig::default()
            });
        assert_eq!(context.config.x_meter_scale, 2.0);
        assert_eq!(context.projector.project(3.0, 4.0), Point2::new(4.0, 3.0));
    }

    #[test]
    fn test_with_config_rebuilds_config_projector() {
        let context = CityContext::new(CityConfig::default(), resolver());
        let before = context.projector.project(0.0, 1.0).x;
        let scaled = context.with_config(CityConfig {
            x_meter_scale: 2.0,
            ..CityConfig::default()
        });
        assert_relative_eq!(scaled.projector.project(0.0, 1.0).x, 2.0 * before, epsilon = 1e-6);
    }
}
