// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building entity
//!
//! A [`Building`] wraps one OSM element carrying a `building` or
//! `building:part` tag. Construction runs the whole pipeline once:
//!
//! 1. resolve the element graph
//! 2. pick a height (tag, prediction, picture or floors)
//! 3. extrude the body (primitive, prism or multipolygon)
//! 4. build the roof (roofline relation or parametric shape), lowering the
//!    body's ceiling by the roof height and placing the roof on top
//!
//! Scalar metrics are computed on first access and memoised. The setters
//! ([`Building::set_tag`], [`Building::set_config`],
//! [`Building::set_predicted_height`]) drop the memoised values and run the
//! pipeline again before returning.

use crate::config::{CityConfig, PredictionMethod};
use crate::context::CityContext;
use crate::features::BuildingFeatures;
use nalgebra::{Point2, Point3};
use osm_lite_geometry::{
    build_from_roof_lines, extrude_footprint, footprint, roof_height, FaceRole, Mesh,
    Multipolygon, PrimitiveSize, Projector, Result as GeometryResult, RoofFrame, RoofParams,
    RoofPlacement, RoofShape, RooflineWays,
};
use osm_lite_model::keys::{
    ADDR_CITY, ADDR_COUNTRY, ADDR_HOUSENUMBER, ADDR_POSTCODE, ADDR_STREET, BUILDING,
    BUILDING_COLOUR, BUILDING_LEVELS, BUILDING_MATERIAL, BUILDING_ROOF_HEIGHT,
    BUILDING_ROOF_SHAPE, ELEVATION, HEIGHT, NAME, ROOF_ANGLE, ROOF_COLOUR, ROOF_DIRECTION,
    ROOF_HEIGHT, ROOF_LEVELS, ROOF_MATERIAL, ROOF_ORIENTATION, ROOF_SHAPE,
};
use osm_lite_model::{
    parse_color, parse_direction, parse_height, Element, ElementId, ElementResolver,
    ElementType, ResolvedElement, Rgba, RoofOrientation, Tags,
};
use std::sync::{Arc, OnceLock};

/// Type of buildings whose `building` tag is missing (building parts)
pub const DEFAULT_BUILDING_TYPE: &str = "yes";

/// Where a building's height came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeightSource {
    /// Positive `height` tag
    Tag,
    /// External regression table
    Predicted,
    /// Facade measured on a picture
    Picture,
    /// Floors times floor height
    Floors,
}

/// Height in scene units with its source
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightEstimate {
    pub value: f64,
    pub source: HeightSource,
}

/// How the roof of a building was produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoofSource {
    Parametric(RoofShape),
    /// Rebuilt from ridge and edge ways of a relation
    Roofline,
}

/// Roof mesh in the building frame
#[derive(Clone, Debug)]
pub struct BuildingRoof {
    pub source: RoofSource,
    /// Amount the body's ceiling was lowered by
    pub height: f64,
    pub mesh: Mesh,
}

/// Memoised scalars; empty cells are computed on next access
#[derive(Debug, Default)]
struct MetricsCache {
    ground_area: OnceLock<f64>,
    perimeter: OnceLock<f64>,
    barycenter: OnceLock<Option<Point2<f64>>>,
    height: OnceLock<HeightEstimate>,
}

/// Height from a measured facade
///
/// `dims` is the matched region in pixels as `(width, height)`; `reference`
/// is the real extent (meters) spanned by the pixel width.
pub fn estimate_height_from_image(dims: (u32, u32), reference: f64) -> Option<f64> {
    let (w_px, h_px) = dims;
    if w_px == 0 || h_px == 0 || !(reference > 0.0) {
        return None;
    }
    Some(h_px as f64 * reference / w_px as f64)
}

/// One building with its body and roof meshes
pub struct Building {
    element: ResolvedElement,
    context: Arc<CityContext>,
    cache: MetricsCache,
    /// Survives tag changes; cleared by a new config
    picture_height: OnceLock<Option<f64>>,
    /// Per-building override of the prediction table
    predicted: Option<f64>,
    body: Mesh,
    roof: Option<BuildingRoof>,
}

impl Building {
    /// Resolve `element` and build its meshes
    pub fn new(element: Element, context: Arc<CityContext>) -> Self {
        let resolved = ResolvedElement::new(element, Arc::clone(&context.resolver));
        let mut building = Self {
            element: resolved,
            context,
            cache: MetricsCache::default(),
            picture_height: OnceLock::new(),
            predicted: None,
            body: Mesh::new(),
            roof: None,
        };
        building.rebuild();
        building
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

    pub fn element(&self) -> &ResolvedElement {
        &self.element
    }

    pub fn config(&self) -> &CityConfig {
        &self.context.config
    }

    /// `w42` style label used in logs
    pub fn label(&self) -> String {
        format!("{}{}", self.kind().prefix(), self.id())
    }

    fn projector(&self) -> &dyn Projector {
        self.context.projector.as_ref()
    }

    fn resolver(&self) -> &dyn ElementResolver {
        self.context.resolver.as_ref()
    }

    // ------------------------------------------------------------------
    // Meshes
    // ------------------------------------------------------------------

    /// Extruded body; its ceiling sits below the roof
    pub fn mesh(&self) -> &Mesh {
        &self.body
    }

    pub fn roof(&self) -> Option<&BuildingRoof> {
        self.roof.as_ref()
    }

    /// Body and roof in one mesh
    pub fn combined_mesh(&self) -> Mesh {
        let mut mesh = self.body.clone();
        if let Some(roof) = &self.roof {
            mesh.merge(&roof.mesh);
        }
        mesh
    }

    fn rebuild(&mut self) {
        self.cache = MetricsCache::default();
        let height = self.height();

        let mut body = match self.build_body(height) {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("{}: no body mesh: {}", self.label(), e);
                Mesh::new()
            }
        };
        let roof = if body.is_empty() {
            None
        } else {
            match self.build_roof(&mut body, height) {
                Ok(roof) => roof,
                Err(e) => {
                    log::warn!("{}: roof skipped: {}", self.label(), e);
                    None
                }
            }
        };

        log::debug!(
            "{}: height {:.2} ({:?}), {} body faces, roof {:?}",
            self.label(),
            height,
            self.height_estimate().source,
            body.face_count(),
            roof.as_ref().map(|r| r.source)
        );
        self.body = body;
        self.roof = roof;
    }

    fn primitive_size(&self) -> PrimitiveSize {
        PrimitiveSize {
            length: self.length(),
            width: self.width(),
            kind: self.context.config.node_shape.into(),
        }
    }

    fn build_body(&self, height: f64) -> GeometryResult<Mesh> {
        let projector = self.projector();
        match self.element.element() {
            Element::Node(node) => {
                let ring: Vec<Point2<f64>> =
                    footprint::node_position(node, projector).into_iter().collect();
                extrude_footprint(&ring, 0.0, height, self.primitive_size())
            }
            Element::Way(_) => {
                let ring = footprint::ring_positions(self.element.sub_nodes(), projector);
                extrude_footprint(&ring, 0.0, height, self.context.config.primitive_size())
            }
            Element::Relation(relation) => Multipolygon::assemble(relation, self.resolver())
                .extrude(
                    self.resolver(),
                    projector,
                    0.0,
                    height,
                    self.context.config.primitive_size(),
                ),
        }
    }

    /// Roof height from the roof tags for a roof `width` across the ridge
    fn tagged_roof_height(&self, width: f64) -> f64 {
        let tags = self.tags();
        let config = &self.context.config;
        let explicit = [ROOF_HEIGHT, BUILDING_ROOF_HEIGHT]
            .iter()
            .filter_map(|key| tags.get(key))
            .map(parse_height)
            .find(|h| *h > 0.0);
        roof_height(
            explicit,
            tags.angle(ROOF_ANGLE),
            self.roof_levels(),
            width,
            config.y_meter_scale,
            config.roof_level_height,
        )
    }

    fn build_roof(&self, body: &mut Mesh, height: f64) -> GeometryResult<Option<BuildingRoof>> {
        let frame = RoofFrame::new(self.length(), self.width(), self.roof_orientation());

        if let Element::Relation(relation) = self.element.element() {
            if let Some(lines) = RooflineWays::classify(relation, self.resolver()) {
                let roof_height = self.tagged_roof_height(frame.width);
                if !(roof_height > 0.0) {
                    log::debug!("{}: roofline roof of height {} skipped", self.label(), roof_height);
                    return Ok(None);
                }
                body.update_ceiling(-roof_height);
                let ceiling: Vec<Point3<f64>> = body
                    .faces_with_role(FaceRole::Ceiling)
                    .flat_map(|face| body.face_points(face))
                    .collect();
                let mesh = build_from_roof_lines(
                    &lines,
                    self.resolver(),
                    self.projector(),
                    &ceiling,
                    height,
                );
                return Ok(Some(BuildingRoof {
                    source: RoofSource::Roofline,
                    height: roof_height,
                    mesh,
                }));
            }
        }

        let shape = self.roof_shape();
        if shape == RoofShape::None {
            return Ok(None);
        }

        let config = &self.context.config;
        let mut params = RoofParams::new(
            shape,
            frame.width,
            frame.length,
            self.tagged_roof_height(frame.width),
        );
        params.footprint_x = self.length();
        params.footprint_z = self.width();
        params.arch_segments_per_meter = config.arch_segments_per_meter;
        params.dome_subdivisions = config.dome_subdivisions;

        let roof_height = params.effective_height();
        if !(roof_height > 0.0) {
            log::debug!("{}: {} roof of height {} skipped", self.label(), shape, roof_height);
            return Ok(None);
        }
        let mut mesh = self.context.router.build(&params)?;
        if roof_height >= height {
            log::warn!(
                "{}: {} roof of {:.2} is not lower than the building ({:.2})",
                self.label(),
                shape,
                roof_height,
                height
            );
        }
        body.update_ceiling(-roof_height);

        let center = self.center();
        RoofPlacement::new(
            center.x,
            center.y,
            height,
            roof_height,
            shape,
            frame.ridge_along_x,
            self.roof_direction(),
        )
        .apply(&mut mesh);

        Ok(Some(BuildingRoof {
            source: RoofSource::Parametric(shape),
            height: roof_height,
            mesh,
        }))
    }

    // ------------------------------------------------------------------
    // Tag attributes
    // ------------------------------------------------------------------

    /// Value of the `building` tag
    pub fn building_type(&self) -> &str {
        self.tags().get(BUILDING).unwrap_or(DEFAULT_BUILDING_TYPE)
    }

    pub fn name(&self) -> Option<&str> {
        self.tags().get(NAME)
    }

    /// `building:levels`, at least 1
    pub fn floors(&self) -> i32 {
        self.tags()
            .levels(BUILDING_LEVELS)
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    /// `ele`, 0 when absent
    pub fn elevation(&self) -> i32 {
        self.tags().int(ELEVATION).unwrap_or(0)
    }

    pub fn house_number(&self) -> Option<i32> {
        self.tags().int(ADDR_HOUSENUMBER)
    }

    pub fn post_code(&self) -> Option<i32> {
        self.tags().int(ADDR_POSTCODE)
    }

    pub fn street(&self) -> Option<&str> {
        self.tags().get(ADDR_STREET)
    }

    pub fn city(&self) -> Option<&str> {
        self.tags().get(ADDR_CITY)
    }

    pub fn country(&self) -> Option<&str> {
        self.tags().get(ADDR_COUNTRY)
    }

    pub fn color(&self) -> Option<Rgba> {
        self.tags().get(BUILDING_COLOUR).and_then(parse_color)
    }

    pub fn material(&self) -> Option<&str> {
        self.tags().get(BUILDING_MATERIAL)
    }

    pub fn roof_color(&self) -> Option<Rgba> {
        self.tags().get(ROOF_COLOUR).and_then(parse_color)
    }

    pub fn roof_material(&self) -> Option<&str> {
        self.tags().get(ROOF_MATERIAL)
    }

    /// `roof:shape` or `building:roof:shape`; unknown values give no roof
    pub fn roof_shape(&self) -> RoofShape {
        let Some(raw) = self.tags().first_of(&[ROOF_SHAPE, BUILDING_ROOF_SHAPE]) else {
            return RoofShape::None;
        };
        RoofShape::parse(raw).unwrap_or_else(|| {
            log::warn!("{}: unknown roof shape {:?}", self.label(), raw);
            RoofShape::None
        })
    }

    /// `roof:levels`, at least 1
    pub fn roof_levels(&self) -> i32 {
        self.tags()
            .levels(ROOF_LEVELS)
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    pub fn roof_orientation(&self) -> RoofOrientation {
        self.tags()
            .get(ROOF_ORIENTATION)
            .and_then(RoofOrientation::parse)
            .unwrap_or_default()
    }

    /// `roof:direction` in degrees
    pub fn roof_direction(&self) -> Option<f64> {
        let raw = self.tags().get(ROOF_DIRECTION)?;
        let direction = parse_direction(raw);
        if direction.is_none() {
            log::warn!("{}: unparsable roof direction {:?}", self.label(), raw);
        }
        direction
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Projected `(x, z)` spans of the bounds
    fn spans(&self) -> (f64, f64) {
        footprint::projected_spans(&self.element.bounds(), self.projector())
    }

    /// Extent along `z`; the scaled default for a zero span
    pub fn width(&self) -> f64 {
        let (_, z) = self.spans();
        if z.is_finite() && z.abs() > 0.0 {
            z.abs()
        } else {
            self.context.config.scaled_default_width()
        }
    }

    /// Extent along `x`; the scaled default for a zero span
    pub fn length(&self) -> f64 {
        let (x, _) = self.spans();
        if x.is_finite() && x.abs() > 0.0 {
            x.abs()
        } else {
            self.context.config.scaled_default_length()
        }
    }

    /// Projection of the bounds midpoint
    pub fn center(&self) -> Point2<f64> {
        let (lat, lon) = self.element.bounds().center();
        self.projector().project(lat, lon)
    }

    pub fn height(&self) -> f64 {
        self.height_estimate().value
    }

    pub fn height_estimate(&self) -> HeightEstimate {
        *self.cache.height.get_or_init(|| self.resolve_height())
    }

    fn resolve_height(&self) -> HeightEstimate {
        let config = &self.context.config;
        let y_scale = config.y_meter_scale;

        if let Some(raw) = self.tags().get(HEIGHT) {
            let h = parse_height(raw);
            if h > 0.0 {
                return HeightEstimate {
                    value: h * y_scale,
                    source: HeightSource::Tag,
                };
            }
            log::debug!("{}: height {:?} unusable", self.label(), raw);
        }

        let predicted = match config.prediction_method {
            PredictionMethod::None => None,
            PredictionMethod::Text => self
                .predicted
                .or_else(|| {
                    self.context
                        .predictor
                        .as_ref()
                        .and_then(|p| p.predict_height(self.id()))
                })
                .filter(|h| *h > 0.0)
                .map(|h| (h, HeightSource::Predicted)),
            PredictionMethod::Picture => self
                .picture_height()
                .filter(|h| *h > 0.0)
                .map(|h| (h, HeightSource::Picture)),
        };
        if let Some((h, source)) = predicted {
            return HeightEstimate {
                value: h * y_scale,
                source,
            };
        }

        HeightEstimate {
            value: config.floor_height * y_scale * self.floors() as f64,
            source: HeightSource::Floors,
        }
    }

    /// Height measured on the building's picture, in meters
    ///
    /// The pixel width spans the building width (or length, see
    /// `PictureOptions::is_width`), taken back to meters.
    pub fn picture_height(&self) -> Option<f64> {
        *self.picture_height.get_or_init(|| {
            let source = self.context.picture.as_ref()?;
            let config = &self.context.config;
            let (color, mode) = config.picture.scan();
            let dims = source.measure(self.id(), color, config.picture.tolerance, mode)?;
            let reference = if config.picture.is_width {
                self.width() / config.z_meter_scale
            } else {
                self.length() / config.x_meter_scale
            };
            estimate_height_from_image(dims, reference)
        })
    }

    /// Planar footprint rings: the way's ring or a relation's outer rings
    pub fn footprint_rings(&self) -> Vec<Vec<Point2<f64>>> {
        let projector = self.projector();
        match self.element.element() {
            Element::Node(_) => Vec::new(),
            Element::Way(_) => vec![footprint::ring_positions(
                self.element.sub_nodes(),
                projector,
            )],
            Element::Relation(relation) => {
                let resolver = self.resolver();
                Multipolygon::assemble(relation, resolver)
                    .groups
                    .iter()
                    .flat_map(|group| group.outer_rings())
                    .map(|ring| {
                        ring.open_nodes()
                            .iter()
                            .filter_map(|&id| resolver.node(id))
                            .filter_map(|n| footprint::node_position(&n, projector))
                            .collect()
                    })
                    .collect()
            }
        }
    }

    /// Area of the ground faces; `width * length` for a node
    ///
    /// A way with fewer than 3 positioned nodes has no footprint, so its
    /// fallback primitives do not count.
    pub fn ground_area(&self) -> f64 {
        *self.cache.ground_area.get_or_init(|| match self.element.element() {
            Element::Node(_) => self.width() * self.length(),
            Element::Way(_)
                if footprint::ring_positions(self.element.sub_nodes(), self.projector()).len()
                    < 3 =>
            {
                0.0
            }
            _ => footprint::ground_area(&self.body),
        })
    }

    /// Summed perimeter of the footprint rings; `2w + 2l` for a node
    pub fn perimeter(&self) -> f64 {
        *self.cache.perimeter.get_or_init(|| match self.kind() {
            ElementType::Node => 2.0 * self.width() + 2.0 * self.length(),
            _ => self
                .footprint_rings()
                .iter()
                .map(|ring| footprint::perimeter(ring))
                .sum(),
        })
    }

    pub fn compactness_index(&self) -> f64 {
        footprint::compactness_index(self.ground_area(), self.perimeter())
    }

    /// Node position, or the projected mean of the resolved nodes
    ///
    /// A closed way's repeated first node is counted once.
    pub fn barycenter(&self) -> Option<Point2<f64>> {
        *self.cache.barycenter.get_or_init(|| match self.element.element() {
            Element::Node(node) => footprint::node_position(node, self.projector()),
            Element::Way(_) => footprint::barycenter(
                footprint::open_ring(self.element.sub_nodes()),
                self.projector(),
            ),
            Element::Relation(_) => {
                footprint::barycenter(self.element.sub_nodes(), self.projector())
            }
        })
    }

    /// Ground area times floors
    pub fn net_internal_surface(&self) -> f64 {
        self.ground_area() * self.floors() as f64
    }

    /// Orientation of the first footprint ring against the south-west corner
    pub fn orientation_deg(&self) -> f64 {
        let bounds = self.element.bounds();
        let corner = self.projector().project(bounds.min_lat, bounds.min_lon);
        self.footprint_rings()
            .first()
            .map(|ring| footprint::orientation_deg(ring, corner))
            .unwrap_or(0.0)
    }

    // ------------------------------------------------------------------
    // Neighbours
    // ------------------------------------------------------------------

    /// `other` has the same type and elevation and a node within `radius`
    /// meters of this building's barycenter
    ///
    /// The radius is scaled per direction by the x/z meter scales.
    pub fn is_neighbor_of(&self, other: &Building, radius: f64) -> bool {
        if other.id() == self.id() && other.kind() == self.kind() {
            return false;
        }
        if other.building_type() != self.building_type() || other.elevation() != self.elevation()
        {
            return false;
        }
        let Some(center) = self.barycenter() else {
            return false;
        };
        let config = &self.context.config;
        other
            .element
            .extent_nodes()
            .iter()
            .filter_map(|n| footprint::node_position(n, self.projector()))
            .any(|p| {
                let theta = f64::atan2((p.y - center.y).abs(), (p.x - center.x).abs());
                let x_radius = radius * theta.cos() * config.x_meter_scale;
                let z_radius = radius * theta.sin() * config.z_meter_scale;
                (p - center).norm() < x_radius.hypot(z_radius)
            })
    }

    pub fn neighbors<'a>(&self, buildings: &'a [Building], radius: f64) -> Vec<&'a Building> {
        buildings
            .iter()
            .filter(|b| self.is_neighbor_of(b, radius))
            .collect()
    }

    /// Feature record with a precomputed neighbour count
    pub fn features(&self, neighbors: usize) -> BuildingFeatures {
        BuildingFeatures {
            id: self.id(),
            area: self.ground_area(),
            perimeter: self.perimeter(),
            index: self.compactness_index(),
            floors: self.floors(),
            nis: self.net_internal_surface(),
            neighbors,
            length: self.length(),
            width: self.width(),
            building_type: self.building_type().to_string(),
            height: self.height(),
        }
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// Change one tag and rebuild
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        let element = match self.element.element() {
            Element::Node(node) => {
                let mut node = node.as_ref().clone();
                node.tags.insert(key, value);
                Element::from(node)
            }
            Element::Way(way) => {
                let mut way = way.as_ref().clone();
                way.tags.insert(key, value);
                Element::from(way)
            }
            Element::Relation(relation) => {
                let mut relation = relation.as_ref().clone();
                relation.tags.insert(key, value);
                Element::from(relation)
            }
        };
        self.element = ResolvedElement::new(element, Arc::clone(&self.context.resolver));
        self.rebuild();
    }

    /// Switch to a new config and rebuild
    pub fn set_config(&mut self, config: CityConfig) {
        self.context = Arc::new(self.context.with_config(config));
        self.picture_height = OnceLock::new();
        self.rebuild();
    }

    /// Use `height` (meters) as this building's predicted height and rebuild
    ///
    /// Only consulted under [`PredictionMethod::Text`].
    pub fn set_predicted_height(&mut self, height: f64) {
        self.predicted = Some(height);
        self.rebuild();
    }
}

impl std::fmt::Debug for Building {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Building")
            .field("element", &self.label())
            .field("height", &self.cache.height.get())
            .field("body_faces", &self.body.face_count())
            .field("roof", &self.roof.as_ref().map(|r| r.source))
            .finish()
    }
}
