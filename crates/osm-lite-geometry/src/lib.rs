// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # OSM-Lite Geometry
//!
//! Footprints, extrusions and roofs for OSM buildings. Elements come from
//! any pool implementing the `ElementResolver` trait of `osm-lite-model`.
//!
//! ## Overview
//!
//! - **Projection**: geographic coordinates to the planar `(x, z)` frame
//! - **Footprint**: rings, bounds, area, perimeter, barycenter
//! - **Extrusion**: prisms (with courtyards) and node primitives whose faces
//!   carry explicit [`FaceRole`]s
//! - **Roof**: eleven parametric shapes dispatched by [`RoofRouter`]
//! - **Roofline**: roofs rebuilt from tagged ridge and edge ways
//! - **Multipolygon**: outer/inner way fragments stitched into rings
//!
//! The vertical axis is `y`; footprints live in `(x, z)`, stored in the
//! `x` and `y` fields of a [`Point2`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use osm_lite_geometry::{
//!     extrude_footprint, Point2, PrimitiveSize, RoofParams, RoofRouter, RoofShape,
//! };
//!
//! let ring = vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(12.0, 0.0),
//!     Point2::new(12.0, 8.0),
//!     Point2::new(0.0, 8.0),
//! ];
//! let mut body = extrude_footprint(&ring, 0.0, 9.0, PrimitiveSize::default())?;
//! body.update_ceiling(-3.0);
//!
//! let roof = RoofRouter::with_default_processors()
//!     .build(&RoofParams::new(RoofShape::Hipped, 8.0, 12.0, 3.0))?;
//! println!("{} + {} faces", body.face_count(), roof.face_count());
//! ```

pub mod error;
pub mod extrusion;
pub mod footprint;
pub mod mesh;
pub mod multipolygon;
pub mod profile;
pub mod projection;
pub mod roof;
pub mod roofline;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

// Re-export main types
pub use error::{Error, Result};
pub use extrusion::{
    apply_transform, box_primitive, cylinder_primitive, extrude_footprint, extrude_profile,
    NodePrimitive, PrimitiveSize,
};
pub use footprint::{
    barycenter, bounding_box, compactness_index, ground_area, node_position, open_ring,
    orientation_deg, perimeter, projected_spans, ring_area, ring_positions,
};
pub use mesh::{Face, FaceRole, Mesh, MeshData};
pub use multipolygon::{stitch_ways, Multipolygon, PolygonGroup, StitchedRing};
pub use profile::{calculate_circle_segments, Profile2D};
pub use projection::{EquirectangularProjector, Projector};
pub use roof::{
    pre_angle, roof_height, RoofFrame, RoofParams, RoofPlacement, RoofPrism, RoofProcessor,
    RoofRouter, RoofShape, FLAT_ROOF_HEIGHT,
};
pub use roofline::{build_from_roof_lines, is_roof_line, RooflineWays};
pub use triangulation::{
    calculate_polygon_normal, triangulate_polygon, triangulate_polygon_with_holes,
};

// Re-export processors
pub use roof::{
    DomeRoofProcessor, FlatRoofProcessor, PrismRoofProcessor, RoundRoofProcessor,
    SkillionRoofProcessor,
};
