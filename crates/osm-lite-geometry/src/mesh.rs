// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon mesh with explicit face roles
//!
//! Building and roof geometry is kept as shared `f64` vertices plus polygon
//! faces. Roof transforms move and insert vertices, so faces stay polygons
//! until export; [`Mesh::to_mesh_data`] triangulates them into GPU-ready
//! buffers.

use crate::triangulation::{calculate_polygon_normal, fan_triangulate, triangulate_polygon_3d};
use crate::{Point3, Vector3};

/// What a face is for
///
/// Assigned when the face is created, so the ceiling that a roof attaches to
/// is found by role instead of by comparing vertex heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceRole {
    /// Footprint at ground level
    Ground,
    /// Top of an extruded facade
    Ceiling,
    /// Side wall of an extrusion
    Wall,
    /// Sloped or curved roof surface
    Roof,
    /// Closing face of a roof solid (underside, end caps)
    Cap,
}

/// One polygon face
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Outer loop as indices into [`Mesh::positions`]
    pub vertices: Vec<usize>,
    /// Hole loops, same index space
    pub holes: Vec<Vec<usize>>,
    pub role: FaceRole,
}

impl Face {
    pub fn new(vertices: Vec<usize>, role: FaceRole) -> Self {
        Self {
            vertices,
            holes: Vec::new(),
            role,
        }
    }

    pub fn with_holes(vertices: Vec<usize>, holes: Vec<Vec<usize>>, role: FaceRole) -> Self {
        Self {
            vertices,
            holes,
            role,
        }
    }

    /// Same face with the opposite winding
    pub fn flipped(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        let holes = self
            .holes
            .iter()
            .map(|h| h.iter().rev().copied().collect())
            .collect();
        Self {
            vertices,
            holes,
            role: self.role,
        }
    }

    /// Every index the face references, outer loop first
    pub fn all_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices
            .iter()
            .chain(self.holes.iter().flatten())
            .copied()
    }
}

/// Triangulated export buffers
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Polygon mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Shared vertex positions
    pub positions: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Add a vertex and return its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.positions.push(position);
        self.positions.len() - 1
    }

    /// Add a face and return its index
    #[inline]
    pub fn add_face(&mut self, vertices: Vec<usize>, role: FaceRole) -> usize {
        self.faces.push(Face::new(vertices, role));
        self.faces.len() - 1
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Number of triangles after triangulating every face
    pub fn triangle_count(&self) -> usize {
        self.face_indices().iter().map(|f| f.len() / 3).sum()
    }

    /// Faces carrying a role
    pub fn faces_with_role(&self, role: FaceRole) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(move |f| f.role == role)
    }

    /// First ground face
    pub fn ground_face(&self) -> Option<&Face> {
        self.faces_with_role(FaceRole::Ground).next()
    }

    /// First ceiling face
    pub fn ceiling_face(&self) -> Option<&Face> {
        self.faces_with_role(FaceRole::Ceiling).next()
    }

    /// Positions of a face's outer loop
    pub fn face_points(&self, face: &Face) -> Vec<Point3<f64>> {
        face.vertices.iter().map(|&i| self.positions[i]).collect()
    }

    /// Unit normal of a face (Newell)
    pub fn face_normal(&self, face: &Face) -> Vector3<f64> {
        calculate_polygon_normal(&self.face_points(face))
    }

    /// Move every vertex used by faces of `role`
    ///
    /// Vertices are shared, so walls attached to a moved ceiling stretch with
    /// it. Each vertex moves once even when several faces reference it.
    pub fn translate_role(&mut self, role: FaceRole, offset: Vector3<f64>) {
        let mut moved = vec![false; self.positions.len()];
        for face in self.faces.iter().filter(|f| f.role == role) {
            for i in face.all_indices() {
                if !moved[i] {
                    moved[i] = true;
                    self.positions[i] += offset;
                }
            }
        }
    }

    /// Raise (or lower, with a negative offset) the ceiling of an extrusion
    pub fn update_ceiling(&mut self, offset: f64) {
        if offset == 0.0 {
            return;
        }
        self.translate_role(FaceRole::Ceiling, Vector3::new(0.0, offset, 0.0));
    }

    /// Translate the whole mesh
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Copy of the mesh with every face present in both windings
    pub fn duplicate_and_flip(&self) -> Mesh {
        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        faces.extend(self.faces.iter().cloned());
        faces.extend(self.faces.iter().map(Face::flipped));
        Mesh {
            positions: self.positions.clone(),
            faces,
        }
    }

    /// Triangle indices per face, into [`Mesh::positions`]
    ///
    /// A triangle yields 3 indices, a planar quad 6. Faces that fail to
    /// triangulate fall back to a fan over the outer loop.
    pub fn face_indices(&self) -> Vec<Vec<usize>> {
        self.faces.iter().map(|f| self.triangulate_face(f)).collect()
    }

    fn triangulate_face(&self, face: &Face) -> Vec<usize> {
        if face.vertices.len() < 3 {
            return Vec::new();
        }
        if face.holes.is_empty() && face.vertices.len() == 3 {
            return face.vertices.clone();
        }

        let outer = self.face_points(face);
        let holes: Vec<Vec<Point3<f64>>> = face
            .holes
            .iter()
            .map(|h| h.iter().map(|&i| self.positions[i]).collect())
            .collect();
        let local = match triangulate_polygon_3d(&outer, &holes) {
            Ok(local) if !local.is_empty() => local,
            Ok(_) => fan_triangulate(face.vertices.len()),
            Err(e) => {
                log::debug!("face triangulation failed ({}), using fan", e);
                fan_triangulate(face.vertices.len())
            }
        };

        let lookup: Vec<usize> = face.all_indices().collect();
        local.into_iter().map(|i| lookup[i]).collect()
    }

    /// Sum of triangle areas over faces of `role`
    pub fn area_of_role(&self, role: FaceRole) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.role == role)
            .map(|f| {
                self.triangulate_face(f)
                    .chunks_exact(3)
                    .map(|t| {
                        crate::triangulation::heron_area(
                            &self.positions[t[0]],
                            &self.positions[t[1]],
                            &self.positions[t[2]],
                        )
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Export as flat-shaded triangle buffers
    ///
    /// Each face gets its own vertices so normals stay crisp at edges. With
    /// `double_sided` every face is emitted a second time, reversed.
    pub fn to_mesh_data(&self, double_sided: bool) -> MeshData {
        let mut data = MeshData::default();
        for face in &self.faces {
            let tris = self.triangulate_face(face);
            if tris.is_empty() {
                continue;
            }
            let normal = self.face_normal(face);
            push_triangles(&mut data, &self.positions, &tris, normal, false);
            if double_sided {
                push_triangles(&mut data, &self.positions, &tris, -normal, true);
            }
        }
        data
    }

    /// Append another mesh
    pub fn merge(&mut self, other: &Mesh) {
        if other.positions.is_empty() {
            return;
        }
        let offset = self.positions.len();
        self.positions.extend_from_slice(&other.positions);
        self.faces.extend(other.faces.iter().map(|f| Face {
            vertices: f.vertices.iter().map(|i| i + offset).collect(),
            holes: f
                .holes
                .iter()
                .map(|h| h.iter().map(|i| i + offset).collect())
                .collect(),
            role: f.role,
        }));
    }

    /// Axis-aligned bounds, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some((min, max))
    }

    /// Drop vertices no face references and renumber the rest
    pub fn compact(&mut self) {
        let mut remap = vec![usize::MAX; self.positions.len()];
        let mut positions = Vec::with_capacity(self.positions.len());
        for face in &self.faces {
            for i in face.all_indices() {
                if remap[i] == usize::MAX {
                    remap[i] = positions.len();
                    positions.push(self.positions[i]);
                }
            }
        }
        for face in &mut self.faces {
            for i in face.vertices.iter_mut() {
                *i = remap[*i];
            }
            for hole in face.holes.iter_mut() {
                for i in hole.iter_mut() {
                    *i = remap[*i];
                }
            }
        }
        self.positions = positions;
    }
}

fn push_triangles(
    data: &mut MeshData,
    positions: &[Point3<f64>],
    tris: &[usize],
    normal: Vector3<f64>,
    reversed: bool,
) {
    let base = data.vertex_count() as u32;
    for &i in tris {
        let p = positions[i];
        data.positions
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        data.normals
            .extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
    }
    for t in 0..tris.len() / 3 {
        let i0 = base + (t * 3) as u32;
        if reversed {
            data.indices.extend_from_slice(&[i0, i0 + 2, i0 + 1]);
        } else {
            data.indices.extend_from_slice(&[i0, i0 + 1, i0 + 2]);
        }
    }
}
