// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Base prism and the transforms that deform it into roof shapes

use crate::mesh::{Face, FaceRole, Mesh};
use crate::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Height class of a prism vertex
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexLevel {
    /// At `y = -height / 2`
    Base,
    /// Strictly between base and ridge
    Mid,
    /// At `y = +height / 2`
    Ridge,
}

/// Roof prism centred on its bounding box
///
/// Size `(width, height, length)` along `(x, y, z)`. The four base corners
/// are vertices 0..4 and the two ridge ends are 4 and 5:
///
/// ```text
///  0 (-w/2, -h/2, -l/2)   1 (+w/2, -h/2, -l/2)
///  2 (+w/2, -h/2, +l/2)   3 (-w/2, -h/2, +l/2)
///  4 ( 0,   +h/2, -l/2)   5 ( 0,   +h/2, +l/2)
/// ```
///
/// Gable ends start out as [`FaceRole::Wall`], slopes as [`FaceRole::Roof`]
/// and the underside as [`FaceRole::Cap`].
#[derive(Clone, Debug, PartialEq)]
pub struct RoofPrism {
    pub mesh: Mesh,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    mids: Vec<usize>,
}

impl RoofPrism {
    pub fn new(width: f64, height: f64, length: f64) -> Self {
        let (w, h, l) = (width / 2.0, height / 2.0, length / 2.0);
        let mut mesh = Mesh::with_capacity(6, 5);
        for p in [
            Point3::new(-w, -h, -l),
            Point3::new(w, -h, -l),
            Point3::new(w, -h, l),
            Point3::new(-w, -h, l),
            Point3::new(0.0, h, -l),
            Point3::new(0.0, h, l),
        ] {
            mesh.add_vertex(p);
        }
        mesh.add_face(vec![0, 1, 2, 3], FaceRole::Cap);
        mesh.add_face(vec![0, 4, 1], FaceRole::Wall);
        mesh.add_face(vec![2, 5, 3], FaceRole::Wall);
        mesh.add_face(vec![1, 4, 5, 2], FaceRole::Roof);
        mesh.add_face(vec![3, 5, 4, 0], FaceRole::Roof);

        Self {
            mesh,
            width,
            height,
            length,
            mids: Vec::new(),
        }
    }

    #[inline]
    fn tolerance(&self) -> f64 {
        1e-6 * self.height.abs().max(1.0)
    }

    /// Level of vertex `i`
    ///
    /// Vertices created by [`RoofPrism::create_mid_vertices`] are always
    /// `Mid`, wherever translation moved them.
    pub fn level(&self, i: usize) -> VertexLevel {
        if self.mids.contains(&i) {
            return VertexLevel::Mid;
        }
        let y = self.mesh.positions[i].y;
        let half = self.height / 2.0;
        let eps = self.tolerance();
        if (y + half).abs() <= eps {
            VertexLevel::Base
        } else if (y - half).abs() <= eps {
            VertexLevel::Ridge
        } else {
            VertexLevel::Mid
        }
    }

    /// Indices of vertices at `level`, in index order
    pub fn vertices_at(&self, level: VertexLevel) -> Vec<usize> {
        (0..self.mesh.vertex_count())
            .filter(|&i| self.level(i) == level)
            .collect()
    }

    pub fn ridge_vertices(&self) -> Vec<usize> {
        self.vertices_at(VertexLevel::Ridge)
    }

    pub fn base_vertices(&self) -> Vec<usize> {
        self.vertices_at(VertexLevel::Base)
    }

    pub fn mid_vertices(&self) -> &[usize] {
        &self.mids
    }

    /// Shorten the ridge by `w` at each end
    ///
    /// The first ridge vertex moves toward the second and the second toward
    /// the first. `w` is capped at half the ridge, which collapses the ridge
    /// into an apex. Gable ends touched by the ridge become roof faces.
    ///
    /// Returns `false` and leaves the mesh untouched when `w <= 0` or the
    /// prism does not have exactly two ridge vertices.
    pub fn to_hipped(&mut self, w: f64) -> bool {
        if w <= 0.0 {
            return false;
        }
        let ridge = self.ridge_vertices();
        if ridge.len() != 2 {
            log::warn!(
                "[Roof] expected 2 ridge vertices, found {}; hip skipped",
                ridge.len()
            );
            return false;
        }
        let (r1, r2) = (ridge[0], ridge[1]);
        let p1 = self.mesh.positions[r1];
        let p2 = self.mesh.positions[r2];
        let d = Vector3::new(p2.x - p1.x, 0.0, p2.z - p1.z);
        let magnitude = d.norm();
        if magnitude <= self.tolerance() {
            log::warn!("[Roof] ridge already collapsed; hip skipped");
            return false;
        }
        let w = w.min(magnitude / 2.0);
        let hip = d * (w / magnitude);
        self.mesh.positions[r1] += hip;
        self.mesh.positions[r2] -= hip;

        for face in &mut self.mesh.faces {
            if face.role == FaceRole::Wall && face.vertices.iter().any(|&i| i == r1 || i == r2) {
                face.role = FaceRole::Roof;
            }
        }
        true
    }

    /// Break every base-to-ridge edge at `hip_height` above the base
    ///
    /// One mid vertex is created per base corner, on the line toward the
    /// ridge of a roof whose ridge was shortened by `hip_length`. It is
    /// inserted into each face that has the corresponding base-ridge edge,
    /// and every face that then holds two mid vertices is split along them.
    ///
    /// Returns `false` and leaves the mesh untouched when the prism does not
    /// have exactly four base vertices or `hip_height` is not strictly
    /// between base and ridge.
    pub fn create_mid_vertices(&mut self, hip_length: f64, hip_height: f64) -> bool {
        let base = self.base_vertices();
        if base.len() != 4 {
            log::warn!(
                "[Roof] expected 4 base vertices, found {}; eave break skipped",
                base.len()
            );
            return false;
        }
        if !(hip_height > 0.0 && hip_height < self.height) {
            log::warn!(
                "[Roof] eave break height {} outside (0, {}); skipped",
                hip_height,
                self.height
            );
            return false;
        }

        let levels: Vec<VertexLevel> = (0..self.mesh.vertex_count())
            .map(|i| self.level(i))
            .collect();
        let eps = self.tolerance();
        let kx = hip_height * self.width / (2.0 * self.height);
        let kz = hip_height * hip_length / self.height;

        let mut mid_of: FxHashMap<usize, usize> = FxHashMap::default();
        for &v in &base {
            let p = self.mesh.positions[v];
            let mid = Point3::new(
                p.x - kx * sign(p.x, eps),
                p.y + hip_height,
                p.z - kz * sign(p.z, eps),
            );
            let index = self.mesh.add_vertex(mid);
            mid_of.insert(v, index);
            self.mids.push(index);
        }

        for face in &mut self.mesh.faces {
            let n = face.vertices.len();
            let mut out = Vec::with_capacity(n + 2);
            for k in 0..n {
                let a = face.vertices[k];
                let b = face.vertices[(k + 1) % n];
                out.push(a);
                match (levels[a], levels[b]) {
                    (VertexLevel::Base, VertexLevel::Ridge) => out.push(mid_of[&a]),
                    (VertexLevel::Ridge, VertexLevel::Base) => out.push(mid_of[&b]),
                    _ => {}
                }
            }
            face.vertices = out;
        }

        self.split_at_mids();
        true
    }

    fn split_at_mids(&mut self) {
        let mids = &self.mids;
        let mut faces = Vec::with_capacity(self.mesh.faces.len() * 2);
        for face in std::mem::take(&mut self.mesh.faces) {
            let at: Vec<usize> = face
                .vertices
                .iter()
                .enumerate()
                .filter(|(_, v)| mids.contains(*v))
                .map(|(k, _)| k)
                .collect();
            if at.len() != 2 {
                faces.push(face);
                continue;
            }
            let (a, b) = (at[0], at[1]);
            let upper: Vec<usize> = face.vertices[a..=b].to_vec();
            let lower: Vec<usize> = face.vertices[b..]
                .iter()
                .chain(face.vertices[..=a].iter())
                .copied()
                .collect();
            for part in [upper, lower] {
                if part.len() >= 3 {
                    faces.push(Face::new(part, face.role));
                }
            }
        }
        self.mesh.faces = faces;
    }

    /// Push the mid vertices outward, perpendicular to the slopes
    ///
    /// `mid_width` moves them across the ridge, `mid_length` along it (on
    /// the hips of a roof whose ridge was shortened by `hip_length`). The
    /// result is clamped to the prism's bounding box.
    ///
    /// Returns `false` when there are no mid vertices or both offsets are 0.
    pub fn translate_mid_vertices(&mut self, hip_length: f64, mid_width: f64, mid_length: f64) -> bool {
        if self.mids.is_empty() || (mid_width == 0.0 && mid_length == 0.0) {
            return false;
        }
        let h = self.height;
        let w_norm = (4.0 * h * h + self.width * self.width).sqrt();
        let l_norm = (h * h + hip_length * hip_length).sqrt();
        let eps = self.tolerance();
        let (hw, hh, hl) = (self.width / 2.0, h / 2.0, self.length / 2.0);

        for &m in &self.mids {
            let p = self.mesh.positions[m];
            let sx = sign(p.x, eps);
            let sz = sign(p.z, eps);
            let across = if w_norm > 0.0 { mid_width / w_norm } else { 0.0 };
            let along = if l_norm > 0.0 { mid_length / l_norm } else { 0.0 };
            let dx = 2.0 * h * across * sx;
            let dy = across * self.width + along * hip_length;
            let dz = along * h * sz;
            self.mesh.positions[m] = Point3::new(
                (p.x + dx).clamp(-hw, hw),
                (p.y + dy).clamp(-hh, hh),
                (p.z + dz).clamp(-hl, hl),
            );
        }
        true
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

/// Sign with a dead zone around zero
#[inline]
fn sign(v: f64, eps: f64) -> f64 {
    if v > eps {
        1.0
    } else if v < -eps {
        -1.0
    } else {
        0.0
    }
}
