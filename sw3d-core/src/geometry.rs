/// Mesh data produced by the OBJ loader and consumed by the rasterizer
use nalgebra::{Matrix4, Point3, Vector3};

/// A triangular face; every index is 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertex: [usize; 3],
    pub texture: [usize; 3],
    pub normal: [usize; 3],
}

impl Face {
    pub fn new(vertex: [usize; 3], texture: [usize; 3], normal: [usize; 3]) -> Self {
        Self {
            vertex,
            texture,
            normal,
        }
    }
}

/// Vertex positions, texture coordinates and faces of a triangulated mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>,
    pub tex_coords: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three positions of a face, in winding order
    pub fn face_positions(&self, face: &Face) -> [Point3<f32>; 3] {
        face.vertex.map(|i| self.vertices[i])
    }

    /// The three texture coordinates of a face, in winding order
    pub fn face_tex_coords(&self, face: &Face) -> [Vector3<f32>; 3] {
        face.texture.map(|i| self.tex_coords[i])
    }

    /// Copy of the mesh with `model` applied to every vertex position
    pub fn transformed(&self, model: &Matrix4<f32>) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|p| model.transform_point(p))
                .collect(),
            tex_coords: self.tex_coords.clone(),
            faces: self.faces.clone(),
        }
    }
}

/// Unit normal of the triangle `(v1, v2, v3)`.
///
/// Computed as `(v3 - v1) × (v2 - v1)`; the operand order decides which
/// winding faces the light, so back-face culling depends on it. Returns
/// `None` for degenerate (zero-area) triangles.
pub fn face_normal(positions: &[Point3<f32>; 3]) -> Option<Vector3<f32>> {
    let [v1, v2, v3] = positions;
    let normal = (v3 - v1).cross(&(v2 - v1));
    normal.try_normalize(f32::EPSILON)
}
