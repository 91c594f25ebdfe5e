/// Flat per-vertex position and normal arrays, the layout a draw call consumes
use nalgebra::{Point3, Vector3};

use crate::geometry::{Mesh, Triangle};

/// Parallel position/normal arrays, three entries per triangle.
///
/// Each vertex carries the facet normal of its triangle, so shading is flat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
        }
    }

    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut buffer = Self::with_capacity(mesh.len() * 3);
        buffer.append_mesh(mesh, &Vector3::zeros());
        buffer
    }

    /// Push every triangle of `mesh` moved by `offset`
    pub fn append_mesh(&mut self, mesh: &Mesh, offset: &Vector3<f32>) {
        self.positions.reserve(mesh.len() * 3);
        self.normals.reserve(mesh.len() * 3);

        let offset = *offset;
        for triangle in &mesh.triangles {
            for vertex in &triangle.vertices {
                self.positions.push(*vertex + offset);
                self.normals.push(triangle.normal);
            }
        }
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = ([Point3<f32>; 3], Vector3<f32>)> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .map(|(p, n)| ([p[0], p[1], p[2]], n[0]))
    }

    /// Collect the buffer back into a mesh, e.g. for export
    pub fn to_mesh(&self, name: impl Into<String>) -> Mesh {
        let mut mesh = Mesh::with_capacity(name, self.triangle_count());
        for ([v1, v2, v3], normal) in self.triangles() {
            mesh.add_triangle(Triangle::new(normal, v1, v2, v3));
        }
        mesh
    }

    /// `[px, py, pz, nx, ny, nz]` per vertex
    pub fn interleaved(&self) -> Vec<f32> {
        self.positions
            .iter()
            .zip(&self.normals)
            .flat_map(|(p, n)| [p.x, p.y, p.z, n.x, n.y, n.z])
            .collect()
    }
}
