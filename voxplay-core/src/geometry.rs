/// Geometry primitives shared by the STL codec and the terrain builder
use nalgebra::{Point3, Vector3};

/// A triangle facet: the normal stored in the file plus three vertices in file order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(normal: Vector3<f32>, v1: Point3<f32>, v2: Point3<f32>, v3: Point3<f32>) -> Self {
        Self {
            normal,
            vertices: [v1, v2, v3],
        }
    }

    /// Calculate the face normal from the triangle's vertices.
    ///
    /// Returns the zero vector for degenerate triangles.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn is_degenerate(&self) -> bool {
        self.calculate_normal() == Vector3::zeros()
    }

    /// Same facet moved by `offset`; the normal is unchanged
    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        let [v0, v1, v2] = self.vertices;
        let offset = *offset;
        Self::new(self.normal, v0 + offset, v1 + offset, v2 + offset)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// A named triangle mesh, as read from one STL file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box over all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let first = *points.next()?;

        let bounds = points.fold(
            Bounds {
                min: first,
                max: first,
            },
            |acc, p| Bounds {
                min: acc.min.inf(p),
                max: acc.max.sup(p),
            },
        );
        Some(bounds)
    }

    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        Self {
            name: self.name.clone(),
            triangles: self.triangles.iter().map(|t| t.translated(offset)).collect(),
        }
    }

    /// Axis-aligned cube spanning `0..size` on every axis, outward normals.
    ///
    /// Used as the terrain block when no block STL file is available; the
    /// corner at the origin makes stamped blocks tile on integer coordinates.
    pub fn cube(size: f32) -> Self {
        let s = size;
        let p = |x: f32, y: f32, z: f32| Point3::new(x * s, y * s, z * s);
        let n = Vector3::new;
        let mut mesh = Self::with_capacity("cube", 12);

        // (normal, four corners counter-clockwise seen from outside)
        let faces = [
            (n(0.0, 0.0, 1.0), [p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)]),
            (n(0.0, 0.0, -1.0), [p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)]),
            (n(0.0, 1.0, 0.0), [p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)]),
            (n(0.0, -1.0, 0.0), [p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)]),
            (n(1.0, 0.0, 0.0), [p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)]),
            (n(-1.0, 0.0, 0.0), [p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)]),
        ];

        for (normal, [a, b, c, d]) in faces {
            mesh.add_triangle(Triangle::new(normal, a, b, c));
            mesh.add_triangle(Triangle::new(normal, a, c, d));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_normals_match_winding() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.len(), 12);
        for triangle in &cube.triangles {
            let computed = triangle.calculate_normal();
            assert!((computed - triangle.normal).norm() < 1e-6, "{triangle:?}");
        }
    }

    #[test]
    fn test_cube_bounds() {
        let bounds = Mesh::cube(2.0).bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(2.0, 2.0, 2.0));
        assert_eq!(bounds.center(), Point3::new(1.0, 1.0, 1.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_degenerate_triangle() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let triangle = Triangle::new(Vector3::zeros(), p, p, Point3::new(2.0, 2.0, 2.0));
        assert!(triangle.is_degenerate());
        assert_eq!(triangle.calculate_normal(), Vector3::zeros());
    }

    #[test]
    fn test_translated_keeps_normal() {
        let cube = Mesh::cube(1.0);
        let moved = cube.translated(&Vector3::new(3.0, -1.0, 2.0));
        assert_eq!(moved.name, "cube");
        assert_eq!(moved.triangles[0].normal, cube.triangles[0].normal);
        let bounds = moved.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(3.0, -1.0, 2.0));
    }
}
