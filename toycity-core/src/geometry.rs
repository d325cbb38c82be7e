/// Triangle meshes consumed by rasterizers
use nalgebra::{Matrix4, Point3, Vector3};

use crate::obj::RenderBuffer;

/// A triangle in some coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Unit face normal from the counter-clockwise winding.
    ///
    /// Zero-area triangles yield `None`.
    pub fn normal(&self) -> Option<Vector3<f32>> {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0)).try_normalize(f32::EPSILON)
    }

    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            vertices: self.vertices.map(|v| matrix.transform_point(&v)),
        }
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Axis-aligned cube centred on the origin, wound counter-clockwise from outside
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let corner = |x: f32, y: f32, z: f32| Point3::new(x * h, y * h, z * h);

        let faces = [
            // +Z
            [corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.)],
            // -Z
            [corner(1., -1., -1.), corner(-1., -1., -1.), corner(-1., 1., -1.), corner(1., 1., -1.)],
            // +Y
            [corner(-1., 1., 1.), corner(1., 1., 1.), corner(1., 1., -1.), corner(-1., 1., -1.)],
            // -Y
            [corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.)],
            // +X
            [corner(1., -1., 1.), corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.)],
            // -X
            [corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.), corner(-1., 1., -1.)],
        ];

        let mut mesh = Self::with_capacity(12);
        for [a, b, c, d] in faces {
            mesh.add_triangle(Triangle::new(a, b, c));
            mesh.add_triangle(Triangle::new(a, c, d));
        }
        mesh
    }

    /// Group a flat vertex buffer into triangles, three indices at a time
    pub fn from_buffer(buffer: &RenderBuffer) -> Self {
        let mut mesh = Self::with_capacity(buffer.triangle_count());
        for corners in buffer.indices.chunks_exact(3) {
            let [a, b, c] = [corners[0], corners[1], corners[2]].map(|i| buffer.vertices[i as usize]);
            mesh.add_triangle(Triangle::new(a, b, c));
        }
        mesh
    }
}
