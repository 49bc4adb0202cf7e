/// Indexed triangle meshes
use std::collections::HashMap;
use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::color::Color4;
use crate::transform::RotationState;

/// A triangle as three indices into the owning mesh's vertex list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl Face {
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }
}

impl From<[usize; 3]> for Face {
    fn from([a, b, c]: [usize; 3]) -> Self {
        Self::new(a, b, c)
    }
}

/// Authoring-time mesh validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::FaceIndexOutOfRange {
                face,
                index,
                vertex_count,
            } => write!(
                f,
                "face {face} references vertex {index} but the mesh has {vertex_count} vertices"
            ),
        }
    }
}

impl std::error::Error for MeshError {}

/// A flat-colored triangle mesh placed in the world.
///
/// Vertices and faces are fixed at construction. Position, rotation and
/// color may change between frames.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub(crate) vertices: Vec<Point3<f32>>,
    pub(crate) faces: Vec<Face>,
    pub position: Vector3<f32>,
    pub rotation: RotationState,
    pub color: Color4,
}

impl Mesh {
    /// Build a mesh, rejecting faces that index past the vertex list
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Point3<f32>>,
        faces: Vec<Face>,
    ) -> Result<Self, MeshError> {
        let mesh = Self {
            name: name.into(),
            vertices,
            faces,
            position: Vector3::zeros(),
            rotation: RotationState::zero(),
            color: Color4::WHITE,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build an indexed mesh from loose triangles, sharing vertices whose
    /// coordinates are bit-for-bit equal
    pub fn from_triangles(
        name: impl Into<String>,
        triangles: impl IntoIterator<Item = [Point3<f32>; 3]>,
    ) -> Self {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();

        for triangle in triangles {
            let [a, b, c] = triangle.map(|p| {
                let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
                *lookup.entry(key).or_insert_with(|| {
                    vertices.push(p);
                    vertices.len() - 1
                })
            });
            faces.push(Face::new(a, b, c));
        }

        Self {
            name: name.into(),
            vertices,
            faces,
            position: Vector3::zeros(),
            rotation: RotationState::zero(),
            color: Color4::WHITE,
        }
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        for (face, indices) in self.faces.iter().map(Face::indices).enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshError::FaceIndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationState) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_color(mut self, color: Color4) -> Self {
        self.color = color;
        self
    }

    /// Axis-aligned cube centred on the origin: 8 shared vertices, 12 faces
    pub fn cube(name: impl Into<String>, size: f32) -> Self {
        let half = size / 2.0;
        let vertices = vec![
            Point3::new(-half, half, half),
            Point3::new(half, half, half),
            Point3::new(-half, -half, half),
            Point3::new(half, -half, half),
            Point3::new(-half, half, -half),
            Point3::new(half, half, -half),
            Point3::new(half, -half, -half),
            Point3::new(-half, -half, -half),
        ];
        let faces = vec![
            // Front
            Face::new(0, 1, 2),
            Face::new(1, 2, 3),
            // Right
            Face::new(1, 3, 6),
            Face::new(1, 5, 6),
            // Top
            Face::new(0, 1, 4),
            Face::new(1, 4, 5),
            // Bottom
            Face::new(2, 3, 7),
            Face::new(3, 6, 7),
            // Left
            Face::new(0, 2, 7),
            Face::new(0, 4, 7),
            // Back
            Face::new(4, 5, 6),
            Face::new(4, 6, 7),
        ];

        Self {
            name: name.into(),
            vertices,
            faces,
            position: Vector3::zeros(),
            rotation: RotationState::zero(),
            color: Color4::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_is_valid() {
        let cube = Mesh::cube("cube", 2.0);
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.faces().len(), 12);
        assert!(cube.validate().is_ok());
        assert!(cube
            .vertices()
            .iter()
            .all(|v| v.x.abs() == 1.0 && v.y.abs() == 1.0 && v.z.abs() == 1.0));
    }

    #[test]
    fn test_rejects_out_of_range_face() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let result = Mesh::new("bad", vertices, vec![Face::new(0, 1, 2), Face::new(0, 3, 1)]);
        assert_eq!(
            result.unwrap_err(),
            MeshError::FaceIndexOutOfRange {
                face: 1,
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn test_from_triangles_shares_vertices() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(1.0, 1.0, 0.0);
        let mesh = Mesh::from_triangles("quad", [[a, b, c], [b, d, c]]);

        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.faces(), &[Face::new(0, 1, 2), Face::new(1, 3, 2)]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let mesh = Mesh::cube("c", 1.0)
            .with_position(Vector3::new(1.0, 2.0, 3.0))
            .with_rotation(RotationState::new(0.5, 0.5, 0.0))
            .with_color(Color4::YELLOW);
        assert_eq!(mesh.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.color, Color4::YELLOW);
        assert!((mesh.rotation.y - 0.5).abs() < 1e-6);
    }
}
