/// Versioned, serializable scene descriptions
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::color::Color4;
use crate::geometry::{Face, Mesh, MeshError};
use crate::projection::{Camera, ProjectionMode};
use crate::render::{RenderConfig, RenderMode};
use crate::stl::{self, StlError};
use crate::transform::{RotationState, Transform};

/// Format version written by [`SceneDescription::to_json`]
pub const SCENE_VERSION: u32 = 1;

#[derive(Debug)]
pub enum SceneError {
    UnsupportedVersion { found: u32, expected: u32 },
    Json(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
    Mesh { name: String, source: MeshError },
    Stl { path: PathBuf, source: StlError },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::UnsupportedVersion { found, expected } => write!(
                f,
                "scene version {found} is not supported (expected {expected})"
            ),
            SceneError::Json(_) => write!(f, "invalid scene JSON"),
            SceneError::Io { path, .. } => write!(f, "failed to access {}", path.display()),
            SceneError::Mesh { name, .. } => write!(f, "mesh '{name}' is invalid"),
            SceneError::Stl { path, .. } => write!(f, "failed to load {}", path.display()),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::UnsupportedVersion { .. } => None,
            SceneError::Json(err) => Some(err),
            SceneError::Io { source, .. } => Some(source),
            SceneError::Mesh { source, .. } => Some(source),
            SceneError::Stl { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        SceneError::Json(err)
    }
}

/// Camera placement as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Extra view-space rotation as pitch / yaw / roll radians
    pub rotate_euler: RotationState,
    /// Extra view-space translation
    pub translate: Vector3<f32>,
}

impl Default for CameraDesc {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            position: camera.position,
            target: camera.target,
            rotate_euler: RotationState::zero(),
            translate: Vector3::zeros(),
        }
    }
}

impl CameraDesc {
    pub fn to_camera(&self) -> Camera {
        let mut camera = Camera::new(self.position, self.target);
        camera.rotate = Transform::rotation_yaw_pitch_roll(&self.rotate_euler);
        camera.translate = Matrix4::new_translation(&self.translate);
        camera
    }
}

/// Where a mesh's geometry comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshShape {
    Cube { size: f32 },
    Indexed { vertices: Vec<Point3<f32>>, faces: Vec<Face> },
    /// Relative paths resolve against the scene file's directory
    Stl { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub name: String,
    pub shape: MeshShape,
    #[serde(default = "zero_offset")]
    pub position: Vector3<f32>,
    #[serde(default)]
    pub rotation: RotationState,
    #[serde(default)]
    pub color: Color4,
}

fn zero_offset() -> Vector3<f32> {
    Vector3::zeros()
}

impl MeshDesc {
    fn cube(name: impl Into<String>, size: f32, position: Vector3<f32>, color: Color4) -> Self {
        Self {
            name: name.into(),
            shape: MeshShape::Cube { size },
            position,
            rotation: RotationState::zero(),
            color,
        }
    }

    fn build(&self, base_dir: Option<&Path>) -> Result<Mesh, SceneError> {
        let mesh = match &self.shape {
            MeshShape::Cube { size } => Mesh::cube(self.name.clone(), *size),
            MeshShape::Indexed { vertices, faces } => {
                Mesh::new(self.name.clone(), vertices.clone(), faces.clone()).map_err(
                    |source| SceneError::Mesh {
                        name: self.name.clone(),
                        source,
                    },
                )?
            }
            MeshShape::Stl { path } => {
                let path = match base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                let mut mesh = stl::load_stl(&path).map_err(|source| match source {
                    StlError::Io(source) => SceneError::Io {
                        path: path.clone(),
                        source,
                    },
                    source => SceneError::Stl {
                        path: path.clone(),
                        source,
                    },
                })?;
                mesh.name = self.name.clone();
                mesh
            }
        };

        Ok(mesh
            .with_position(self.position)
            .with_rotation(self.rotation)
            .with_color(self.color))
    }
}

/// A camera plus meshes, as stored in a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub version: u32,
    #[serde(default = "default_clear_color")]
    pub clear_color: [u8; 4],
    #[serde(default)]
    pub camera: CameraDesc,
    #[serde(default)]
    pub meshes: Vec<MeshDesc>,
    /// Mode and projection the scene is meant to be viewed with
    #[serde(default)]
    pub render: RenderConfig,
    /// Directory the description was loaded from, for resolving STL paths
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_clear_color() -> [u8; 4] {
    [0, 0, 0, 255]
}

/// Renderable scene: what the frame driver consumes
#[derive(Debug, Clone)]
pub struct Scene {
    pub clear_color: [u8; 4],
    pub camera: Camera,
    pub meshes: Vec<Mesh>,
    pub render: RenderConfig,
}

impl SceneDescription {
    pub fn new(camera: CameraDesc, meshes: Vec<MeshDesc>) -> Self {
        Self {
            version: SCENE_VERSION,
            clear_color: default_clear_color(),
            camera,
            meshes,
            render: RenderConfig::default(),
            base_dir: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut description = Self::from_json(&json)?;
        description.base_dir = path.parent().map(Path::to_path_buf);
        info!(
            "loaded scene {} ({} meshes)",
            path.display(),
            description.meshes.len()
        );
        Ok(description)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("saved scene to {}", path.display());
        Ok(())
    }

    /// Validate the description and load every mesh
    pub fn build(&self) -> Result<Scene, SceneError> {
        if self.version != SCENE_VERSION {
            return Err(SceneError::UnsupportedVersion {
                found: self.version,
                expected: SCENE_VERSION,
            });
        }

        let meshes = self
            .meshes
            .iter()
            .map(|desc| desc.build(self.base_dir.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        if meshes.is_empty() {
            warn!("scene has no meshes, frames will only show the clear color");
        }

        Ok(Scene {
            clear_color: self.clear_color,
            camera: self.camera.to_camera(),
            meshes,
            render: self.render,
        })
    }

    /// Unit reference cube with axis markers and two marker quads, viewed
    /// from above
    pub fn demo() -> Self {
        const MARKER: f32 = 0.02;
        let tilt = RotationState::new(0.5, 0.5, 0.0);

        let mut meshes = vec![MeshDesc::cube("reference", 1.0, Vector3::zeros(), Color4::YELLOW)];
        let axes = [
            ("marker-x", Vector3::x(), Color4::WHITE),
            ("marker-y", Vector3::y(), Color4::MAGENTA),
            ("marker-z", Vector3::z(), Color4::CYAN),
        ];
        for (name, position, color) in axes {
            meshes.push(MeshDesc {
                rotation: tilt,
                ..MeshDesc::cube(name, MARKER, position, color)
            });
        }

        let quads: [(&str, Vector3<f32>, f32, Vector3<f32>, Vector3<f32>, Color4); 2] = [
            (
                "destination",
                Vector3::new(-0.2555, -0.1375, 1.072),
                0.6,
                Vector3::x(),
                -Vector3::z(),
                Color4::WHITE,
            ),
            (
                "source",
                Vector3::new(-0.182_642_58, -0.320_142_58, 1.0405),
                0.4,
                Vector3::x(),
                Vector3::y(),
                Color4::rgb(1.0, 0.3, 0.0),
            ),
        ];
        for (name, corner, width, row, column, color) in quads {
            let corners = [
                corner,
                corner + row * width,
                corner + column * width,
                corner + (row + column) * width,
            ];
            for (i, position) in corners.into_iter().enumerate() {
                meshes.push(MeshDesc {
                    rotation: tilt,
                    ..MeshDesc::cube(format!("{name}-{i}"), MARKER, position, color)
                });
            }
        }

        let centre = Point3::new(-0.0555, -0.4375, 1.272);
        let camera = CameraDesc {
            position: centre + Vector3::new(0.0, 7.0, 0.0),
            target: Point3::new(centre.x, centre.y, 1.0721),
            ..CameraDesc::default()
        };

        Self::new(camera, meshes)
    }
}
