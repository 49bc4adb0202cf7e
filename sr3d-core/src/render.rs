/// Frame driver: camera + meshes in, pixels out
use log::{debug, trace};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::geometry::Mesh;
use crate::projection::{project, Camera, Projection};
use crate::raster::{draw_line, fill_triangle, fill_triangle_parallel};
use crate::scene::Scene;
use crate::surface::PixelSurface;
use crate::transform::Transform;

/// What gets rasterized for each face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Three edges per face
    #[default]
    Wireframe,
    /// Scan-line filled interior
    Fill,
    /// Filled interior with the edges drawn over it
    FillAndWireframe,
}

impl RenderMode {
    /// Cycle to the next mode, for interactive toggling
    pub fn next(self) -> Self {
        match self {
            RenderMode::Wireframe => RenderMode::Fill,
            RenderMode::Fill => RenderMode::FillAndWireframe,
            RenderMode::FillAndWireframe => RenderMode::Wireframe,
        }
    }

    fn fills(self) -> bool {
        matches!(self, RenderMode::Fill | RenderMode::FillAndWireframe)
    }

    fn outlines(self) -> bool {
        matches!(self, RenderMode::Wireframe | RenderMode::FillAndWireframe)
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,
    pub projection: Projection,
    /// Spread triangle rows across the rayon pool
    pub parallel: bool,
}

/// Counters for one `render` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub meshes: usize,
    pub faces: usize,
}

/// Drives one frame: builds the matrices and rasterizes every face
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Rasterize `meshes` as seen from `camera` into `surface`.
    ///
    /// The surface is not cleared here. Only the surface is written.
    ///
    /// # Panics
    /// Panics if a face indexes past its mesh's vertex list.
    pub fn render(&self, surface: &mut PixelSurface, camera: &Camera, meshes: &[Mesh]) -> FrameStats {
        let view = camera.view_matrix();
        let projection = self.config.projection.matrix(surface.aspect(), camera);

        let mut stats = FrameStats::default();
        for mesh in meshes {
            let world = Transform::world_matrix(&mesh.position, &mesh.rotation);
            let transform = Transform::mvp_matrix(&world, &view, &projection);
            stats.faces += self.render_mesh(surface, mesh, &transform);
            stats.meshes += 1;
        }

        debug!(
            "rendered {} meshes / {} faces in {:?} mode",
            stats.meshes, stats.faces, self.config.mode
        );
        stats
    }

    /// Render a built scene with its own camera
    pub fn render_scene(&self, surface: &mut PixelSurface, scene: &Scene) -> FrameStats {
        self.render(surface, &scene.camera, &scene.meshes)
    }

    fn render_mesh(&self, surface: &mut PixelSurface, mesh: &Mesh, transform: &Matrix4<f32>) -> usize {
        trace!("mesh '{}': {} faces", mesh.name, mesh.faces().len());
        let (width, height) = (surface.width(), surface.height());
        let vertices = mesh.vertices();
        let mode = self.config.mode;

        for face in mesh.faces() {
            let a = project(&vertices[face.a], transform, width, height);
            let b = project(&vertices[face.b], transform, width, height);
            let c = project(&vertices[face.c], transform, width, height);

            if mode.fills() {
                if self.config.parallel {
                    fill_triangle_parallel(surface, a, b, c, mesh.color);
                } else {
                    fill_triangle(surface, a, b, c, mesh.color);
                }
            }
            if mode.outlines() {
                draw_line(surface, a, b, mesh.color);
                draw_line(surface, b, c, mesh.color);
                draw_line(surface, c, a, mesh.color);
            }
        }

        mesh.faces().len()
    }
}
