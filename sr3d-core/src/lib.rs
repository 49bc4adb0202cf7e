/// SR3D Core Library - CPU rasterization of flat-colored triangle meshes
///
/// This library owns the pixel surface, scene model, projection and the
/// line / scan-line rasterizers, plus scene description and STL loading.
/// Presentation is left to the caller.

pub mod color;
pub mod geometry;
pub mod projection;
pub mod raster;
pub mod render;
pub mod scene;
pub mod stl;
pub mod surface;
pub mod transform;

// Re-export commonly used types
pub use color::Color4;
pub use geometry::{Face, Mesh, MeshError};
pub use projection::{project, Camera, Projection, ProjectionMode, ScreenPoint};
pub use render::{FrameStats, RenderConfig, RenderMode, Renderer};
pub use scene::{Scene, SceneDescription, SceneError, SCENE_VERSION};
pub use stl::{load_stl, parse_stl, StlError};
pub use surface::{ChannelOrder, PixelSurface};
pub use transform::{RotationState, Transform};
