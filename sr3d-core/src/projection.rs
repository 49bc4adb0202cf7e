/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

/// Projection parameters shared by every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub mode: ProjectionMode,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Perspective,
            fov_y: 0.78, // ~45 degrees
            near: 0.01,
            far: 100.0,
        }
    }
}

impl Projection {
    /// Projection matrix for a surface of the given aspect ratio
    pub fn matrix(&self, aspect: f32, camera: &Camera) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(aspect, self.fov_y, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (camera.position - camera.target).norm();
                let width = height * aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }
}

/// Camera placement for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Extra rotation applied after the look-at transform
    pub rotate: Matrix4<f32>,
    /// Extra translation applied after `rotate`
    pub translate: Matrix4<f32>,
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            position,
            target,
            up: Vector3::y(),
            rotate: Matrix4::identity(),
            translate: Matrix4::identity(),
        }
    }

    /// World-to-view matrix: look-at, then `rotate`, then `translate`
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.translate * self.rotate * Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 10.0), Point3::origin())
    }
}

/// A projected point: pixel coordinates plus the depth it came in with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Map an object-space point to screen space.
///
/// `transform` is the full world-view-projection matrix. The result is moved
/// from a centred, Y-up frame to a top-left, Y-down pixel frame. Nothing is
/// clipped here.
pub fn project(point: &Point3<f32>, transform: &Matrix4<f32>, width: usize, height: usize) -> ScreenPoint {
    let p = transform.transform_point(point);
    let (width, height) = (width as f32, height as f32);
    ScreenPoint {
        x: p.x * width + width / 2.0,
        y: -p.y * height + height / 2.0,
        z: p.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_centre() {
        let p = project(&Point3::origin(), &Matrix4::identity(), 640, 480);
        assert_eq!(p, ScreenPoint::new(320.0, 240.0, 0.0));
    }

    #[test]
    fn test_y_axis_points_down() {
        let p = project(&Point3::new(0.25, 0.25, 0.5), &Matrix4::identity(), 100, 100);
        assert!((p.x - 75.0).abs() < 1e-6);
        assert!((p.y - 25.0).abs() < 1e-6);
        assert!((p.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        // Target sits straight ahead, down -Z in view space
        let target = view.transform_point(&camera.target);
        assert!(target.x.abs() < 1e-6 && target.y.abs() < 1e-6);
        assert!((target.z + 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_extra_translate_applies_in_view_space() {
        let mut camera = Camera::default();
        camera.translate = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let target = camera.view_matrix().transform_point(&camera.target);
        assert!((target.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_perspective_keeps_centre() {
        let camera = Camera::default();
        let transform = Projection::default().matrix(4.0 / 3.0, &camera) * camera.view_matrix();
        let p = project(&Point3::origin(), &transform, 640, 480);
        assert!((p.x - 320.0).abs() < 1e-3);
        assert!((p.y - 240.0).abs() < 1e-3);
    }
}
