/// 3D transformation matrices and rotation state
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// Euler rotation in radians: `x` is pitch, `y` is yaw, `z` is roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations.
///
/// Matrices act on column vectors, so the right-most factor of a product is
/// applied first.
pub struct Transform;

impl Transform {
    /// Roll about Z, then pitch about X, then yaw about Y
    pub fn rotation_yaw_pitch_roll(rotation: &RotationState) -> Matrix4<f32> {
        let yaw = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let pitch = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let roll = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        yaw * pitch * roll
    }

    /// Create a translation matrix
    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    /// Object-to-world matrix: rotate in place, then move to `position`
    pub fn world_matrix(position: &Vector3<f32>, rotation: &RotationState) -> Matrix4<f32> {
        Self::translation_matrix(position) * Self::rotation_yaw_pitch_roll(rotation)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
