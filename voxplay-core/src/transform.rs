/// Model placement and the per-frame matrices handed to a renderer
use nalgebra::{Matrix4, Vector3};

use crate::camera::FlyCamera;

/// Placement of the terrain in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    /// Rotation about the x axis in radians
    pub rotation_x: f32,
    pub translation: Vector3<f32>,
}

impl ModelTransform {
    pub fn new(rotation_x: f32, translation: Vector3<f32>) -> Self {
        Self {
            rotation_x,
            translation,
        }
    }

    /// Rotation first, then translation in the rotated frame
    pub fn matrix(&self) -> Matrix4<f32> {
        let rotation = Matrix4::new_rotation(Vector3::x() * self.rotation_x);
        rotation * Matrix4::new_translation(&self.translation)
    }
}

impl Default for ModelTransform {
    /// Terrain heights run along +z; a quarter turn about x stands them up along +y
    fn default() -> Self {
        Self::new(-std::f32::consts::FRAC_PI_2, Vector3::zeros())
    }
}

/// Values a shader program would receive for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub mvp: Matrix4<f32>,
    pub mv: Matrix4<f32>,
    /// Seconds since start, two decimals
    pub time: f32,
}

impl Uniforms {
    pub fn compute(model: &ModelTransform, camera: &FlyCamera, time: f32) -> Self {
        let model = model.matrix();
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        let mv = view * model;
        Self {
            mvp: projection * mv,
            mv,
            time,
        }
    }
}
