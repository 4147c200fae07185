use super::Vec3;
use nalgebra::Matrix4;

/// Composes scale, then rotation about X, Y and Z, then translation.
pub fn compose_world_matrix(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Matrix4<f32> {
    let scale_matrix = Matrix4::new_nonuniform_scaling(scale);
    let rot_x = Matrix4::from_axis_angle(&Vec3::x_axis(), rotation.x);
    let rot_y = Matrix4::from_axis_angle(&Vec3::y_axis(), rotation.y);
    let rot_z = Matrix4::from_axis_angle(&Vec3::z_axis(), rotation.z);
    let translation = Matrix4::new_translation(position);

    translation * rot_z * rot_y * rot_x * scale_matrix
}

/// Spatial state of one entity across the two most recent snapshots.
///
/// `previous_position` only changes when a new `current_position` is
/// accepted; it is never interpolated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub previous_position: Vec3,
    pub current_position: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// First sighting: both positions are the true location, so the entity
    /// appears in place instead of animating in from the origin.
    pub fn at(position: Vec3) -> Self {
        Self {
            previous_position: position,
            current_position: position,
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Ages the current position and accepts a new one.
    pub fn accept(&mut self, position: Vec3) {
        self.previous_position = self.current_position;
        self.current_position = position;
    }

    pub fn displacement(&self) -> Vec3 {
        self.current_position - self.previous_position
    }

    /// Per-axis lerp between the last two known positions. The factor is
    /// clamped to [0, 1]; 0 yields `previous_position` and 1 yields
    /// `current_position` exactly.
    pub fn interpolated_position(&self, factor: f32) -> Vec3 {
        let t = if factor.is_nan() { 1.0 } else { factor.clamp(0.0, 1.0) };
        self.previous_position.lerp(&self.current_position, t)
    }

    pub fn world_matrix(&self, factor: f32) -> Matrix4<f32> {
        compose_world_matrix(&self.interpolated_position(factor), &self.rotation, &self.scale)
    }
}
