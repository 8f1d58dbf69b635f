//! Transform component

use bevy_ecs::prelude::*;
use glam::{Mat3, Mat4, Quat, Vec3};

/// Below this determinant the model matrix is treated as singular
const SINGULAR_EPSILON: f32 = 1e-8;

/// Position, orientation and scale of an entity.
///
/// The model and normal matrices are cached and only recomputed by
/// [`Transform::update_matrices`]; the engine calls it once per frame before
/// rendering.
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    model: Mat4,
    normal: Mat3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            model: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        let mut transform = Self {
            position,
            ..Default::default()
        };
        transform.update_matrices();
        transform
    }

    pub fn from_position_rotation_scale(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self {
            position,
            rotation,
            scale,
            ..Default::default()
        };
        transform.update_matrices();
        transform
    }

    /// Model matrix computed from the current fields, bypassing the cache
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Recompute the cached model and normal matrices
    pub fn update_matrices(&mut self) {
        self.model = self.matrix();
        let linear = Mat3::from_mat4(self.model);
        if linear.determinant().abs() > SINGULAR_EPSILON {
            self.normal = linear.inverse().transpose();
        } else {
            log::warn!("Singular model matrix (scale {:?}), keeping previous normal matrix", self.scale);
        }
    }

    /// Cached model matrix as of the last `update_matrices`
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    /// Cached inverse-transpose of the model matrix's linear part
    pub fn normal_matrix(&self) -> Mat3 {
        self.normal
    }

    /// Local -Z in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotate around a world-space axis
    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        let delta = Quat::from_axis_angle(axis.normalize(), angle);
        self.rotation = (delta * self.rotation).normalize();
    }

    /// Turn so that `forward()` points at `target`
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.rotation = look_rotation(target - self.position, up);
    }
}

/// Orientation whose local -Z points along `direction`
pub(crate) fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let Some(forward) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };
    match up.cross(forward).try_normalize() {
        Some(right) => {
            let up = forward.cross(right);
            Quat::from_mat3(&Mat3::from_cols(-right, up, -forward))
        }
        // Looking straight along `up`
        None => Quat::from_rotation_arc(-Vec3::Z, forward),
    }
}
