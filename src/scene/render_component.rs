//! Renderable component

use crate::resources::{Material, Mesh, ShaderProgram};
use bevy_ecs::prelude::*;
use std::sync::Arc;

/// Draws a mesh with a program and material at the entity's transform.
///
/// A renderer without a mesh or program is a fatal render error, so both are
/// checked every frame.
#[derive(Component, Debug, Default)]
pub struct MeshRenderer {
    pub mesh: Option<Arc<Mesh>>,
    pub shader: Option<Arc<ShaderProgram>>,
    pub material: Material,
}

impl MeshRenderer {
    pub fn new(mesh: Arc<Mesh>, shader: Arc<ShaderProgram>) -> Self {
        Self {
            mesh: Some(mesh),
            shader: Some(shader),
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }
}
