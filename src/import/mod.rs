//! Scene import boundary
//!
//! Importers hand back flat, de-indexed triangle lists together with a
//! material record per mesh. Mesh building consumes nothing else.

mod obj;

pub use obj::ObjImporter;

use glam::{Vec2, Vec3};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("Failed to read '{path}': {message}")]
    Io { path: String, message: String },
    #[error("{file}:{line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },
    #[error("Unsupported scene format '{0}'")]
    UnsupportedFormat(String),
}

/// Material record of one imported mesh
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub opacity: f32,
    /// Texture map paths as written in the source file
    pub diffuse_map: Option<String>,
    pub ambient_map: Option<String>,
    pub dispersion_map: Option<String>,
}

impl Default for ImportedMaterial {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ZERO,
            opacity: 1.0,
            diffuse_map: None,
            ambient_map: None,
            dispersion_map: None,
        }
    }
}

/// One mesh as a flat triangle list.
///
/// `normals` and `uvs` are either empty or hold one entry per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub material: ImportedMaterial,
}

impl ImportedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Reads a scene file into meshes
pub trait SceneImporter {
    fn import(&self, path: &Path) -> Result<Vec<ImportedMesh>, ImportError>;
}

/// Reduce a texture path to its last path segment
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("textures/stone.png"), "stone.png");
        assert_eq!(last_path_segment("C:\\assets\\wood.jpg"), "wood.jpg");
        assert_eq!(last_path_segment("plain.png"), "plain.png");
    }
}
