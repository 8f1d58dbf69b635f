//! Shared setup for the integration tests.
//!
//! Every test runs against a `HeadlessDevice`; files a test needs are
//! written into a temporary directory registered as logical resource
//! directories.

#![allow(dead_code)]

use scenegl::gl::{GlContext, HeadlessDevice};
use scenegl::resources::ResourceDirectories;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VERTEX_SHADER: &str = "#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
uniform mat4 u_model;
uniform mat3 u_normal_matrix;
uniform mat4 u_view;
uniform mat4 u_projection;
out vec3 v_normal;
void main() {
    v_normal = u_normal_matrix * normal;
    gl_Position = u_projection * u_view * u_model * vec4(position, 1.0);
}
";

pub const FRAGMENT_SHADER: &str = "#version 330 core
in vec3 v_normal;
uniform sampler2D u_texture0;
uniform vec3 u_diffuse;
uniform float u_opacity;
uniform float u_time;
out vec4 color;
void main() {
    color = vec4(u_diffuse, u_opacity);
}
";

/// Missing closing brace of `main`
pub const BROKEN_VERTEX_SHADER: &str = "#version 330 core
layout(location = 0) in vec3 position;
void main() {
    gl_Position = vec4(position, 1.0);
";

pub struct TestContext {
    pub device: HeadlessDevice,
    pub ctx: GlContext,
    pub directories: ResourceDirectories,
    dir: TempDir,
}

impl TestContext {
    /// Context with `shaders`, `textures`, `meshes` and `sounds` directories
    pub fn new() -> Self {
        let device = HeadlessDevice::new();
        let ctx = GlContext::new(device.clone());
        let dir = tempfile::tempdir().unwrap();

        let mut directories = ResourceDirectories::new();
        for id in ["shaders", "textures", "meshes", "sounds"] {
            let path = dir.path().join(id);
            std::fs::create_dir_all(&path).unwrap();
            directories.register(id, path);
        }

        Self {
            device,
            ctx,
            directories,
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `filename` inside logical directory `folder_id`
    pub fn write(&self, folder_id: &str, filename: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.directories.resolve(folder_id, filename).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Write a solid-colour PNG into the `textures` directory
    pub fn write_png(&self, filename: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.directories.resolve("textures", filename).unwrap();
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        image.save(&path).unwrap();
        path
    }
}
