//! Per-frame draw orchestration

use crate::gl::{GlContext, Viewport};
use crate::resources::{FrameBufferError, MeshError, ResourceError, ShaderError};
use crate::scene::{Camera, MeshRenderer, Name, Scene, Transform};
use glam::Vec4;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Entity '{0}' has a renderer without a mesh")]
    MissingMesh(String),
    #[error("Entity '{0}' has a renderer without a shader")]
    MissingShader(String),
    #[error("Mesh '{mesh}' of entity '{entity}' is not ready")]
    MeshNotReady { entity: String, mesh: String },
    #[error("Scene has no primary camera")]
    NoPrimaryCamera,
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    FrameBuffer(#[from] FrameBufferError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Clears the default framebuffer and draws scenes from their primary camera
#[derive(Debug, Clone)]
pub struct Renderer {
    clear_color: Vec4,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(width: u32, height: u32, clear_color: Vec4) -> Self {
        Self {
            clear_color,
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Bind the default framebuffer and clear colour and depth
    pub fn clear(&self, ctx: &GlContext) {
        ctx.set_viewport(Viewport::sized(self.width, self.height));
        let gl = ctx.gl();
        gl.bind_framebuffer(0);
        gl.set_depth_test(true);
        gl.clear_color(self.clear_color.to_array());
        gl.clear(true, true);
    }

    /// Draw every `MeshRenderer` from the primary camera.
    ///
    /// Cameras with a render plane capture into their framebuffer and present
    /// it to the default framebuffer afterwards. Returns the number of draw
    /// calls issued; the first fatal error aborts the frame.
    pub fn render_scene(
        &self,
        ctx: &GlContext,
        scene: &mut Scene,
        time: f32,
    ) -> Result<usize, RenderError> {
        let camera_entity = scene.primary_camera().ok_or(RenderError::NoPrimaryCamera)?;
        let mut query = scene
            .world_mut()
            .query::<(Option<&Name>, &Transform, &MeshRenderer)>();
        let world = scene.world();
        let camera = world
            .get::<Camera>(camera_entity)
            .ok_or(RenderError::NoPrimaryCamera)?;

        camera.begin_capture(ctx);
        let mut draws = 0;
        for (name, transform, renderer) in query.iter(world) {
            let entity = name.map(Name::as_str).unwrap_or("<unnamed>");
            if let Err(e) = self.draw(ctx, camera, entity, transform, renderer, time) {
                camera.end_capture(ctx);
                log::error!("Render aborted: {}", e);
                return Err(e);
            }
            draws += 1;
        }
        camera.end_capture(ctx);

        if camera.has_render_plane() {
            ctx.set_viewport(Viewport::sized(self.width, self.height));
            camera.present(ctx, time);
        }
        log::trace!("Rendered {} draw calls", draws);
        Ok(draws)
    }

    fn draw(
        &self,
        ctx: &GlContext,
        camera: &Camera,
        entity: &str,
        transform: &Transform,
        renderer: &MeshRenderer,
        time: f32,
    ) -> Result<(), RenderError> {
        let mesh = renderer
            .mesh
            .as_ref()
            .ok_or_else(|| RenderError::MissingMesh(entity.to_string()))?;
        let shader = renderer
            .shader
            .as_ref()
            .ok_or_else(|| RenderError::MissingShader(entity.to_string()))?;
        if !mesh.is_ready() {
            return Err(RenderError::MeshNotReady {
                entity: entity.to_string(),
                mesh: mesh.name().to_string(),
            });
        }
        let material = &renderer.material;

        material.bind(ctx);
        mesh.bind(ctx);
        shader.bind(ctx);
        // glUniform targets the active program, so samplers follow the bind
        material.apply_samplers(ctx, shader);

        shader.set_uniform(ctx, "u_model", transform.model_matrix());
        shader.set_uniform(ctx, "u_normal_matrix", transform.normal_matrix());
        shader.set_uniform(ctx, "u_projection", camera.projection_matrix());
        shader.set_uniform(ctx, "u_view", camera.view_matrix());
        shader.set_uniform(ctx, "u_camera_position", camera.position);
        shader.set_uniform(ctx, "u_camera_target", camera.target());
        shader.set_uniform(ctx, "u_time", time);
        material.apply_colors(ctx, shader);

        mesh.draw(ctx);

        mesh.unbind(ctx);
        shader.unbind(ctx);
        material.unbind(ctx);
        Ok(())
    }
}
