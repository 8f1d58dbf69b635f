//! Camera component

use crate::gl::{GlContext, InternalFormat, PixelChannels, PixelType, ShaderStage};
use crate::render::RenderError;
use crate::resources::{
    FrameBuffer, FrameBufferError, GpuResource, Mesh, Resources, ShaderProgram,
};
use crate::scene::transform::look_rotation;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the shared full-screen quad in the mesh manager
pub const CAMERA_PLANE_MESH: &str = "camplane";
/// Name of the shared post-process program in the shader manager
pub const DEFERRED_POST_SHADER: &str = "deferred_post";

const DEFERRED_POST_VERTEX: &str = include_str!("shaders/deferred_post.vert");
const DEFERRED_POST_FRAGMENT: &str = include_str!("shaders/deferred_post.frag");

/// Lens and clip settings of a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub lens_width: f32,
    pub lens_height: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            lens_width: 1280.0,
            lens_height: 720.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl ViewSettings {
    pub fn aspect(&self) -> f32 {
        if self.lens_height > 0.0 {
            self.lens_width / self.lens_height
        } else {
            1.0
        }
    }
}

/// Albedo, normal and position targets, in attachment order
const CAPTURE_TARGETS: [(InternalFormat, PixelType); 3] = [
    (InternalFormat::Rgba8, PixelType::UnsignedByte),
    (InternalFormat::Rgba16F, PixelType::Float),
    (InternalFormat::Rgba16F, PixelType::Float),
];

fn attach_targets(ctx: &GlContext, framebuffer: &mut FrameBuffer) -> Result<(), FrameBufferError> {
    for (format, pixel_type) in CAPTURE_TARGETS {
        framebuffer.attach_color_render_target(ctx, format, PixelChannels::Rgba, pixel_type)?;
    }
    framebuffer.attach_depth_buffer_target(ctx)?;
    framebuffer.validate(ctx)
}

/// Full-screen plane the camera framebuffer is presented through
#[derive(Debug, Clone)]
struct RenderPlane {
    mesh: Arc<Mesh>,
    shader: Arc<ShaderProgram>,
}

/// Perspective camera.
///
/// View and projection matrices are only recomputed by
/// [`Camera::update_view_matrix`] and [`Camera::update_projection_matrix`];
/// a camera moved without an update renders with its previous matrices.
#[derive(Component, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub settings: ViewSettings,
    target: Vec3,
    view: Mat4,
    projection: Mat4,
    framebuffer: Option<FrameBuffer>,
    plane: Option<RenderPlane>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, ViewSettings::default())
    }
}

impl Camera {
    pub fn new(position: Vec3, settings: ViewSettings) -> Self {
        let mut camera = Self {
            position,
            orientation: Quat::IDENTITY,
            settings,
            target: position - Vec3::Z,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            framebuffer: None,
            plane: None,
        };
        camera.update_view_matrix();
        camera.update_projection_matrix();
        camera
    }

    pub fn update_view_matrix(&mut self) {
        let forward = self.orientation * -Vec3::Z;
        self.target = self.position + forward;

        let back = self.position - self.target;
        let right = Vec3::Y
            .cross(back)
            .try_normalize()
            .unwrap_or_else(|| self.orientation * Vec3::X);
        let up = back.cross(right).normalize();
        self.view = Mat4::look_at_rh(self.position, self.target, up);
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh_gl(
            self.settings.fov_degrees.to_radians(),
            self.settings.aspect(),
            self.settings.near,
            self.settings.far,
        );
    }

    /// Turn towards `target`. Matrices are not updated.
    pub fn look_at(&mut self, target: Vec3) {
        self.orientation = look_rotation(target - self.position, Vec3::Y);
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let delta = Quat::from_axis_angle(axis.normalize(), angle);
        self.orientation = (delta * self.orientation).normalize();
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Create the camera framebuffer and attach the shared plane resources.
    ///
    /// The `"camplane"` mesh and `"deferred_post"` program are created the
    /// first time any camera asks for them and reused afterwards.
    pub fn init_render_plane(
        &mut self,
        ctx: &GlContext,
        resources: &Resources,
    ) -> Result<(), RenderError> {
        self.release_render_target(ctx);

        let framebuffer = self.create_framebuffer(ctx)?;
        let plane = Self::shared_plane(ctx, resources);
        match plane {
            Ok(plane) => {
                log::debug!(
                    "Camera render plane ready ({}x{}, framebuffer {})",
                    framebuffer.size().0,
                    framebuffer.size().1,
                    framebuffer.gl_name()
                );
                self.framebuffer = Some(framebuffer);
                self.plane = Some(plane);
                Ok(())
            }
            Err(e) => {
                framebuffer.release(ctx);
                Err(e)
            }
        }
    }

    fn create_framebuffer(&self, ctx: &GlContext) -> Result<FrameBuffer, RenderError> {
        let width = self.settings.lens_width.max(1.0) as u32;
        let height = self.settings.lens_height.max(1.0) as u32;
        let mut framebuffer = FrameBuffer::new(ctx, width, height)?;
        if let Err(e) = attach_targets(ctx, &mut framebuffer) {
            framebuffer.release(ctx);
            return Err(e.into());
        }
        Ok(framebuffer)
    }

    fn shared_plane(ctx: &GlContext, resources: &Resources) -> Result<RenderPlane, RenderError> {
        let mesh = resources
            .meshes
            .get_or_try_insert_with(CAMERA_PLANE_MESH, || {
                let mesh = Mesh::quad(ctx, CAMERA_PLANE_MESH);
                match mesh.error() {
                    Some(e) => {
                        let e = e.clone();
                        mesh.release(ctx);
                        Err(e)
                    }
                    None => Ok(mesh),
                }
            })?;
        let shader = resources
            .shaders
            .get_or_try_insert_with(DEFERRED_POST_SHADER, || {
                ShaderProgram::from_sources(
                    ctx,
                    DEFERRED_POST_SHADER,
                    &[
                        (ShaderStage::Vertex, DEFERRED_POST_VERTEX),
                        (ShaderStage::Fragment, DEFERRED_POST_FRAGMENT),
                    ],
                )
            })?;
        Ok(RenderPlane { mesh, shader })
    }

    pub fn has_render_plane(&self) -> bool {
        self.framebuffer.is_some() && self.plane.is_some()
    }

    pub fn framebuffer(&self) -> Option<&FrameBuffer> {
        self.framebuffer.as_ref()
    }

    /// Redirect rendering into the camera framebuffer
    pub fn begin_capture(&self, ctx: &GlContext) {
        if let Some(framebuffer) = &self.framebuffer {
            framebuffer.bind(ctx);
            ctx.gl().clear(true, true);
        }
    }

    pub fn end_capture(&self, ctx: &GlContext) {
        if let Some(framebuffer) = &self.framebuffer {
            framebuffer.unbind(ctx);
        }
    }

    /// Draw the plane into the bound framebuffer, sampling the captured targets
    pub fn present(&self, ctx: &GlContext, time: f32) {
        let (Some(framebuffer), Some(plane)) = (&self.framebuffer, &self.plane) else {
            return;
        };
        let textures = framebuffer.textures();

        textures.bind(ctx);
        plane.mesh.bind(ctx);
        plane.shader.bind(ctx);
        for (unit, _) in textures.occupied_units() {
            plane
                .shader
                .set_uniform(ctx, &format!("u_texture{}", unit), unit as i32);
        }
        plane.shader.set_uniform(ctx, "u_time", time);
        plane.mesh.draw(ctx);
        plane.mesh.unbind(ctx);
        plane.shader.unbind(ctx);
        textures.unbind(ctx);
    }

    /// Dispose the camera framebuffer. Shared plane resources stay with the
    /// resource managers.
    pub fn release_render_target(&mut self, ctx: &GlContext) {
        if let Some(mut framebuffer) = self.framebuffer.take() {
            framebuffer.dispose(ctx);
        }
        self.plane = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessDevice;

    #[test]
    fn test_view_matrix_faces_forward() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), ViewSettings::default());
        camera.update_view_matrix();
        assert!(camera.target().abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-6));

        // A point in front of the camera lands on the -Z axis in view space
        let in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn test_view_matrix_looking_straight_down() {
        let mut camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), ViewSettings::default());
        camera.look_at(Vec3::ZERO);
        camera.update_view_matrix();
        assert!(!camera.view_matrix().is_nan());
        assert!(camera.target().abs_diff_eq(Vec3::new(0.0, 9.0, 0.0), 1e-5));
    }

    #[test]
    fn test_matrices_are_explicit() {
        let mut camera = Camera::default();
        let view = camera.view_matrix();
        camera.translate(Vec3::X);
        assert_eq!(camera.view_matrix(), view);
        camera.update_view_matrix();
        assert_ne!(camera.view_matrix(), view);
    }

    #[test]
    fn test_projection_uses_gl_depth_range() {
        let mut camera = Camera::default();
        camera.settings.near = 1.0;
        camera.settings.far = 10.0;
        camera.update_projection_matrix();
        let near = camera
            .projection_matrix()
            .project_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!((near.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_render_plane_lifecycle() {
        let device = HeadlessDevice::new();
        let ctx = GlContext::new(device.clone());
        let resources = Resources::new();
        let mut camera = Camera::new(
            Vec3::ZERO,
            ViewSettings {
                lens_width: 64.0,
                lens_height: 32.0,
                ..Default::default()
            },
        );

        camera.init_render_plane(&ctx, &resources).unwrap();
        assert!(camera.has_render_plane());
        let framebuffer = camera.framebuffer().unwrap();
        assert_eq!(framebuffer.size(), (64, 32));
        assert_eq!(framebuffer.color_attachment_count(), 3);
        assert!(framebuffer.has_depth_buffer());

        camera.release_render_target(&ctx);
        assert!(!camera.has_render_plane());
        resources.release_all(&ctx);
        assert_eq!(device.live_object_count(), 0);
    }
}
