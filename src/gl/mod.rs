//! OpenGL device abstraction
//!
//! [`GlDevice`] is the single seam to the driver: every GL entry point the
//! engine issues goes through it. Object names are plain `u32` values where
//! zero is the null object, exactly as in GL itself.
//!
//! Two devices are provided:
//! - [`GlowDevice`]: the production device on top of a `glow` context
//! - [`HeadlessDevice`]: a software state tracker for tests and tools

mod context;
#[cfg(not(target_arch = "wasm32"))]
mod glow_device;
mod handle;
mod headless;
mod types;

pub use context::*;
#[cfg(not(target_arch = "wasm32"))]
pub use glow_device::GlowDevice;
pub use handle::GlHandle;
pub use headless::*;
pub use types::*;

/// Core GL device trait
///
/// Implementations are only ever driven from the thread that owns the GL
/// context; see [`GlContext`].
pub trait GlDevice {
    /// Device name for diagnostics
    fn name(&self) -> &'static str;

    // Vertex arrays and buffers

    /// Create a vertex array object, 0 on failure
    fn create_vertex_array(&self) -> u32;
    fn delete_vertex_array(&self, vertex_array: u32);
    fn bind_vertex_array(&self, vertex_array: u32);

    /// Create a buffer object, 0 on failure
    fn create_buffer(&self) -> u32;
    fn delete_buffer(&self, buffer: u32);
    fn bind_array_buffer(&self, buffer: u32);
    /// Upload `data` into the bound array buffer with static usage
    fn array_buffer_data(&self, data: &[u8]);
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Describe attribute `index` of the bound vertex array
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        scalar: ScalarType,
        stride: i32,
        offset: i32,
    );

    // Textures

    /// Create a texture object, 0 on failure
    fn create_texture(&self) -> u32;
    fn delete_texture(&self, texture: u32);
    /// Select texture unit `unit` (0-based)
    fn active_texture(&self, unit: u32);
    fn bind_texture_2d(&self, texture: u32);
    /// Define the image of the bound 2D texture
    fn tex_image_2d(
        &self,
        internal_format: InternalFormat,
        width: u32,
        height: u32,
        channels: PixelChannels,
        pixel_type: PixelType,
        pixels: Option<&[u8]>,
    );
    /// Set an integer parameter of the bound 2D texture
    fn tex_parameter(&self, parameter: u32, value: i32);
    fn generate_mipmap_2d(&self);

    // Framebuffers

    /// Create a framebuffer object, 0 on failure
    fn create_framebuffer(&self) -> u32;
    fn delete_framebuffer(&self, framebuffer: u32);
    fn bind_framebuffer(&self, framebuffer: u32);
    fn framebuffer_texture_2d(&self, attachment: u32, texture: u32);
    fn draw_buffers(&self, attachments: &[u32]);
    /// Create a renderbuffer object, 0 on failure
    fn create_renderbuffer(&self) -> u32;
    fn delete_renderbuffer(&self, renderbuffer: u32);
    fn bind_renderbuffer(&self, renderbuffer: u32);
    fn renderbuffer_storage(&self, internal_format: InternalFormat, width: u32, height: u32);
    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: u32);
    /// Completeness of the bound framebuffer
    fn check_framebuffer_status(&self) -> u32;

    // Shaders and programs

    /// Create a shader object, 0 on failure
    fn create_shader(&self, stage: ShaderStage) -> u32;
    fn delete_shader(&self, shader: u32);
    fn shader_source(&self, shader: u32, source: &str);
    fn compile_shader(&self, shader: u32);
    fn shader_info_log(&self, shader: u32) -> String;

    /// Create a program object, 0 on failure
    fn create_program(&self) -> u32;
    fn delete_program(&self, program: u32);
    fn attach_shader(&self, program: u32, shader: u32);
    fn detach_shader(&self, program: u32, shader: u32);
    fn link_program(&self, program: u32);
    fn program_info_log(&self, program: u32) -> String;
    fn use_program(&self, program: u32);

    /// Resolve a uniform, `None` when the program does not declare it
    fn uniform_location(&self, program: u32, name: &str) -> Option<UniformLocation>;
    fn uniform_1_i32(&self, location: UniformLocation, value: i32);
    fn uniform_1_f32(&self, location: UniformLocation, value: f32);
    fn uniform_2_f32(&self, location: UniformLocation, x: f32, y: f32);
    fn uniform_3_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32);
    fn uniform_4_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32);
    fn uniform_matrix_3_f32(&self, location: UniformLocation, columns: &[f32; 9]);
    fn uniform_matrix_4_f32(&self, location: UniformLocation, columns: &[f32; 16]);

    // Frame state and drawing

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, color: bool, depth: bool);
    fn set_depth_test(&self, enabled: bool);
    fn draw_arrays(&self, primitive: PrimitiveType, first: i32, count: i32);
}
