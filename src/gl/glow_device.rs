//! Production GL device on top of `glow`

use crate::gl::types::*;
use crate::gl::GlDevice;
use glow::HasContext;
use std::num::NonZeroU32;

/// GL device backed by a native `glow` context
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Wrap a context that is current on the calling thread
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Direct access to the wrapped context for advanced operations
    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

fn name_of<T>(result: Result<T, String>, kind: &str, to_u32: impl FnOnce(T) -> u32) -> u32 {
    match result {
        Ok(object) => to_u32(object),
        Err(e) => {
            log::error!("Failed to create {}: {}", kind, e);
            0
        }
    }
}

fn vertex_array(name: u32) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(name).map(glow::NativeVertexArray)
}

fn buffer(name: u32) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(name).map(glow::NativeBuffer)
}

fn texture(name: u32) -> Option<glow::NativeTexture> {
    NonZeroU32::new(name).map(glow::NativeTexture)
}

fn framebuffer(name: u32) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(name).map(glow::NativeFramebuffer)
}

fn renderbuffer(name: u32) -> Option<glow::NativeRenderbuffer> {
    NonZeroU32::new(name).map(glow::NativeRenderbuffer)
}

fn shader(name: u32) -> Option<glow::NativeShader> {
    NonZeroU32::new(name).map(glow::NativeShader)
}

fn program(name: u32) -> Option<glow::NativeProgram> {
    NonZeroU32::new(name).map(glow::NativeProgram)
}

fn location(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

impl GlDevice for GlowDevice {
    fn name(&self) -> &'static str {
        "glow"
    }

    fn create_vertex_array(&self) -> u32 {
        let result = unsafe { self.gl.create_vertex_array() };
        name_of(result, "vertex array", |v| v.0.get())
    }

    fn delete_vertex_array(&self, name: u32) {
        if let Some(v) = vertex_array(name) {
            unsafe { self.gl.delete_vertex_array(v) }
        }
    }

    fn bind_vertex_array(&self, name: u32) {
        unsafe { self.gl.bind_vertex_array(vertex_array(name)) }
    }

    fn create_buffer(&self) -> u32 {
        let result = unsafe { self.gl.create_buffer() };
        name_of(result, "buffer", |b| b.0.get())
    }

    fn delete_buffer(&self, name: u32) {
        if let Some(b) = buffer(name) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn bind_array_buffer(&self, name: u32) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer(name)) }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        scalar: ScalarType,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            match scalar {
                ScalarType::Float => self.gl.vertex_attrib_pointer_f32(
                    index,
                    components,
                    scalar.to_gl(),
                    false,
                    stride,
                    offset,
                ),
                ScalarType::Int => self.gl.vertex_attrib_pointer_i32(
                    index,
                    components,
                    scalar.to_gl(),
                    stride,
                    offset,
                ),
                ScalarType::Double => self.gl.vertex_attrib_pointer_f64(
                    index,
                    components,
                    scalar.to_gl(),
                    stride,
                    offset,
                ),
            }
        }
    }

    fn create_texture(&self) -> u32 {
        let result = unsafe { self.gl.create_texture() };
        name_of(result, "texture", |t| t.0.get())
    }

    fn delete_texture(&self, name: u32) {
        if let Some(t) = texture(name) {
            unsafe { self.gl.delete_texture(t) }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&self, name: u32) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture(name)) }
    }

    fn tex_image_2d(
        &self,
        internal_format: InternalFormat,
        width: u32,
        height: u32,
        channels: PixelChannels,
        pixel_type: PixelType,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format.to_gl() as i32,
                width as i32,
                height as i32,
                0,
                channels.to_gl(),
                pixel_type.to_gl(),
                pixels,
            )
        }
    }

    fn tex_parameter(&self, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value) }
    }

    fn generate_mipmap_2d(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn create_framebuffer(&self) -> u32 {
        let result = unsafe { self.gl.create_framebuffer() };
        name_of(result, "framebuffer", |f| f.0.get())
    }

    fn delete_framebuffer(&self, name: u32) {
        if let Some(f) = framebuffer(name) {
            unsafe { self.gl.delete_framebuffer(f) }
        }
    }

    fn bind_framebuffer(&self, name: u32) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer(name)) }
    }

    fn framebuffer_texture_2d(&self, attachment: u32, name: u32) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                texture(name),
                0,
            )
        }
    }

    fn draw_buffers(&self, attachments: &[u32]) {
        unsafe { self.gl.draw_buffers(attachments) }
    }

    fn create_renderbuffer(&self) -> u32 {
        let result = unsafe { self.gl.create_renderbuffer() };
        name_of(result, "renderbuffer", |r| r.0.get())
    }

    fn delete_renderbuffer(&self, name: u32) {
        if let Some(r) = renderbuffer(name) {
            unsafe { self.gl.delete_renderbuffer(r) }
        }
    }

    fn bind_renderbuffer(&self, name: u32) {
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, renderbuffer(name)) }
    }

    fn renderbuffer_storage(&self, internal_format: InternalFormat, width: u32, height: u32) {
        unsafe {
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                internal_format.to_gl(),
                width as i32,
                height as i32,
            )
        }
    }

    fn framebuffer_renderbuffer(&self, attachment: u32, name: u32) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment,
                glow::RENDERBUFFER,
                renderbuffer(name),
            )
        }
    }

    fn check_framebuffer_status(&self) -> u32 {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) }
    }

    fn create_shader(&self, stage: ShaderStage) -> u32 {
        let result = unsafe { self.gl.create_shader(stage.to_gl()) };
        name_of(result, "shader", |s| s.0.get())
    }

    fn delete_shader(&self, name: u32) {
        if let Some(s) = shader(name) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn shader_source(&self, name: u32, source: &str) {
        if let Some(s) = shader(name) {
            unsafe { self.gl.shader_source(s, source) }
        }
    }

    fn compile_shader(&self, name: u32) {
        if let Some(s) = shader(name) {
            unsafe { self.gl.compile_shader(s) }
        }
    }

    fn shader_info_log(&self, name: u32) -> String {
        match shader(name) {
            Some(s) => unsafe { self.gl.get_shader_info_log(s) },
            None => String::new(),
        }
    }

    fn create_program(&self) -> u32 {
        let result = unsafe { self.gl.create_program() };
        name_of(result, "program", |p| p.0.get())
    }

    fn delete_program(&self, name: u32) {
        if let Some(p) = program(name) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn attach_shader(&self, program_name: u32, shader_name: u32) {
        if let (Some(p), Some(s)) = (program(program_name), shader(shader_name)) {
            unsafe { self.gl.attach_shader(p, s) }
        }
    }

    fn detach_shader(&self, program_name: u32, shader_name: u32) {
        if let (Some(p), Some(s)) = (program(program_name), shader(shader_name)) {
            unsafe { self.gl.detach_shader(p, s) }
        }
    }

    fn link_program(&self, name: u32) {
        if let Some(p) = program(name) {
            unsafe { self.gl.link_program(p) }
        }
    }

    fn program_info_log(&self, name: u32) -> String {
        match program(name) {
            Some(p) => unsafe { self.gl.get_program_info_log(p) },
            None => String::new(),
        }
    }

    fn use_program(&self, name: u32) {
        unsafe { self.gl.use_program(program(name)) }
    }

    fn uniform_location(&self, name: u32, uniform: &str) -> Option<UniformLocation> {
        let p = program(name)?;
        unsafe { self.gl.get_uniform_location(p, uniform) }.map(|l| UniformLocation(l.0))
    }

    fn uniform_1_i32(&self, loc: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), value) }
    }

    fn uniform_1_f32(&self, loc: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&location(loc)), value) }
    }

    fn uniform_2_f32(&self, loc: UniformLocation, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(&location(loc)), x, y) }
    }

    fn uniform_3_f32(&self, loc: UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(Some(&location(loc)), x, y, z) }
    }

    fn uniform_4_f32(&self, loc: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_matrix_3_f32(&self, loc: UniformLocation, columns: &[f32; 9]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(&location(loc)), false, columns)
        }
    }

    fn uniform_matrix_4_f32(&self, loc: UniformLocation, columns: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location(loc)), false, columns)
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, color: [f32; 4]) {
        unsafe { self.gl.clear_color(color[0], color[1], color[2], color[3]) }
    }

    fn clear(&self, color: bool, depth: bool) {
        let mut mask = 0;
        if color {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if mask != 0 {
            unsafe { self.gl.clear(mask) }
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive.to_gl(), first, count) }
    }
}
