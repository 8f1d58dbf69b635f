//! Headless GL device for testing and tooling.
//!
//! This device doesn't talk to a driver. It tracks object names, bindings,
//! framebuffer attachments and program uniforms closely enough to exercise
//! the engine's resource lifecycle without GPU hardware, and records every
//! state-changing call so tests can assert on call sequences.

use crate::gl::types::*;
use crate::gl::GlDevice;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// A uniform value as it reached the device
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

/// One `vertex_attrib_pointer` description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttribPointer {
    pub index: u32,
    pub components: i32,
    pub scalar: ScalarType,
    pub stride: i32,
    pub offset: i32,
}

/// Recorded state-changing call
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    BindVertexArray(u32),
    BufferData { buffer: u32, bytes: usize },
    ActiveTexture(u32),
    BindTexture { unit: u32, texture: u32 },
    BindFramebuffer(u32),
    DrawBuffers(Vec<u32>),
    UseProgram(u32),
    Uniform { name: String, value: UniformData },
    Viewport { width: i32, height: i32 },
    Clear { color: bool, depth: bool },
    DrawArrays { primitive: PrimitiveType, first: i32, count: i32 },
}

#[derive(Debug, Default)]
struct TextureObject {
    size: Option<(u32, u32)>,
    format: Option<InternalFormat>,
    mipmapped: bool,
    parameters: HashMap<u32, i32>,
}

#[derive(Debug, Default)]
struct FramebufferObject {
    colors: BTreeMap<u32, u32>,
    depth: Option<u32>,
    draw_buffers: Vec<u32>,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    shaders: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: HashMap<String, u32>,
}

#[derive(Debug, Default)]
struct Bindings {
    vertex_array: u32,
    array_buffer: u32,
    framebuffer: u32,
    renderbuffer: u32,
    program: u32,
    active_unit: u32,
    units: HashMap<u32, u32>,
}

#[derive(Debug, Default)]
struct State {
    next_name: u32,
    next_location: u32,
    fail_allocations: bool,
    vertex_arrays: HashMap<u32, Vec<AttribPointer>>,
    enabled_attributes: HashSet<(u32, u32)>,
    buffers: HashMap<u32, usize>,
    textures: HashMap<u32, TextureObject>,
    framebuffers: HashMap<u32, FramebufferObject>,
    renderbuffers: HashMap<u32, Option<(u32, u32)>>,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    locations: HashMap<u32, String>,
    bound: Bindings,
    depth_test: bool,
    calls: Vec<GlCall>,
}

impl State {
    fn allocate(&mut self) -> u32 {
        if self.fail_allocations {
            return 0;
        }
        self.next_name += 1;
        self.next_name
    }

    fn record(&mut self, call: GlCall) {
        self.calls.push(call);
    }

    fn bound_texture(&self) -> u32 {
        self.bound
            .units
            .get(&self.bound.active_unit)
            .copied()
            .unwrap_or(0)
    }

    fn uniform(&mut self, location: UniformLocation, value: UniformData) {
        if let Some(name) = self.locations.get(&location.0).cloned() {
            self.record(GlCall::Uniform { name, value });
        }
    }
}

/// Check a GLSL source closely enough to catch structural mistakes
fn check_glsl(source: &str) -> Result<(), String> {
    if !source.contains("main") {
        return Err("ERROR: 0:1: 'main' : function not defined".to_string());
    }

    let mut depth = 0i32;
    let mut last_line = 1;
    for (number, line) in source.lines().enumerate() {
        last_line = number + 1;
        if line.trim_start().starts_with("#error") {
            return Err(format!("ERROR: 0:{}: '#error' : {}", last_line, line.trim()));
        }
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(format!("ERROR: 0:{}: '}}' : syntax error", last_line));
                    }
                }
                _ => {}
            }
        }
    }

    if depth != 0 {
        return Err(format!(
            "ERROR: 0:{}: '' : syntax error: unexpected end of file",
            last_line
        ));
    }
    Ok(())
}

/// Names of all `uniform` declarations in a GLSL source
fn declared_uniforms(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let mut line = line.trim();
        if line.starts_with("layout") {
            match line.find(')') {
                Some(end) => line = line[end + 1..].trim(),
                None => continue,
            }
        }
        let Some(rest) = line.strip_prefix("uniform ") else {
            continue;
        };

        let declaration = rest.split(';').next().unwrap_or("");
        let mut tokens = declaration
            .split_whitespace()
            .filter(|t| !matches!(*t, "lowp" | "mediump" | "highp"));
        // Type
        if tokens.next().is_none() {
            continue;
        }
        let remainder = tokens.collect::<Vec<_>>().join(" ");
        for name in remainder.split(',') {
            let name = name.split('=').next().unwrap_or("");
            let name = name.split('[').next().unwrap_or("").trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Headless GL device.
///
/// Cloning shares the underlying state, so a test can keep one clone for
/// inspection while the engine owns the other inside its `GlContext`.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDevice {
    state: Rc<RefCell<State>>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_*` call return the null name
    pub fn set_fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Total number of live GL objects of every kind
    pub fn live_object_count(&self) -> usize {
        let state = self.state.borrow();
        state.vertex_arrays.len()
            + state.buffers.len()
            + state.textures.len()
            + state.framebuffers.len()
            + state.renderbuffers.len()
            + state.shaders.len()
            + state.programs.len()
    }

    pub fn texture_exists(&self, name: u32) -> bool {
        self.state.borrow().textures.contains_key(&name)
    }

    pub fn framebuffer_exists(&self, name: u32) -> bool {
        self.state.borrow().framebuffers.contains_key(&name)
    }

    pub fn renderbuffer_exists(&self, name: u32) -> bool {
        self.state.borrow().renderbuffers.contains_key(&name)
    }

    pub fn buffer_exists(&self, name: u32) -> bool {
        self.state.borrow().buffers.contains_key(&name)
    }

    pub fn vertex_array_exists(&self, name: u32) -> bool {
        self.state.borrow().vertex_arrays.contains_key(&name)
    }

    pub fn shader_exists(&self, name: u32) -> bool {
        self.state.borrow().shaders.contains_key(&name)
    }

    pub fn program_exists(&self, name: u32) -> bool {
        self.state.borrow().programs.contains_key(&name)
    }

    /// Size of the image defined for a texture
    pub fn texture_size(&self, name: u32) -> Option<(u32, u32)> {
        self.state.borrow().textures.get(&name).and_then(|t| t.size)
    }

    pub fn texture_format(&self, name: u32) -> Option<InternalFormat> {
        self.state.borrow().textures.get(&name).and_then(|t| t.format)
    }

    pub fn texture_parameter(&self, name: u32, parameter: u32) -> Option<i32> {
        self.state
            .borrow()
            .textures
            .get(&name)
            .and_then(|t| t.parameters.get(&parameter).copied())
    }

    pub fn texture_mipmapped(&self, name: u32) -> bool {
        self.state
            .borrow()
            .textures
            .get(&name)
            .map(|t| t.mipmapped)
            .unwrap_or(false)
    }

    /// Bytes uploaded into a buffer
    pub fn buffer_size(&self, name: u32) -> Option<usize> {
        self.state.borrow().buffers.get(&name).copied()
    }

    /// Attribute pointers described on a vertex array
    pub fn attrib_pointers(&self, vertex_array: u32) -> Vec<AttribPointer> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .cloned()
            .unwrap_or_default()
    }

    pub fn draw_buffers(&self, framebuffer: u32) -> Vec<u32> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .map(|f| f.draw_buffers.clone())
            .unwrap_or_default()
    }

    /// `(attachment point, texture)` pairs of a framebuffer
    pub fn color_attachments(&self, framebuffer: u32) -> Vec<(u32, u32)> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .map(|f| f.colors.iter().map(|(a, t)| (*a, *t)).collect())
            .unwrap_or_default()
    }

    pub fn depth_attachment(&self, framebuffer: u32) -> Option<u32> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .and_then(|f| f.depth)
    }

    pub fn current_program(&self) -> u32 {
        self.state.borrow().bound.program
    }

    pub fn current_framebuffer(&self) -> u32 {
        self.state.borrow().bound.framebuffer
    }

    pub fn current_vertex_array(&self) -> u32 {
        self.state.borrow().bound.vertex_array
    }

    pub fn active_unit(&self) -> u32 {
        self.state.borrow().bound.active_unit
    }

    /// Texture bound on a texture unit
    pub fn bound_texture(&self, unit: u32) -> u32 {
        self.state
            .borrow()
            .bound
            .units
            .get(&unit)
            .copied()
            .unwrap_or(0)
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.state.borrow().depth_test
    }

    /// Source last given to a shader object
    pub fn shader_source_of(&self, name: u32) -> Option<String> {
        self.state
            .borrow()
            .shaders
            .get(&name)
            .map(|s| s.source.clone())
    }
}

impl GlDevice for HeadlessDevice {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_vertex_array(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.vertex_arrays.insert(name, Vec::new());
        }
        name
    }

    fn delete_vertex_array(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&name);
        state.enabled_attributes.retain(|(vao, _)| *vao != name);
        if state.bound.vertex_array == name {
            state.bound.vertex_array = 0;
        }
    }

    fn bind_vertex_array(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.bound.vertex_array = name;
        state.record(GlCall::BindVertexArray(name));
    }

    fn create_buffer(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.buffers.insert(name, 0);
        }
        name
    }

    fn delete_buffer(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&name);
        if state.bound.array_buffer == name {
            state.bound.array_buffer = 0;
        }
    }

    fn bind_array_buffer(&self, name: u32) {
        self.state.borrow_mut().bound.array_buffer = name;
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound.array_buffer;
        if let Some(size) = state.buffers.get_mut(&buffer) {
            *size = data.len();
        }
        state.record(GlCall::BufferData {
            buffer,
            bytes: data.len(),
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let vao = state.bound.vertex_array;
        state.enabled_attributes.insert((vao, index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        scalar: ScalarType,
        stride: i32,
        offset: i32,
    ) {
        let mut state = self.state.borrow_mut();
        let vao = state.bound.vertex_array;
        if let Some(pointers) = state.vertex_arrays.get_mut(&vao) {
            pointers.retain(|p| p.index != index);
            pointers.push(AttribPointer {
                index,
                components,
                scalar,
                stride,
                offset,
            });
        }
    }

    fn create_texture(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.textures.insert(name, TextureObject::default());
        }
        name
    }

    fn delete_texture(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&name);
        state.bound.units.retain(|_, t| *t != name);
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.bound.active_unit = unit;
        state.record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture_2d(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        let unit = state.bound.active_unit;
        state.bound.units.insert(unit, name);
        state.record(GlCall::BindTexture {
            unit,
            texture: name,
        });
    }

    fn tex_image_2d(
        &self,
        internal_format: InternalFormat,
        width: u32,
        height: u32,
        _channels: PixelChannels,
        _pixel_type: PixelType,
        _pixels: Option<&[u8]>,
    ) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        if let Some(object) = state.textures.get_mut(&texture) {
            object.size = Some((width, height));
            object.format = Some(internal_format);
        }
    }

    fn tex_parameter(&self, parameter: u32, value: i32) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        if let Some(object) = state.textures.get_mut(&texture) {
            object.parameters.insert(parameter, value);
        }
    }

    fn generate_mipmap_2d(&self) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        if let Some(object) = state.textures.get_mut(&texture) {
            object.mipmapped = object.size.is_some();
        }
    }

    fn create_framebuffer(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.framebuffers.insert(name, FramebufferObject::default());
        }
        name
    }

    fn delete_framebuffer(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&name);
        if state.bound.framebuffer == name {
            state.bound.framebuffer = 0;
        }
    }

    fn bind_framebuffer(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.bound.framebuffer = name;
        state.record(GlCall::BindFramebuffer(name));
    }

    fn framebuffer_texture_2d(&self, attachment: u32, texture: u32) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound.framebuffer;
        if let Some(object) = state.framebuffers.get_mut(&framebuffer) {
            if texture == 0 {
                object.colors.remove(&attachment);
            } else {
                object.colors.insert(attachment, texture);
            }
        }
    }

    fn draw_buffers(&self, attachments: &[u32]) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound.framebuffer;
        if let Some(object) = state.framebuffers.get_mut(&framebuffer) {
            object.draw_buffers = attachments.to_vec();
        }
        state.record(GlCall::DrawBuffers(attachments.to_vec()));
    }

    fn create_renderbuffer(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.renderbuffers.insert(name, None);
        }
        name
    }

    fn delete_renderbuffer(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        state.renderbuffers.remove(&name);
        if state.bound.renderbuffer == name {
            state.bound.renderbuffer = 0;
        }
    }

    fn bind_renderbuffer(&self, name: u32) {
        self.state.borrow_mut().bound.renderbuffer = name;
    }

    fn renderbuffer_storage(&self, _internal_format: InternalFormat, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        let renderbuffer = state.bound.renderbuffer;
        if let Some(storage) = state.renderbuffers.get_mut(&renderbuffer) {
            *storage = Some((width, height));
        }
    }

    fn framebuffer_renderbuffer(&self, _attachment: u32, renderbuffer: u32) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound.framebuffer;
        if let Some(object) = state.framebuffers.get_mut(&framebuffer) {
            object.depth = (renderbuffer != 0).then_some(renderbuffer);
        }
    }

    fn check_framebuffer_status(&self) -> u32 {
        let state = self.state.borrow();
        let name = state.bound.framebuffer;
        if name == 0 {
            return glow::FRAMEBUFFER_COMPLETE;
        }
        let Some(framebuffer) = state.framebuffers.get(&name) else {
            return glow::FRAMEBUFFER_UNDEFINED;
        };

        if framebuffer.colors.is_empty() && framebuffer.depth.is_none() {
            return glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }
        let textures_ready = framebuffer.colors.values().all(|texture| {
            state
                .textures
                .get(texture)
                .map(|t| t.size.is_some())
                .unwrap_or(false)
        });
        let depth_ready = framebuffer.depth.map_or(true, |rb| {
            matches!(state.renderbuffers.get(&rb), Some(Some(_)))
        });
        if !textures_ready || !depth_ready {
            return glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
        }
        let draw_buffers_ready = framebuffer
            .draw_buffers
            .iter()
            .all(|db| *db == glow::NONE || framebuffer.colors.contains_key(db));
        if !draw_buffers_ready {
            return glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER;
        }
        glow::FRAMEBUFFER_COMPLETE
    }

    fn create_shader(&self, stage: ShaderStage) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.shaders.insert(
                name,
                ShaderObject {
                    stage,
                    source: String::new(),
                    compiled: false,
                    log: String::new(),
                },
            );
        }
        name
    }

    fn delete_shader(&self, name: u32) {
        self.state.borrow_mut().shaders.remove(&name);
    }

    fn shader_source(&self, name: u32, source: &str) {
        if let Some(shader) = self.state.borrow_mut().shaders.get_mut(&name) {
            shader.source = source.to_string();
        }
    }

    fn compile_shader(&self, name: u32) {
        if let Some(shader) = self.state.borrow_mut().shaders.get_mut(&name) {
            match check_glsl(&shader.source) {
                Ok(()) => {
                    shader.compiled = true;
                    shader.log.clear();
                }
                Err(log) => {
                    shader.compiled = false;
                    shader.log = log;
                }
            }
        }
    }

    fn shader_info_log(&self, name: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&name)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn create_program(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        if name != 0 {
            state.programs.insert(name, ProgramObject::default());
        }
        name
    }

    fn delete_program(&self, name: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(program) = state.programs.remove(&name) {
            for location in program.uniforms.values() {
                state.locations.remove(location);
            }
        }
        if state.bound.program == name {
            state.bound.program = 0;
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            if !object.shaders.contains(&shader) {
                object.shaders.push(shader);
            }
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.shaders.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let Some(shaders) = state.programs.get(&program).map(|p| p.shaders.clone()) else {
            return;
        };

        let mut log = String::new();
        let mut uniforms = Vec::new();
        let mut has_vertex = false;
        let mut has_fragment = false;
        for shader in &shaders {
            match state.shaders.get(shader) {
                Some(object) if object.compiled => {
                    has_vertex |= object.stage == ShaderStage::Vertex;
                    has_fragment |= object.stage == ShaderStage::Fragment;
                    uniforms.extend(declared_uniforms(&object.source));
                }
                _ => {
                    log = "ERROR: One or more attached shaders not successfully compiled"
                        .to_string();
                }
            }
        }
        if log.is_empty() && !has_vertex {
            log = "ERROR: Linking with no vertex shader".to_string();
        }
        if log.is_empty() && !has_fragment {
            log = "ERROR: Linking with no fragment shader".to_string();
        }

        let mut locations = HashMap::new();
        if log.is_empty() {
            for uniform in uniforms {
                if locations.contains_key(&uniform) {
                    continue;
                }
                state.next_location += 1;
                let location = state.next_location;
                state.locations.insert(location, uniform.clone());
                locations.insert(uniform, location);
            }
        }

        if let Some(object) = state.programs.get_mut(&program) {
            object.linked = log.is_empty();
            object.log = log;
            object.uniforms = locations;
        }
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.bound.program = program;
        state.record(GlCall::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let object = state.programs.get(&program)?;
        if !object.linked {
            return None;
        }
        object.uniforms.get(name).copied().map(UniformLocation)
    }

    fn uniform_1_i32(&self, location: UniformLocation, value: i32) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Int(value));
    }

    fn uniform_1_f32(&self, location: UniformLocation, value: f32) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Float(value));
    }

    fn uniform_2_f32(&self, location: UniformLocation, x: f32, y: f32) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Vec2([x, y]));
    }

    fn uniform_3_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Vec3([x, y, z]));
    }

    fn uniform_4_f32(&self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Vec4([x, y, z, w]));
    }

    fn uniform_matrix_3_f32(&self, location: UniformLocation, columns: &[f32; 9]) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Mat3(*columns));
    }

    fn uniform_matrix_4_f32(&self, location: UniformLocation, columns: &[f32; 16]) {
        self.state
            .borrow_mut()
            .uniform(location, UniformData::Mat4(*columns));
    }

    fn viewport(&self, _x: i32, _y: i32, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .record(GlCall::Viewport { width, height });
    }

    fn clear_color(&self, _color: [f32; 4]) {}

    fn clear(&self, color: bool, depth: bool) {
        self.state
            .borrow_mut()
            .record(GlCall::Clear { color, depth });
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state.borrow_mut().depth_test = enabled;
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: i32, count: i32) {
        self.state.borrow_mut().record(GlCall::DrawArrays {
            primitive,
            first,
            count,
        });
    }
}
