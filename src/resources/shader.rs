//! Shader stages and linked programs

use crate::gl::*;
use crate::resources::{DirectoryError, GpuResource, ResourceDirectories};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use thiserror::Error;

/// Shader and program errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    #[error("Failed to acquire {0} name")]
    HandleAcquisition(&'static str),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("Failed to read shader source '{path}': {message}")]
    Read { path: String, message: String },
    #[error("Failed to compile {stage} shader '{name}': {log}")]
    Compile {
        stage: ShaderStage,
        name: String,
        log: String,
    },
    #[error("{stage} shader '{name}' is not ready")]
    StageNotReady { stage: ShaderStage, name: String },
    #[error("Invalid stage combination {0:?}, expected vertex+fragment or vertex+geometry+fragment")]
    InvalidStages(Vec<ShaderStage>),
    #[error("Failed to link program '{name}': {log}")]
    Link { name: String, log: String },
}

/// Shader construction pipeline. A failed shader stays at the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShaderStatus {
    Uninitialized,
    AcquiringHandle,
    ResolvingSource,
    ReadingSource,
    Compiling,
    Ready,
}

/// One compiled shader stage.
///
/// Compilation failures never error on their own; the program checks the
/// status of every stage it is built from.
#[derive(Debug)]
pub struct Shader {
    name: String,
    stage: ShaderStage,
    handle: GlHandle,
    status: ShaderStatus,
    error: Option<ShaderError>,
}

impl Shader {
    fn empty(name: &str, stage: ShaderStage) -> Self {
        Self {
            name: name.to_string(),
            stage,
            handle: GlHandle::new("shader"),
            status: ShaderStatus::Uninitialized,
            error: None,
        }
    }

    /// Load and compile a stage from a logical resource directory
    pub fn load(
        ctx: &GlContext,
        directories: &ResourceDirectories,
        stage: ShaderStage,
        folder_id: &str,
        filename: &str,
    ) -> Self {
        let mut shader = Self::empty(filename, stage);
        if !shader.acquire(ctx) {
            return shader;
        }

        shader.status = ShaderStatus::ResolvingSource;
        let path = match directories.resolve(folder_id, filename) {
            Ok(path) => path,
            Err(e) => {
                shader.fail(e.into());
                return shader;
            }
        };

        shader.status = ShaderStatus::ReadingSource;
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                shader.fail(ShaderError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
                return shader;
            }
        };

        shader.compile(ctx, &source);
        shader
    }

    /// Compile a stage from in-memory source
    pub fn from_source(ctx: &GlContext, name: &str, stage: ShaderStage, source: &str) -> Self {
        let mut shader = Self::empty(name, stage);
        if shader.acquire(ctx) {
            shader.compile(ctx, source);
        }
        shader
    }

    fn acquire(&mut self, ctx: &GlContext) -> bool {
        self.status = ShaderStatus::AcquiringHandle;
        let name = ctx.gl().create_shader(self.stage);
        if name == 0 {
            self.fail(ShaderError::HandleAcquisition("shader"));
            return false;
        }
        log::trace!("Created {} shader {} for '{}'", self.stage, name, self.name);
        self.handle.set(name);
        true
    }

    fn compile(&mut self, ctx: &GlContext, source: &str) {
        self.status = ShaderStatus::Compiling;
        let gl = ctx.gl();
        let name = self.handle.get();
        gl.shader_source(name, source);
        gl.compile_shader(name);

        let log = gl.shader_info_log(name);
        if !log.trim().is_empty() {
            self.fail(ShaderError::Compile {
                stage: self.stage,
                name: self.name.clone(),
                log,
            });
            return;
        }
        self.status = ShaderStatus::Ready;
        log::debug!("Compiled {} shader '{}'", self.stage, self.name);
    }

    fn fail(&mut self, error: ShaderError) {
        log::warn!("Shader '{}' failed at {:?}: {}", self.name, self.status, error);
        self.error = Some(error);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn gl_name(&self) -> u32 {
        self.handle.get()
    }

    pub fn status(&self) -> ShaderStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ShaderError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == ShaderStatus::Ready
    }
}

impl GpuResource for Shader {
    fn release(&self, ctx: &GlContext) {
        if let Some(name) = self.handle.take() {
            log::trace!("Deleting shader {} ('{}')", name, self.name);
            ctx.gl().delete_shader(name);
        }
    }
}

/// A value that can be uploaded to a uniform
pub trait UniformValue {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation);
}

impl UniformValue for i32 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_1_i32(location, *self);
    }
}

impl UniformValue for u32 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_1_i32(location, *self as i32);
    }
}

impl UniformValue for bool {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_1_i32(location, *self as i32);
    }
}

impl UniformValue for f32 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_1_f32(location, *self);
    }
}

impl UniformValue for Vec2 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_2_f32(location, self.x, self.y);
    }
}

impl UniformValue for Vec3 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_3_f32(location, self.x, self.y, self.z);
    }
}

impl UniformValue for Vec4 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_4_f32(location, self.x, self.y, self.z, self.w);
    }
}

impl UniformValue for Mat3 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_matrix_3_f32(location, &self.to_cols_array());
    }
}

impl UniformValue for Mat4 {
    fn apply(&self, gl: &dyn GlDevice, location: UniformLocation) {
        gl.uniform_matrix_4_f32(location, &self.to_cols_array());
    }
}

/// Program construction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgramStatus {
    Uninitialized,
    AcquiringHandle,
    Linking,
    Ready,
}

/// A linked shader program.
///
/// Construction either yields a ready program or an error; no partially
/// linked program is ever observable.
#[derive(Debug)]
pub struct ShaderProgram {
    name: String,
    handle: GlHandle,
    status: ProgramStatus,
}

impl ShaderProgram {
    /// Link a program from vertex+fragment or vertex+geometry+fragment stages
    pub fn new(ctx: &GlContext, name: &str, stages: &[&Shader]) -> Result<Self, ShaderError> {
        let mut kinds: Vec<ShaderStage> = stages.iter().map(|s| s.stage()).collect();
        kinds.sort_by_key(|stage| match stage {
            ShaderStage::Vertex => 0,
            ShaderStage::Geometry => 1,
            ShaderStage::Fragment => 2,
        });
        let valid = matches!(
            kinds.as_slice(),
            [ShaderStage::Vertex, ShaderStage::Fragment]
                | [ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]
        );
        if !valid {
            return Err(ShaderError::InvalidStages(kinds));
        }
        if let Some(stage) = stages.iter().find(|s| !s.is_ready()) {
            log::error!("Program '{}': {} stage '{}' is not ready", name, stage.stage(), stage.name());
            return Err(ShaderError::StageNotReady {
                stage: stage.stage(),
                name: stage.name().to_string(),
            });
        }

        let mut program = Self {
            name: name.to_string(),
            handle: GlHandle::new("program"),
            status: ProgramStatus::AcquiringHandle,
        };
        let gl = ctx.gl();
        let handle = gl.create_program();
        if handle == 0 {
            return Err(ShaderError::HandleAcquisition("program"));
        }

        program.status = ProgramStatus::Linking;
        for stage in stages {
            gl.attach_shader(handle, stage.gl_name());
        }
        gl.link_program(handle);
        for stage in stages {
            gl.detach_shader(handle, stage.gl_name());
        }

        let log = gl.program_info_log(handle);
        if !log.trim().is_empty() {
            gl.delete_program(handle);
            log::error!("Program '{}' failed to link: {}", name, log);
            return Err(ShaderError::Link {
                name: name.to_string(),
                log,
            });
        }

        log::debug!("Linked program '{}' ({})", name, handle);
        program.handle.set(handle);
        program.status = ProgramStatus::Ready;
        Ok(program)
    }

    /// Load, compile and link stages from a logical directory.
    ///
    /// The intermediate shader objects are released whether or not linking
    /// succeeds.
    pub fn load(
        ctx: &GlContext,
        directories: &ResourceDirectories,
        name: &str,
        folder_id: &str,
        stages: &[(ShaderStage, &str)],
    ) -> Result<Self, ShaderError> {
        let shaders: Vec<Shader> = stages
            .iter()
            .map(|(stage, filename)| Shader::load(ctx, directories, *stage, folder_id, filename))
            .collect();
        Self::link_and_release(ctx, name, shaders)
    }

    /// Compile and link stages from in-memory sources
    pub fn from_sources(
        ctx: &GlContext,
        name: &str,
        stages: &[(ShaderStage, &str)],
    ) -> Result<Self, ShaderError> {
        let shaders: Vec<Shader> = stages
            .iter()
            .map(|(stage, source)| {
                Shader::from_source(ctx, &format!("{}.{}", name, stage), *stage, source)
            })
            .collect();
        Self::link_and_release(ctx, name, shaders)
    }

    fn link_and_release(
        ctx: &GlContext,
        name: &str,
        shaders: Vec<Shader>,
    ) -> Result<Self, ShaderError> {
        let stages: Vec<&Shader> = shaders.iter().collect();
        let result = Self::new(ctx, name, &stages);
        for shader in &shaders {
            shader.release(ctx);
        }
        result
    }

    /// Make this the active program
    pub fn bind(&self, ctx: &GlContext) {
        ctx.gl().use_program(self.handle.get());
    }

    pub fn unbind(&self, ctx: &GlContext) {
        ctx.gl().use_program(0);
    }

    /// Set a uniform by name. Names the program does not declare are ignored.
    pub fn set_uniform<V: UniformValue>(&self, ctx: &GlContext, name: &str, value: V) {
        let gl = ctx.gl();
        if let Some(location) = gl.uniform_location(self.handle.get(), name) {
            value.apply(gl, location);
        }
    }

    pub fn has_uniform(&self, ctx: &GlContext, name: &str) -> bool {
        ctx.gl().uniform_location(self.handle.get(), name).is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gl_name(&self) -> u32 {
        self.handle.get()
    }

    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ProgramStatus::Ready && !self.handle.is_null()
    }
}

impl GpuResource for ShaderProgram {
    fn release(&self, ctx: &GlContext) {
        if let Some(name) = self.handle.take() {
            log::trace!("Deleting program {} ('{}')", name, self.name);
            ctx.gl().delete_program(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core\n\
        layout(location = 0) in vec3 position;\n\
        uniform mat4 u_model;\n\
        uniform float u_time;\n\
        void main() {\n\
            gl_Position = u_model * vec4(position, 1.0);\n\
        }\n";

    const FRAGMENT: &str = "#version 330 core\n\
        out vec4 color;\n\
        void main() {\n\
            color = vec4(1.0);\n\
        }\n";

    fn context() -> (HeadlessDevice, GlContext) {
        let device = HeadlessDevice::new();
        (device.clone(), GlContext::new(device))
    }

    #[test]
    fn test_link_and_set_uniforms() {
        let (device, ctx) = context();
        let program = ShaderProgram::from_sources(
            &ctx,
            "basic",
            &[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, FRAGMENT)],
        )
        .unwrap();
        assert!(program.is_ready());

        program.bind(&ctx);
        device.clear_calls();
        program.set_uniform(&ctx, "u_time", 1.5f32);
        program.set_uniform(&ctx, "u_undeclared", Vec3::ONE);

        assert_eq!(
            device.calls(),
            vec![GlCall::Uniform {
                name: "u_time".to_string(),
                value: UniformData::Float(1.5)
            }]
        );
        assert_eq!(device.current_program(), program.gl_name());
        program.release(&ctx);
        assert_eq!(device.live_object_count(), 0);
    }

    #[test]
    fn test_unready_stage_fails_before_program_creation() {
        let (device, ctx) = context();
        let vertex = Shader::from_source(&ctx, "broken.vert", ShaderStage::Vertex, "void main() {");
        let fragment = Shader::from_source(&ctx, "ok.frag", ShaderStage::Fragment, FRAGMENT);
        assert_eq!(vertex.status(), ShaderStatus::Compiling);

        let result = ShaderProgram::new(&ctx, "broken", &[&vertex, &fragment]);
        assert!(matches!(result, Err(ShaderError::StageNotReady { .. })));
        assert_eq!(device.live_object_count(), 2);

        vertex.release(&ctx);
        fragment.release(&ctx);
    }

    #[test]
    fn test_invalid_stage_combination() {
        let (_device, ctx) = context();
        let fragment = Shader::from_source(&ctx, "a.frag", ShaderStage::Fragment, FRAGMENT);
        let other = Shader::from_source(&ctx, "b.frag", ShaderStage::Fragment, FRAGMENT);
        assert!(matches!(
            ShaderProgram::new(&ctx, "fragments", &[&fragment, &other]),
            Err(ShaderError::InvalidStages(_))
        ));
        fragment.release(&ctx);
        other.release(&ctx);
    }

    #[test]
    fn test_handle_failure_on_shader() {
        let (device, ctx) = context();
        device.set_fail_allocations(true);
        let shader = Shader::from_source(&ctx, "a.vert", ShaderStage::Vertex, VERTEX);
        assert_eq!(shader.status(), ShaderStatus::AcquiringHandle);
        assert_eq!(shader.error(), Some(&ShaderError::HandleAcquisition("shader")));
    }
}
