//! GPU vertex array + buffer pair

use crate::gl::{GlContext, GlHandle, PrimitiveType, ScalarType};
use crate::resources::{AttributeStorage, GpuResource};
use thiserror::Error;

/// Vertex buffer and attribute storage errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("Vertex buffer is already initialised")]
    AlreadyInitialised,
    #[error("Vertex buffer is not initialised")]
    NotInitialised,
    #[error("Vertex buffer already holds data, destroy and re-initialise to re-buffer")]
    AlreadyBuffered,
    #[error("Failed to acquire {0} name")]
    HandleAcquisition(&'static str),
    #[error("Attribute storage is misaligned")]
    Misaligned,
    #[error("{vertex_count} vertices cannot be assembled into {primitive:?}")]
    PrimitiveMismatch {
        vertex_count: u32,
        primitive: PrimitiveType,
    },
    #[error("Attribute storage is sealed")]
    StorageSealed,
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("Attribute '{name}' holds {expected:?} data, got {actual:?}")]
    ScalarMismatch {
        name: String,
        expected: ScalarType,
        actual: ScalarType,
    },
}

/// Lifecycle of a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferStatus {
    Uninitialized,
    Allocated,
    Ready,
    Destroyed,
}

/// GPU-resident snapshot of one attribute storage.
///
/// Attributes are uploaded column-wise into a single buffer object: every
/// attribute's bytes follow the previous one's, and each attribute gets its
/// own pointer slot in storage order.
#[derive(Debug)]
pub struct VertexBuffer {
    vertex_array: GlHandle,
    buffer: GlHandle,
    vertex_count: u32,
    primitive: PrimitiveType,
    next_slot: u32,
    status: BufferStatus,
    error: Option<BufferError>,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self {
            vertex_array: GlHandle::new("vertex array"),
            buffer: GlHandle::new("buffer"),
            vertex_count: 0,
            primitive: PrimitiveType::default(),
            next_slot: 0,
            status: BufferStatus::Uninitialized,
            error: None,
        }
    }

    /// Allocate the vertex array and buffer names
    pub fn initialise_buffers(&mut self, ctx: &GlContext) -> Result<(), BufferError> {
        if matches!(self.status, BufferStatus::Allocated | BufferStatus::Ready) {
            return self.fail(BufferError::AlreadyInitialised);
        }

        let gl = ctx.gl();
        let vertex_array = gl.create_vertex_array();
        let buffer = gl.create_buffer();
        if vertex_array == 0 || buffer == 0 {
            if vertex_array != 0 {
                gl.delete_vertex_array(vertex_array);
            }
            if buffer != 0 {
                gl.delete_buffer(buffer);
            }
            let kind = if vertex_array == 0 { "vertex array" } else { "buffer" };
            return self.fail(BufferError::HandleAcquisition(kind));
        }

        log::trace!("Created vertex array {} with buffer {}", vertex_array, buffer);
        self.vertex_array.set(vertex_array);
        self.buffer.set(buffer);
        self.status = BufferStatus::Allocated;
        self.error = None;
        Ok(())
    }

    /// Upload `storage` and describe one attribute pointer per attribute.
    ///
    /// The storage is sealed afterwards. A primitive/vertex count mismatch is
    /// recorded and returned but leaves the buffer ready.
    pub fn buffer_data(
        &mut self,
        ctx: &GlContext,
        storage: &AttributeStorage,
        primitive: PrimitiveType,
    ) -> Result<(), BufferError> {
        match self.status {
            BufferStatus::Allocated => {}
            BufferStatus::Ready => return self.fail(BufferError::AlreadyBuffered),
            _ => return self.fail(BufferError::NotInitialised),
        }
        let gl = ctx.gl();
        let vertex_array = self.vertex_array.get();
        let buffer = self.buffer.get();
        let next_slot = &mut self.next_slot;

        let uploaded = storage.seal_aligned(|attributes| {
            gl.bind_vertex_array(vertex_array);
            gl.bind_array_buffer(buffer);
            let mut bytes = Vec::with_capacity(attributes.iter().map(|a| a.byte_len()).sum());
            for attribute in attributes {
                bytes.extend_from_slice(attribute.data());
            }
            gl.array_buffer_data(&bytes);

            let mut offset = 0;
            for attribute in attributes {
                gl.enable_vertex_attrib_array(*next_slot);
                gl.vertex_attrib_pointer(
                    *next_slot,
                    attribute.components() as i32,
                    attribute.scalar_type(),
                    attribute.stride() as i32,
                    offset as i32,
                );
                offset += attribute.byte_len();
                *next_slot += 1;
            }

            gl.bind_vertex_array(0);
            gl.bind_array_buffer(0);
            attributes.first().map_or(0, |a| a.datapoint_count())
        });
        let Some(vertex_count) = uploaded else {
            return self.fail(BufferError::Misaligned);
        };

        log::debug!(
            "Buffered {} vertices across {} attributes",
            vertex_count,
            self.next_slot
        );
        self.vertex_count = vertex_count as u32;
        self.status = BufferStatus::Ready;
        self.set_primitive_type(primitive)
    }

    /// Change the primitive type and re-validate the vertex count against it
    pub fn set_primitive_type(&mut self, primitive: PrimitiveType) -> Result<(), BufferError> {
        self.primitive = primitive;
        if self.vertex_count % primitive.vertices_per_primitive() != 0 {
            return self.fail(BufferError::PrimitiveMismatch {
                vertex_count: self.vertex_count,
                primitive,
            });
        }
        if matches!(self.error, Some(BufferError::PrimitiveMismatch { .. })) {
            self.error = None;
        }
        Ok(())
    }

    /// Delete the GPU names. Safe to call any number of times.
    pub fn destroy_buffers(&mut self, ctx: &GlContext) {
        self.release(ctx);
        self.next_slot = 0;
        self.vertex_count = 0;
        if self.status != BufferStatus::Uninitialized {
            self.status = BufferStatus::Destroyed;
        }
    }

    pub fn bind(&self, ctx: &GlContext) {
        ctx.gl().bind_vertex_array(self.vertex_array.get());
    }

    pub fn unbind(&self, ctx: &GlContext) {
        ctx.gl().bind_vertex_array(0);
    }

    /// Draw every vertex with the current primitive type
    pub fn draw(&self, ctx: &GlContext) {
        ctx.gl()
            .draw_arrays(self.primitive, 0, self.vertex_count as i32);
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn primitive_vertex_count(&self) -> u32 {
        self.primitive.vertices_per_primitive()
    }

    /// Number of attribute slots described so far
    pub fn attribute_slots(&self) -> u32 {
        self.next_slot
    }

    pub fn status(&self) -> BufferStatus {
        self.status
    }

    pub fn error(&self) -> Option<&BufferError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == BufferStatus::Ready
    }

    pub fn vertex_array_name(&self) -> u32 {
        self.vertex_array.get()
    }

    pub fn buffer_name(&self) -> u32 {
        self.buffer.get()
    }

    fn fail(&mut self, error: BufferError) -> Result<(), BufferError> {
        log::warn!("Vertex buffer {:?}: {}", self.vertex_array, error);
        self.error = Some(error.clone());
        Err(error)
    }
}

impl GpuResource for VertexBuffer {
    fn release(&self, ctx: &GlContext) {
        if let Some(name) = self.vertex_array.take() {
            log::trace!("Deleting vertex array {}", name);
            ctx.gl().delete_vertex_array(name);
        }
        if let Some(name) = self.buffer.take() {
            log::trace!("Deleting buffer {}", name);
            ctx.gl().delete_buffer(name);
        }
    }
}
