//! Resource management
//!
//! GPU resources (vertex buffers, textures, framebuffers, shaders, meshes)
//! and the managers that own them. Every type holding GL object names
//! implements [`GpuResource`] so owners can tear it down leaf-first.

mod attribute;
mod directories;
mod framebuffer;
mod manager;
mod material;
mod mesh;
mod multi_texture;
mod shader;
mod texture;
mod vertex_buffer;

pub use attribute::*;
pub use directories::*;
pub use framebuffer::*;
pub use manager::*;
pub use material::*;
pub use mesh::*;
pub use multi_texture::*;
pub use shader::*;
pub use texture::*;
pub use vertex_buffer::*;

use crate::gl::GlContext;

/// A resource owning GL object names.
///
/// `release` deletes them and leaves null names behind, so calling it more
/// than once is harmless.
pub trait GpuResource {
    fn release(&self, ctx: &GlContext);
}
