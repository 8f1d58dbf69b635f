//! Off-screen render targets

use crate::gl::*;
use crate::resources::{GpuResource, MultiTexture, Texture, TextureError, TextureSettings};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameBufferError {
    #[error("Failed to acquire {0} name")]
    HandleAcquisition(&'static str),
    #[error("Frame buffer already has depth buffer")]
    DepthAlreadyAttached,
    #[error("Frame buffer supports at most {MAX_TEXTURE_UNITS} colour attachments")]
    TooManyColorAttachments,
    #[error("Failed to create colour target: {0}")]
    ColorTarget(TextureError),
    #[error("Frame buffer has been disposed")]
    Disposed,
    #[error("Frame buffer is incomplete: {0}")]
    Incomplete(String),
}

/// A framebuffer with owned colour textures and an optional depth buffer.
///
/// Colour targets get attachment points in the order they are attached, and
/// are also exposed through [`FrameBuffer::textures`] for sampling.
#[derive(Debug)]
pub struct FrameBuffer {
    handle: GlHandle,
    depth: GlHandle,
    width: u32,
    height: u32,
    attachments: Vec<Arc<Texture>>,
    textures: MultiTexture,
}

impl FrameBuffer {
    pub fn new(ctx: &GlContext, width: u32, height: u32) -> Result<Self, FrameBufferError> {
        let name = ctx.gl().create_framebuffer();
        if name == 0 {
            return Err(FrameBufferError::HandleAcquisition("framebuffer"));
        }
        log::trace!("Created framebuffer {} ({}x{})", name, width, height);

        let handle = GlHandle::new("framebuffer");
        handle.set(name);
        Ok(Self {
            handle,
            depth: GlHandle::new("renderbuffer"),
            width,
            height,
            attachments: Vec::new(),
            textures: MultiTexture::new(),
        })
    }

    /// Create a colour texture and attach it at the next attachment point
    pub fn attach_color_render_target(
        &mut self,
        ctx: &GlContext,
        format: InternalFormat,
        channels: PixelChannels,
        pixel_type: PixelType,
    ) -> Result<Arc<Texture>, FrameBufferError> {
        if self.handle.is_null() {
            return Err(FrameBufferError::Disposed);
        }
        let index = self.attachments.len();
        if index >= MAX_TEXTURE_UNITS {
            return Err(FrameBufferError::TooManyColorAttachments);
        }

        self.bind(ctx);
        let texture = Texture::render_target(
            ctx,
            &format!("framebuffer {} colour {}", self.handle.get(), index),
            self.width,
            self.height,
            format,
            channels,
            pixel_type,
            TextureSettings::render_target(),
        );
        if let Err(e) = texture.check() {
            texture.release(ctx);
            self.unbind(ctx);
            return Err(FrameBufferError::ColorTarget(e));
        }

        let gl = ctx.gl();
        gl.framebuffer_texture_2d(color_attachment(index as u32), texture.gl_name());
        let draw_buffers: Vec<u32> = (0..=index as u32).map(color_attachment).collect();
        gl.draw_buffers(&draw_buffers);

        let texture = Arc::new(texture);
        self.textures
            .set_texture_unit(Arc::clone(&texture), index)
            .map_err(FrameBufferError::ColorTarget)?;
        self.attachments.push(Arc::clone(&texture));
        self.unbind(ctx);

        log::debug!(
            "Attached colour target {} ({:?}) to framebuffer {}",
            index,
            format,
            self.handle.get()
        );
        Ok(texture)
    }

    /// Attach a depth/stencil renderbuffer. Allowed once per framebuffer.
    pub fn attach_depth_buffer_target(&mut self, ctx: &GlContext) -> Result<(), FrameBufferError> {
        if self.handle.is_null() {
            return Err(FrameBufferError::Disposed);
        }
        if !self.depth.is_null() {
            log::error!("Framebuffer {} already has depth buffer", self.handle.get());
            return Err(FrameBufferError::DepthAlreadyAttached);
        }

        let gl = ctx.gl();
        let renderbuffer = gl.create_renderbuffer();
        if renderbuffer == 0 {
            return Err(FrameBufferError::HandleAcquisition("renderbuffer"));
        }

        self.bind(ctx);
        gl.bind_renderbuffer(renderbuffer);
        gl.renderbuffer_storage(InternalFormat::Depth24Stencil8, self.width, self.height);
        gl.framebuffer_renderbuffer(glow::DEPTH_STENCIL_ATTACHMENT, renderbuffer);
        gl.bind_renderbuffer(0);
        self.unbind(ctx);

        self.depth.set(renderbuffer);
        Ok(())
    }

    /// Empty when complete, otherwise a readable completeness status
    pub fn frame_buffer_status(&self, ctx: &GlContext) -> String {
        if self.handle.is_null() {
            return FrameBufferError::Disposed.to_string();
        }
        self.bind(ctx);
        let status = ctx.gl().check_framebuffer_status();
        self.unbind(ctx);

        if status == glow::FRAMEBUFFER_COMPLETE {
            String::new()
        } else {
            framebuffer_status_name(status).to_string()
        }
    }

    pub fn validate(&self, ctx: &GlContext) -> Result<(), FrameBufferError> {
        match self.frame_buffer_status(ctx) {
            status if status.is_empty() => Ok(()),
            status => Err(FrameBufferError::Incomplete(status)),
        }
    }

    /// Render into this framebuffer, sizing the viewport to it
    pub fn bind(&self, ctx: &GlContext) {
        ctx.gl().bind_framebuffer(self.handle.get());
        ctx.push_viewport(Viewport::sized(self.width, self.height));
    }

    /// Return to the default framebuffer and the viewport in use before `bind`
    pub fn unbind(&self, ctx: &GlContext) {
        ctx.gl().bind_framebuffer(0);
        ctx.restore_viewport();
    }

    /// Delete the owned textures, then the depth buffer, then the framebuffer
    pub fn dispose(&mut self, ctx: &GlContext) {
        self.textures.unbind(ctx);
        self.release(ctx);
        self.attachments.clear();
        self.textures = MultiTexture::new();
    }

    pub fn color_attachment(&self, index: usize) -> Option<&Arc<Texture>> {
        self.attachments.get(index)
    }

    pub fn color_attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// The colour targets bound at their attachment index
    pub fn textures(&self) -> &MultiTexture {
        &self.textures
    }

    pub fn has_depth_buffer(&self) -> bool {
        !self.depth.is_null()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn gl_name(&self) -> u32 {
        self.handle.get()
    }

    pub fn depth_buffer_name(&self) -> u32 {
        self.depth.get()
    }
}

impl GpuResource for FrameBuffer {
    fn release(&self, ctx: &GlContext) {
        for texture in &self.attachments {
            texture.release(ctx);
        }
        if let Some(name) = self.depth.take() {
            log::trace!("Deleting renderbuffer {}", name);
            ctx.gl().delete_renderbuffer(name);
        }
        if let Some(name) = self.handle.take() {
            log::trace!("Deleting framebuffer {}", name);
            ctx.gl().delete_framebuffer(name);
        }
    }
}
