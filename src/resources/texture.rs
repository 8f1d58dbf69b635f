//! Texture loading and management

use crate::gl::*;
use crate::resources::{DirectoryError, GpuResource, ResourceDirectories};
use image::DynamicImage;
use thiserror::Error;

/// Texture errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextureError {
    #[error("Failed to acquire texture name")]
    HandleAcquisition,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("Failed to decode image '{path}': {message}")]
    Decode { path: String, message: String },
    #[error("Texture size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },
    #[error("Pixel data holds {actual} bytes, expected {expected}")]
    PixelCount { expected: usize, actual: usize },
    #[error("Texture unit {0} is out of range (max {MAX_TEXTURE_UNITS})")]
    UnitOutOfRange(usize),
}

/// Progress of a texture through its construction pipeline.
///
/// A failed texture stays at the step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TextureStatus {
    Uninitialized,
    AcquiringHandle,
    ImportingImage,
    LoadingImage,
    Ready,
}

/// Sampling parameters applied when the image is uploaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSettings {
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
        }
    }
}

impl TextureSettings {
    /// Nearest filtering with border clamp, used for render targets
    pub fn render_target() -> Self {
        Self {
            wrap_s: TextureWrap::ClampToBorder,
            wrap_t: TextureWrap::ClampToBorder,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
        }
    }
}

/// A 2D GPU texture
#[derive(Debug)]
pub struct Texture {
    name: String,
    handle: GlHandle,
    width: u32,
    height: u32,
    format: InternalFormat,
    settings: TextureSettings,
    status: TextureStatus,
    error: Option<TextureError>,
}

impl Texture {
    fn empty(name: &str, settings: TextureSettings) -> Self {
        Self {
            name: name.to_string(),
            handle: GlHandle::new("texture"),
            width: 0,
            height: 0,
            format: InternalFormat::Rgba8,
            settings,
            status: TextureStatus::Uninitialized,
            error: None,
        }
    }

    /// Import an image file from a logical resource directory.
    ///
    /// Never fails outright: check [`Texture::status`] or [`Texture::check`].
    pub fn import(
        ctx: &GlContext,
        directories: &ResourceDirectories,
        folder_id: &str,
        filename: &str,
        settings: TextureSettings,
    ) -> Self {
        let mut texture = Self::empty(filename, settings);
        if texture.acquire(ctx).is_err() {
            return texture;
        }

        texture.status = TextureStatus::ImportingImage;
        let path = match directories.resolve(folder_id, filename) {
            Ok(path) => path,
            Err(e) => {
                texture.fail(e.into());
                return texture;
            }
        };
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(e) => {
                texture.fail(TextureError::Decode {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
                return texture;
            }
        };

        texture.load_image(ctx, &image);
        texture
    }

    /// Upload an already decoded image
    pub fn from_image(
        ctx: &GlContext,
        name: &str,
        image: &DynamicImage,
        settings: TextureSettings,
    ) -> Self {
        let mut texture = Self::empty(name, settings);
        if texture.acquire(ctx).is_ok() {
            texture.status = TextureStatus::ImportingImage;
            texture.load_image(ctx, image);
        }
        texture
    }

    /// Upload tightly packed RGBA8 pixels, bottom row first
    pub fn from_rgba8(
        ctx: &GlContext,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        settings: TextureSettings,
    ) -> Self {
        let mut texture = Self::empty(name, settings);
        if texture.acquire(ctx).is_err() {
            return texture;
        }
        texture.status = TextureStatus::ImportingImage;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            texture.fail(TextureError::PixelCount {
                expected,
                actual: pixels.len(),
            });
            return texture;
        }
        texture.upload(
            ctx,
            InternalFormat::Rgba8,
            width,
            height,
            PixelChannels::Rgba,
            PixelType::UnsignedByte,
            Some(pixels),
        );
        texture
    }

    /// Allocate an empty image to render into
    #[allow(clippy::too_many_arguments)]
    pub fn render_target(
        ctx: &GlContext,
        name: &str,
        width: u32,
        height: u32,
        format: InternalFormat,
        channels: PixelChannels,
        pixel_type: PixelType,
        settings: TextureSettings,
    ) -> Self {
        let mut texture = Self::empty(name, settings);
        if texture.acquire(ctx).is_err() {
            return texture;
        }
        texture.upload(ctx, format, width, height, channels, pixel_type, None);
        texture
    }

    fn acquire(&mut self, ctx: &GlContext) -> Result<(), TextureError> {
        self.status = TextureStatus::AcquiringHandle;
        let name = ctx.gl().create_texture();
        if name == 0 {
            return Err(self.fail(TextureError::HandleAcquisition));
        }
        log::trace!("Created texture {} for '{}'", name, self.name);
        self.handle.set(name);
        Ok(())
    }

    fn load_image(&mut self, ctx: &GlContext, image: &DynamicImage) {
        // GL samples the bottom row first
        let rgba = image.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        self.upload(
            ctx,
            InternalFormat::Rgba8,
            width,
            height,
            PixelChannels::Rgba,
            PixelType::UnsignedByte,
            Some(rgba.as_raw()),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn upload(
        &mut self,
        ctx: &GlContext,
        format: InternalFormat,
        width: u32,
        height: u32,
        channels: PixelChannels,
        pixel_type: PixelType,
        pixels: Option<&[u8]>,
    ) {
        self.status = TextureStatus::LoadingImage;
        if width == 0 || height == 0 {
            self.fail(TextureError::InvalidSize { width, height });
            return;
        }

        let gl = ctx.gl();
        gl.bind_texture_2d(self.handle.get());
        gl.tex_image_2d(format, width, height, channels, pixel_type, pixels);
        gl.tex_parameter(glow::TEXTURE_WRAP_S, self.settings.wrap_s.to_gl());
        gl.tex_parameter(glow::TEXTURE_WRAP_T, self.settings.wrap_t.to_gl());
        gl.tex_parameter(glow::TEXTURE_MIN_FILTER, self.settings.min_filter.to_gl());
        gl.tex_parameter(glow::TEXTURE_MAG_FILTER, self.settings.mag_filter.to_gl());
        if self.settings.min_filter.uses_mipmaps() {
            gl.generate_mipmap_2d();
        }
        gl.bind_texture_2d(0);

        self.width = width;
        self.height = height;
        self.format = format;
        self.status = TextureStatus::Ready;
        log::debug!("Texture '{}' ready ({}x{})", self.name, width, height);
    }

    fn fail(&mut self, error: TextureError) -> TextureError {
        log::warn!("Texture '{}' failed at {:?}: {}", self.name, self.status, error);
        self.error = Some(error.clone());
        error
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// GL texture name, 0 once released
    pub fn gl_name(&self) -> u32 {
        self.handle.get()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> InternalFormat {
        self.format
    }

    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    pub fn status(&self) -> TextureStatus {
        self.status
    }

    pub fn error(&self) -> Option<&TextureError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == TextureStatus::Ready
    }

    /// The recorded error, if construction failed
    pub fn check(&self) -> Result<(), TextureError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl GpuResource for Texture {
    fn release(&self, ctx: &GlContext) {
        if let Some(name) = self.handle.take() {
            log::trace!("Deleting texture {} ('{}')", name, self.name);
            ctx.gl().delete_texture(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_upload() {
        let device = HeadlessDevice::new();
        let ctx = GlContext::new(device.clone());
        let texture = Texture::from_rgba8(&ctx, "white", 2, 2, &[255; 16], TextureSettings::default());

        let name = texture.gl_name();
        assert!(texture.is_ready());
        assert_eq!(device.texture_size(name), Some((2, 2)));
        assert!(device.texture_mipmapped(name));
        texture.release(&ctx);
        assert!(!device.texture_exists(name));
        assert_eq!(texture.gl_name(), 0);
    }

    #[test]
    fn test_wrong_pixel_count() {
        let ctx = GlContext::new(HeadlessDevice::new());
        let texture = Texture::from_rgba8(&ctx, "bad", 2, 2, &[0; 3], TextureSettings::default());
        assert_eq!(texture.status(), TextureStatus::ImportingImage);
        assert!(matches!(texture.error(), Some(TextureError::PixelCount { .. })));
        texture.release(&ctx);
    }

    #[test]
    fn test_unregistered_directory_stops_import() {
        let ctx = GlContext::new(HeadlessDevice::new());
        let texture = Texture::import(
            &ctx,
            &ResourceDirectories::new(),
            "textures",
            "stone.png",
            TextureSettings::default(),
        );
        assert_eq!(texture.status(), TextureStatus::ImportingImage);
        assert_eq!(
            texture.check(),
            Err(TextureError::Directory(DirectoryError::Unregistered(
                "textures".to_string()
            )))
        );
        texture.release(&ctx);
    }

    #[test]
    fn test_handle_failure() {
        let device = HeadlessDevice::new();
        device.set_fail_allocations(true);
        let ctx = GlContext::new(device);
        let texture = Texture::render_target(
            &ctx,
            "target",
            4,
            4,
            InternalFormat::Rgba8,
            PixelChannels::Rgba,
            PixelType::UnsignedByte,
            TextureSettings::render_target(),
        );
        assert_eq!(texture.status(), TextureStatus::AcquiringHandle);
        assert_eq!(texture.error(), Some(&TextureError::HandleAcquisition));
    }
}
