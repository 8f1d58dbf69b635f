//! Common types shared between GL devices

/// Base scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Float,
    Int,
    Double,
}

impl ScalarType {
    /// Size of one component in bytes
    pub fn size(&self) -> usize {
        match self {
            ScalarType::Float | ScalarType::Int => 4,
            ScalarType::Double => 8,
        }
    }

    pub fn to_gl(&self) -> u32 {
        match self {
            ScalarType::Float => glow::FLOAT,
            ScalarType::Int => glow::INT,
            ScalarType::Double => glow::DOUBLE,
        }
    }
}

/// Topology vertices are assembled into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    #[default]
    Triangles,
}

impl PrimitiveType {
    /// Number of vertices that make up one primitive
    pub fn vertices_per_primitive(&self) -> u32 {
        match self {
            PrimitiveType::Points => 1,
            PrimitiveType::Lines => 2,
            PrimitiveType::Triangles => 3,
        }
    }

    pub fn to_gl(&self) -> u32 {
        match self {
            PrimitiveType::Points => glow::POINTS,
            PrimitiveType::Lines => glow::LINES,
            PrimitiveType::Triangles => glow::TRIANGLES,
        }
    }
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub fn to_gl(&self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapLinear,
}

impl TextureFilter {
    pub fn to_gl(&self) -> i32 {
        (match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }) as i32
    }

    pub fn uses_mipmaps(&self) -> bool {
        matches!(
            self,
            TextureFilter::NearestMipmapNearest | TextureFilter::LinearMipmapLinear
        )
    }
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl TextureWrap {
    pub fn to_gl(&self) -> i32 {
        (match self {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::ClampToBorder => glow::CLAMP_TO_BORDER,
        }) as i32
    }
}

/// Sized internal storage format of a texture or renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    R16F,
    Rgb16F,
    Rgba16F,
    R32F,
    Rgba32F,
    DepthComponent24,
    Depth24Stencil8,
}

impl InternalFormat {
    pub fn to_gl(&self) -> u32 {
        match self {
            InternalFormat::R8 => glow::R8,
            InternalFormat::Rg8 => glow::RG8,
            InternalFormat::Rgb8 => glow::RGB8,
            InternalFormat::Rgba8 => glow::RGBA8,
            InternalFormat::R16F => glow::R16F,
            InternalFormat::Rgb16F => glow::RGB16F,
            InternalFormat::Rgba16F => glow::RGBA16F,
            InternalFormat::R32F => glow::R32F,
            InternalFormat::Rgba32F => glow::RGBA32F,
            InternalFormat::DepthComponent24 => glow::DEPTH_COMPONENT24,
            InternalFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        }
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            InternalFormat::DepthComponent24 | InternalFormat::Depth24Stencil8
        )
    }
}

/// Channel layout of client-side pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelChannels {
    Red,
    Rg,
    Rgb,
    Rgba,
}

impl PixelChannels {
    pub fn to_gl(&self) -> u32 {
        match self {
            PixelChannels::Red => glow::RED,
            PixelChannels::Rg => glow::RG,
            PixelChannels::Rgb => glow::RGB,
            PixelChannels::Rgba => glow::RGBA,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            PixelChannels::Red => 1,
            PixelChannels::Rg => 2,
            PixelChannels::Rgb => 3,
            PixelChannels::Rgba => 4,
        }
    }
}

/// Component type of client-side pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    UnsignedByte,
    HalfFloat,
    Float,
}

impl PixelType {
    pub fn to_gl(&self) -> u32 {
        match self {
            PixelType::UnsignedByte => glow::UNSIGNED_BYTE,
            PixelType::HalfFloat => glow::HALF_FLOAT,
            PixelType::Float => glow::FLOAT,
        }
    }
}

/// Resolved location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Number of texture units a `MultiTexture` addresses
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Attachment point of the N-th colour target
pub fn color_attachment(index: u32) -> u32 {
    glow::COLOR_ATTACHMENT0 + index
}

/// Human readable name for a `check_framebuffer_status` result
pub fn framebuffer_status_name(status: u32) -> &'static str {
    match status {
        glow::FRAMEBUFFER_COMPLETE => "complete",
        glow::FRAMEBUFFER_UNDEFINED => "framebuffer undefined",
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "missing attachment",
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "incomplete draw buffer",
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "incomplete read buffer",
        glow::FRAMEBUFFER_UNSUPPORTED => "unsupported attachment combination",
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "incomplete multisample",
        glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "incomplete layer targets",
        _ => "unknown framebuffer status",
    }
}
