//! GPU resource lifecycle tests against the headless device.
//!
//! # Test Categories
//!
//! - **Attribute Tests**: storage alignment and population
//! - **Vertex Buffer Tests**: upload layout and primitive validation
//! - **Texture Tests**: file import and texture table binding
//! - **Framebuffer Tests**: colour/depth attachments and disposal
//! - **Shader Tests**: compile/link failures and file loading

mod common;

use common::{TestContext, BROKEN_VERTEX_SHADER, FRAGMENT_SHADER, VERTEX_SHADER};
use rstest::rstest;
use scenegl::gl::{
    AttribPointer, InternalFormat, PixelChannels, PixelType, PrimitiveType, ScalarType,
    ShaderStage,
};
use scenegl::resources::{
    Attribute, AttributeStorage, BufferError, BufferStatus, FrameBuffer, FrameBufferError,
    GpuResource, MultiTexture, ProgramStatus, Shader, ShaderError, ShaderProgram, ShaderStatus,
    Texture, TextureError, TextureSettings, TextureStatus, VertexBuffer,
};
use std::sync::Arc;

// ============================================================================
// Attribute Tests
// ============================================================================

#[rstest]
#[case::matching_counts(&[0.0; 9], &[0.0; 6], true)]
#[case::unequal_counts(&[0.0; 9], &[0.0; 4], false)]
#[case::partial_datapoint(&[0.0; 8], &[0.0; 6], false)]
fn test_storage_alignment(#[case] positions: &[f32], #[case] uvs: &[f32], #[case] aligned: bool) {
    let storage = AttributeStorage::new();
    assert!(storage.add_attribute(Attribute::from_f32("position", 3, positions)));
    assert!(storage.add_attribute(Attribute::from_f32("uv", 2, uvs)));
    assert_eq!(storage.validate_data_alignment(), aligned);
    assert_eq!(storage.total_byte_count(), (positions.len() + uvs.len()) * 4);
}

#[test]
fn test_storage_rejects_duplicate_names() {
    let storage = AttributeStorage::new();
    assert!(storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 3])));
    assert!(!storage.add_attribute(Attribute::from_f32("position", 2, &[0.0; 2])));
    assert_eq!(storage.attribute("position").map(|a| a.components()), Some(3));
    assert!(storage.attribute("normal").is_none());
}

// ============================================================================
// Vertex Buffer Tests
// ============================================================================

fn buffered(test: &TestContext, vertices: usize, primitive: PrimitiveType) -> VertexBuffer {
    let storage = AttributeStorage::new();
    storage.add_attribute(Attribute::from_f32("position", 3, &vec![0.5; vertices * 3]));
    let mut buffer = VertexBuffer::new();
    buffer.initialise_buffers(&test.ctx).unwrap();
    let _ = buffer.buffer_data(&test.ctx, &storage, primitive);
    buffer
}

#[test]
fn test_single_triangle() {
    let test = TestContext::new();
    let buffer = buffered(&test, 3, PrimitiveType::Triangles);
    assert_eq!(buffer.vertex_count(), 3);
    assert_eq!(buffer.error(), None);
    assert_eq!(buffer.status(), BufferStatus::Ready);
    buffer.release(&test.ctx);
}

#[test]
fn test_interleaved_layout() {
    let test = TestContext::new();
    let storage = AttributeStorage::new();
    storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 9]));
    storage.add_attribute(Attribute::from_i32("bone", 1, &[0, 1, 2]));
    storage.add_attribute(Attribute::from_f32("uv", 2, &[0.0; 6]));

    let mut buffer = VertexBuffer::new();
    buffer.initialise_buffers(&test.ctx).unwrap();
    buffer
        .buffer_data(&test.ctx, &storage, PrimitiveType::Triangles)
        .unwrap();

    assert_eq!(test.device.buffer_size(buffer.buffer_name()), Some(36 + 12 + 24));
    let pointers = test.device.attrib_pointers(buffer.vertex_array_name());
    assert_eq!(
        pointers,
        vec![
            AttribPointer {
                index: 0,
                components: 3,
                scalar: ScalarType::Float,
                stride: 12,
                offset: 0,
            },
            AttribPointer {
                index: 1,
                components: 1,
                scalar: ScalarType::Int,
                stride: 4,
                offset: 36,
            },
            AttribPointer {
                index: 2,
                components: 2,
                scalar: ScalarType::Float,
                stride: 8,
                offset: 48,
            },
        ]
    );
    assert!(storage.is_sealed());
    buffer.release(&test.ctx);
}

#[rstest]
#[case::points(PrimitiveType::Points, 1)]
#[case::lines(PrimitiveType::Lines, 2)]
#[case::triangles(PrimitiveType::Triangles, 3)]
fn test_primitive_mismatch(#[case] primitive: PrimitiveType, #[case] per_primitive: u32) {
    let test = TestContext::new();
    let mut buffer = buffered(&test, 5, PrimitiveType::Points);
    assert_eq!(buffer.vertex_count(), 5);

    let result = buffer.set_primitive_type(primitive);
    if 5 % per_primitive == 0 {
        assert_eq!(result, Ok(()));
        assert_eq!(buffer.error(), None);
    } else {
        assert_eq!(
            result,
            Err(BufferError::PrimitiveMismatch {
                vertex_count: 5,
                primitive,
            })
        );
        assert!(buffer.error().is_some());
    }
    assert_eq!(buffer.primitive_vertex_count(), per_primitive);

    // Idempotent
    assert_eq!(buffer.set_primitive_type(primitive), result);
    buffer.release(&test.ctx);
}

#[test]
fn test_destroy_is_idempotent() {
    let test = TestContext::new();
    let mut buffer = buffered(&test, 3, PrimitiveType::Triangles);
    buffer.destroy_buffers(&test.ctx);
    buffer.destroy_buffers(&test.ctx);
    assert_eq!(buffer.status(), BufferStatus::Destroyed);
    assert_eq!(test.device.live_object_count(), 0);
}

// ============================================================================
// Texture Tests
// ============================================================================

#[test]
fn test_texture_import_from_file() {
    let test = TestContext::new();
    test.write_png("red.png", 4, 2, [255, 0, 0, 255]);

    let texture = Texture::import(
        &test.ctx,
        &test.directories,
        "textures",
        "red.png",
        TextureSettings::default(),
    );
    assert_eq!(texture.status(), TextureStatus::Ready);
    assert_eq!(texture.size(), (4, 2));
    assert_eq!(test.device.texture_size(texture.gl_name()), Some((4, 2)));
    assert!(test.device.texture_mipmapped(texture.gl_name()));
    texture.release(&test.ctx);
}

#[test]
fn test_texture_import_failures_keep_step() {
    let test = TestContext::new();
    test.write("textures", "garbage.png", b"not a png");

    let unregistered = Texture::import(
        &test.ctx,
        &test.directories,
        "nowhere",
        "red.png",
        TextureSettings::default(),
    );
    assert_eq!(unregistered.status(), TextureStatus::ImportingImage);
    assert!(matches!(unregistered.error(), Some(TextureError::Directory(_))));

    let garbage = Texture::import(
        &test.ctx,
        &test.directories,
        "textures",
        "garbage.png",
        TextureSettings::default(),
    );
    assert_eq!(garbage.status(), TextureStatus::ImportingImage);
    assert!(matches!(garbage.error(), Some(TextureError::Decode { .. })));

    unregistered.release(&test.ctx);
    garbage.release(&test.ctx);
}

#[test]
fn test_second_multi_texture_bind() {
    let test = TestContext::new();
    let red = Arc::new(Texture::from_rgba8(
        &test.ctx,
        "red",
        1,
        1,
        &[255, 0, 0, 255],
        TextureSettings::default(),
    ));
    let blue = Arc::new(Texture::from_rgba8(
        &test.ctx,
        "blue",
        1,
        1,
        &[0, 0, 255, 255],
        TextureSettings::default(),
    ));

    let mut first = MultiTexture::new();
    first.set_texture_unit(Arc::clone(&red), 0).unwrap();
    first.set_texture_unit(Arc::clone(&blue), 3).unwrap();
    let mut second = MultiTexture::new();
    second.set_texture_unit(Arc::clone(&blue), 1).unwrap();

    first.bind(&test.ctx);
    assert!(first.is_bound(&test.ctx));
    assert_eq!(test.device.bound_texture(3), blue.gl_name());

    second.bind(&test.ctx);
    assert!(second.is_bound(&test.ctx));
    assert!(!first.is_bound(&test.ctx));
    assert_eq!(test.device.bound_texture(0), 0);
    assert_eq!(test.device.bound_texture(3), 0);
    assert_eq!(test.device.bound_texture(1), blue.gl_name());
    assert_eq!(test.device.active_unit(), 0);

    // Unbinding a table that is not bound changes nothing
    first.unbind(&test.ctx);
    assert!(second.is_bound(&test.ctx));

    second.unbind(&test.ctx);
    assert_eq!(test.ctx.bound_multi_texture(), None);
    assert!(matches!(
        second.set_texture_unit(red.clone(), 8),
        Err(TextureError::UnitOutOfRange(8))
    ));

    red.release(&test.ctx);
    blue.release(&test.ctx);
}

// ============================================================================
// Framebuffer Tests
// ============================================================================

#[test]
fn test_multiple_render_targets() {
    let test = TestContext::new();
    let mut framebuffer = FrameBuffer::new(&test.ctx, 32, 16).unwrap();
    assert_ne!(framebuffer.frame_buffer_status(&test.ctx), "");

    for format in [InternalFormat::Rgba8, InternalFormat::Rgba16F, InternalFormat::Rgba16F] {
        framebuffer
            .attach_color_render_target(&test.ctx, format, PixelChannels::Rgba, PixelType::Float)
            .unwrap();
    }
    framebuffer.attach_depth_buffer_target(&test.ctx).unwrap();

    assert_eq!(framebuffer.frame_buffer_status(&test.ctx), "");
    assert_eq!(
        test.device.draw_buffers(framebuffer.gl_name()),
        vec![
            glow::COLOR_ATTACHMENT0,
            glow::COLOR_ATTACHMENT1,
            glow::COLOR_ATTACHMENT2
        ]
    );
    let albedo = framebuffer.color_attachment(0).unwrap();
    assert_eq!(albedo.size(), (32, 16));
    assert_eq!(
        framebuffer.textures().texture(0).map(|t| t.gl_name()),
        Some(albedo.gl_name())
    );
    assert_eq!(
        test.device
            .texture_parameter(albedo.gl_name(), glow::TEXTURE_MIN_FILTER),
        Some(glow::NEAREST as i32)
    );

    framebuffer.dispose(&test.ctx);
    assert_eq!(test.device.live_object_count(), 0);
}

#[test]
fn test_second_depth_attachment_fails() {
    let test = TestContext::new();
    let mut framebuffer = FrameBuffer::new(&test.ctx, 8, 8).unwrap();
    framebuffer
        .attach_color_render_target(
            &test.ctx,
            InternalFormat::Rgba8,
            PixelChannels::Rgba,
            PixelType::UnsignedByte,
        )
        .unwrap();
    framebuffer.attach_depth_buffer_target(&test.ctx).unwrap();
    let depth = framebuffer.depth_buffer_name();

    let second = framebuffer.attach_depth_buffer_target(&test.ctx);
    assert_eq!(second, Err(FrameBufferError::DepthAlreadyAttached));
    assert_eq!(
        second.unwrap_err().to_string(),
        "Frame buffer already has depth buffer"
    );
    assert_eq!(framebuffer.depth_buffer_name(), depth);
    assert_eq!(test.device.depth_attachment(framebuffer.gl_name()), Some(depth));
    assert_eq!(framebuffer.frame_buffer_status(&test.ctx), "");

    framebuffer.dispose(&test.ctx);
    framebuffer.dispose(&test.ctx);
    assert_eq!(framebuffer.gl_name(), 0);
    assert_eq!(test.device.live_object_count(), 0);
}

// ============================================================================
// Shader Tests
// ============================================================================

#[test]
fn test_broken_vertex_shader_fails_program() {
    let test = TestContext::new();
    let vertex = Shader::from_source(&test.ctx, "broken.vert", ShaderStage::Vertex, BROKEN_VERTEX_SHADER);
    let fragment = Shader::from_source(&test.ctx, "flat.frag", ShaderStage::Fragment, FRAGMENT_SHADER);

    assert!(vertex.status() < ShaderStatus::Ready);
    assert!(!vertex.error().map(|e| e.to_string()).unwrap_or_default().is_empty());
    assert_eq!(fragment.status(), ShaderStatus::Ready);

    let program = ShaderProgram::new(&test.ctx, "broken", &[&vertex, &fragment]);
    assert!(matches!(
        program,
        Err(ShaderError::StageNotReady {
            stage: ShaderStage::Vertex,
            ..
        })
    ));

    vertex.release(&test.ctx);
    fragment.release(&test.ctx);
    assert_eq!(test.device.live_object_count(), 0);
}

#[rstest]
#[case::vertex_only(&[ShaderStage::Vertex])]
#[case::fragment_twice(&[ShaderStage::Fragment, ShaderStage::Fragment])]
fn test_invalid_stage_sets(#[case] stages: &[ShaderStage]) {
    let test = TestContext::new();
    let sources: Vec<(ShaderStage, &str)> = stages
        .iter()
        .map(|&stage| match stage {
            ShaderStage::Vertex => (stage, VERTEX_SHADER),
            _ => (stage, FRAGMENT_SHADER),
        })
        .collect();
    let program = ShaderProgram::from_sources(&test.ctx, "partial", &sources);
    assert!(matches!(program, Err(ShaderError::InvalidStages(_))));
    assert_eq!(test.device.live_object_count(), 0);
}

#[test]
fn test_program_from_files() {
    let test = TestContext::new();
    test.write("shaders", "lit.vert", VERTEX_SHADER);
    test.write("shaders", "lit.frag", FRAGMENT_SHADER);

    let program = ShaderProgram::load(
        &test.ctx,
        &test.directories,
        "lit",
        "shaders",
        &[
            (ShaderStage::Vertex, "lit.vert"),
            (ShaderStage::Fragment, "lit.frag"),
        ],
    )
    .unwrap();
    assert_eq!(program.status(), ProgramStatus::Ready);
    assert!(program.has_uniform(&test.ctx, "u_normal_matrix"));
    assert!(!program.has_uniform(&test.ctx, "u_missing"));

    // Unknown uniforms are ignored
    program.bind(&test.ctx);
    program.set_uniform(&test.ctx, "u_missing", 1.0f32);
    program.unbind(&test.ctx);

    program.release(&test.ctx);
    assert_eq!(test.device.live_object_count(), 0);
}

#[test]
fn test_shader_missing_file() {
    let test = TestContext::new();
    let shader = Shader::load(
        &test.ctx,
        &test.directories,
        ShaderStage::Fragment,
        "shaders",
        "absent.frag",
    );
    assert_eq!(shader.status(), ShaderStatus::ReadingSource);
    assert!(matches!(shader.error(), Some(ShaderError::Read { .. })));
    shader.release(&test.ctx);
}
