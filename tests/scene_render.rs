//! Scene, camera and frame orchestration tests against the headless device.

mod common;

use common::{TestContext, FRAGMENT_SHADER, VERTEX_SHADER};
use glam::{Vec3, Vec4};
use scenegl::gl::{GlCall, GlContext, HeadlessDevice, PrimitiveType, ShaderStage, UniformData};
use scenegl::input::{InputEvent, KeyCode};
use scenegl::render::{RenderError, Renderer};
use scenegl::resources::{
    GpuResource, Material, MaterialDescriptor, Mesh, Resources, ShaderProgram, Texture,
    TextureSettings,
};
use scenegl::scene::{
    Behaviour, BehaviourContext, Behaviours, Camera, MeshRenderer, Scene, Transform,
    ViewSettings, CAMERA_PLANE_MESH, DEFERRED_POST_SHADER,
};
use scenegl::{Engine, EngineConfig};
use std::sync::Arc;

fn small_view() -> ViewSettings {
    ViewSettings {
        lens_width: 32.0,
        lens_height: 32.0,
        ..Default::default()
    }
}

fn lit_program(ctx: &GlContext) -> Arc<ShaderProgram> {
    Arc::new(
        ShaderProgram::from_sources(
            ctx,
            "lit",
            &[
                (ShaderStage::Vertex, VERTEX_SHADER),
                (ShaderStage::Fragment, FRAGMENT_SHADER),
            ],
        )
        .unwrap(),
    )
}

// ============================================================================
// Camera Tests
// ============================================================================

#[test]
fn test_cameras_share_plane_resources() {
    let test = TestContext::new();
    let resources = Resources::new();

    let mut first = Camera::new(Vec3::ZERO, small_view());
    let mut second = Camera::new(Vec3::new(0.0, 0.0, 5.0), small_view());
    first.init_render_plane(&test.ctx, &resources).unwrap();
    second.init_render_plane(&test.ctx, &resources).unwrap();

    assert_eq!(resources.meshes.names(), vec![CAMERA_PLANE_MESH.to_string()]);
    assert_eq!(resources.shaders.names(), vec![DEFERRED_POST_SHADER.to_string()]);
    assert_ne!(
        first.framebuffer().map(|f| f.gl_name()),
        second.framebuffer().map(|f| f.gl_name())
    );

    first.release_render_target(&test.ctx);
    second.release_render_target(&test.ctx);
    resources.release_all(&test.ctx);
    assert_eq!(test.device.live_object_count(), 0);
}

#[test]
fn test_failed_plane_releases_framebuffer() {
    let test = TestContext::new();
    let resources = Resources::new();
    let mut camera = Camera::new(Vec3::ZERO, small_view());

    test.device.set_fail_allocations(true);
    assert!(camera.init_render_plane(&test.ctx, &resources).is_err());
    test.device.set_fail_allocations(false);

    assert!(!camera.has_render_plane());
    assert!(resources.meshes.is_empty());
    assert_eq!(test.device.live_object_count(), 0);
}

// ============================================================================
// Render Tests
// ============================================================================

#[test]
fn test_render_sets_uniforms_and_samplers() {
    let test = TestContext::new();
    let mut scene = Scene::new();
    let camera = scene.spawn("camera");
    scene.insert(camera, Camera::new(Vec3::new(0.0, 0.0, 3.0), small_view()));
    scene.set_primary_camera(camera);

    let texture = Arc::new(Texture::from_rgba8(
        &test.ctx,
        "white",
        1,
        1,
        &[255; 4],
        TextureSettings::default(),
    ));
    let mut material = Material::new(MaterialDescriptor {
        diffuse: Vec3::new(1.0, 0.5, 0.25),
        ..Default::default()
    });
    material
        .textures_mut()
        .set_texture_unit(Arc::clone(&texture), 0)
        .unwrap();

    let mesh = Arc::new(Mesh::cube(&test.ctx, "cube"));
    let program = lit_program(&test.ctx);
    let entity = scene.spawn("cube");
    scene.insert(
        entity,
        MeshRenderer::new(Arc::clone(&mesh), Arc::clone(&program)).with_material(material),
    );
    if let Some(mut transform) = scene.get_mut::<Transform>(entity) {
        transform.position = Vec3::new(1.0, 0.0, 0.0);
    }
    scene.update_transforms();

    let renderer = Renderer::new(32, 32, Vec4::ZERO);
    test.device.clear_calls();
    assert_eq!(renderer.render_scene(&test.ctx, &mut scene, 1.5), Ok(1));

    let calls = test.device.calls();
    let uniform = |wanted: &str| {
        calls.iter().find_map(|call| match call {
            GlCall::Uniform { name, value } if name == wanted => Some(value.clone()),
            _ => None,
        })
    };
    assert_eq!(uniform("u_texture0"), Some(UniformData::Int(0)));
    assert_eq!(uniform("u_time"), Some(UniformData::Float(1.5)));
    assert_eq!(uniform("u_diffuse"), Some(UniformData::Vec3([1.0, 0.5, 0.25])));
    match uniform("u_model") {
        Some(UniformData::Mat4(columns)) => assert_eq!(&columns[12..15], &[1.0, 0.0, 0.0]),
        other => panic!("unexpected u_model {:?}", other),
    }
    assert!(matches!(uniform("u_normal_matrix"), Some(UniformData::Mat3(_))));

    // Textures are bound before the draw and released after it
    let bind_texture = calls
        .iter()
        .position(|call| {
            *call
                == GlCall::BindTexture {
                    unit: 0,
                    texture: texture.gl_name(),
                }
        })
        .unwrap();
    let draw = calls
        .iter()
        .position(|call| matches!(call, GlCall::DrawArrays { .. }))
        .unwrap();
    assert!(bind_texture < draw);
    assert_eq!(test.device.bound_texture(0), 0);
    assert_eq!(test.ctx.bound_multi_texture(), None);

    mesh.release(&test.ctx);
    program.release(&test.ctx);
    texture.release(&test.ctx);
}

#[test]
fn test_missing_mesh_aborts_frame() {
    let test = TestContext::new();
    let mut scene = Scene::new();
    let camera = scene.spawn("camera");
    scene.insert(camera, Camera::default());
    scene.set_primary_camera(camera);

    let program = lit_program(&test.ctx);
    let entity = scene.spawn("empty");
    scene.insert(
        entity,
        MeshRenderer {
            shader: Some(Arc::clone(&program)),
            ..Default::default()
        },
    );

    let renderer = Renderer::new(32, 32, Vec4::ZERO);
    test.device.clear_calls();
    assert_eq!(
        renderer.render_scene(&test.ctx, &mut scene, 0.0),
        Err(RenderError::MissingMesh("empty".to_string()))
    );
    assert!(!test
        .device
        .calls()
        .iter()
        .any(|call| matches!(call, GlCall::DrawArrays { .. })));
    program.release(&test.ctx);
}

#[test]
fn test_render_plane_presents_to_default_framebuffer() {
    let test = TestContext::new();
    let resources = Resources::new();
    let mut scene = Scene::new();

    let mut camera = Camera::new(Vec3::ZERO, small_view());
    camera.init_render_plane(&test.ctx, &resources).unwrap();
    let capture = camera.framebuffer().map(|f| f.gl_name()).unwrap();
    let entity = scene.spawn("camera");
    scene.insert(entity, camera);
    scene.set_primary_camera(entity);

    let renderer = Renderer::new(64, 48, Vec4::ZERO);
    test.device.clear_calls();
    assert_eq!(renderer.render_scene(&test.ctx, &mut scene, 0.0), Ok(0));

    let calls = test.device.calls();
    assert_eq!(calls.first(), Some(&GlCall::BindFramebuffer(capture)));
    assert!(calls.contains(&GlCall::Viewport {
        width: 64,
        height: 48
    }));
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, GlCall::DrawArrays { .. }))
            .last(),
        Some(&GlCall::DrawArrays {
            primitive: PrimitiveType::Triangles,
            first: 0,
            count: 6,
        })
    );
    assert_eq!(test.device.current_framebuffer(), 0);

    scene.release(&test.ctx);
    resources.release_all(&test.ctx);
    assert_eq!(test.device.live_object_count(), 0);
}

// ============================================================================
// Engine Tests
// ============================================================================

struct MoveOnSpace;

impl Behaviour for MoveOnSpace {
    fn update(&mut self, ctx: &mut BehaviourContext) {
        if ctx.input.is_key_pressed(KeyCode::Space) {
            if let Some(transform) = ctx.transform.as_deref_mut() {
                transform.translate(Vec3::Y);
            }
        }
    }
}

#[test]
fn test_engine_frame_and_shutdown() {
    let device = HeadlessDevice::new();
    let config = EngineConfig {
        width: 32,
        height: 32,
        camera: small_view(),
        ..Default::default()
    };
    let mut engine = Engine::new(GlContext::new(device.clone()), config);
    let camera = engine.spawn_camera("camera", Vec3::new(0.0, 0.0, 4.0), true).unwrap();
    assert_eq!(engine.scene().primary_camera(), Some(camera));

    let mesh = engine
        .resources()
        .meshes
        .add("cube", Mesh::cube(engine.context(), "cube"))
        .unwrap();
    let program = engine
        .resources()
        .shaders
        .add("lit", {
            ShaderProgram::from_sources(
                engine.context(),
                "lit",
                &[
                    (ShaderStage::Vertex, VERTEX_SHADER),
                    (ShaderStage::Fragment, FRAGMENT_SHADER),
                ],
            )
            .unwrap()
        })
        .unwrap();

    let scene = engine.scene_mut();
    let cube = scene.spawn("cube");
    scene.insert(cube, MeshRenderer::new(mesh, program));
    scene.insert(cube, Behaviours::new().with(MoveOnSpace));

    let press = [InputEvent::Key {
        key: KeyCode::Space,
        pressed: true,
    }];
    let mut swaps = 0;
    engine.frame(&press, || swaps += 1).unwrap();
    engine.frame(&[], || swaps += 1).unwrap();
    assert_eq!(swaps, 2);

    let transform = engine.scene().get::<Transform>(cube).unwrap();
    assert_eq!(transform.position, Vec3::Y);
    assert_eq!(transform.model_matrix().w_axis.truncate(), Vec3::Y);

    engine.shutdown();
    assert_eq!(device.live_object_count(), 0);
    engine.shutdown();
}
