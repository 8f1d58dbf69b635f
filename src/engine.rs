//! Main engine implementation

use crate::audio::{AudioBackend, SoundSource};
use crate::gl::GlContext;
use crate::input::{InputEvent, InputState};
use crate::logging::init_logging;
use crate::render::{RenderError, Renderer};
use crate::resources::{ResourceDirectories, Resources};
use crate::scene::{Camera, Scene};
use crate::EngineConfig;
use bevy_ecs::prelude::*;
use glam::{Vec3, Vec4};
use std::sync::Arc;
use std::time::Instant;

/// Wall-clock frame timing
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame: 0,
        }
    }

    /// Start a new frame, returning seconds since the previous one
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frame += 1;
        delta
    }

    /// Seconds since the clock was created
    pub fn time(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Owns the GL context and everything drawn through it
pub struct Engine {
    ctx: GlContext,
    config: EngineConfig,
    directories: ResourceDirectories,
    resources: Resources,
    scene: Scene,
    renderer: Renderer,
    input: InputState,
    clock: FrameClock,
    shut_down: bool,
}

impl Engine {
    pub fn new(ctx: GlContext, config: EngineConfig) -> Self {
        init_logging(&config.logging);
        let color = config.clear_color;
        let renderer = Renderer::new(
            config.width,
            config.height,
            Vec4::new(color[0], color[1], color[2], color[3]),
        );
        log::info!(
            "Engine '{}' created on {} ({}x{})",
            config.title,
            ctx.gl().name(),
            config.width,
            config.height
        );

        Self {
            directories: config.directories.clone(),
            ctx,
            config,
            resources: Resources::new(),
            scene: Scene::new(),
            renderer,
            input: InputState::new(),
            clock: FrameClock::new(),
            shut_down: false,
        }
    }

    /// Spawn a camera with the configured view settings.
    ///
    /// The first camera spawned becomes the primary camera. With
    /// `render_plane` the camera renders through its own framebuffer.
    pub fn spawn_camera(
        &mut self,
        name: &str,
        position: Vec3,
        render_plane: bool,
    ) -> Result<Entity, RenderError> {
        let mut camera = Camera::new(position, self.config.camera);
        if render_plane {
            camera.init_render_plane(&self.ctx, &self.resources)?;
        }
        let entity = self.scene.spawn(name);
        self.scene.insert(entity, camera);
        if self.scene.primary_camera().is_none() {
            self.scene.set_primary_camera(entity);
        }
        Ok(entity)
    }

    /// A sound source sweeping at the configured interval
    pub fn sound_source(&self, backend: Arc<dyn AudioBackend>) -> SoundSource {
        SoundSource::new(backend, self.config.sweep_interval())
    }

    /// Run one frame: apply input, clear, update behaviours and transforms,
    /// render, then `swap`. Returns the frame delta in seconds.
    ///
    /// A fatal render error aborts the frame before `swap`.
    pub fn frame(
        &mut self,
        events: &[InputEvent],
        swap: impl FnOnce(),
    ) -> Result<f32, RenderError> {
        self.ctx.assert_render_thread();
        let delta = self.clock.tick();
        let time = self.clock.time();

        for event in events {
            self.input.handle_event(event);
        }

        self.renderer.clear(&self.ctx);
        self.scene.update_behaviours(delta, time, &self.input);
        self.scene.update_transforms();
        self.renderer.render_scene(&self.ctx, &mut self.scene, time)?;

        swap();
        self.input.end_frame();
        Ok(delta)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.renderer.resize(width, height);
    }

    /// Release camera framebuffers, then every managed resource
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.scene.release(&self.ctx);
        self.resources.release_all(&self.ctx);
        self.shut_down = true;
        log::info!("Engine shut down after {} frames", self.clock.frame_count());
    }

    pub fn context(&self) -> &GlContext {
        &self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn directories(&self) -> &ResourceDirectories {
        &self.directories
    }

    pub fn directories_mut(&mut self) -> &mut ResourceDirectories {
        &mut self.directories
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.shut_down {
            log::warn!("Engine dropped without shutdown, GPU objects leak");
        }
    }
}
