//! Scene management on top of a Bevy ECS `World`

mod behaviour;
mod camera;
mod render_component;
mod transform;

pub use behaviour::*;
pub use camera::*;
pub use render_component::*;
pub use transform::*;

use crate::gl::GlContext;
use crate::input::InputState;
use bevy_ecs::prelude::*;

/// Human-readable entity name
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Entities, their components and the primary camera
pub struct Scene {
    world: World,
    primary_camera: Option<Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            primary_camera: None,
        }
    }

    /// Spawn an entity with a `Name` and an identity `Transform`
    pub fn spawn(&mut self, name: &str) -> Entity {
        let entity = self
            .world
            .spawn((Name(name.to_string()), Transform::default()))
            .id();
        log::trace!("Spawned entity {:?} '{}'", entity, name);
        entity
    }

    /// Add or replace a component. Returns false for a dead entity.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        if !self.world.entities().contains(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(component);
        true
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.world.get::<C>(entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<Mut<'_, C>> {
        self.world.get_mut::<C>(entity)
    }

    /// Despawn an entity, disposing its camera framebuffer if it has one
    pub fn despawn(&mut self, ctx: &GlContext, entity: Entity) -> bool {
        if let Some(mut camera) = self.world.get_mut::<Camera>(entity) {
            camera.release_render_target(ctx);
        }
        if self.primary_camera == Some(entity) {
            self.primary_camera = None;
        }
        self.world.despawn(entity)
    }

    /// First entity with the given name
    pub fn find(&mut self, name: &str) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &Name)>();
        query
            .iter(&self.world)
            .find(|(_, n)| n.as_str() == name)
            .map(|(entity, _)| entity)
    }

    /// Make `entity` the camera frames are rendered from.
    /// Returns false when it has no `Camera`.
    pub fn set_primary_camera(&mut self, entity: Entity) -> bool {
        if self.world.get::<Camera>(entity).is_none() {
            log::warn!("Entity {:?} has no camera, primary camera unchanged", entity);
            return false;
        }
        self.primary_camera = Some(entity);
        true
    }

    pub fn primary_camera(&self) -> Option<Entity> {
        self.primary_camera
    }

    pub fn cameras(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<Camera>>();
        query.iter(&self.world).collect()
    }

    /// Recompute the cached matrices of every transform and camera
    pub fn update_transforms(&mut self) {
        let mut query = self.world.query::<&mut Transform>();
        for mut transform in query.iter_mut(&mut self.world) {
            transform.update_matrices();
        }
        let mut cameras = self.world.query::<&mut Camera>();
        for mut camera in cameras.iter_mut(&mut self.world) {
            camera.update_view_matrix();
            camera.update_projection_matrix();
        }
    }

    /// Run every entity's behaviours for one frame
    pub fn update_behaviours(&mut self, delta: f32, time: f32, input: &InputState) {
        let entities: Vec<Entity> = {
            let mut query = self.world.query_filtered::<Entity, With<Behaviours>>();
            query.iter(&self.world).collect()
        };

        for entity in entities {
            // Detach the list so behaviours can borrow the transform mutably
            let Some(mut attached) = self.world.get_mut::<Behaviours>(entity) else {
                continue;
            };
            let mut behaviours = std::mem::take(&mut *attached);

            {
                let mut transform = self.world.get_mut::<Transform>(entity);
                let mut ctx = BehaviourContext {
                    entity,
                    transform: transform.as_deref_mut(),
                    delta,
                    time,
                    input,
                };
                behaviours.run(&mut ctx);
            }

            if let Some(mut attached) = self.world.get_mut::<Behaviours>(entity) {
                *attached = behaviours;
            }
        }
    }

    /// Dispose every camera framebuffer
    pub fn release(&mut self, ctx: &GlContext) {
        let mut query = self.world.query::<&mut Camera>();
        for mut camera in query.iter_mut(&mut self.world) {
            camera.release_render_target(ctx);
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessDevice;
    use glam::Vec3;

    struct Spin;

    impl Behaviour for Spin {
        fn update(&mut self, ctx: &mut BehaviourContext) {
            if let Some(transform) = ctx.transform.as_deref_mut() {
                transform.translate(Vec3::Y * ctx.delta);
            }
        }
    }

    #[test]
    fn test_spawn_and_find() {
        let mut scene = Scene::new();
        let cube = scene.spawn("cube");
        scene.spawn("floor");
        assert_eq!(scene.find("cube"), Some(cube));
        assert_eq!(scene.find("missing"), None);
        assert!(scene.get::<Transform>(cube).is_some());
    }

    #[test]
    fn test_primary_camera_requires_camera() {
        let mut scene = Scene::new();
        let entity = scene.spawn("not a camera");
        assert!(!scene.set_primary_camera(entity));
        assert_eq!(scene.primary_camera(), None);

        scene.insert(entity, Camera::default());
        assert!(scene.set_primary_camera(entity));
        assert_eq!(scene.primary_camera(), Some(entity));
        assert_eq!(scene.cameras(), vec![entity]);
    }

    #[test]
    fn test_despawn_clears_primary_camera() {
        let ctx = GlContext::new(HeadlessDevice::new());
        let mut scene = Scene::new();
        let camera = scene.spawn("camera");
        scene.insert(camera, Camera::default());
        scene.set_primary_camera(camera);

        assert!(scene.despawn(&ctx, camera));
        assert_eq!(scene.primary_camera(), None);
        assert!(!scene.despawn(&ctx, camera));
        assert!(!scene.insert(camera, Name("ghost".to_string())));
    }

    #[test]
    fn test_behaviours_update_transform() {
        let mut scene = Scene::new();
        let entity = scene.spawn("spinner");
        scene.insert(entity, Behaviours::new().with(Spin));

        scene.update_behaviours(0.25, 0.25, &InputState::new());
        scene.update_behaviours(0.25, 0.5, &InputState::new());

        let transform = scene.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(scene.get::<Behaviours>(entity).map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_update_transforms_refreshes_cameras() {
        let mut scene = Scene::new();
        let entity = scene.spawn("camera");
        scene.insert(entity, Camera::default());
        let before = scene.get::<Camera>(entity).map(|c| c.view_matrix());

        if let Some(mut camera) = scene.get_mut::<Camera>(entity) {
            camera.translate(Vec3::new(0.0, 0.0, 2.0));
        }
        assert_eq!(scene.get::<Camera>(entity).map(|c| c.view_matrix()), before);

        scene.update_transforms();
        let camera = scene.get::<Camera>(entity).unwrap();
        assert!(camera.target().abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }
}
