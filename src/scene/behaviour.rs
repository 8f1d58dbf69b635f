//! Per-entity behaviour scripts

use crate::input::InputState;
use crate::scene::Transform;
use bevy_ecs::prelude::*;
use std::any::Any;

/// Upcast to [`Any`] for concrete-type lookup of boxed behaviours
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What a behaviour sees of its entity and the frame
pub struct BehaviourContext<'a> {
    pub entity: Entity,
    /// `None` when the entity has no `Transform`
    pub transform: Option<&'a mut Transform>,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the engine started
    pub time: f32,
    pub input: &'a InputState,
}

/// A script attached to an entity.
///
/// `start` runs once before the first `update` the behaviour receives.
pub trait Behaviour: AsAny + Send + Sync {
    fn start(&mut self, _ctx: &mut BehaviourContext) {}

    fn update(&mut self, ctx: &mut BehaviourContext);
}

struct Slot {
    behaviour: Box<dyn Behaviour>,
    started: bool,
}

/// Ordered list of behaviours on one entity
#[derive(Component, Default)]
pub struct Behaviours {
    slots: Vec<Slot>,
}

impl Behaviours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, behaviour: impl Behaviour + 'static) -> Self {
        self.add(behaviour);
        self
    }

    pub fn add(&mut self, behaviour: impl Behaviour + 'static) {
        self.slots.push(Slot {
            behaviour: Box::new(behaviour),
            started: false,
        });
    }

    /// First behaviour of type `T`
    pub fn get<T: Behaviour + 'static>(&self) -> Option<&T> {
        self.slots.iter().find_map(|slot| {
            let behaviour: &dyn Behaviour = slot.behaviour.as_ref();
            behaviour.as_any().downcast_ref::<T>()
        })
    }

    pub fn get_mut<T: Behaviour + 'static>(&mut self) -> Option<&mut T> {
        self.slots.iter_mut().find_map(|slot| {
            let behaviour: &mut dyn Behaviour = slot.behaviour.as_mut();
            behaviour.as_any_mut().downcast_mut::<T>()
        })
    }

    /// Every behaviour of type `T`, in insertion order
    pub fn get_all<T: Behaviour + 'static>(&self) -> Vec<&T> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let behaviour: &dyn Behaviour = slot.behaviour.as_ref();
                behaviour.as_any().downcast_ref::<T>()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start pending behaviours, then update all of them
    pub fn run(&mut self, ctx: &mut BehaviourContext) {
        for slot in &mut self.slots {
            if !slot.started {
                slot.behaviour.start(ctx);
                slot.started = true;
            }
            slot.behaviour.update(ctx);
        }
    }
}

impl std::fmt::Debug for Behaviours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behaviours")
            .field("count", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[derive(Default)]
    struct Counter {
        starts: u32,
        updates: u32,
    }

    impl Behaviour for Counter {
        fn start(&mut self, _ctx: &mut BehaviourContext) {
            self.starts += 1;
        }

        fn update(&mut self, _ctx: &mut BehaviourContext) {
            self.updates += 1;
        }
    }

    struct Mover(Vec3);

    impl Behaviour for Mover {
        fn update(&mut self, ctx: &mut BehaviourContext) {
            if let Some(transform) = ctx.transform.as_deref_mut() {
                transform.translate(self.0 * ctx.delta);
            }
        }
    }

    fn context<'a>(transform: Option<&'a mut Transform>, input: &'a InputState) -> BehaviourContext<'a> {
        BehaviourContext {
            entity: Entity::PLACEHOLDER,
            transform,
            delta: 0.5,
            time: 0.0,
            input,
        }
    }

    #[test]
    fn test_lookup_by_type() {
        let behaviours = Behaviours::new()
            .with(Counter::default())
            .with(Mover(Vec3::X))
            .with(Counter {
                starts: 7,
                updates: 0,
            });

        assert_eq!(behaviours.get::<Counter>().map(|c| c.starts), Some(0));
        assert_eq!(behaviours.get_all::<Counter>().len(), 2);
        assert_eq!(behaviours.get_all::<Mover>().len(), 1);
    }

    #[test]
    fn test_start_runs_once() {
        let input = InputState::new();
        let mut behaviours = Behaviours::new().with(Counter::default());
        behaviours.run(&mut context(None, &input));
        behaviours.run(&mut context(None, &input));

        let counter = behaviours.get::<Counter>().unwrap();
        assert_eq!(counter.starts, 1);
        assert_eq!(counter.updates, 2);
    }

    #[test]
    fn test_behaviour_moves_transform() {
        let input = InputState::new();
        let mut transform = Transform::new();
        let mut behaviours = Behaviours::new().with(Mover(Vec3::new(2.0, 0.0, 0.0)));
        behaviours.run(&mut context(Some(&mut transform), &input));
        assert_eq!(transform.position, Vec3::new(1.0, 0.0, 0.0));
    }
}
