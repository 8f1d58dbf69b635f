//! Named, shared resource storage

use crate::audio::SoundClip;
use crate::gl::GlContext;
use crate::resources::{GpuResource, Mesh, ShaderProgram, Texture};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

/// Lock-guarded map of named resources handed out as `Arc`s.
///
/// The manager is the owner responsible for releasing what it holds; the
/// `Arc`s given to components are references, not ownership.
#[derive(Debug)]
pub struct ResourceManager<T> {
    kind: &'static str,
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> ResourceManager<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Add a new resource. Fails if the name is taken.
    pub fn add(&self, name: &str, resource: T) -> Result<Arc<T>, ResourceError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            return Err(ResourceError::Duplicate {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        let resource = Arc::new(resource);
        entries.insert(name.to_string(), Arc::clone(&resource));
        log::debug!("Added {} '{}'", self.kind, name);
        Ok(resource)
    }

    /// Add or replace, returning the previous resource for the caller to release
    pub fn set(&self, name: &str, resource: T) -> Option<Arc<T>> {
        self.entries
            .lock()
            .insert(name.to_string(), Arc::new(resource))
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.lock().get(name).cloned()
    }

    /// Like `get`, for callers that cannot continue without the resource
    pub fn require(&self, name: &str) -> Result<Arc<T>, ResourceError> {
        self.get(name).ok_or_else(|| ResourceError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    /// Return the named resource, creating it under the lock if missing.
    ///
    /// `create` must not call back into this manager.
    pub fn get_or_try_insert_with<E>(
        &self,
        name: &str,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(name) {
            return Ok(Arc::clone(existing));
        }
        let resource = Arc::new(create()?);
        entries.insert(name.to_string(), Arc::clone(&resource));
        log::debug!("Created {} '{}'", self.kind, name);
        Ok(resource)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<T>> {
        self.entries.lock().remove(name)
    }

    /// Sorted resource names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Remove everything, handing the resources back
    pub fn drain(&self) -> Vec<(String, Arc<T>)> {
        self.entries.lock().drain().collect()
    }
}

impl<T: GpuResource> ResourceManager<T> {
    /// Release the GPU objects of every resource and empty the manager
    pub fn release_all(&self, ctx: &GlContext) {
        let drained = self.drain();
        for (name, resource) in &drained {
            log::trace!("Releasing {} '{}'", self.kind, name);
            resource.release(ctx);
        }
        if !drained.is_empty() {
            log::debug!("Released {} {} resources", drained.len(), self.kind);
        }
    }
}

/// Every resource manager of an engine
#[derive(Debug)]
pub struct Resources {
    pub meshes: ResourceManager<Mesh>,
    pub textures: ResourceManager<Texture>,
    pub shaders: ResourceManager<ShaderProgram>,
    pub sounds: ResourceManager<SoundClip>,
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

impl Resources {
    pub fn new() -> Self {
        Self {
            meshes: ResourceManager::new("mesh"),
            textures: ResourceManager::new("texture"),
            shaders: ResourceManager::new("shader"),
            sounds: ResourceManager::new("sound"),
        }
    }

    /// Release leaf-first: meshes and programs before the textures they sample
    pub fn release_all(&self, ctx: &GlContext) {
        self.meshes.release_all(ctx);
        self.shaders.release_all(ctx);
        self.textures.release_all(ctx);
        self.sounds.drain();
    }
}
