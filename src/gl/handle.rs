//! Atomic GL object names

use std::sync::atomic::{AtomicU32, Ordering};

/// A GL object name owned by a resource.
///
/// Zero is the null name. `take` swaps the name out so deletion happens at
/// most once, even when the owning resource is shared behind an `Arc`.
#[derive(Default)]
pub struct GlHandle {
    name: AtomicU32,
    kind: &'static str,
}

impl GlHandle {
    pub fn new(kind: &'static str) -> Self {
        Self {
            name: AtomicU32::new(0),
            kind,
        }
    }

    pub fn get(&self) -> u32 {
        self.name.load(Ordering::Acquire)
    }

    pub fn set(&self, name: u32) {
        self.name.store(name, Ordering::Release);
    }

    pub fn is_null(&self) -> bool {
        self.get() == 0
    }

    /// Take the name, leaving null behind. Returns `None` when already null.
    pub fn take(&self) -> Option<u32> {
        match self.name.swap(0, Ordering::AcqRel) {
            0 => None,
            name => Some(name),
        }
    }
}

impl std::fmt::Debug for GlHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.get())
    }
}

impl Drop for GlHandle {
    fn drop(&mut self) {
        let name = *self.name.get_mut();
        if name != 0 {
            log::warn!("{} {} dropped without being released", self.kind, name);
        }
    }
}
