//! Render-thread GL context

use crate::gl::GlDevice;
use std::cell::Cell;
use std::thread::{self, ThreadId};

/// Identity of a `MultiTexture` for bound-state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultiTextureId(pub(crate) u64);

/// Viewport rectangle in window pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
        }
    }
}

/// The GL context every GPU operation goes through.
///
/// A `GlContext` is created once on the thread that owns the native GL
/// context and is neither `Send` nor `Sync`. It also carries the state GL
/// itself does not let us query cheaply, such as which `MultiTexture` is
/// currently bound.
pub struct GlContext {
    device: Box<dyn GlDevice>,
    owner: ThreadId,
    bound_textures: Cell<Option<MultiTextureId>>,
    viewport: Cell<Viewport>,
    saved_viewport: Cell<Option<Viewport>>,
}

impl GlContext {
    pub fn new(device: impl GlDevice + 'static) -> Self {
        log::debug!("GL context created on device '{}'", device.name());
        Self {
            device: Box::new(device),
            owner: thread::current().id(),
            bound_textures: Cell::new(None),
            viewport: Cell::new(Viewport::default()),
            saved_viewport: Cell::new(None),
        }
    }

    /// Access the device. Debug builds assert render-thread affinity.
    pub fn gl(&self) -> &dyn GlDevice {
        self.assert_render_thread();
        self.device.as_ref()
    }

    pub fn assert_render_thread(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "GL calls must be issued from the thread that created the context"
        );
    }

    /// The `MultiTexture` currently bound, if any
    pub fn bound_multi_texture(&self) -> Option<MultiTextureId> {
        self.bound_textures.get()
    }

    pub(crate) fn set_bound_multi_texture(&self, id: Option<MultiTextureId>) {
        self.bound_textures.set(id);
    }

    /// The viewport last set through this context
    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.gl()
            .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        self.viewport.set(viewport);
    }

    /// Set `viewport`, remembering the current one for `restore_viewport`.
    /// Only one level is kept.
    pub(crate) fn push_viewport(&self, viewport: Viewport) {
        self.saved_viewport.set(Some(self.viewport.get()));
        self.set_viewport(viewport);
    }

    pub(crate) fn restore_viewport(&self) {
        if let Some(viewport) = self.saved_viewport.take() {
            self.set_viewport(viewport);
        }
    }
}

impl std::fmt::Debug for GlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlContext")
            .field("device", &self.device.name())
            .field("bound_textures", &self.bound_textures.get())
            .field("viewport", &self.viewport.get())
            .finish()
    }
}
