//! Texture unit binding table

use crate::gl::{GlContext, MultiTextureId, MAX_TEXTURE_UNITS};
use crate::resources::{Texture, TextureError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Eight texture-unit slots bound together.
///
/// Slots reference textures owned elsewhere (a resource manager or a
/// `FrameBuffer`). At most one `MultiTexture` is bound on a context at a
/// time; binding another one unbinds the previous first.
#[derive(Debug)]
pub struct MultiTexture {
    id: MultiTextureId,
    slots: [Option<Arc<Texture>>; MAX_TEXTURE_UNITS],
}

impl Default for MultiTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiTexture {
    pub fn new() -> Self {
        Self {
            id: MultiTextureId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            slots: Default::default(),
        }
    }

    pub fn id(&self) -> MultiTextureId {
        self.id
    }

    pub fn set_texture_unit(
        &mut self,
        texture: Arc<Texture>,
        unit: usize,
    ) -> Result<(), TextureError> {
        let slot = self
            .slots
            .get_mut(unit)
            .ok_or(TextureError::UnitOutOfRange(unit))?;
        *slot = Some(texture);
        Ok(())
    }

    pub fn clear_texture_unit(&mut self, unit: usize) -> Result<(), TextureError> {
        let slot = self
            .slots
            .get_mut(unit)
            .ok_or(TextureError::UnitOutOfRange(unit))?;
        *slot = None;
        Ok(())
    }

    pub fn texture(&self, unit: usize) -> Option<&Arc<Texture>> {
        self.slots.get(unit).and_then(Option::as_ref)
    }

    /// `(unit, texture)` for every occupied slot
    pub fn occupied_units(&self) -> impl Iterator<Item = (usize, &Arc<Texture>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(unit, slot)| slot.as_ref().map(|texture| (unit, texture)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_bound(&self, ctx: &GlContext) -> bool {
        ctx.bound_multi_texture() == Some(self.id)
    }

    /// Bind every occupied slot to its unit, replacing whatever table is bound
    pub fn bind(&self, ctx: &GlContext) {
        if ctx.bound_multi_texture().is_some() {
            unbind_all_units(ctx);
        }

        let gl = ctx.gl();
        for (unit, texture) in self.occupied_units() {
            gl.active_texture(unit as u32);
            gl.bind_texture_2d(texture.gl_name());
        }
        gl.active_texture(0);
        ctx.set_bound_multi_texture(Some(self.id));
    }

    /// Unbind every unit if this table is the one bound, otherwise do nothing
    pub fn unbind(&self, ctx: &GlContext) {
        if self.is_bound(ctx) {
            unbind_all_units(ctx);
        }
    }
}

fn unbind_all_units(ctx: &GlContext) {
    let gl = ctx.gl();
    for unit in 0..MAX_TEXTURE_UNITS as u32 {
        gl.active_texture(unit);
        gl.bind_texture_2d(0);
    }
    gl.active_texture(0);
    ctx.set_bound_multi_texture(None);
}
