//! Material descriptors and bound material state

use crate::gl::GlContext;
use crate::import::{last_path_segment, ImportedMaterial};
use crate::resources::{
    GpuResource, MultiTexture, ResourceDirectories, ResourceManager, ShaderProgram, Texture,
    TextureSettings,
};
use glam::Vec3;

/// Logical directory texture maps are loaded from
pub const TEXTURE_DIRECTORY: &str = "textures";

/// Texture unit of each material map
pub const DIFFUSE_UNIT: usize = 0;
pub const AMBIENT_UNIT: usize = 1;
pub const DISPERSION_UNIT: usize = 2;

/// Material colours and texture map file names of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub opacity: f32,
    pub diffuse_map: Option<String>,
    pub ambient_map: Option<String>,
    pub dispersion_map: Option<String>,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ZERO,
            opacity: 1.0,
            diffuse_map: None,
            ambient_map: None,
            dispersion_map: None,
        }
    }
}

impl MaterialDescriptor {
    /// Take an imported material, keeping only the file name of each map
    pub fn from_imported(material: &ImportedMaterial) -> Self {
        let file_name = |path: &Option<String>| {
            path.as_deref()
                .map(last_path_segment)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };
        Self {
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            opacity: material.opacity,
            diffuse_map: file_name(&material.diffuse_map),
            ambient_map: file_name(&material.ambient_map),
            dispersion_map: file_name(&material.dispersion_map),
        }
    }

    /// `(unit, file name)` for every map present
    pub fn texture_maps(&self) -> impl Iterator<Item = (usize, &str)> {
        [
            (DIFFUSE_UNIT, &self.diffuse_map),
            (AMBIENT_UNIT, &self.ambient_map),
            (DISPERSION_UNIT, &self.dispersion_map),
        ]
        .into_iter()
        .filter_map(|(unit, map)| map.as_deref().map(|name| (unit, name)))
    }
}

/// A descriptor plus the textures it samples
#[derive(Debug, Default)]
pub struct Material {
    descriptor: MaterialDescriptor,
    textures: MultiTexture,
}

impl Material {
    pub fn new(descriptor: MaterialDescriptor) -> Self {
        Self {
            descriptor,
            textures: MultiTexture::new(),
        }
    }

    /// Resolve every map through the texture manager, importing missing ones
    /// from the `"textures"` directory. Maps that fail to load are skipped.
    pub fn from_descriptor(
        ctx: &GlContext,
        descriptor: MaterialDescriptor,
        textures: &ResourceManager<Texture>,
        directories: &ResourceDirectories,
    ) -> Self {
        let mut material = Self::new(descriptor);
        let maps: Vec<(usize, String)> = material
            .descriptor
            .texture_maps()
            .map(|(unit, name)| (unit, name.to_string()))
            .collect();

        for (unit, name) in maps {
            let texture = match textures.get(&name) {
                Some(texture) => texture,
                None => {
                    let texture = Texture::import(
                        ctx,
                        directories,
                        TEXTURE_DIRECTORY,
                        &name,
                        TextureSettings::default(),
                    );
                    if let Err(e) = texture.check() {
                        log::warn!("Skipping texture map '{}': {}", name, e);
                        texture.release(ctx);
                        continue;
                    }
                    match textures.add(&name, texture) {
                        Ok(texture) => texture,
                        Err(e) => {
                            log::warn!("Skipping texture map '{}': {}", name, e);
                            continue;
                        }
                    }
                }
            };
            if let Err(e) = material.textures.set_texture_unit(texture, unit) {
                log::warn!("Skipping texture map '{}': {}", name, e);
            }
        }
        material
    }

    pub fn descriptor(&self) -> &MaterialDescriptor {
        &self.descriptor
    }

    pub fn textures(&self) -> &MultiTexture {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut MultiTexture {
        &mut self.textures
    }

    pub fn bind(&self, ctx: &GlContext) {
        self.textures.bind(ctx);
    }

    pub fn unbind(&self, ctx: &GlContext) {
        self.textures.unbind(ctx);
    }

    /// Point `u_texture<N>` at unit N for every texture present
    pub fn apply_samplers(&self, ctx: &GlContext, program: &ShaderProgram) {
        for (unit, _) in self.textures.occupied_units() {
            program.set_uniform(ctx, &format!("u_texture{}", unit), unit as i32);
        }
    }

    /// Set the colour uniforms of this material
    pub fn apply_colors(&self, ctx: &GlContext, program: &ShaderProgram) {
        program.set_uniform(ctx, "u_ambient", self.descriptor.ambient);
        program.set_uniform(ctx, "u_diffuse", self.descriptor.diffuse);
        program.set_uniform(ctx, "u_specular", self.descriptor.specular);
        program.set_uniform(ctx, "u_opacity", self.descriptor.opacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessDevice;

    #[test]
    fn test_imported_maps_keep_file_name() {
        let imported = ImportedMaterial {
            diffuse_map: Some("assets/textures/brick.png".to_string()),
            dispersion_map: Some("C:\\maps\\brick_disp.png".to_string()),
            ..Default::default()
        };
        let descriptor = MaterialDescriptor::from_imported(&imported);
        assert_eq!(descriptor.diffuse_map.as_deref(), Some("brick.png"));
        assert_eq!(descriptor.ambient_map, None);
        assert_eq!(
            descriptor.texture_maps().collect::<Vec<_>>(),
            vec![(0, "brick.png"), (2, "brick_disp.png")]
        );
    }

    #[test]
    fn test_managed_textures_are_reused() {
        let ctx = GlContext::new(HeadlessDevice::new());
        let textures = ResourceManager::new("texture");
        let brick = textures
            .add(
                "brick.png",
                Texture::from_rgba8(&ctx, "brick.png", 1, 1, &[255; 4], TextureSettings::default()),
            )
            .unwrap();

        let descriptor = MaterialDescriptor {
            diffuse_map: Some("brick.png".to_string()),
            ambient_map: Some("missing.png".to_string()),
            ..Default::default()
        };
        let material =
            Material::from_descriptor(&ctx, descriptor, &textures, &ResourceDirectories::new());

        assert_eq!(
            material.textures().texture(DIFFUSE_UNIT).map(|t| t.gl_name()),
            Some(brick.gl_name())
        );
        assert!(material.textures().texture(AMBIENT_UNIT).is_none());
        assert_eq!(textures.len(), 1);
        textures.release_all(&ctx);
    }
}
