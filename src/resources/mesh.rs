//! Mesh building from imported or hand-made attribute data

use crate::gl::{GlContext, PrimitiveType};
use crate::import::{ImportError, ImportedMesh, SceneImporter};
use crate::resources::{
    Attribute, AttributeStorage, BufferError, DirectoryError, GpuResource, MaterialDescriptor,
    ResourceDirectories, VertexBuffer,
};
use glam::{Vec2, Vec3};
use thiserror::Error;

/// Attribute slot names used by built meshes
pub const POSITION_ATTRIBUTE: &str = "position";
pub const NORMAL_ATTRIBUTE: &str = "normal";
pub const UV_ATTRIBUTE: &str = "uv";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Scene '{file}' has no mesh at index {index}")]
    MissingMesh { file: String, index: usize },
    #[error("Failed to parse mesh '{name}': {reason}")]
    Parse { name: String, reason: String },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Mesh pipeline progress, with a distinct failure state per step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshStatus {
    Uninitialized,
    Importing,
    Parsing,
    Buffering,
    Ready,
    ImportFailed,
    ParseFailed,
    BufferFailed,
}

/// A drawable mesh: attribute data, its vertex buffer and material record
#[derive(Debug)]
pub struct Mesh {
    name: String,
    storage: AttributeStorage,
    buffer: VertexBuffer,
    material: MaterialDescriptor,
    status: MeshStatus,
    error: Option<MeshError>,
}

impl Mesh {
    fn empty(name: &str, material: MaterialDescriptor) -> Self {
        Self {
            name: name.to_string(),
            storage: AttributeStorage::new(),
            buffer: VertexBuffer::new(),
            material,
            status: MeshStatus::Uninitialized,
            error: None,
        }
    }

    /// Build a mesh from a populated attribute storage
    pub fn from_storage(
        ctx: &GlContext,
        name: &str,
        storage: AttributeStorage,
        primitive: PrimitiveType,
        material: MaterialDescriptor,
    ) -> Self {
        let mut mesh = Self::empty(name, material);
        mesh.storage = storage;
        mesh.build(ctx, primitive);
        mesh
    }

    /// Build a mesh from an importer's triangle list
    pub fn from_imported(ctx: &GlContext, imported: &ImportedMesh) -> Self {
        let mut mesh = Self::empty(
            &imported.name,
            MaterialDescriptor::from_imported(&imported.material),
        );
        if mesh.parse(imported) {
            mesh.build(ctx, PrimitiveType::Triangles);
        }
        mesh
    }

    /// Import mesh `index` of a scene file from a logical resource directory
    pub fn import(
        ctx: &GlContext,
        importer: &dyn SceneImporter,
        directories: &ResourceDirectories,
        folder_id: &str,
        filename: &str,
        index: usize,
    ) -> Self {
        let mut mesh = Self::empty(filename, MaterialDescriptor::default());
        mesh.status = MeshStatus::Importing;

        let imported = directories
            .resolve(folder_id, filename)
            .map_err(MeshError::from)
            .and_then(|path| importer.import(&path).map_err(MeshError::from))
            .and_then(|mut meshes| {
                if index < meshes.len() {
                    Ok(meshes.swap_remove(index))
                } else {
                    Err(MeshError::MissingMesh {
                        file: filename.to_string(),
                        index,
                    })
                }
            });

        match imported {
            Ok(imported) => {
                mesh.name = imported.name.clone();
                mesh.material = MaterialDescriptor::from_imported(&imported.material);
                if mesh.parse(&imported) {
                    mesh.build(ctx, PrimitiveType::Triangles);
                }
            }
            Err(e) => mesh.fail(MeshStatus::ImportFailed, e),
        }
        mesh
    }

    /// Import every mesh of a scene file
    pub fn import_scene(
        ctx: &GlContext,
        importer: &dyn SceneImporter,
        directories: &ResourceDirectories,
        folder_id: &str,
        filename: &str,
    ) -> Result<Vec<Self>, MeshError> {
        let path = directories.resolve(folder_id, filename)?;
        let imported = importer.import(&path)?;
        Ok(imported
            .iter()
            .map(|mesh| Self::from_imported(ctx, mesh))
            .collect())
    }

    /// Unit quad in the XY plane, spanning -1..1
    pub fn quad(ctx: &GlContext, name: &str) -> Self {
        let corners = [
            (Vec3::new(-1.0, -1.0, 0.0), Vec2::new(0.0, 0.0)),
            (Vec3::new(1.0, -1.0, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(-1.0, 1.0, 0.0), Vec2::new(0.0, 1.0)),
        ];
        let order = [0, 1, 2, 0, 2, 3];

        let positions: Vec<Vec3> = order.iter().map(|&i| corners[i].0).collect();
        let normals = vec![Vec3::Z; order.len()];
        let uvs: Vec<Vec2> = order.iter().map(|&i| corners[i].1).collect();
        Self::from_columns(ctx, name, &positions, &normals, &uvs)
    }

    /// Unit cube centred at the origin
    pub fn cube(ctx: &GlContext, name: &str) -> Self {
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        let mut positions = Vec::with_capacity(36);
        let mut normals = Vec::with_capacity(36);
        let mut uvs = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            for uv in corners {
                positions.push(normal * 0.5 + u * (uv.x - 0.5) + v * (uv.y - 0.5));
                normals.push(normal);
                uvs.push(uv);
            }
        }
        Self::from_columns(ctx, name, &positions, &normals, &uvs)
    }

    fn from_columns(
        ctx: &GlContext,
        name: &str,
        positions: &[Vec3],
        normals: &[Vec3],
        uvs: &[Vec2],
    ) -> Self {
        let imported = ImportedMesh {
            name: name.to_string(),
            positions: positions.to_vec(),
            normals: normals.to_vec(),
            uvs: uvs.to_vec(),
            ..Default::default()
        };
        Self::from_imported(ctx, &imported)
    }

    fn parse(&mut self, imported: &ImportedMesh) -> bool {
        self.status = MeshStatus::Parsing;
        let count = imported.positions.len();
        let reason = if count == 0 {
            Some("no positions".to_string())
        } else if !imported.normals.is_empty() && imported.normals.len() != count {
            Some(format!("{} normals for {} positions", imported.normals.len(), count))
        } else if !imported.uvs.is_empty() && imported.uvs.len() != count {
            Some(format!("{} uvs for {} positions", imported.uvs.len(), count))
        } else {
            None
        };
        if let Some(reason) = reason {
            let name = self.name.clone();
            self.fail(MeshStatus::ParseFailed, MeshError::Parse { name, reason });
            return false;
        }

        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::from_f32(
            POSITION_ATTRIBUTE,
            3,
            bytemuck::cast_slice(&imported.positions),
        ));
        if !imported.normals.is_empty() {
            storage.add_attribute(Attribute::from_f32(
                NORMAL_ATTRIBUTE,
                3,
                bytemuck::cast_slice(&imported.normals),
            ));
        }
        if !imported.uvs.is_empty() {
            storage.add_attribute(Attribute::from_f32(
                UV_ATTRIBUTE,
                2,
                bytemuck::cast_slice(&imported.uvs),
            ));
        }
        self.storage = storage;
        true
    }

    fn build(&mut self, ctx: &GlContext, primitive: PrimitiveType) {
        self.status = MeshStatus::Buffering;
        let result = self
            .buffer
            .initialise_buffers(ctx)
            .and_then(|_| self.buffer.buffer_data(ctx, &self.storage, primitive));
        match result {
            Ok(()) => {
                self.status = MeshStatus::Ready;
                log::debug!(
                    "Mesh '{}' ready with {} vertices",
                    self.name,
                    self.buffer.vertex_count()
                );
            }
            Err(e) => self.fail(MeshStatus::BufferFailed, e.into()),
        }
    }

    fn fail(&mut self, status: MeshStatus, error: MeshError) {
        log::warn!("Mesh '{}': {}", self.name, error);
        self.status = status;
        self.error = Some(error);
    }

    pub fn bind(&self, ctx: &GlContext) {
        self.buffer.bind(ctx);
    }

    pub fn unbind(&self, ctx: &GlContext) {
        self.buffer.unbind(ctx);
    }

    pub fn draw(&self, ctx: &GlContext) {
        self.buffer.draw(ctx);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &AttributeStorage {
        &self.storage
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    pub fn material(&self) -> &MaterialDescriptor {
        &self.material
    }

    pub fn set_material(&mut self, material: MaterialDescriptor) {
        self.material = material;
    }

    pub fn vertex_count(&self) -> u32 {
        self.buffer.vertex_count()
    }

    pub fn status(&self) -> MeshStatus {
        self.status
    }

    pub fn error(&self) -> Option<&MeshError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == MeshStatus::Ready
    }
}

impl GpuResource for Mesh {
    fn release(&self, ctx: &GlContext) {
        self.buffer.release(ctx);
    }
}
