//! Wavefront OBJ/MTL importer

use crate::import::{ImportError, ImportedMaterial, ImportedMesh, SceneImporter};
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::Path;

/// Imports `.obj` files with their `.mtl` material libraries.
///
/// Polygons are fan-triangulated and de-indexed. A new mesh starts at every
/// `o`, `g` or `usemtl` statement that follows geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjImporter;

impl ObjImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse OBJ source. `read_library` returns the text of an `mtllib`
    /// file, or `None` when it cannot be read.
    pub fn parse(
        &self,
        file: &str,
        source: &str,
        mut read_library: impl FnMut(&str) -> Option<String>,
    ) -> Result<Vec<ImportedMesh>, ImportError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut uvs: Vec<Vec2> = Vec::new();
        let mut materials: HashMap<String, ImportedMaterial> = HashMap::new();

        let mut meshes = Vec::new();
        let mut current = MeshBuilder::new(default_mesh_name(file), ImportedMaterial::default());

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let syntax = |message: String| ImportError::Syntax {
                file: file.to_string(),
                line,
                message,
            };
            let content = raw.split('#').next().unwrap_or("").trim();
            let mut tokens = content.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let rest: Vec<&str> = tokens.collect();

            match keyword {
                "v" => positions.push(parse_vec3(&rest).map_err(syntax)?),
                "vn" => normals.push(parse_vec3(&rest).map_err(syntax)?),
                "vt" => uvs.push(parse_vec2(&rest).map_err(syntax)?),
                "f" => {
                    if rest.len() < 3 {
                        return Err(syntax(format!("face has {} vertices", rest.len())));
                    }
                    let corners = rest
                        .iter()
                        .map(|corner| parse_corner(corner, &positions, &uvs, &normals))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(syntax)?;
                    for i in 1..corners.len() - 1 {
                        current.push(corners[0]);
                        current.push(corners[i]);
                        current.push(corners[i + 1]);
                    }
                }
                "o" | "g" => {
                    let name = rest.join(" ");
                    let material = current.material.clone();
                    let previous = std::mem::replace(&mut current, MeshBuilder::new(name, material));
                    previous.finish_into(&mut meshes);
                }
                "usemtl" => {
                    let name = rest.join(" ");
                    let material = materials.get(&name).cloned().unwrap_or_else(|| {
                        log::warn!("{}:{}: unknown material '{}'", file, line, name);
                        ImportedMaterial {
                            name: name.clone(),
                            ..Default::default()
                        }
                    });
                    let mesh_name = current.name.clone();
                    if current.is_empty() {
                        current.material = material;
                    } else {
                        let previous =
                            std::mem::replace(&mut current, MeshBuilder::new(mesh_name, material));
                        previous.finish_into(&mut meshes);
                    }
                }
                "mtllib" => {
                    for library in rest.iter().copied() {
                        match read_library(library) {
                            Some(text) => materials.extend(parse_mtl(library, &text)?),
                            None => log::warn!("{}: material library '{}' not found", file, library),
                        }
                    }
                }
                // Smoothing groups, lines and the rest carry nothing we draw
                _ => {}
            }
        }

        current.finish_into(&mut meshes);
        log::debug!("Imported {} meshes from '{}'", meshes.len(), file);
        Ok(meshes)
    }
}

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<Vec<ImportedMesh>, ImportError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !extension.eq_ignore_ascii_case("obj") {
            return Err(ImportError::UnsupportedFormat(path.display().to_string()));
        }
        let source = std::fs::read_to_string(path).map_err(|e| ImportError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("scene.obj");

        self.parse(file, &source, |library| {
            std::fs::read_to_string(directory.join(library)).ok()
        })
    }
}

/// Parse an MTL material library
pub fn parse_mtl(
    file: &str,
    source: &str,
) -> Result<HashMap<String, ImportedMaterial>, ImportError> {
    let mut materials = HashMap::new();
    let mut current: Option<ImportedMaterial> = None;

    for (index, raw) in source.lines().enumerate() {
        let syntax = |message: String| ImportError::Syntax {
            file: file.to_string(),
            line: index + 1,
            message,
        };
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        if keyword == "newmtl" {
            if let Some(material) = current.take() {
                materials.insert(material.name.clone(), material);
            }
            current = Some(ImportedMaterial {
                name: rest.join(" "),
                ..Default::default()
            });
            continue;
        }

        let Some(material) = current.as_mut() else {
            continue;
        };
        match keyword {
            "Ka" => material.ambient = parse_vec3(&rest).map_err(syntax)?,
            "Kd" => material.diffuse = parse_vec3(&rest).map_err(syntax)?,
            "Ks" => material.specular = parse_vec3(&rest).map_err(syntax)?,
            "d" => material.opacity = parse_float(rest.first()).map_err(syntax)?,
            "Tr" => material.opacity = 1.0 - parse_float(rest.first()).map_err(syntax)?,
            // Map options precede the file name
            "map_Kd" => material.diffuse_map = rest.last().map(|s| s.to_string()),
            "map_Ka" => material.ambient_map = rest.last().map(|s| s.to_string()),
            "map_disp" | "disp" => material.dispersion_map = rest.last().map(|s| s.to_string()),
            _ => {}
        }
    }

    if let Some(material) = current {
        materials.insert(material.name.clone(), material);
    }
    Ok(materials)
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    position: Vec3,
    uv: Option<Vec2>,
    normal: Option<Vec3>,
}

struct MeshBuilder {
    name: String,
    material: ImportedMaterial,
    corners: Vec<Corner>,
}

impl MeshBuilder {
    fn new(name: String, material: ImportedMaterial) -> Self {
        Self {
            name,
            material,
            corners: Vec::new(),
        }
    }

    fn push(&mut self, corner: Corner) {
        self.corners.push(corner);
    }

    fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Normals and UVs are kept only when every corner has one
    fn finish_into(self, meshes: &mut Vec<ImportedMesh>) {
        if self.corners.is_empty() {
            return;
        }
        let normals: Option<Vec<Vec3>> = self.corners.iter().map(|c| c.normal).collect();
        let uvs: Option<Vec<Vec2>> = self.corners.iter().map(|c| c.uv).collect();
        meshes.push(ImportedMesh {
            name: self.name,
            positions: self.corners.iter().map(|c| c.position).collect(),
            normals: normals.unwrap_or_default(),
            uvs: uvs.unwrap_or_default(),
            material: self.material,
        });
    }
}

fn default_mesh_name(file: &str) -> String {
    file.rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file)
        .to_string()
}

fn parse_float(token: Option<&&str>) -> Result<f32, String> {
    let token = token.ok_or_else(|| "missing value".to_string())?;
    token
        .parse::<f32>()
        .map_err(|_| format!("invalid number '{}'", token))
}

fn parse_vec3(tokens: &[&str]) -> Result<Vec3, String> {
    Ok(Vec3::new(
        parse_float(tokens.first())?,
        parse_float(tokens.get(1))?,
        parse_float(tokens.get(2))?,
    ))
}

fn parse_vec2(tokens: &[&str]) -> Result<Vec2, String> {
    Ok(Vec2::new(
        parse_float(tokens.first())?,
        parse_float(tokens.get(1)).unwrap_or(0.0),
    ))
}

/// Resolve a 1-based (or negative, relative) OBJ index
fn resolve_index(token: &str, len: usize) -> Result<usize, String> {
    let index: i64 = token
        .parse()
        .map_err(|_| format!("invalid index '{}'", token))?;
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(format!("index {} out of range", index));
    }
    Ok(resolved as usize)
}

fn parse_corner(
    corner: &str,
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
) -> Result<Corner, String> {
    let mut parts = corner.split('/');
    let position = parts
        .next()
        .ok_or_else(|| "empty face vertex".to_string())
        .and_then(|p| resolve_index(p, positions.len()))?;
    let uv = match parts.next() {
        Some(p) if !p.is_empty() => Some(uvs[resolve_index(p, uvs.len())?]),
        _ => None,
    };
    let normal = match parts.next() {
        Some(p) if !p.is_empty() => Some(normals[resolve_index(p, normals.len())?]),
        _ => None,
    };
    Ok(Corner {
        position: positions[position],
        uv,
        normal,
    })
}
