use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of the bytes an asset was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        let result = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        Self(out)
    }

    /// Digest over several byte slices in order (e.g. an OBJ and its MTL).
    pub fn of_all<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..6] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// A mesh primitive as reported by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Index into [`ModelData::materials`].
    pub material: Option<usize>,
}

/// A material as reported by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// A decoded model subtree, ready to be placed in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub source: String,
    pub meshes: Vec<MeshInfo>,
    pub materials: Vec<MaterialInfo>,
    pub digest: ContentDigest,
}

impl ModelData {
    pub fn vertex_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }

    /// Base colour of the first mesh's material, falling back to the default grey.
    pub fn primary_color(&self) -> [f32; 4] {
        self.meshes
            .first()
            .and_then(|m| m.material)
            .or(if self.materials.is_empty() { None } else { Some(0) })
            .and_then(|i| self.materials.get(i))
            .map(|m| m.base_color)
            .unwrap_or(MaterialInfo::default().base_color)
    }
}

/// How a texture is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMapping {
    #[default]
    Uv,
    EquirectangularReflection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
}

/// A fetched texture. Only the header is decoded; pixel upload is left to
/// the renderer backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    pub digest: ContentDigest,
    pub mapping: TextureMapping,
    pub wrap: TextureWrap,
}

/// A typeface font in the JSON layout produced by facetype converters.
#[derive(Debug, Clone, PartialEq)]
pub struct FontData {
    pub path: String,
    pub family: String,
    pub glyph_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_short_hex() {
        let a = ContentDigest::of(b"momiji");
        let b = ContentDigest::of(b"momiji");
        assert_eq!(a, b);
        assert_eq!(a.to_string().len(), 12);
        assert_ne!(a, ContentDigest::of(b"ityou"));
    }

    #[test]
    fn digest_of_parts_matches_concatenation() {
        let joined = ContentDigest::of(b"objmtl");
        let parts = ContentDigest::of_all([b"obj".as_slice(), b"mtl".as_slice()]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn primary_color_prefers_mesh_material() {
        let model = ModelData {
            source: "bench.glb".into(),
            meshes: vec![MeshInfo {
                name: "seat".into(),
                vertex_count: 8,
                index_count: 36,
                material: Some(1),
            }],
            materials: vec![
                MaterialInfo::default(),
                MaterialInfo {
                    name: "wood".into(),
                    base_color: [0.5, 0.3, 0.1, 1.0],
                },
            ],
            digest: ContentDigest::default(),
        };
        assert_eq!(model.primary_color(), [0.5, 0.3, 0.1, 1.0]);
        assert_eq!(model.vertex_count(), 8);
    }

    #[test]
    fn primary_color_defaults_without_materials() {
        let model = ModelData {
            source: "empty.glb".into(),
            meshes: vec![],
            materials: vec![],
            digest: ContentDigest::default(),
        };
        assert_eq!(model.primary_color(), [0.8, 0.8, 0.8, 1.0]);
    }
}
