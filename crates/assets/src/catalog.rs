use glam::Vec3;
use momiji_common::{Scale, Transform};
use serde::{Deserialize, Serialize};

/// Where a model's geometry comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ModelSource {
    /// A `.gltf` (JSON) or `.glb` (binary) file.
    Gltf { path: String },
    /// A Wavefront OBJ with its material library. The MTL loads first.
    ObjMtl { obj: String, mtl: String },
}

impl ModelSource {
    pub fn gltf(path: impl Into<String>) -> Self {
        ModelSource::Gltf { path: path.into() }
    }

    pub fn obj_mtl(obj: impl Into<String>, mtl: impl Into<String>) -> Self {
        ModelSource::ObjMtl {
            obj: obj.into(),
            mtl: mtl.into(),
        }
    }

    /// The path that identifies this model in logs.
    pub fn label(&self) -> &str {
        match self {
            ModelSource::Gltf { path } => path,
            ModelSource::ObjMtl { obj, .. } => obj,
        }
    }
}

/// Loading tier. Core entries gate the first paint; extras fill in whenever they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTier {
    Core,
    #[default]
    Extra,
}

/// One declared model placement. Immutable once declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub source: ModelSource,
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation_degrees: Vec3,
    #[serde(default)]
    pub tier: LoadTier,
}

impl AssetEntry {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            scale: Scale::default(),
            position: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            tier: LoadTier::Extra,
        }
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Scale::Uniform(scale);
        self
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation_degrees = Vec3::new(x, y, z);
        self
    }

    pub fn core(mut self) -> Self {
        self.tier = LoadTier::Core;
        self
    }

    pub fn label(&self) -> &str {
        self.source.label()
    }

    /// The transform applied to the loaded subtree.
    pub fn transform(&self) -> Transform {
        Transform::from_degrees(self.position, self.rotation_degrees, self.scale.to_vec3())
    }
}

/// A base model decorated with clones of a second model at listed positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoliageEntry {
    pub base: AssetEntry,
    pub decoration: ModelSource,
    /// Text file with one `x, y, z` triple per line.
    pub positions: String,
    #[serde(default)]
    pub seed: u64,
}

/// Declarative list of what the scene contains. No logic beyond defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCatalog {
    pub entries: Vec<AssetEntry>,
    pub foliage: Vec<FoliageEntry>,
    pub water_normals: String,
    pub background: String,
    pub font: String,
}

impl AssetCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            foliage: Vec::new(),
            ..Self::default()
        }
    }

    pub fn core_entries(&self) -> impl Iterator<Item = &AssetEntry> {
        self.entries.iter().filter(|e| e.tier == LoadTier::Core)
    }

    pub fn extra_entries(&self) -> impl Iterator<Item = &AssetEntry> {
        self.entries.iter().filter(|e| e.tier == LoadTier::Extra)
    }

    /// Number of loads issued for this catalog (one per entry and per foliage entry).
    pub fn load_count(&self) -> usize {
        self.entries.len() + self.foliage.len()
    }
}

impl Default for AssetCatalog {
    /// The autumn garden: terrain, pond, furnishings, and trees.
    fn default() -> Self {
        let entries = vec![
            AssetEntry::new(ModelSource::obj_mtl(
                "./assets/landscape_ground/landscape_ground.obj",
                "./assets/landscape_ground/landscape_ground.mtl",
            ))
            .core(),
            AssetEntry::new(ModelSource::obj_mtl(
                "./assets/landscape_water/landscape_water.obj",
                "./assets/landscape_water/landscape_water.mtl",
            ))
            .core(),
            AssetEntry::new(ModelSource::obj_mtl(
                "./assets/maki_single_2.obj",
                "./assets/maki_single_2.mtl",
            ))
            .core(),
            AssetEntry::new(ModelSource::gltf("./assets/bench/bench.glb"))
                .at(7.0, 0.0, 18.0)
                .rotated(0.0, 30.0, 0.0)
                .core(),
            AssetEntry::new(ModelSource::gltf("./assets/loghouse/loghouse.glb"))
                .scaled(0.815)
                .at(0.0, 2.5, -15.0)
                .core(),
            AssetEntry::new(ModelSource::gltf("./assets/maki/maki.glb"))
                .scaled(0.8)
                .at(26.0, 0.0, 18.0)
                .rotated(0.0, 90.0, 0.0)
                .core(),
            AssetEntry::new(ModelSource::gltf("./assets/momiji_01/momiji.glb")),
            AssetEntry::new(ModelSource::gltf("./assets/momiji_02/momiji.glb")),
            AssetEntry::new(ModelSource::gltf("./assets/ityou/ityou.glb")),
            AssetEntry::new(ModelSource::gltf("./assets/tree/tree.glb"))
                .scaled(1.2)
                .at(28.0, 0.0, -20.0)
                .rotated(0.0, 25.0, 0.0),
        ];

        Self {
            entries,
            foliage: Vec::new(),
            water_normals: "./textures/waternormals.jpg".into(),
            background: "./assets/HDRI/sunflowers_puresky_1k.exr".into(),
            font: "./fonts/helvetiker_bold.typeface.json".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_splits_tiers() {
        let catalog = AssetCatalog::default();
        assert_eq!(catalog.core_entries().count(), 6);
        assert_eq!(catalog.extra_entries().count(), 4);
        assert_eq!(catalog.load_count(), 10);
    }

    #[test]
    fn entry_transform_uses_radians() {
        let entry = AssetEntry::new(ModelSource::gltf("maki.glb"))
            .scaled(0.8)
            .at(26.0, 0.0, 18.0)
            .rotated(0.0, 90.0, 0.0);
        let t = entry.transform();
        assert_eq!(t.position, Vec3::new(26.0, 0.0, 18.0));
        assert_eq!(t.rotation, Vec3::new(0.0, 90.0_f32.to_radians(), 0.0));
        assert_eq!(t.scale, Vec3::splat(0.8));
    }

    #[test]
    fn obj_label_is_geometry_path() {
        let source = ModelSource::obj_mtl("a.obj", "a.mtl");
        assert_eq!(source.label(), "a.obj");
    }

    #[test]
    fn entry_parses_with_defaults() {
        let json = r#"{ "source": { "format": "gltf", "path": "bench.glb" } }"#;
        let entry: AssetEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.scale, Scale::Uniform(1.0));
        assert_eq!(entry.position, Vec3::ZERO);
        assert_eq!(entry.tier, LoadTier::Extra);
    }

    #[test]
    fn entry_parses_per_axis_scale_and_tier() {
        let json = r#"{
            "source": { "format": "obj_mtl", "obj": "g.obj", "mtl": "g.mtl" },
            "scale": [1.0, 2.0, 1.0],
            "position": [0.0, 2.5, -15.0],
            "tier": "core"
        }"#;
        let entry: AssetEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.scale, Scale::PerAxis(Vec3::new(1.0, 2.0, 1.0)));
        assert_eq!(entry.tier, LoadTier::Core);
        assert!(matches!(entry.source, ModelSource::ObjMtl { .. }));
    }
}
