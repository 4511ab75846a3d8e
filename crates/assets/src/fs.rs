//! File-backed asset loader.
//!
//! Reads assets relative to a root directory and decodes just enough of each
//! format to describe it: mesh and material tables for glTF/GLB (via `gltf`)
//! and OBJ/MTL (via `tobj`), image dimensions for textures (via `image`),
//! family and glyph count for typeface fonts. Vertex data stays with the
//! rendering backend.
//!
//! File reads and decoding run on a small worker pool; the futures handed out
//! only wait for the worker's answer, so polling them never blocks.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::ThreadPool;
use futures::future::LocalBoxFuture;

use crate::AssetError;
use crate::catalog::ModelSource;
use crate::data::{
    ContentDigest, FontData, MaterialInfo, MeshInfo, ModelData, TextureData, TextureMapping,
};
use crate::loader::AssetLoader;

/// Worker threads used by [`FsAssetLoader::new`].
const WORKERS: usize = 4;

/// Loads assets from disk below a root directory. Catalog paths like
/// `./assets/x.glb` are resolved against the root.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    dir: AssetDir,
    pool: ThreadPool,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        Self::with_workers(root, WORKERS)
    }

    fn with_workers(root: impl Into<PathBuf>, workers: usize) -> Result<Self, AssetError> {
        let pool = ThreadPool::builder()
            .pool_size(workers.max(1))
            .name_prefix("momiji-assets-")
            .create()
            .map_err(AssetError::Workers)?;
        Ok(Self {
            dir: AssetDir { root: root.into() },
            pool,
        })
    }

    /// Run `job` on the pool. The returned future resolves once the worker
    /// answers; if it is dropped first, a job that has not started is skipped.
    fn spawn<T, F>(&self, label: String, job: F) -> LocalBoxFuture<'static, Result<T, AssetError>>
    where
        T: Send + 'static,
        F: FnOnce(&AssetDir) -> Result<T, AssetError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let dir = self.dir.clone();
        self.pool.spawn_ok(async move {
            if tx.is_canceled() {
                return;
            }
            let _ = tx.send(job(&dir));
        });
        rx.map(move |answer| answer.unwrap_or_else(|_| Err(AssetError::Abandoned(label))))
            .boxed_local()
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_model(&self, source: &ModelSource) -> LocalBoxFuture<'static, Result<ModelData, AssetError>> {
        let source = source.clone();
        self.spawn(source.label().to_string(), move |dir| dir.decode_model(&source))
    }

    fn load_texture(&self, path: &str) -> LocalBoxFuture<'static, Result<TextureData, AssetError>> {
        let path = path.to_string();
        self.spawn(path.clone(), move |dir| dir.decode_texture(&path))
    }

    fn load_font(&self, path: &str) -> LocalBoxFuture<'static, Result<FontData, AssetError>> {
        let path = path.to_string();
        self.spawn(path.clone(), move |dir| dir.decode_font(&path))
    }

    fn load_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, AssetError>> {
        let path = path.to_string();
        self.spawn(path.clone(), move |dir| dir.read_text(&path))
    }
}

/// The synchronous half of the loader, run on worker threads.
#[derive(Debug, Clone)]
struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches("./"))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.resolve(path);
        tracing::debug!(path, resolved = %full.display(), "reading asset");
        std::fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
            _ => AssetError::Io {
                path: path.to_string(),
                source,
            },
        })
    }

    fn read_text(&self, path: &str) -> Result<String, AssetError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| AssetError::Encoding {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode_model(&self, source: &ModelSource) -> Result<ModelData, AssetError> {
        match source {
            ModelSource::Gltf { path } => {
                let bytes = self.read(path)?;
                decode_gltf(path, &bytes)
            }
            ModelSource::ObjMtl { obj, mtl } => {
                let mtl_bytes = self.read(mtl)?;
                let obj_bytes = self.read(obj)?;
                decode_obj(obj, &obj_bytes, &mtl_bytes)
            }
        }
    }

    fn decode_texture(&self, path: &str) -> Result<TextureData, AssetError> {
        let bytes = self.read(path)?;
        let image_err = |reason: String| AssetError::Image {
            path: path.to_string(),
            reason,
        };
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| image_err(e.to_string()))?
            .into_dimensions()
            .map_err(|e| image_err(e.to_string()))?;

        let mapping = match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("exr") | Some("hdr") => TextureMapping::EquirectangularReflection,
            _ => TextureMapping::Uv,
        };
        Ok(TextureData {
            path: path.to_string(),
            width,
            height,
            byte_len: bytes.len(),
            digest: ContentDigest::of(&bytes),
            mapping,
            wrap: Default::default(),
        })
    }

    fn decode_font(&self, path: &str) -> Result<FontData, AssetError> {
        let text = self.read_text(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let glyph_count = value
            .get("glyphs")
            .and_then(|g| g.as_object())
            .map(|g| g.len())
            .ok_or_else(|| AssetError::Font {
                path: path.to_string(),
                reason: "missing glyph table".into(),
            })?;
        let family = value
            .get("familyName")
            .and_then(|n| n.as_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(FontData {
            path: path.to_string(),
            family,
            glyph_count,
        })
    }
}

/// Describe a `.gltf` or `.glb` document. External buffers are not fetched.
fn decode_gltf(path: &str, bytes: &[u8]) -> Result<ModelData, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| AssetError::Gltf {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let mut meshes = Vec::new();
    for mesh in gltf.meshes() {
        let name = mesh.name().unwrap_or("unnamed");
        for (j, primitive) in mesh.primitives().enumerate() {
            let vertex_count = primitive
                .get(&gltf::Semantic::Positions)
                .map(|a| a.count() as u32)
                .unwrap_or(0);
            let index_count = primitive
                .indices()
                .map(|a| a.count() as u32)
                .unwrap_or(vertex_count);
            meshes.push(MeshInfo {
                name: format!("{name}_{}.{j}", mesh.index()),
                vertex_count,
                index_count,
                material: primitive.material().index(),
            });
        }
    }

    let materials = gltf
        .materials()
        .enumerate()
        .map(|(i, material)| MaterialInfo {
            name: format!("{}_{i}", material.name().unwrap_or("unnamed")),
            base_color: material.pbr_metallic_roughness().base_color_factor(),
        })
        .collect();

    Ok(ModelData {
        source: path.to_string(),
        meshes,
        materials,
        digest: ContentDigest::of(bytes),
    })
}

/// Describe an OBJ mesh with the materials of its companion MTL file.
fn decode_obj(path: &str, obj: &[u8], mtl: &[u8]) -> Result<ModelData, AssetError> {
    let obj_err = |reason: String| AssetError::Obj {
        path: path.to_string(),
        reason,
    };
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let mut obj_reader = obj;
    let (models, obj_materials) = tobj::load_obj_buf(&mut obj_reader, &options, |_| {
        let mut mtl_reader = mtl;
        tobj::load_mtl_buf(&mut mtl_reader)
    })
    .map_err(|e| obj_err(e.to_string()))?;

    let mut materials = obj_materials.map_err(|e| obj_err(e.to_string()))?;
    // Catalog pairs the MTL explicitly, so an OBJ without `mtllib` still gets it.
    if materials.is_empty() {
        let mut mtl_reader = mtl;
        materials = tobj::load_mtl_buf(&mut mtl_reader)
            .map_err(|e| obj_err(e.to_string()))?
            .0;
    }

    let materials = materials
        .into_iter()
        .map(|m| {
            let mut base_color = MaterialInfo::default().base_color;
            if let Some(diffuse) = m.diffuse {
                base_color[..3].copy_from_slice(&diffuse);
            }
            if let Some(alpha) = m.dissolve {
                base_color[3] = alpha;
            }
            MaterialInfo {
                name: m.name,
                base_color,
            }
        })
        .collect();

    let meshes = models
        .into_iter()
        .map(|model| MeshInfo {
            name: model.name,
            vertex_count: (model.mesh.positions.len() / 3) as u32,
            index_count: model.mesh.indices.len() as u32,
            material: model.mesh.material_id,
        })
        .collect();

    Ok(ModelData {
        source: path.to_string(),
        meshes,
        materials,
        digest: ContentDigest::of_all([obj, mtl]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::borrow::Cow;
    use std::task::Context;

    // 24 VEC3 floats then 36 u16 indices.
    const GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "buffers": [ { "byteLength": 360, "uri": "bench.bin" } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 288 },
            { "buffer": 0, "byteOffset": 288, "byteLength": 72 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 24, "type": "VEC3",
              "min": [-1.0, 0.0, -0.5], "max": [1.0, 0.8, 0.5] },
            { "bufferView": 1, "componentType": 5123, "count": 36, "type": "SCALAR" }
        ],
        "meshes": [
            { "name": "seat", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
        ],
        "materials": [
            { "name": "wood", "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 0.125, 1.0] } }
        ]
    }"#;

    fn write(dir: &Path, rel: &str, contents: &[u8]) {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    fn loader_at(root: &Path) -> FsAssetLoader {
        FsAssetLoader::with_workers(root, 1).unwrap()
    }

    /// The same document packed as a binary container with an embedded buffer.
    fn glb() -> Vec<u8> {
        let json = GLTF.replace(r#", "uri": "bench.bin""#, "");
        gltf::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: 0,
            },
            json: Cow::Owned(json.into_bytes()),
            bin: Some(Cow::Owned(vec![0u8; 360])),
        }
        .to_vec()
        .unwrap()
    }

    fn encoded(image: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn resolves_dot_relative_paths() {
        let loader = FsAssetLoader::new("/srv/garden").unwrap();
        assert_eq!(
            loader.dir.resolve("./assets/bench/bench.glb"),
            PathBuf::from("/srv/garden/assets/bench/bench.glb")
        );
    }

    #[test]
    fn decodes_gltf_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "assets/bench.gltf", GLTF.as_bytes());
        let loader = loader_at(dir.path());

        let model = block_on(loader.load_model(&ModelSource::gltf("./assets/bench.gltf"))).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].vertex_count, 24);
        assert_eq!(model.meshes[0].index_count, 36);
        assert_eq!(model.meshes[0].material, Some(0));
        assert_eq!(model.materials[0].name, "wood_0");
        assert_eq!(model.materials[0].base_color, [0.5, 0.25, 0.125, 1.0]);
        assert_eq!(model.primary_color(), [0.5, 0.25, 0.125, 1.0]);
    }

    #[test]
    fn decodes_binary_gltf() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = glb();
        write(dir.path(), "bench.glb", &bytes);
        let loader = loader_at(dir.path());

        let model = block_on(loader.load_model(&ModelSource::gltf("bench.glb"))).unwrap();
        assert_eq!(model.meshes[0].name, "seat_0.0");
        assert_eq!(model.meshes[0].index_count, 36);
        assert_eq!(model.digest, ContentDigest::of(&bytes));
    }

    #[test]
    fn rejects_glb_with_wrong_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = glb();
        bytes[4] = 1;
        write(dir.path(), "old.glb", &bytes);
        let loader = loader_at(dir.path());

        let err = block_on(loader.load_model(&ModelSource::gltf("old.glb"))).unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn decodes_obj_with_materials() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "maki.mtl",
            b"newmtl bark\nKd 0.4 0.2 0.1\nd 0.5\nnewmtl cut\nKd 0.9 0.8 0.6\n",
        );
        write(
            dir.path(),
            "maki.obj",
            b"mtllib maki.mtl\no log\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nusemtl cut\nf 1 2 3 4\no stump\nv 0 0 1\nv 1 0 1\nv 1 1 1\nf 5 6 7\n",
        );
        let loader = loader_at(dir.path());

        let model = block_on(loader.load_model(&ModelSource::obj_mtl("maki.obj", "maki.mtl")))
            .unwrap();
        assert_eq!(model.materials.len(), 2);
        assert_eq!(model.materials[0].base_color, [0.4, 0.2, 0.1, 0.5]);
        assert_eq!(model.materials[1].name, "cut");
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].name, "log");
        assert_eq!(model.meshes[0].vertex_count, 4);
        assert_eq!(model.meshes[0].index_count, 6);
        assert_eq!(model.meshes[0].material, Some(1));
        assert_eq!(model.meshes[1].name, "stump");
        assert_eq!(model.meshes[1].index_count, 3);
    }

    #[test]
    fn obj_without_mtllib_still_reads_paired_materials() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bare.mtl", b"newmtl moss\nKd 0.1 0.5 0.1\n");
        write(dir.path(), "bare.obj", b"v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n");
        let loader = loader_at(dir.path());

        let model = block_on(loader.load_model(&ModelSource::obj_mtl("bare.obj", "bare.mtl")))
            .unwrap();
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].base_color, [0.1, 0.5, 0.1, 1.0]);
    }

    #[test]
    fn obj_rejects_bad_position() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.mtl", b"");
        write(dir.path(), "bad.obj", b"v 0 0 zero\nv 1 0 0\nv 1 1 0\nf 1 2 3\n");
        let loader = loader_at(dir.path());

        let err = block_on(loader.load_model(&ModelSource::obj_mtl("bad.obj", "bad.mtl")))
            .unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_at(dir.path());
        let err = block_on(loader.load_texture("./textures/none.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(p) if p == "./textures/none.jpg"));
    }

    #[test]
    fn textures_report_dimensions_and_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let sky = encoded(
            image::DynamicImage::ImageRgb32F(image::Rgb32FImage::new(8, 4)),
            image::ImageFormat::OpenExr,
        );
        let normals = encoded(
            image::DynamicImage::ImageRgb8(image::RgbImage::new(16, 16)),
            image::ImageFormat::Jpeg,
        );
        write(dir.path(), "sky.exr", &sky);
        write(dir.path(), "normals.jpg", &normals);
        let loader = loader_at(dir.path());

        let sky_tex = block_on(loader.load_texture("sky.exr")).unwrap();
        assert_eq!(sky_tex.mapping, TextureMapping::EquirectangularReflection);
        assert_eq!((sky_tex.width, sky_tex.height), (8, 4));
        assert_eq!(sky_tex.byte_len, sky.len());
        let normals_tex = block_on(loader.load_texture("normals.jpg")).unwrap();
        assert_eq!(normals_tex.mapping, TextureMapping::Uv);
        assert_eq!((normals_tex.width, normals_tex.height), (16, 16));
    }

    #[test]
    fn undecodable_texture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "noise.jpg", b"not an image");
        let loader = loader_at(dir.path());
        let err = block_on(loader.load_texture("noise.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn decodes_typeface_font() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "fonts/helvetiker_bold.typeface.json",
            br#"{ "familyName": "Helvetiker", "glyphs": { "0": {}, "1": {}, ":": {} } }"#,
        );
        let loader = loader_at(dir.path());

        let font = block_on(loader.load_font("./fonts/helvetiker_bold.typeface.json")).unwrap();
        assert_eq!(font.family, "Helvetiker");
        assert_eq!(font.glyph_count, 3);
    }

    #[test]
    fn font_without_glyphs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.json", br#"{ "familyName": "Nothing" }"#);
        let loader = loader_at(dir.path());
        assert!(matches!(
            block_on(loader.load_font("empty.json")),
            Err(AssetError::Font { .. })
        ));
    }

    #[test]
    fn polling_a_load_never_runs_it_on_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bench.gltf", GLTF.as_bytes());
        let loader = loader_at(dir.path());

        // Occupy the only worker until released.
        let (release, gate) = std::sync::mpsc::channel::<()>();
        loader.pool.spawn_ok(async move {
            let _ = gate.recv();
        });

        let mut load = loader.load_model(&ModelSource::gltf("bench.gltf"));
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        for _ in 0..3 {
            assert!(load.poll_unpin(&mut cx).is_pending());
        }

        release.send(()).unwrap();
        let model = block_on(load).unwrap();
        assert_eq!(model.meshes.len(), 1);
    }

    #[test]
    fn dropped_load_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_at(dir.path());
        let (release, gate) = std::sync::mpsc::channel::<()>();
        loader.pool.spawn_ok(async move {
            let _ = gate.recv();
        });

        drop(loader.load_text("never.txt"));
        release.send(()).unwrap();
        // The pool keeps working after a skipped job.
        write(dir.path(), "note.txt", b"kept");
        assert_eq!(block_on(loader.load_text("note.txt")).unwrap(), "kept");
        assert!(matches!(
            block_on(loader.load_text("absent.txt")),
            Err(AssetError::NotFound(_))
        ));
    }
}
