//! Assets: the declarative model catalog, the asynchronous loader interface,
//! and a file-backed loader.
//!
//! The scene never touches raw bytes. It asks an [`AssetLoader`] for a model,
//! texture, font or text file and receives a future of decoded data.
//!
//! # Invariants
//! - Catalog entries are immutable once declared.
//! - A failed load carries no partial result.

mod catalog;
mod data;
mod fs;
mod loader;

pub use catalog::{AssetCatalog, AssetEntry, FoliageEntry, LoadTier, ModelSource};
pub use data::{
    ContentDigest, FontData, MaterialInfo, MeshInfo, ModelData, TextureData, TextureMapping,
    TextureWrap,
};
pub use fs::FsAssetLoader;
pub use loader::AssetLoader;

/// Errors from fetching or decoding an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8: {reason}")]
    Encoding { path: String, reason: String },
    #[error("image decode error in {path}: {reason}")]
    Image { path: String, reason: String },
    #[error("glTF parse error in {path}: {reason}")]
    Gltf { path: String, reason: String },
    #[error("OBJ/MTL parse error in {path}: {reason}")]
    Obj { path: String, reason: String },
    #[error("font error in {path}: {reason}")]
    Font { path: String, reason: String },
    #[error("malformed data in {path}: {reason}")]
    Malformed { path: String, reason: String },
    #[error("cannot start asset workers: {0}")]
    Workers(#[source] std::io::Error),
    #[error("asset worker stopped before finishing {0}")]
    Abandoned(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    "momiji-assets v0.1.0"
}
