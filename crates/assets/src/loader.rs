use futures::future::LocalBoxFuture;

use crate::AssetError;
use crate::catalog::ModelSource;
use crate::data::{FontData, ModelData, TextureData};

/// Asynchronous asset fetch-and-decode collaborator.
///
/// Every method returns a future that owns what it needs, so callers can
/// hold it past the borrow of the loader. A rejected future carries no
/// partial result. Futures are single-threaded (`!Send`) and are driven by
/// whoever owns them.
pub trait AssetLoader {
    fn load_model(&self, source: &ModelSource) -> LocalBoxFuture<'static, Result<ModelData, AssetError>>;

    fn load_texture(&self, path: &str) -> LocalBoxFuture<'static, Result<TextureData, AssetError>>;

    fn load_font(&self, path: &str) -> LocalBoxFuture<'static, Result<FontData, AssetError>>;

    fn load_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, AssetError>>;
}
