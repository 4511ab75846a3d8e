//! Test doubles: a scripted asset loader and a hand-set clock.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use momiji_assets::{
    AssetError, AssetLoader, ContentDigest, FontData, MaterialInfo, MeshInfo, ModelData,
    ModelSource, TextureData, TextureMapping, TextureWrap,
};

use crate::clock::WallClock;

/// Loader whose outcomes are scripted per path. Unscripted paths succeed at once.
#[derive(Default)]
pub struct ScriptedLoader {
    failing: HashSet<String>,
    texts: HashMap<String, String>,
    held: RefCell<HashMap<String, VecDeque<oneshot::Receiver<bool>>>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn with_text(mut self, path: &str, contents: &str) -> Self {
        self.texts.insert(path.to_string(), contents.to_string());
        self
    }

    /// The next load of `path` waits until the sender fires: `true` succeeds, `false` fails.
    pub fn hold(&self, path: &str) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.held
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn respond<T: 'static>(
        &self,
        path: &str,
        value: Result<T, AssetError>,
    ) -> LocalBoxFuture<'static, Result<T, AssetError>> {
        self.requests.borrow_mut().push(path.to_string());
        let path = path.to_string();
        if self.failing.contains(&path) {
            return future::ready(Err(AssetError::NotFound(path))).boxed_local();
        }
        let held = self
            .held
            .borrow_mut()
            .get_mut(&path)
            .and_then(|queue| queue.pop_front());
        match held {
            Some(rx) => async move {
                match rx.await {
                    Ok(true) => value,
                    _ => Err(AssetError::NotFound(path)),
                }
            }
            .boxed_local(),
            None => future::ready(value).boxed_local(),
        }
    }
}

pub fn model(path: &str) -> ModelData {
    ModelData {
        source: path.to_string(),
        meshes: vec![MeshInfo {
            name: "mesh_0".into(),
            vertex_count: 24,
            index_count: 36,
            material: Some(0),
        }],
        materials: vec![MaterialInfo::default()],
        digest: ContentDigest::of(path.as_bytes()),
    }
}

impl AssetLoader for ScriptedLoader {
    fn load_model(&self, source: &ModelSource) -> LocalBoxFuture<'static, Result<ModelData, AssetError>> {
        let path = source.label();
        self.respond(path, Ok(model(path)))
    }

    fn load_texture(&self, path: &str) -> LocalBoxFuture<'static, Result<TextureData, AssetError>> {
        let texture = TextureData {
            path: path.to_string(),
            width: 1,
            height: 1,
            byte_len: 0,
            digest: ContentDigest::of(path.as_bytes()),
            mapping: TextureMapping::Uv,
            wrap: TextureWrap::ClampToEdge,
        };
        self.respond(path, Ok(texture))
    }

    fn load_font(&self, path: &str) -> LocalBoxFuture<'static, Result<FontData, AssetError>> {
        let font = FontData {
            path: path.to_string(),
            family: "Helvetiker".into(),
            glyph_count: 11,
        };
        self.respond(path, Ok(font))
    }

    fn load_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, AssetError>> {
        let text = self
            .texts
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()));
        self.respond(path, text)
    }
}

/// Clock the test sets by hand.
#[derive(Clone, Default)]
pub struct ManualClock(pub Rc<Cell<u32>>);

impl ManualClock {
    pub fn at(minute: u32) -> Self {
        Self(Rc::new(Cell::new(minute)))
    }

    pub fn set(&self, minute: u32) {
        self.0.set(minute);
    }
}

impl WallClock for ManualClock {
    fn minute_of_day(&self) -> u32 {
        self.0.get()
    }
}
