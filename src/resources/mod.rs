//! Asset acquisition for effects.
//!
//! Effects name their visual asset by a fixed path and ask an [`AssetLoader`]
//! to prepare it. Prepared assets are immutable and shared through [`Arc`],
//! so thirty flares referencing the same texture hold one decoded copy.
//!
//! - [`FileLoader`] reads from an asset root (filesystem natively, HTTP on
//!   wasm32), decodes by file extension and caches per path
//! - [`MemoryLoader`] serves preloaded assets, handy for embedding and tests

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use cgmath::{InnerSpace, Vector3};
use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    data_structures::instance::Instance,
    error::{EffectError, Result},
};

pub mod animation;
pub mod mesh;
pub mod texture;

pub use mesh::MeshData;
pub use texture::Sprite;

/// Environment variable overriding the asset root of [`FileLoader::from_env`].
pub const ASSET_ROOT_ENV: &str = "FLOW_FX_ASSETS";

/// Bounding sphere in the asset's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vector3<f32>,
    pub radius: f32,
}

impl Bounds {
    pub fn new(center: Vector3<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing all `points`; a zero sphere when there are none.
    pub fn enclosing(points: impl IntoIterator<Item = [f32; 3]>) -> Self {
        let points: Vec<Vector3<f32>> = points.into_iter().map(Vector3::from).collect();
        let Some(first) = points.first() else {
            return Self::new(Vector3::new(0.0, 0.0, 0.0), 0.0);
        };
        let (min, max) = points.iter().fold((*first, *first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|p| (*p - center).magnitude())
            .fold(0.0_f32, f32::max);
        Self::new(center, radius)
    }

    /// The sphere after placing the asset with `instance`.
    pub fn transformed(&self, instance: &Instance) -> Self {
        let world = instance * &Instance::from(self.center);
        Self::new(world.position, self.radius * instance.max_scale())
    }
}

/// A prepared, immutable visual asset.
#[derive(Debug)]
pub enum Asset {
    Sprite(Sprite),
    Model(MeshData),
}

impl Asset {
    pub fn bounds(&self) -> Bounds {
        match self {
            Asset::Sprite(sprite) => sprite.bounds(),
            Asset::Model(mesh) => mesh.bounds,
        }
    }
}

/// Source of visual assets.
///
/// `prepare` may suspend. It fails with [`EffectError::AssetLoad`] when the
/// path is unknown or the data cannot be decoded.
pub trait AssetLoader {
    fn prepare<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Arc<Asset>>>;
}

/// Loader serving assets registered up front.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    assets: HashMap<String, Arc<Asset>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, asset: Asset) -> Self {
        self.insert(path, asset);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, asset: Asset) {
        self.assets.insert(path.into(), Arc::new(asset));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }
}

impl AssetLoader for MemoryLoader {
    fn prepare<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Arc<Asset>>> {
        let asset = self
            .assets
            .get(path)
            .cloned()
            .ok_or_else(|| EffectError::asset(path, "no such asset registered"));
        async move { asset }.boxed_local()
    }
}

/// Loader reading assets below a root directory (or URL base on wasm32).
#[derive(Debug)]
pub struct FileLoader {
    root: PathBuf,
    cache: RefCell<HashMap<String, Arc<Asset>>>,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Root from `FLOW_FX_ASSETS`, falling back to `./assets`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ASSET_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new("./").join("assets"));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }

    async fn decode(&self, path: &str) -> anyhow::Result<Asset> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .with_context(|| format!("`{path}` has no file extension"))?;
        match extension.as_str() {
            "obj" => {
                let text = self.load_string(path).await?;
                mesh::parse_obj(path, &text)
            }
            "glb" | "gltf" => {
                let bytes = self.load_binary(path).await?;
                let gltf = gltf::Gltf::from_slice(&bytes)
                    .with_context(|| format!("`{path}` is not a valid glTF document"))?;
                let parent = Path::new(path).parent().unwrap_or(Path::new(""));
                let mut buffers = Vec::new();
                for buffer in gltf.buffers() {
                    match buffer.source() {
                        gltf::buffer::Source::Bin => {
                            let blob = gltf
                                .blob
                                .as_deref()
                                .with_context(|| format!("`{path}` references a missing GLB blob"))?;
                            buffers.push(blob.to_vec());
                        }
                        gltf::buffer::Source::Uri(uri) => {
                            let relative = parent.join(uri);
                            let relative = relative.to_string_lossy();
                            buffers.push(self.load_binary(&relative).await?);
                        }
                    }
                }
                mesh::from_gltf(path, &gltf, &buffers)
            }
            _ => {
                let bytes = self.load_binary(path).await?;
                texture::decode_sprite(path, &bytes, Some(&extension))
            }
        }
    }

    pub async fn load_string(&self, file_name: &str) -> anyhow::Result<String> {
        let bytes = self.load_binary(file_name).await?;
        String::from_utf8(bytes).with_context(|| format!("`{file_name}` is not valid UTF-8"))
    }

    pub async fn load_binary(&self, file_name: &str) -> anyhow::Result<Vec<u8>> {
        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.format_url(file_name)?;
            reqwest::get(url).await?.bytes().await?.to_vec()
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            let path = self.root.join(file_name);
            // tokio::fs needs a runtime; plain executors such as block_on read inline
            let read = if tokio::runtime::Handle::try_current().is_ok() {
                tokio::fs::read(&path).await
            } else {
                std::fs::read(&path)
            };
            read.with_context(|| format!("cannot read {}", path.display()))?
        };

        Ok(data)
    }

    #[cfg(target_arch = "wasm32")]
    fn format_url(&self, file_name: &str) -> anyhow::Result<reqwest::Url> {
        let window = web_sys::window().context("no browser window")?;
        let origin = window
            .location()
            .origin()
            .map_err(|_| anyhow::anyhow!("window has no origin"))?;
        let base = reqwest::Url::parse(&format!("{}/{}/", origin, self.root.display()))?;
        Ok(base.join(file_name)?)
    }
}

impl AssetLoader for FileLoader {
    fn prepare<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Arc<Asset>>> {
        async move {
            let cached = self.cache.borrow().get(path).cloned();
            if let Some(asset) = cached {
                log::trace!("asset cache hit for {path}");
                return Ok(asset);
            }
            let asset = self.decode(path).await.map_err(|source| {
                log::warn!("asset {path} failed to load: {source:#}");
                EffectError::asset(path, source)
            })?;
            let asset = Arc::new(asset);
            self.cache
                .borrow_mut()
                .insert(path.to_owned(), Arc::clone(&asset));
            log::debug!("prepared asset {path}");
            Ok(asset)
        }
        .boxed_local()
    }
}
