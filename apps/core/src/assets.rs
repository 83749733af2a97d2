use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::model::{Asset, ImageHandle};

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    NotFound { index: usize, table_len: usize },
    Factory(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { index, table_len } => {
                write!(f, "asset {index} not found (table has {table_len} assets)")
            }
            Self::Factory(error) => write!(f, "asset handle creation failed: {error}"),
        }
    }
}

impl std::error::Error for AssetError {}

/// Creates and releases the process resources backing image handles.
pub trait AssetFactory {
    fn create(&mut self, asset: &Asset) -> Result<ImageHandle, AssetError>;
    fn release(&mut self, handle: &ImageHandle);
}

/// In-process blob registry: every handle gets a unique `blob:` URL that stays live
/// until released.
#[derive(Debug, Default)]
pub struct BlobFactory {
    next_id: u64,
    live: HashSet<String>,
}

impl BlobFactory {
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.contains(url)
    }
}

impl AssetFactory for BlobFactory {
    fn create(&mut self, asset: &Asset) -> Result<ImageHandle, AssetError> {
        if asset.data.is_empty() {
            return Err(AssetError::Factory("asset has no data".to_string()));
        }

        let mime = if asset.mime.trim().is_empty() {
            FALLBACK_MIME.to_string()
        } else {
            asset.mime.trim().to_string()
        };

        self.next_id += 1;
        let url = format!("blob:flick/{}", self.next_id);
        self.live.insert(url.clone());
        Ok(ImageHandle::new(url, mime, asset.data.len()))
    }

    fn release(&mut self, handle: &ImageHandle) {
        self.live.remove(handle.url());
    }
}

/// Memoizes handles by asset index. Handles are released when the cache is cleared or
/// dropped.
pub struct AssetCache<F: AssetFactory = BlobFactory> {
    factory: F,
    handles: HashMap<usize, Rc<ImageHandle>>,
    created: usize,
}

impl Default for AssetCache<BlobFactory> {
    fn default() -> Self {
        Self::new(BlobFactory::default())
    }
}

impl<F: AssetFactory> AssetCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            handles: HashMap::new(),
            created: 0,
        }
    }

    pub fn resolve(
        &mut self,
        index: usize,
        assets: &[Asset],
    ) -> Result<Rc<ImageHandle>, AssetError> {
        if let Some(handle) = self.handles.get(&index) {
            return Ok(Rc::clone(handle));
        }

        let asset = assets.get(index).ok_or(AssetError::NotFound {
            index,
            table_len: assets.len(),
        })?;
        let handle = Rc::new(self.factory.create(asset)?);
        self.created += 1;
        self.handles.insert(index, Rc::clone(&handle));
        Ok(handle)
    }

    /// Releases every handle. Indices may refer to different content afterwards, so
    /// nothing is kept.
    pub fn clear(&mut self) {
        for (_, handle) in self.handles.drain() {
            self.factory.release(&handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of handles created over the cache's lifetime.
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: AssetFactory> Drop for AssetCache<F> {
    fn drop(&mut self) {
        self.clear();
    }
}
