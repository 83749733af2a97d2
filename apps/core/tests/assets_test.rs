use std::cell::RefCell;
use std::rc::Rc;

use flick_core::assets::{AssetCache, AssetError, AssetFactory, BlobFactory};
use flick_core::model::{Asset, ImageHandle};

#[derive(Default)]
struct Ledger {
    created: Vec<String>,
    released: Vec<String>,
}

#[derive(Clone, Default)]
struct CountingFactory {
    ledger: Rc<RefCell<Ledger>>,
}

impl AssetFactory for CountingFactory {
    fn create(&mut self, asset: &Asset) -> Result<ImageHandle, AssetError> {
        let mut ledger = self.ledger.borrow_mut();
        let url = format!("test:{}", ledger.created.len());
        ledger.created.push(url.clone());
        Ok(ImageHandle::new(url, asset.mime.clone(), asset.data.len()))
    }

    fn release(&mut self, handle: &ImageHandle) {
        self.ledger.borrow_mut().released.push(handle.url().to_string());
    }
}

fn png_table() -> Vec<Asset> {
    vec![
        Asset::new(vec![1, 2, 3], "image/png"),
        Asset::new(vec![4, 5], "image/png"),
    ]
}

#[test]
fn same_index_returns_identical_handle_without_recreating() {
    let factory = CountingFactory::default();
    let mut cache = AssetCache::new(factory.clone());
    let assets = png_table();

    let first = cache.resolve(0, &assets).unwrap();
    let second = cache.resolve(0, &assets).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(factory.ledger.borrow().created.len(), 1);
    assert_eq!(first.byte_len(), 3);
}

#[test]
fn different_indices_never_share_a_handle() {
    let mut cache = AssetCache::default();
    let assets = png_table();

    let first = cache.resolve(0, &assets).unwrap();
    let second = cache.resolve(1, &assets).unwrap();

    assert!(!Rc::ptr_eq(&first, &second));
    assert_ne!(first.url(), second.url());
    assert_eq!(cache.len(), 2);
}

#[test]
fn out_of_range_index_reports_asset_not_found() {
    let mut cache = AssetCache::default();
    let result = cache.resolve(7, &png_table());

    assert_eq!(
        result.unwrap_err(),
        AssetError::NotFound {
            index: 7,
            table_len: 2
        }
    );
    assert!(cache.is_empty());
}

#[test]
fn clear_releases_every_handle_and_forgets_indices() {
    let factory = CountingFactory::default();
    let mut cache = AssetCache::new(factory.clone());
    let assets = png_table();
    let before = cache.resolve(0, &assets).unwrap();
    cache.resolve(1, &assets).unwrap();

    cache.clear();

    let mut released = factory.ledger.borrow().released.clone();
    released.sort();
    assert_eq!(released, vec!["test:0".to_string(), "test:1".to_string()]);
    assert!(cache.is_empty());

    let after = cache.resolve(0, &assets).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(cache.created_count(), 3);
}

#[test]
fn dropping_the_cache_releases_handles() {
    let factory = CountingFactory::default();
    {
        let mut cache = AssetCache::new(factory.clone());
        cache.resolve(0, &png_table()).unwrap();
    }
    assert_eq!(factory.ledger.borrow().released, vec!["test:0".to_string()]);
}

#[test]
fn blob_factory_tracks_live_urls() {
    let mut cache = AssetCache::new(BlobFactory::default());
    let handle = cache.resolve(1, &png_table()).unwrap();

    assert!(handle.url().starts_with("blob:"));
    assert!(cache.factory().is_live(handle.url()));
    assert_eq!(cache.factory().live_count(), 1);

    cache.clear();
    assert_eq!(cache.factory().live_count(), 0);
}
