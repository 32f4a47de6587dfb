use hairfx::error::AssetResult;
use hairfx::filters::{
    AssetStore, DirAssetStore, FilterAssetCache, MemoryAssetStore, EYES_FILE, HAIR_OVERLAY_FILE,
    MASK_FILE, METADATA_FILE,
};
use hairfx::PipelineConfig;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Wraps a store and records every existence check
struct LookupLog {
    inner: MemoryAssetStore,
    lookups: Mutex<Vec<String>>,
}

impl LookupLog {
    fn new(inner: MemoryAssetStore) -> Self {
        Self {
            inner,
            lookups: Mutex::new(Vec::new()),
        }
    }

    fn directory_lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|path| !path.ends_with(".png") && !path.ends_with(".json"))
            .cloned()
            .collect()
    }
}

impl AssetStore for LookupLog {
    fn exists(&self, path: &str) -> bool {
        self.lookups.lock().unwrap().push(path.to_string());
        self.inner.exists(path)
    }

    fn read(&self, path: &str) -> AssetResult<Vec<u8>> {
        self.inner.read(path)
    }
}

#[test]
fn miss_searches_face_then_hair_then_combo() {
    let store = Arc::new(LookupLog::new(
        MemoryAssetStore::new().with_file("filters/combo/punk_rocker/mask.png", png(4, 4)),
    ));
    let cache = FilterAssetCache::new(store.clone(), 1 << 20);

    let assets = cache.load("punk_rocker").unwrap();
    assert!(assets.mask.is_some());
    assert_eq!(
        store.directory_lookups(),
        vec![
            "filters/face/punk_rocker",
            "filters/hair/punk_rocker",
            "filters/combo/punk_rocker",
        ]
    );
}

#[test]
fn search_stops_at_the_first_matching_category() {
    let store = Arc::new(LookupLog::new(
        MemoryAssetStore::new()
            .with_file("filters/face/batman/mask.png", png(4, 4))
            .with_file("filters/hair/batman/hair_overlay.png", png(4, 4)),
    ));
    let cache = FilterAssetCache::new(store.clone(), 1 << 20);

    let assets = cache.load("batman").unwrap();
    assert!(assets.mask.is_some());
    assert!(assets.hair_overlay.is_none());
    assert_eq!(store.directory_lookups(), vec!["filters/face/batman"]);
}

#[test]
fn metadata_identifies_the_filter_directory() {
    let store = Arc::new(LookupLog::new(
        MemoryAssetStore::new()
            .with_file("filters/hair/rainbow/metadata.json", br#"{"version": "2"}"#.to_vec()),
    ));
    let cache = FilterAssetCache::new(store.clone(), 1 << 20);

    let assets = cache.load("rainbow").unwrap();
    assert_eq!(
        assets.metadata.as_ref().and_then(|m| m.version.as_deref()),
        Some("2")
    );
    let lookups = store.lookups.lock().unwrap().clone();
    assert_eq!(
        &lookups[..3],
        &[
            "filters/face/rainbow/metadata.json",
            "filters/face/rainbow",
            "filters/hair/rainbow/metadata.json",
        ]
    );
    assert!(lookups.iter().all(|path| !path.starts_with("filters/combo/")));
}

#[test]
fn hit_does_not_touch_the_store() {
    let store = Arc::new(LookupLog::new(
        MemoryAssetStore::new().with_file("filters/face/batman/mask.png", png(4, 4)),
    ));
    let cache = FilterAssetCache::new(store.clone(), 1 << 20);

    let first = cache.load("batman").unwrap();
    let lookups = store.lookups.lock().unwrap().len();
    let second = cache.load("batman").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.lookups.lock().unwrap().len(), lookups);
}

#[test]
fn unknown_filter_is_none_and_not_cached() {
    let cache = FilterAssetCache::new(Arc::new(MemoryAssetStore::new()), 1 << 20);
    assert!(cache.load("does_not_exist").is_none());
    assert!(cache.is_empty());
}

#[test]
fn directory_without_files_loads_empty_assets() {
    let store = MemoryAssetStore::new().with_file("filters/hair/rainbow/readme.txt", b"hi".to_vec());
    let cache = FilterAssetCache::new(Arc::new(store), 1 << 20);

    let assets = cache.load("rainbow").unwrap();
    assert!(assets.is_empty());
}

#[test]
fn byte_budget_evicts_least_recently_used() {
    // every filter is one 16x16 RGBA overlay: 1024 bytes
    let store = ["tiger", "batman", "masquerade"]
        .iter()
        .fold(MemoryAssetStore::new(), |store, id| {
            store.with_file(format!("filters/face/{id}/{MASK_FILE}"), png(16, 16))
        });
    let cache = FilterAssetCache::new(Arc::new(store), 2048);

    cache.load("tiger").unwrap();
    cache.load("batman").unwrap();
    cache.load("tiger").unwrap();
    cache.load("masquerade").unwrap();

    assert!(cache.contains("tiger"));
    assert!(cache.contains("masquerade"));
    assert!(!cache.contains("batman"));
    assert!(cache.size_bytes() <= cache.capacity_bytes());
}

#[test]
fn capacity_comes_from_an_eighth_of_the_budget() {
    let config = PipelineConfig::default().with_memory_budget_mb(64);
    let cache = FilterAssetCache::from_config(Arc::new(MemoryAssetStore::new()), &config);
    assert_eq!(cache.capacity_bytes(), 8 * 1024 * 1024);
}

#[test]
fn preload_counts_found_filters_and_clear_empties() {
    let store = MemoryAssetStore::new()
        .with_file("filters/face/batman/mask.png", png(4, 4))
        .with_file("filters/hair/neon_pink/hair_overlay.png", png(4, 4));
    let cache = FilterAssetCache::new(Arc::new(store), 1 << 20);

    assert_eq!(cache.preload(&["batman", "neon_pink", "tiger"]), 2);
    assert_eq!(cache.len(), 2);

    let held = cache.load("batman").unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.size_bytes(), 0);
    assert!(held.mask.is_some());
}

#[test]
fn directory_store_reads_all_layers() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("filters").join("combo").join("cyber_queen");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MASK_FILE), png(8, 4)).unwrap();
    std::fs::write(dir.join(EYES_FILE), png(4, 4)).unwrap();
    std::fs::write(dir.join(HAIR_OVERLAY_FILE), png(8, 8)).unwrap();
    std::fs::write(
        dir.join(METADATA_FILE),
        r#"{"author": "studio", "tags": ["neon", "punk"]}"#,
    )
    .unwrap();

    let config = PipelineConfig::default().with_asset_root(root.path());
    let store = DirAssetStore::new(root.path());
    let cache = FilterAssetCache::from_config(Arc::new(store), &config);

    let assets = cache.load("cyber_queen").unwrap();
    assert_eq!(assets.mask.as_ref().map(|m| m.dimensions()), Some((8, 4)));
    assert!(assets.eyes.is_some());
    assert!(assets.hair_overlay.is_some());
    let metadata = assets.metadata.as_ref().unwrap();
    assert_eq!(metadata.author.as_deref(), Some("studio"));
    assert_eq!(metadata.tags, vec!["neon", "punk"]);
}

#[test]
fn broken_files_are_skipped() {
    let store = MemoryAssetStore::new()
        .with_file("filters/face/tiger/mask.png", b"not a png".to_vec())
        .with_file("filters/face/tiger/metadata.json", b"{".to_vec())
        .with_file("filters/face/tiger/eyes.png", png(2, 2));
    let cache = FilterAssetCache::new(Arc::new(store), 1 << 20);

    let assets = cache.load("tiger").unwrap();
    assert!(assets.mask.is_none());
    assert!(assets.metadata.is_none());
    assert!(assets.eyes.is_some());
}

#[test]
fn overlapping_loads_and_preloads_stay_within_budget() {
    let ids = ["batman", "tiger", "neon_pink", "punk_rocker"];
    let store = MemoryAssetStore::new()
        .with_file("filters/face/batman/mask.png", png(16, 16))
        .with_file("filters/face/tiger/eyes.png", png(16, 16))
        .with_file("filters/hair/neon_pink/hair_overlay.png", png(16, 16))
        .with_file("filters/combo/punk_rocker/mask.png", png(16, 16));
    // room for two of the four 1 KiB filters
    let cache = Arc::new(FilterAssetCache::new(Arc::new(store), 2048));

    for _ in 0..20 {
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        assert_eq!(cache.preload(&ids[..]), ids.len());
                    } else {
                        for id in ids.iter().cycle().skip(i).take(8) {
                            assert!(cache.load(id).is_some(), "{id}");
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.size_bytes() <= cache.capacity_bytes());
        assert!(cache.len() <= 2);
    }
}
