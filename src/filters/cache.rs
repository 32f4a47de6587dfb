use super::assets::{load_filter_assets, AssetStore, FilterAssets, METADATA_FILE};
use super::catalog::FilterCategory;
use crate::config::PipelineConfig;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Least-recently-used map whose capacity is a byte budget.
///
/// Each entry carries a caller-supplied weight. Inserting past the budget
/// evicts the least recently used entries until the total fits again.
#[derive(Debug)]
pub struct ByteLru<V> {
    entries: HashMap<String, LruEntry<V>>,
    recency: BTreeMap<u64, String>,
    clock: u64,
    size: usize,
    capacity: usize,
}

#[derive(Debug)]
struct LruEntry<V> {
    value: V,
    weight: usize,
    stamp: u64,
}

impl<V: Clone> ByteLru<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            size: 0,
            capacity: capacity.max(1),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up `key`, marking it most recently used
    pub fn get(&mut self, key: &str) -> Option<V> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, key.to_string());
        Some(entry.value.clone())
    }

    /// Insert or replace `key`. Returns the keys evicted to make room.
    pub fn put(&mut self, key: String, value: V, weight: usize) -> Vec<String> {
        let weight = weight.max(1);
        if let Some(old) = self.entries.remove(&key) {
            self.recency.remove(&old.stamp);
            self.size -= old.weight;
        }

        let stamp = self.tick();
        self.recency.insert(stamp, key.clone());
        self.entries.insert(
            key,
            LruEntry {
                value,
                weight,
                stamp,
            },
        );
        self.size += weight;

        let mut evicted = Vec::new();
        while self.size > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.size -= entry.weight;
            }
            evicted.push(oldest);
        }
        evicted
    }

    pub fn evict_all(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.size = 0;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Cache of decoded filter overlays, keyed by filter id.
///
/// Safe to share between threads. Decoding on a miss happens outside the
/// lock, so two racing misses for one id may both decode; the later insert
/// wins.
pub struct FilterAssetCache {
    store: Arc<dyn AssetStore>,
    lru: Mutex<ByteLru<Arc<FilterAssets>>>,
}

impl FilterAssetCache {
    pub fn new(store: Arc<dyn AssetStore>, capacity_bytes: usize) -> Self {
        tracing::debug!(capacity_bytes, "creating filter asset cache");
        Self {
            store,
            lru: Mutex::new(ByteLru::new(capacity_bytes)),
        }
    }

    pub fn from_config(store: Arc<dyn AssetStore>, config: &PipelineConfig) -> Self {
        Self::new(store, config.cache_capacity_bytes())
    }

    fn lru(&self) -> MutexGuard<'_, ByteLru<Arc<FilterAssets>>> {
        self.lru.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Assets for `filter_id`, from cache or the store.
    ///
    /// `None` when no category directory holds the filter.
    pub fn load(&self, filter_id: &str) -> Option<Arc<FilterAssets>> {
        if let Some(hit) = self.lru().get(filter_id) {
            return Some(hit);
        }

        let dir = self.resolve_dir(filter_id)?;
        let assets = Arc::new(load_filter_assets(self.store.as_ref(), &dir));
        let bytes = assets.byte_size();
        tracing::debug!(filter = filter_id, bytes, "loaded filter assets");

        let evicted = self.lru().put(filter_id.to_string(), assets.clone(), bytes);
        for key in evicted {
            tracing::debug!(filter = %key, "evicted filter assets");
        }
        Some(assets)
    }

    fn resolve_dir(&self, filter_id: &str) -> Option<String> {
        // metadata marks a filter directory, but overlays alone are enough
        let found = FilterCategory::ALL.iter().find_map(|category| {
            let dir = format!("filters/{}/{}", category.dir_name(), filter_id);
            let present = self.store.exists(&format!("{dir}/{METADATA_FILE}"))
                || self.store.exists(&dir);
            present.then_some(dir)
        });
        if found.is_none() {
            tracing::debug!(filter = filter_id, "no asset directory for filter");
        }
        found
    }

    /// Load each id in order; returns how many were found
    pub fn preload<S: AsRef<str>>(&self, filter_ids: &[S]) -> usize {
        let loaded = filter_ids
            .iter()
            .filter(|id| self.load(id.as_ref()).is_some())
            .count();
        tracing::info!(requested = filter_ids.len(), loaded, "preloaded filter assets");
        loaded
    }

    /// Drop every cached entry. Assets already handed out stay valid.
    pub fn clear(&self) {
        let mut lru = self.lru();
        if !lru.is_empty() {
            tracing::debug!(entries = lru.len(), bytes = lru.size(), "clearing filter asset cache");
        }
        lru.evict_all();
    }

    pub fn contains(&self, filter_id: &str) -> bool {
        self.lru().contains(filter_id)
    }

    pub fn len(&self) -> usize {
        self.lru().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru().is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.lru().size()
    }

    pub fn capacity_bytes(&self) -> usize {
        self.lru().capacity()
    }
}
