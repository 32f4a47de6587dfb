use crate::error::{AssetError, AssetResult};
use image::RgbaImage;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub const MASK_FILE: &str = "mask.png";
pub const EYES_FILE: &str = "eyes.png";
pub const HAIR_OVERLAY_FILE: &str = "hair_overlay.png";
pub const METADATA_FILE: &str = "metadata.json";

/// Read-only hierarchical byte store addressed by `/`-separated paths
pub trait AssetStore: Send + Sync {
    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> AssetResult<Vec<u8>>;
}

/// Asset store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl AssetStore for DirAssetStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn read(&self, path: &str) -> AssetResult<Vec<u8>> {
        std::fs::read(self.resolve(path)).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
            _ => AssetError::Io {
                path: path.to_string(),
                source,
            },
        })
    }
}

/// In-memory asset store, handy for bundled assets and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn exists(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        if self.files.contains_key(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.files.keys().any(|key| key.starts_with(&prefix))
    }

    fn read(&self, path: &str) -> AssetResult<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Descriptive data shipped with a filter in `metadata.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterMetadata {
    pub author: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Decoded overlays for one filter. Any of them may be absent.
///
/// Instances are shared between composites and must not be mutated.
#[derive(Debug, Clone, Default)]
pub struct FilterAssets {
    pub mask: Option<RgbaImage>,
    pub eyes: Option<RgbaImage>,
    pub hair_overlay: Option<RgbaImage>,
    pub metadata: Option<FilterMetadata>,
}

impl FilterAssets {
    /// Approximate decoded size, used as the cache weight
    pub fn byte_size(&self) -> usize {
        let images: usize = [&self.mask, &self.eyes, &self.hair_overlay]
            .into_iter()
            .flatten()
            .map(|image| image.as_raw().len())
            .sum();
        let metadata = self.metadata.as_ref().map_or(0, |meta| {
            meta.author.as_ref().map_or(0, String::len)
                + meta.version.as_ref().map_or(0, String::len)
                + meta.description.as_ref().map_or(0, String::len)
                + meta.tags.iter().map(String::len).sum::<usize>()
        });
        images + metadata
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_none()
            && self.eyes.is_none()
            && self.hair_overlay.is_none()
            && self.metadata.is_none()
    }
}

/// Load every asset found in `dir`, skipping the ones that are missing or broken
pub fn load_filter_assets(store: &dyn AssetStore, dir: &str) -> FilterAssets {
    FilterAssets {
        mask: load_optional(store, dir, MASK_FILE, decode_image),
        eyes: load_optional(store, dir, EYES_FILE, decode_image),
        hair_overlay: load_optional(store, dir, HAIR_OVERLAY_FILE, decode_image),
        metadata: load_optional(store, dir, METADATA_FILE, decode_metadata),
    }
}

fn load_optional<T>(
    store: &dyn AssetStore,
    dir: &str,
    file: &str,
    decode: fn(&str, &[u8]) -> AssetResult<T>,
) -> Option<T> {
    let path = format!("{dir}/{file}");
    if !store.exists(&path) {
        tracing::trace!(path, "asset not present");
        return None;
    }

    match store.read(&path).and_then(|bytes| decode(&path, &bytes)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "skipping filter asset");
            None
        }
    }
}

fn decode_image(path: &str, bytes: &[u8]) -> AssetResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|source| AssetError::Image {
            path: path.to_string(),
            source,
        })
}

fn decode_metadata(path: &str, bytes: &[u8]) -> AssetResult<FilterMetadata> {
    serde_json::from_slice(bytes).map_err(|source| AssetError::Metadata {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn memory_store_reports_directories() {
        let store = MemoryAssetStore::new().with_file("filters/face/batman/mask.png", png(1, 1));
        assert!(store.exists("filters/face/batman"));
        assert!(store.exists("filters/face"));
        assert!(!store.exists("filters/face/bat"));
        assert!(!store.exists("filters/hair/batman"));
    }

    #[test]
    fn partial_asset_sets_load() {
        let store = MemoryAssetStore::new()
            .with_file("filters/hair/glow/hair_overlay.png", png(4, 2))
            .with_file(
                "filters/hair/glow/metadata.json",
                br#"{"author":"studio","tags":["neon","pink"]}"#.to_vec(),
            );

        let assets = load_filter_assets(&store, "filters/hair/glow");
        assert!(assets.mask.is_none());
        assert!(assets.eyes.is_none());
        assert_eq!(assets.hair_overlay.as_ref().map(|i| i.dimensions()), Some((4, 2)));

        let metadata = assets.metadata.unwrap();
        assert_eq!(metadata.author.as_deref(), Some("studio"));
        assert_eq!(metadata.version, None);
        assert_eq!(metadata.tags, vec!["neon", "pink"]);
    }

    #[test]
    fn broken_files_are_skipped() {
        let store = MemoryAssetStore::new()
            .with_file("filters/face/x/mask.png", b"not a png".to_vec())
            .with_file("filters/face/x/metadata.json", b"{".to_vec());

        let assets = load_filter_assets(&store, "filters/face/x");
        assert!(assets.is_empty());
        assert_eq!(assets.byte_size(), 0);
    }

    #[test]
    fn byte_size_counts_decoded_pixels() {
        let assets = FilterAssets {
            eyes: Some(RgbaImage::new(10, 10)),
            hair_overlay: Some(RgbaImage::new(2, 5)),
            ..Default::default()
        };
        assert_eq!(assets.byte_size(), 400 + 40);
    }
}
