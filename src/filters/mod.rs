//! Filter catalog, asset loading and compositing.

mod assets;
mod blend;
mod cache;
pub mod catalog;
mod compositor;
pub mod draw;

pub use assets::{
    load_filter_assets, AssetStore, DirAssetStore, FilterAssets, FilterMetadata,
    MemoryAssetStore, EYES_FILE, HAIR_OVERLAY_FILE, MASK_FILE, METADATA_FILE,
};
pub use blend::{blend_pixel, BlendMode};
pub use cache::{ByteLru, FilterAssetCache};
pub use catalog::{FilterCategory, FilterDefinition};
pub use compositor::{compose, FilterCompositor, EYE_ALPHA, FACE_MASK_ALPHA, HAIR_ALPHA};
