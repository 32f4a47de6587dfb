use super::assets::FilterAssets;
use super::blend::BlendMode;
use super::cache::FilterAssetCache;
use super::catalog::{FilterCategory, FilterDefinition};
use super::draw::{draw_image, mask_in, paint_opacity, scale};
use crate::convert::PackedImage;
use crate::error::{CompositeError, CompositeResult};
use crate::segmentation::{AnalysisResult, FaceLandmarks, Landmark, SegmentationMask};
use std::sync::Arc;

/// Paint alpha of the face mask overlay (~90%)
pub const FACE_MASK_ALPHA: u8 = 230;
/// Paint alpha of eye overlays (~78%)
pub const EYE_ALPHA: u8 = 200;
/// Paint alpha of the masked hair layer (~78%)
pub const HAIR_ALPHA: u8 = 200;

/// Face mask width relative to the face box width
const FACE_MASK_WIDTH_RATIO: f32 = 1.4;
/// Face mask vertical anchor relative to the box centre
const FACE_MASK_VERTICAL_RATIO: f32 = 0.7;
/// Eye overlay side relative to the face box width
const EYE_SIZE_RATIO: f32 = 0.15;

/// Renders filter overlays onto frames
pub struct FilterCompositor {
    cache: Arc<FilterAssetCache>,
}

impl FilterCompositor {
    pub fn new(cache: Arc<FilterAssetCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<FilterAssetCache> {
        &self.cache
    }

    /// Render `filter` onto a copy of `original`.
    ///
    /// Missing assets only skip their layer.
    pub fn apply(
        &self,
        original: &PackedImage,
        filter: &FilterDefinition,
        analysis: &AnalysisResult,
    ) -> CompositeResult<PackedImage> {
        let _span = tracing::debug_span!("composite", filter = filter.id).entered();

        let loaded = self.cache.load(filter.id);
        let empty = FilterAssets::default();
        let assets = loaded.as_deref().unwrap_or(&empty);
        compose(original, filter, analysis, assets)
    }
}

/// Render `filter` with explicit `assets`. `original` is never modified.
pub fn compose(
    original: &PackedImage,
    filter: &FilterDefinition,
    analysis: &AnalysisResult,
    assets: &FilterAssets,
) -> CompositeResult<PackedImage> {
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositeError::EmptyFrame { width, height });
    }

    let mut canvas = original.clone();
    match filter.category {
        FilterCategory::Face => draw_face(&mut canvas, analysis, assets),
        FilterCategory::Hair => draw_hair(&mut canvas, filter.blend_mode, analysis, assets)?,
        FilterCategory::Combo => {
            // hair goes last so its stencil is not painted over
            draw_face(&mut canvas, analysis, assets);
            draw_hair(&mut canvas, filter.blend_mode, analysis, assets)?;
        }
    }
    Ok(canvas)
}

fn draw_face(canvas: &mut PackedImage, analysis: &AnalysisResult, assets: &FilterAssets) {
    let Some(face) = analysis.face.as_ref() else {
        tracing::trace!("no face landmarks, skipping face layers");
        return;
    };
    let limit = overlay_limit(canvas);

    if let Some(mask) = assets.mask.as_ref() {
        draw_face_mask(canvas, face, mask, limit);
    }
    if let Some(eyes) = assets.eyes.as_ref() {
        draw_eyes(canvas, face, eyes, limit);
    }
}

/// Largest overlay side worth rendering; anything bigger is a bogus face box
fn overlay_limit(canvas: &PackedImage) -> i64 {
    canvas.width().max(canvas.height()) as i64 * 4
}

fn draw_face_mask(canvas: &mut PackedImage, face: &FaceLandmarks, mask: &PackedImage, limit: i64) {
    let bbox = face.bounding_box;
    if mask.width() == 0 {
        return;
    }
    let target_w = (bbox.width() * FACE_MASK_WIDTH_RATIO).round() as i64;
    let target_h =
        (mask.height() as f32 * target_w as f32 / mask.width() as f32).round() as i64;
    if target_w > limit || target_h > limit {
        return;
    }
    let Some(scaled) = scale(mask, target_w, target_h) else {
        return;
    };

    let x = (bbox.center_x() - target_w as f32 / 2.0).round() as i64;
    let y = (bbox.center_y() * FACE_MASK_VERTICAL_RATIO - target_h as f32 / 2.0).round() as i64;
    draw_image(
        canvas,
        &scaled,
        x,
        y,
        paint_opacity(FACE_MASK_ALPHA),
        BlendMode::Normal,
    );
}

fn draw_eyes(canvas: &mut PackedImage, face: &FaceLandmarks, eyes: &PackedImage, limit: i64) {
    let size = (face.bounding_box.width() * EYE_SIZE_RATIO).round() as i64;
    if size > limit {
        return;
    }
    let Some(scaled) = scale(eyes, size, size) else {
        return;
    };

    for eye in Landmark::EYES {
        let Some(point) = face.get(eye) else {
            tracing::trace!(landmark = eye.name(), "landmark missing, skipping eye overlay");
            continue;
        };
        let x = (point.x - size as f32 / 2.0).round() as i64;
        let y = (point.y - size as f32 / 2.0).round() as i64;
        draw_image(canvas, &scaled, x, y, paint_opacity(EYE_ALPHA), BlendMode::Normal);
    }
}

fn draw_hair(
    canvas: &mut PackedImage,
    mode: BlendMode,
    analysis: &AnalysisResult,
    assets: &FilterAssets,
) -> CompositeResult<()> {
    let Some(mask) = analysis.mask.as_ref() else {
        tracing::trace!("no segmentation mask, skipping hair layer");
        return Ok(());
    };
    let Some(overlay) = assets.hair_overlay.as_ref() else {
        return Ok(());
    };
    check_mask(canvas, mask)?;

    let (width, height) = canvas.dimensions();
    let Some(texture) = scale(overlay, width as i64, height as i64) else {
        return Ok(());
    };

    let mut working = canvas.clone();
    draw_image(&mut working, &texture, 0, 0, 1.0, mode);
    mask_in(&mut working, mask);
    draw_image(
        canvas,
        &working,
        0,
        0,
        paint_opacity(HAIR_ALPHA),
        BlendMode::Normal,
    );
    Ok(())
}

fn check_mask(canvas: &PackedImage, mask: &SegmentationMask) -> CompositeResult<()> {
    if canvas.dimensions() == mask.dimensions() {
        return Ok(());
    }
    Err(CompositeError::MaskSizeMismatch {
        width: canvas.width(),
        height: canvas.height(),
        mask_width: mask.width(),
        mask_height: mask.height(),
    })
}
