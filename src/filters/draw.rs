//! The handful of 2D drawing primitives the compositor is built on.

use super::blend::{blend_pixel, BlendMode};
use image::{imageops, GrayImage, RgbaImage};

/// Paint alpha as a fraction, Android style (`alpha / 255`)
pub fn paint_opacity(alpha: u8) -> f32 {
    alpha as f32 / 255.0
}

/// Bilinear scale. Returns `None` for non-positive target sizes.
pub fn scale(src: &RgbaImage, width: i64, height: i64) -> Option<RgbaImage> {
    if width <= 0 || height <= 0 || width > u32::MAX as i64 || height > u32::MAX as i64 {
        return None;
    }
    let (width, height) = (width as u32, height as u32);
    if src.dimensions() == (width, height) {
        return Some(src.clone());
    }
    Some(imageops::resize(src, width, height, imageops::FilterType::Triangle))
}

/// Draw `src` with its top-left corner at (`x`, `y`), clipped to `dst`
pub fn draw_image(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    x: i64,
    y: i64,
    opacity: f32,
    mode: BlendMode,
) {
    if opacity <= 0.0 {
        return;
    }
    let (dst_w, dst_h) = (dst.width() as i64, dst.height() as i64);
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + src_w).min(dst_w);
    let y1 = (y + src_h).min(dst_h);

    for dy in y0..y1 {
        for dx in x0..x1 {
            let source = *src.get_pixel((dx - x) as u32, (dy - y) as u32);
            blend_pixel(dst.get_pixel_mut(dx as u32, dy as u32), source, opacity, mode);
        }
    }
}

/// Destination-in: keep `dst` only where `mask` is opaque.
///
/// Mask luma is read as alpha. Dimensions must already match.
pub fn mask_in(dst: &mut RgbaImage, mask: &GrayImage) {
    for (pixel, coverage) in dst.pixels_mut().zip(mask.pixels()) {
        let alpha = pixel[3] as u32 * coverage[0] as u32;
        pixel[3] = ((alpha + 127) / 255) as u8;
        if pixel[3] == 0 {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn scale_rejects_empty_targets() {
        let src = RgbaImage::new(4, 4);
        assert!(scale(&src, 0, 4).is_none());
        assert!(scale(&src, 4, -1).is_none());
        assert_eq!(scale(&src, 8, 2).map(|i| i.dimensions()), Some((8, 2)));
    }

    #[test]
    fn drawing_is_clipped_to_destination() {
        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        draw_image(&mut dst, &src, -2, 3, 1.0, BlendMode::Normal);

        assert_eq!(dst.get_pixel(0, 3), &Rgba([255, 255, 255, 255]));
        assert_eq!(dst.get_pixel(1, 3), &Rgba([255, 255, 255, 255]));
        assert_eq!(dst.get_pixel(2, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(dst.get_pixel(0, 2), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn draw_far_outside_touches_nothing() {
        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let before = dst.clone();
        let src = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        draw_image(&mut dst, &src, 100, -100, 1.0, BlendMode::Normal);
        assert_eq!(dst, before);
    }

    #[test]
    fn mask_in_clears_uncovered_pixels() {
        let mut dst = RgbaImage::from_pixel(2, 1, Rgba([50, 60, 70, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        mask_in(&mut dst, &mask);

        assert_eq!(dst.get_pixel(0, 0), &Rgba([50, 60, 70, 255]));
        assert_eq!(dst.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
    }
}
