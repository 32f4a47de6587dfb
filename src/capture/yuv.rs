use super::frame::{Plane, RawFrame};
use image::RgbImage;

/// How chroma samples are laid out in the produced frame.
///
/// Different camera stacks hand out the same 4:2:0 data with different
/// stride metadata, so sources can pick the one their hardware reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaLayout {
    /// Separate U and V planes, pixel stride 1, no row padding
    #[default]
    Planar,
    /// U and V share one interleaved buffer (pixel stride 2)
    SemiPlanar,
    /// Planar, but every row (luma and chroma) carries trailing padding bytes
    Padded { row_padding: usize },
}

/// Convert RGB to full-range BT.601 YCbCr
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8;
    let u = (128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b)
        .round()
        .clamp(0.0, 255.0) as u8;
    let v = (128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b)
        .round()
        .clamp(0.0, 255.0) as u8;

    (y, u, v)
}

/// Encode an RGB image as a 4:2:0 planar [`RawFrame`].
///
/// Chroma is averaged over each 2x2 block. Odd trailing rows/columns only
/// contribute to luma.
pub fn encode_yuv420(rgb: &RgbImage, layout: ChromaLayout) -> RawFrame {
    let (width, height) = rgb.dimensions();
    let w = width as usize;
    let h = height as usize;
    let cw = w / 2;
    let ch = h / 2;

    let mut luma = vec![0u8; w * h];
    let mut u = vec![0u8; cw * ch];
    let mut v = vec![0u8; cw * ch];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (py, _, _) = rgb_to_yuv(pixel[0], pixel[1], pixel[2]);
        luma[y as usize * w + x as usize] = py;
    }

    for cy in 0..ch {
        for cx in 0..cw {
            let mut sum_u = 0u32;
            let mut sum_v = 0u32;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let p = rgb.get_pixel((cx * 2 + dx) as u32, (cy * 2 + dy) as u32);
                let (_, pu, pv) = rgb_to_yuv(p[0], p[1], p[2]);
                sum_u += pu as u32;
                sum_v += pv as u32;
            }
            u[cy * cw + cx] = ((sum_u + 2) / 4) as u8;
            v[cy * cw + cx] = ((sum_v + 2) / 4) as u8;
        }
    }

    let planes = match layout {
        ChromaLayout::Planar => vec![
            Plane::packed(luma, w),
            Plane::packed(u, cw),
            Plane::packed(v, cw),
        ],
        ChromaLayout::SemiPlanar => {
            let mut interleaved = Vec::with_capacity(cw * ch * 2);
            for (pu, pv) in u.iter().zip(v.iter()) {
                interleaved.push(*pu);
                interleaved.push(*pv);
            }
            // U starts at byte 0, V at byte 1 of the same buffer
            let v_plane = interleaved.get(1..).map(<[u8]>::to_vec).unwrap_or_default();
            let mut u_plane = interleaved;
            u_plane.pop();
            vec![
                Plane::packed(luma, w),
                Plane::new(u_plane, cw * 2, 2),
                Plane::new(v_plane, cw * 2, 2),
            ]
        }
        ChromaLayout::Padded { row_padding } => vec![
            Plane::new(pad_rows(&luma, w, h, row_padding), w + row_padding, 1),
            Plane::new(pad_rows(&u, cw, ch, row_padding), cw + row_padding, 1),
            Plane::new(pad_rows(&v, cw, ch, row_padding), cw + row_padding, 1),
        ],
    };

    RawFrame::new(width, height, planes)
}

fn pad_rows(data: &[u8], width: usize, height: usize, padding: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity((width + padding) * height);
    for row in data.chunks_exact(width.max(1)).take(height) {
        out.extend_from_slice(row);
        out.extend(std::iter::repeat(0xAA).take(padding));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_layout_has_expected_plane_sizes() {
        let rgb = RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]));
        let frame = encode_yuv420(&rgb, ChromaLayout::Planar);
        let planes = frame.planes();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].data.len(), 48);
        assert_eq!(planes[1].data.len(), 12);
        assert_eq!(planes[1].row_stride, 4);
        assert_eq!(planes[2].pixel_stride, 1);
    }

    #[test]
    fn semi_planar_planes_alias_one_buffer() {
        let rgb = RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 90]));
        let frame = encode_yuv420(&rgb, ChromaLayout::SemiPlanar);
        let u = &frame.planes()[1];
        let v = &frame.planes()[2];
        assert_eq!(u.pixel_stride, 2);
        assert_eq!(u.row_stride, 4);
        assert_eq!(u.data[2], u.data[0]);
        assert_eq!(v.data[0], u.data[1]);
    }

    #[test]
    fn grey_has_neutral_chroma() {
        let (y, u, v) = rgb_to_yuv(128, 128, 128);
        assert_eq!(y, 128);
        assert_eq!(u, 128);
        assert_eq!(v, 128);
    }
}
