use super::nv21::{PackedFormat, PackedFrame};
use crate::error::{ConversionError, ConversionResult};
use image::RgbaImage;

/// Image codec that turns a packed buffer into a displayable RGBA image
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, packed: &PackedFrame) -> ConversionResult<RgbaImage>;
}

/// Direct full-range BT.601 NV21 decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct Bt601Decoder;

impl FrameDecoder for Bt601Decoder {
    fn decode(&self, packed: &PackedFrame) -> ConversionResult<RgbaImage> {
        match packed.format {
            PackedFormat::Nv21 => decode_nv21(packed),
        }
    }
}

fn decode_nv21(packed: &PackedFrame) -> ConversionResult<RgbaImage> {
    let w = packed.width as usize;
    let h = packed.height as usize;
    let cw = w / 2;
    let ch = h / 2;
    let y_size = packed.luma_len();

    if cw == 0 || ch == 0 || packed.data.len() < y_size + cw * ch * 2 {
        return Err(ConversionError::Decode(format!(
            "NV21 buffer of {} bytes does not fit {}x{}",
            packed.data.len(),
            packed.width,
            packed.height
        )));
    }

    let (luma, chroma) = packed.data.split_at(y_size);
    let mut rgba = vec![0u8; w * h * 4];

    for (row, out_row) in rgba.chunks_exact_mut(w * 4).enumerate() {
        let chroma_row = (row / 2).min(ch - 1) * cw * 2;
        let luma_row = &luma[row * w..(row + 1) * w];
        for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
            let c = chroma_row + (col / 2).min(cw - 1) * 2;
            let (r, g, b) = yuv_to_rgb(luma_row[col], chroma[c + 1], chroma[c]);
            out.copy_from_slice(&[r, g, b, 255]);
        }
    }

    RgbaImage::from_raw(packed.width, packed.height, rgba)
        .ok_or_else(|| ConversionError::Decode("RGBA buffer size mismatch".to_string()))
}

/// Convert full-range BT.601 YCbCr to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).round().clamp(0.0, 255.0) as u8;
    let g = (y - 0.344_136 * u - 0.714_136 * v).round().clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).round().clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::rgb_to_yuv;
    use crate::convert::nv21::ChromaPath;

    fn packed(width: u32, height: u32, data: Vec<u8>) -> PackedFrame {
        PackedFrame {
            width,
            height,
            format: PackedFormat::Nv21,
            path: ChromaPath::Contiguous,
            data,
        }
    }

    #[test]
    fn solid_colour_survives_round_trip_within_tolerance() {
        let (y, u, v) = rgb_to_yuv(200, 80, 40);
        let frame = packed(2, 2, vec![y, y, y, y, v, u]);
        let image = Bt601Decoder.decode(&frame).unwrap();
        for pixel in image.pixels() {
            assert!((pixel[0] as i32 - 200).abs() <= 2);
            assert!((pixel[1] as i32 - 80).abs() <= 2);
            assert!((pixel[2] as i32 - 40).abs() <= 2);
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn truncated_buffer_is_a_decode_error() {
        let frame = packed(4, 4, vec![0; 17]);
        assert!(matches!(
            Bt601Decoder.decode(&frame),
            Err(ConversionError::Decode(_))
        ));
    }
}
