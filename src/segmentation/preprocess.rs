use super::types::SegmentationMask;
use image::{imageops, GrayImage, RgbaImage};
use ndarray::Array4;

/// Preprocessor for converting frames to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    pub fn input_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Preprocess an RGBA frame into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Drop alpha, convert to float and normalize to [0, 1]
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, frame: &RgbaImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized;
        let source = if frame.dimensions() != (self.target_width, self.target_height) {
            resized = imageops::resize(
                frame,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        let (width, height) = source.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in source.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = pixel[channel] as f32 / 255.0;
            }
        }

        tensor
    }

    /// Turn a model matte (row-major, values 0.0-1.0) into a mask at frame size
    pub fn matte_to_mask(
        matte: &[f32],
        matte_width: u32,
        matte_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> SegmentationMask {
        let _span = tracing::debug_span!("postprocess").entered();

        let mask = GrayImage::from_fn(matte_width, matte_height, |x, y| {
            let idx = (y * matte_width + x) as usize;
            let value = matte.get(idx).copied().unwrap_or(0.0);
            image::Luma([(value * 255.0).round().clamp(0.0, 255.0) as u8])
        });

        if (matte_width, matte_height) == (target_width, target_height) {
            return mask;
        }

        imageops::resize(
            &mask,
            target_width,
            target_height,
            imageops::FilterType::Triangle,
        )
    }

    /// Mean probability of the pixels the matte counts as hair
    pub fn matte_confidence(matte: &[f32]) -> f32 {
        let (sum, count) = matte
            .iter()
            .filter(|value| **value > 0.5)
            .fold((0.0f32, 0usize), |(sum, count), value| (sum + value, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn tensor_is_nchw_and_normalized() {
        let frame = RgbaImage::from_pixel(4, 2, Rgba([255, 0, 51, 10]));
        let tensor = Preprocessor::new(4, 2).preprocess(&frame);

        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn frame_is_resized_to_model_input() {
        let frame = RgbaImage::new(64, 48);
        let preprocessor = Preprocessor::new(16, 12);
        let tensor = preprocessor.preprocess(&frame);
        let (width, height) = preprocessor.input_size();
        assert_eq!(tensor.shape(), &[1, 3, height as usize, width as usize]);
        assert_eq!(tensor.shape(), &[1, 3, 12, 16]);
    }

    #[test]
    fn matte_is_scaled_to_frame() {
        let matte = vec![1.0; 8 * 8];
        let mask = Preprocessor::matte_to_mask(&matte, 8, 8, 32, 24);
        assert_eq!(mask.dimensions(), (32, 24));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn confidence_ignores_background() {
        assert_eq!(Preprocessor::matte_confidence(&[0.1, 0.2]), 0.0);
        let confidence = Preprocessor::matte_confidence(&[0.0, 0.8, 1.0]);
        assert!((confidence - 0.9).abs() < 1e-6);
    }
}
