use super::types::{
    AnalysisResult, AnalyzerMode, BoundingBox, FaceLandmarks, HairAnalyzer, Landmark, Point,
    SegmentationMask,
};
use crate::error::AnalyzeResult;
use image::{Luma, RgbaImage};

/// Confidence reported by placeholder results
pub const PLACEHOLDER_CONFIDENCE: f32 = 0.3;

/// Analyzer used when no model is available.
///
/// Produces the same geometry for every frame of a given size: an oval
/// "hair" region over the top of the frame and a centred face, so filters
/// still render while inference is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAnalyzer;

impl PlaceholderAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn placeholder_result(width: u32, height: u32) -> AnalysisResult {
        let w = width as f32;
        let h = height as f32;

        let face = FaceLandmarks::new(BoundingBox::new(0.3 * w, 0.25 * h, 0.7 * w, 0.65 * h))
            .with_point(Landmark::LeftEye, Point::new(0.4 * w, 0.4 * h))
            .with_point(Landmark::RightEye, Point::new(0.6 * w, 0.4 * h))
            .with_point(Landmark::NoseTip, Point::new(0.5 * w, 0.5 * h))
            .with_point(Landmark::MouthCenter, Point::new(0.5 * w, 0.58 * h));

        AnalysisResult::new(
            Some(oval_mask(width, height)),
            Some(face),
            PLACEHOLDER_CONFIDENCE,
        )
    }
}

/// Ellipse covering the upper-middle of the frame
fn oval_mask(width: u32, height: u32) -> SegmentationMask {
    let cx = width as f32 / 2.0;
    let cy = height as f32 * 0.3;
    let rx = (width as f32 * 0.35).max(1.0);
    let ry = (height as f32 * 0.25).max(1.0);

    SegmentationMask::from_fn(width, height, |x, y| {
        let dx = (x as f32 + 0.5 - cx) / rx;
        let dy = (y as f32 + 0.5 - cy) / ry;
        if dx * dx + dy * dy <= 1.0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

impl HairAnalyzer for PlaceholderAnalyzer {
    fn analyze(&self, frame: &RgbaImage) -> AnalyzeResult<AnalysisResult> {
        let (width, height) = frame.dimensions();
        Ok(Self::placeholder_result(width, height))
    }

    fn mode(&self) -> AnalyzerMode {
        AnalyzerMode::Unavailable
    }
}
