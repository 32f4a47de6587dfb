use crate::error::AnalyzeResult;
use image::{GrayImage, RgbaImage};
use std::collections::BTreeMap;

/// Confidence above which an analysis (and its landmarks) is trusted
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Per-pixel hair coverage: 0 = background, 255 = hair.
/// Dimensions match the analysed frame.
pub type SegmentationMask = GrayImage;

/// Named facial feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Landmark {
    LeftEye,
    RightEye,
    NoseTip,
    MouthCenter,
}

impl Landmark {
    pub const EYES: [Landmark; 2] = [Landmark::LeftEye, Landmark::RightEye];

    pub fn name(&self) -> &'static str {
        match self {
            Landmark::LeftEye => "eye-left",
            Landmark::RightEye => "eye-right",
            Landmark::NoseTip => "nose-tip",
            Landmark::MouthCenter => "mouth-center",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Face geometry found in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    pub bounding_box: BoundingBox,
    pub points: BTreeMap<Landmark, Point>,
}

impl FaceLandmarks {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            points: BTreeMap::new(),
        }
    }

    pub fn with_point(mut self, landmark: Landmark, point: Point) -> Self {
        self.points.insert(landmark, point);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<Point> {
        self.points.get(&landmark).copied()
    }
}

/// Output of one analysis pass. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub mask: Option<SegmentationMask>,
    pub face: Option<FaceLandmarks>,
    /// Overall confidence in [0, 1]
    pub confidence: f32,
}

impl AnalysisResult {
    pub fn new(mask: Option<SegmentationMask>, face: Option<FaceLandmarks>, confidence: f32) -> Self {
        Self {
            mask,
            face,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_confident(&self) -> bool {
        self.confidence > CONFIDENCE_THRESHOLD
    }

    pub fn has_confident_landmarks(&self) -> bool {
        self.face.is_some() && self.confidence > CONFIDENCE_THRESHOLD
    }
}

/// Whether an analyzer runs real inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerMode {
    Model,
    /// Inference is unavailable; results are deterministic placeholders
    Unavailable,
}

/// Trait for hair/face analysis backends
///
/// Implementations are shared between pipeline restarts, so they take
/// `&self` and synchronise any internal state themselves.
pub trait HairAnalyzer: Send + Sync {
    /// Analyse a frame
    ///
    /// # Returns
    /// * A mask the size of `frame`, optional face geometry and a confidence
    /// * `Err` only when no result could be produced at all
    fn analyze(&self, frame: &RgbaImage) -> AnalyzeResult<AnalysisResult>;

    fn mode(&self) -> AnalyzerMode;

    /// Reset internal state (for models with temporal/recurrent components)
    fn reset_state(&self) {}
}
