#[cfg(feature = "onnx")]
mod onnx;
mod placeholder;
mod preprocess;
pub mod types;

#[cfg(feature = "onnx")]
pub use onnx::OnnxHairSegmenter;
pub use placeholder::{PlaceholderAnalyzer, PLACEHOLDER_CONFIDENCE};
pub use preprocess::Preprocessor;
pub use types::{
    AnalysisResult, AnalyzerMode, BoundingBox, FaceLandmarks, HairAnalyzer, Landmark, Point,
    SegmentationMask, CONFIDENCE_THRESHOLD,
};

use std::sync::Arc;

/// Create the analyzer for an optional model path.
///
/// Without a path (or without the `onnx` feature) this is the placeholder.
#[cfg(feature = "onnx")]
pub fn create_analyzer(model_path: Option<&str>) -> anyhow::Result<Arc<dyn HairAnalyzer>> {
    match model_path {
        Some(path) => Ok(Arc::new(OnnxHairSegmenter::new(path)?)),
        None => Ok(Arc::new(PlaceholderAnalyzer::new())),
    }
}

#[cfg(not(feature = "onnx"))]
pub fn create_analyzer(model_path: Option<&str>) -> anyhow::Result<Arc<dyn HairAnalyzer>> {
    if let Some(path) = model_path {
        anyhow::bail!("model {path} given but hairfx was built without the `onnx` feature");
    }
    Ok(Arc::new(PlaceholderAnalyzer::new()))
}
