use super::preprocess::Preprocessor;
use super::types::{AnalysisResult, AnalyzerMode, HairAnalyzer};
use crate::error::{AnalysisError, AnalyzeResult};
use anyhow::{Context, Result};
use image::RgbaImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// Binary hair segmentation network run through ONNX Runtime.
///
/// Expects one `[1, 3, H, W]` float input and a `[1, 1, H, W]` (or
/// `[1, H, W]`) hair probability output. It does not locate faces.
pub struct OnnxHairSegmenter {
    session: Mutex<Session>,
    preprocessor: Preprocessor,
}

impl OnnxHairSegmenter {
    /// Create a segmenter from an ONNX file
    ///
    /// # Default Configuration
    /// - Input size: 256x256
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading hair segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let preprocessor = Preprocessor::new(256, 256);
        let (input_width, input_height) = preprocessor.input_size();
        tracing::info!(
            "Hair segmentation model loaded successfully (input {}x{})",
            input_width,
            input_height
        );

        Ok(Self {
            session: Mutex::new(session),
            preprocessor,
        })
    }

    fn run(&self, frame: &RgbaImage) -> Result<(Vec<f32>, u32, u32)> {
        let input_tensor = self.preprocessor.preprocess(frame);

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = session
            .run(ort::inputs![TensorRef::from_array_view(input_tensor.view())?])
            .context("Failed to run inference")?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        let (matte_height, matte_width) = match dims.as_slice() {
            [.., h, w] => (*h as u32, *w as u32),
            _ => anyhow::bail!("unexpected output shape {:?}", dims),
        };

        Ok((data.to_vec(), matte_width, matte_height))
    }
}

impl HairAnalyzer for OnnxHairSegmenter {
    fn analyze(&self, frame: &RgbaImage) -> AnalyzeResult<AnalysisResult> {
        let _span = tracing::debug_span!("onnx_segment").entered();

        let (matte, matte_width, matte_height) = self
            .run(frame)
            .map_err(|e| AnalysisError::Segmentation(format!("{e:#}")))?;

        let (width, height) = frame.dimensions();
        let confidence = Preprocessor::matte_confidence(&matte);
        let mask = Preprocessor::matte_to_mask(&matte, matte_width, matte_height, width, height);

        Ok(AnalysisResult::new(Some(mask), None, confidence))
    }

    fn mode(&self) -> AnalyzerMode {
        AnalyzerMode::Model
    }
}
