//! Real-time camera frame pipeline: planar frame conversion, single-slot
//! backpressure, hair/face analysis and layered filter compositing.

pub mod capture;
pub mod config;
pub mod convert;
pub mod error;
pub mod filters;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use config::PipelineConfig;
pub use convert::{PackedImage, PixelFormatConverter, ScratchBuffers};
pub use error::{AnalysisError, AssetError, CompositeError, ConversionError, PipelineError};
pub use filters::{FilterAssetCache, FilterCompositor, FilterDefinition};
pub use pipeline::{CaptureRecord, FramePipeline, PipelinePhase, PipelineState};
pub use segmentation::{AnalysisResult, HairAnalyzer};
