//! Error types for each stage of the frame pipeline.
//!
//! Only [`AnalysisError`] ever reaches observers. The others are recovered
//! close to where they happen.

use thiserror::Error;

/// Raw frame could not be packed or decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("frame has {0} planes, expected 3")]
    MissingPlanes(usize),

    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("{plane} plane too small: need {needed} bytes, got {actual}")]
    PlaneTooSmall {
        plane: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("{plane} plane has zero pixel stride")]
    ZeroPixelStride { plane: &'static str },

    #[error("decode failed: {0}")]
    Decode(String),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

/// The analysis collaborator could not produce a result.
///
/// A low-confidence result is not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("hair segmentation failed: {0}")]
    Segmentation(String),

    #[error("face landmark detection failed: {0}")]
    Landmarks(String),

    #[error("model not loaded: {0}")]
    ModelUnavailable(String),
}

pub type AnalyzeResult<T> = Result<T, AnalysisError>;

/// A filter asset was missing or undecodable.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid metadata {path}: {source}")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Drawing a filter onto a frame failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("cannot composite onto an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },

    #[error("segmentation mask is {mask_width}x{mask_height}, frame is {width}x{height}")]
    MaskSizeMismatch {
        width: u32,
        height: u32,
        mask_width: u32,
        mask_height: u32,
    },
}

pub type CompositeResult<T> = Result<T, CompositeError>;

/// Caller misuse of the pipeline's public operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("failed to spawn frame worker: {0}")]
    WorkerSpawn(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
