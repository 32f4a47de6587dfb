//! Frame admission, processing and state publication.

mod gate;
mod orchestrator;
mod state;

pub use gate::{AdmissionPermit, FrameGate};
pub use orchestrator::FramePipeline;
pub use state::{
    CaptureRecord, PipelinePhase, PipelineState, PipelineStats, ProcessedFrame,
    StatsSnapshot,
};
