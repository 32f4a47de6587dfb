mod frame;
mod synthetic;
#[cfg(feature = "webcam")]
mod v4l_capture;
mod yuv;

pub use frame::{Plane, RawFrame};
pub use synthetic::SyntheticCapture;
#[cfg(feature = "webcam")]
pub use v4l_capture::WebcamCapture;
pub use yuv::{encode_yuv420, rgb_to_yuv, ChromaLayout};

use anyhow::Result;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame in 4:2:0 planar layout
    fn capture_frame(&mut self) -> Result<RawFrame>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
