mod loopback;

pub use loopback::{rgba_to_yuyv, V4L2Output};

use anyhow::Result;
use image::RgbaImage;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}
