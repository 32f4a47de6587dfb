use super::yuv::{encode_yuv420, ChromaLayout};
use super::{CaptureSource, RawFrame};
use anyhow::{ensure, Result};
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Moving colour-bar test pattern, for running the pipeline without a camera
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    layout: ChromaLayout,
    frame_index: u32,
    outstanding: Arc<AtomicUsize>,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width >= 2 && height >= 2,
            "synthetic capture needs at least 2x2 pixels, got {}x{}",
            width,
            height
        );

        tracing::info!("Initializing synthetic capture at {}x{}", width, height);

        Ok(Self {
            width,
            height,
            layout: ChromaLayout::Planar,
            frame_index: 0,
            outstanding: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_layout(mut self, layout: ChromaLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Frames handed out and not yet released
    pub fn outstanding_frames(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    fn pattern(&self) -> RgbImage {
        let shift = self.frame_index.wrapping_mul(4);
        let width = self.width;
        let height = self.height;
        RgbImage::from_fn(width, height, |x, y| {
            let band = ((x + shift) * 8 / width.max(1)) % 8;
            let shade = (y * 255 / height.max(1)) as u8;
            match band {
                0 => Rgb([255, 255, 255]),
                1 => Rgb([255, 255, shade]),
                2 => Rgb([shade, 255, 255]),
                3 => Rgb([0, 255, shade]),
                4 => Rgb([255, shade, 255]),
                5 => Rgb([255, 0, shade]),
                6 => Rgb([shade, 0, 255]),
                _ => Rgb([shade, shade, shade]),
            }
        })
    }
}

impl CaptureSource for SyntheticCapture {
    fn capture_frame(&mut self) -> Result<RawFrame> {
        let frame = encode_yuv420(&self.pattern(), self.layout);
        self.frame_index = self.frame_index.wrapping_add(1);

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let outstanding = self.outstanding.clone();
        Ok(frame.with_release_hook(move || {
            outstanding.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
