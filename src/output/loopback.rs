use super::OutputSink;
use crate::capture::rgb_to_yuv;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes processed frames to a v4l2loopback device as YUYV
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
            buffer: Vec::with_capacity((width * height * 2) as usize),
        })
    }
}

/// Convert an RGBA frame to YUV 4:2:2 (YUYV), reusing `out`'s allocation.
/// Alpha is ignored.
pub fn rgba_to_yuyv(frame: &RgbaImage, out: &mut Vec<u8>) {
    let (width, height) = frame.dimensions();
    out.clear();
    out.reserve((width * height * 2) as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let pixel1 = frame.get_pixel(x, y);
            let pixel2 = if x + 1 < width {
                frame.get_pixel(x + 1, y)
            } else {
                pixel1
            };

            let (y1, u1, v1) = rgb_to_yuv(pixel1[0], pixel1[1], pixel1[2]);
            let (y2, u2, v2) = rgb_to_yuv(pixel2[0], pixel2[1], pixel2[2]);

            // Average U and V for the pair of pixels
            let u = ((u1 as u16 + u2 as u16) / 2) as u8;
            let v = ((v1 as u16 + v2 as u16) / 2) as u8;

            // YUYV format: Y0 U Y1 V
            out.extend_from_slice(&[y1, u, y2, v]);
        }
    }
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        let resized;
        let frame = if frame.dimensions() != (self.width, self.height) {
            resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        rgba_to_yuyv(frame, &mut self.buffer);

        self.file
            .write_all(&self.buffer)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
