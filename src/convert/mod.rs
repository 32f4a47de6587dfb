//! Raw sensor frame to displayable image conversion.
//!
//! Conversion happens in two steps: the planar frame is packed into a single
//! NV21 buffer drawn from a [`ScratchBuffers`] arena, then a [`FrameDecoder`]
//! turns that buffer into an RGBA image.

mod decode;
mod nv21;
mod scratch;

pub use decode::{Bt601Decoder, FrameDecoder};
pub use nv21::{chroma_len, pack_nv21, ChromaPath, PackedFormat, PackedFrame};
pub use scratch::ScratchBuffers;

use crate::capture::RawFrame;
use crate::error::ConversionResult;
use image::RgbaImage;
use std::sync::Arc;

/// Displayable interleaved RGBA frame
pub type PackedImage = RgbaImage;

/// Converts planar 4:2:0 frames into [`PackedImage`]s
#[derive(Clone)]
pub struct PixelFormatConverter {
    decoder: Arc<dyn FrameDecoder>,
}

impl Default for PixelFormatConverter {
    fn default() -> Self {
        Self::new(Bt601Decoder)
    }
}

impl PixelFormatConverter {
    pub fn new(decoder: impl FrameDecoder + 'static) -> Self {
        Self {
            decoder: Arc::new(decoder),
        }
    }

    /// Convert one frame. The frame itself is left untouched; releasing it
    /// is the caller's job.
    pub fn convert(
        &self,
        frame: &RawFrame,
        scratch: &mut ScratchBuffers,
    ) -> ConversionResult<PackedImage> {
        let _span = tracing::debug_span!("convert", width = frame.width(), height = frame.height())
            .entered();

        let packed = pack_nv21(frame, scratch)?;
        tracing::trace!(path = ?packed.path, bytes = packed.data.len(), "packed frame");

        let decoded = self.decoder.decode(&packed);
        packed.recycle(scratch);
        decoded
    }
}
