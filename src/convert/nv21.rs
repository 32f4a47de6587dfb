use super::scratch::ScratchBuffers;
use crate::capture::{Plane, RawFrame};
use crate::error::{ConversionError, ConversionResult};

/// Which chroma copy strategy packed a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaPath {
    /// Both chroma planes contiguous: whole-plane interleave
    Contiguous,
    /// Stride-aware per-row copy
    Strided,
}

/// Byte layout of a [`PackedFrame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedFormat {
    /// Full luma plane followed by interleaved V/U at quarter resolution
    Nv21,
}

/// A frame packed into a single buffer, ready for the image codec.
///
/// The buffer belongs to a [`ScratchBuffers`] arena and goes back to it via
/// [`recycle`](Self::recycle).
#[derive(Debug)]
pub struct PackedFrame {
    pub width: u32,
    pub height: u32,
    pub format: PackedFormat,
    pub path: ChromaPath,
    pub data: Vec<u8>,
}

impl PackedFrame {
    pub fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn recycle(self, scratch: &mut ScratchBuffers) {
        scratch.give_back(self.data);
    }
}

/// Interleaved chroma byte count: `width/2 * height/2 * 2`
pub fn chroma_len(width: u32, height: u32) -> usize {
    (width as usize / 2) * (height as usize / 2) * 2
}

fn check_plane(
    plane: &Plane,
    name: &'static str,
    cols: usize,
    rows: usize,
) -> ConversionResult<()> {
    if plane.pixel_stride == 0 {
        return Err(ConversionError::ZeroPixelStride { plane: name });
    }
    let needed = plane.required_len(cols, rows);
    if plane.data.len() < needed {
        return Err(ConversionError::PlaneTooSmall {
            plane: name,
            needed,
            actual: plane.data.len(),
        });
    }
    Ok(())
}

/// Pack a 4:2:0 planar frame into NV21 using buffers from `scratch`
pub fn pack_nv21(frame: &RawFrame, scratch: &mut ScratchBuffers) -> ConversionResult<PackedFrame> {
    let (width, height) = frame.dimensions();
    if width < 2 || height < 2 {
        return Err(ConversionError::InvalidDimensions { width, height });
    }

    let [y_plane, u_plane, v_plane] = match frame.planes() {
        [y, u, v, ..] => [y, u, v],
        planes => return Err(ConversionError::MissingPlanes(planes.len())),
    };

    let w = width as usize;
    let h = height as usize;
    let cw = w / 2;
    let ch = h / 2;

    check_plane(y_plane, "luma", w, h)?;
    check_plane(u_plane, "chroma U", cw, ch)?;
    check_plane(v_plane, "chroma V", cw, ch)?;

    let y_size = w * h;
    let mut data = scratch.take(y_size + chroma_len(width, height));

    copy_luma(y_plane, w, h, &mut data[..y_size]);

    let contiguous = [u_plane, v_plane]
        .iter()
        .all(|plane| plane.pixel_stride == 1 && plane.row_stride == cw);

    let path = if contiguous {
        let half = cw * ch;
        let chroma = &mut data[y_size..];
        for ((pair, v), u) in chroma
            .chunks_exact_mut(2)
            .zip(&v_plane.data[..half])
            .zip(&u_plane.data[..half])
        {
            pair[0] = *v;
            pair[1] = *u;
        }
        ChromaPath::Contiguous
    } else {
        let mut row = scratch.take(cw * 2);
        for r in 0..ch {
            let u_start = r * u_plane.row_stride;
            let v_start = r * v_plane.row_stride;
            for c in 0..cw {
                row[c * 2] = v_plane.data[v_start + c * v_plane.pixel_stride];
                row[c * 2 + 1] = u_plane.data[u_start + c * u_plane.pixel_stride];
            }
            let offset = y_size + r * cw * 2;
            data[offset..offset + cw * 2].copy_from_slice(&row);
        }
        scratch.give_back(row);
        ChromaPath::Strided
    };

    Ok(PackedFrame {
        width,
        height,
        format: PackedFormat::Nv21,
        path,
        data,
    })
}

fn copy_luma(plane: &Plane, width: usize, height: usize, out: &mut [u8]) {
    if plane.pixel_stride == 1 && plane.row_stride == width {
        out.copy_from_slice(&plane.data[..width * height]);
        return;
    }

    for (r, dst) in out.chunks_exact_mut(width).enumerate() {
        let start = r * plane.row_stride;
        if plane.pixel_stride == 1 {
            dst.copy_from_slice(&plane.data[start..start + width]);
        } else {
            for (c, value) in dst.iter_mut().enumerate() {
                *value = plane.data[start + c * plane.pixel_stride];
            }
        }
    }
}
