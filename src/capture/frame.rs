use std::fmt;

/// One plane of a planar sensor frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    /// Bytes between the starts of two consecutive rows
    pub row_stride: usize,
    /// Bytes between two consecutive samples in a row
    pub pixel_stride: usize,
}

impl Plane {
    pub fn new(data: Vec<u8>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// Tightly packed plane: one byte per sample, no row padding
    pub fn packed(data: Vec<u8>, width: usize) -> Self {
        Self::new(data, width, 1)
    }

    /// Minimum byte length needed to address `rows` rows of `cols` samples
    pub fn required_len(&self, cols: usize, rows: usize) -> usize {
        if cols == 0 || rows == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pixel_stride + 1
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A camera capture in YUV 4:2:0 planar layout (luma, chroma U, chroma V).
///
/// The frame owns its capture resources. They are handed back through the
/// release hook exactly once, when the frame is dropped, whichever path the
/// pipeline took with it.
pub struct RawFrame {
    width: u32,
    height: u32,
    planes: Vec<Plane>,
    on_release: Option<ReleaseHook>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, planes: Vec<Plane>) -> Self {
        Self {
            width,
            height,
            planes,
            on_release: None,
        }
    }

    /// Attach a callback that returns the underlying buffer to its source
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Release the frame now instead of at end of scope
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("planes", &self.planes.len())
            .field("has_release_hook", &self.on_release.is_some())
            .finish()
    }
}
