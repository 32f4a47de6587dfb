use std::collections::HashMap;

/// Reusable byte buffers for frame conversion, keyed by length.
///
/// One arena belongs to one worker. It is passed by `&mut` into the
/// converter, so it can never be touched by two threads at once. A buffer is
/// allocated the first time a length is requested and recycled afterwards.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    pool: HashMap<usize, Vec<Vec<u8>>>,
    allocations: usize,
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer of exactly `len` bytes. Contents are unspecified.
    pub fn take(&mut self, len: usize) -> Vec<u8> {
        if let Some(buffer) = self.pool.get_mut(&len).and_then(Vec::pop) {
            return buffer;
        }
        self.allocations += 1;
        tracing::trace!(bytes = len, "allocating scratch buffer");
        vec![0u8; len]
    }

    /// Return a buffer taken with [`take`](Self::take)
    pub fn give_back(&mut self, buffer: Vec<u8>) {
        self.pool.entry(buffer.len()).or_default().push(buffer);
    }

    /// Drop every pooled buffer
    pub fn clear(&mut self) {
        let bytes = self.retained_bytes();
        self.pool.clear();
        if bytes > 0 {
            tracing::debug!(bytes, "released scratch buffers");
        }
    }

    /// Number of fresh allocations made over the arena's lifetime
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Bytes currently held in the pool
    pub fn retained_bytes(&self) -> usize {
        self.pool
            .iter()
            .map(|(len, buffers)| len * buffers.len())
            .sum()
    }
}
