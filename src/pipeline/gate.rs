use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot admission gate.
///
/// At most one frame is admitted until it is released. Losers are expected
/// to drop their frame immediately; nothing is queued.
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. `true` only for the caller that won it.
    pub fn try_admit(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Free the slot, unconditionally
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the gate's slot until dropped
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<FrameGate>,
}

impl AdmissionPermit {
    pub fn try_acquire(gate: &Arc<FrameGate>) -> Option<Self> {
        gate.try_admit().then(|| Self { gate: gate.clone() })
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
