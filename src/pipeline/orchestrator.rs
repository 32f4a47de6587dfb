use super::gate::{AdmissionPermit, FrameGate};
use super::state::{
    CaptureRecord, PipelinePhase, PipelineState, PipelineStats, ProcessedFrame, Stage, StatsSnapshot,
};
use crate::capture::RawFrame;
use crate::convert::{PixelFormatConverter, ScratchBuffers};
use crate::error::{PipelineError, PipelineResult};
use crate::filters::{catalog, FilterAssetCache, FilterCompositor};
use crate::segmentation::HairAnalyzer;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tokio::sync::watch;

/// A frame that won admission, on its way to the worker
struct Job {
    frame: RawFrame,
    permit: AdmissionPermit,
}

struct Worker {
    jobs: SyncSender<Job>,
    thread: JoinHandle<()>,
}

/// State shared between callers and the frame worker
struct Shared {
    converter: PixelFormatConverter,
    analyzer: Arc<dyn HairAnalyzer>,
    compositor: FilterCompositor,
    gate: Arc<FrameGate>,
    state: watch::Sender<Arc<PipelineState>>,
    stats: PipelineStats,
}

/// Drives raw frames through conversion, analysis and compositing and
/// publishes the result.
///
/// Frames are admitted one at a time; a frame submitted while another is
/// in flight is dropped. Processing runs on one worker thread that owns the
/// conversion scratch arena.
pub struct FramePipeline {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl FramePipeline {
    pub fn new(
        converter: PixelFormatConverter,
        analyzer: Arc<dyn HairAnalyzer>,
        cache: Arc<FilterAssetCache>,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(PipelineState::default()));
        Self {
            shared: Arc::new(Shared {
                converter,
                analyzer,
                compositor: FilterCompositor::new(cache),
                gate: Arc::new(FrameGate::new()),
                state,
                stats: PipelineStats::default(),
            }),
            worker: Mutex::new(None),
        }
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn the frame worker and move to `Active`. No-op if running.
    pub fn start(&self) -> PipelineResult<()> {
        let mut worker = self.worker();
        if worker.is_some() {
            return Ok(());
        }

        let (jobs, queue) = mpsc::sync_channel(1);
        let shared = self.shared.clone();
        let thread = thread::Builder::new()
            .name("hairfx-frame-worker".to_string())
            .spawn(move || run_worker(shared, queue))
            .map_err(|e| PipelineError::WorkerSpawn(e.to_string()))?;

        *worker = Some(Worker { jobs, thread });
        self.shared.publish(|state| {
            state.phase = PipelinePhase::Active;
            state.error = None;
        });
        tracing::info!(mode = ?self.shared.analyzer.mode(), "frame pipeline started");
        Ok(())
    }

    /// Stop processing.
    ///
    /// A frame already in flight finishes first. Scratch buffers and the
    /// asset cache are released.
    pub fn stop(&self) {
        let Some(worker) = self.worker().take() else {
            return;
        };
        self.shared.publish(|state| state.phase = PipelinePhase::Inactive);
        self.shared.shut_down(worker);
        tracing::info!("frame pipeline stopped");
    }

    /// Hand a frame to the pipeline. Never blocks: if a frame is already
    /// in flight (or the pipeline is stopped) this one is released at once.
    pub fn submit_frame(&self, frame: RawFrame) {
        let stats = &self.shared.stats;
        stats.frame_submitted();

        let mut worker = self.worker();
        let Some(active) = worker.as_ref() else {
            tracing::trace!("pipeline not running, dropping frame");
            stats.frame_dropped();
            return;
        };

        let Some(permit) = AdmissionPermit::try_acquire(&self.shared.gate) else {
            tracing::trace!("frame in flight, dropping frame");
            stats.frame_dropped();
            return;
        };

        match active.jobs.try_send(Job { frame, permit }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!("frame worker busy, dropping frame");
                stats.frame_dropped();
            }
            Err(TrySendError::Disconnected(job)) => {
                tracing::warn!("frame worker exited unexpectedly, stopping pipeline");
                stats.frame_dropped();
                drop(job);
                if let Some(dead) = worker.take() {
                    self.shared.publish(|state| {
                        state.phase = PipelinePhase::Inactive;
                        state.error = Some("frame worker exited unexpectedly".to_string());
                    });
                    self.shared.shut_down(dead);
                }
            }
        }
    }

    /// Select the filter applied to subsequent frames; `None` disables filtering
    pub fn select_filter(&self, filter_id: Option<&str>) -> PipelineResult<()> {
        let filter = match filter_id {
            Some(id) => Some(
                catalog::find(id).ok_or_else(|| PipelineError::UnknownFilter(id.to_string()))?,
            ),
            None => None,
        };
        tracing::info!(filter = ?filter.map(|f| f.id), "filter selected");
        self.shared.publish(|state| state.selected_filter = filter);
        Ok(())
    }

    /// Return from `Error` to `Active`
    pub fn clear_error(&self) {
        self.shared.publish(|state| {
            if matches!(state.phase, PipelinePhase::Error(_)) {
                state.phase = PipelinePhase::Active;
            }
            state.error = None;
        });
    }

    /// Last successfully analysed frame, its processed version and the
    /// filter it was rendered with.
    ///
    /// `None` until a frame has been analysed successfully. Frames whose
    /// analysis failed are never captured.
    pub fn capture_photo(&self) -> Option<CaptureRecord> {
        let state = self.state();
        let frame = state.last_success.clone()?;
        Some(CaptureRecord {
            original: frame.original,
            processed: frame.processed,
            filter_id: frame.filter.map(|f| f.id),
            analysis: frame.analysis,
            captured_at: chrono::Local::now(),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<PipelineState>> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> Arc<PipelineState> {
        self.shared.state.borrow().clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn cache(&self) -> &Arc<FilterAssetCache> {
        self.shared.compositor.cache()
    }

    pub fn is_running(&self) -> bool {
        self.worker().is_some()
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(shared: Arc<Shared>, queue: Receiver<Job>) {
    let mut scratch = ScratchBuffers::new();
    tracing::debug!("frame worker started");

    while let Ok(job) = queue.recv() {
        shared.process(job, &mut scratch);
    }

    scratch.clear();
    tracing::debug!("frame worker exiting");
}

impl Shared {
    /// Close the worker's queue, wait for it and release what it held
    fn shut_down(&self, worker: Worker) {
        let Worker { jobs, thread } = worker;
        drop(jobs);
        if thread.join().is_err() {
            tracing::error!("frame worker panicked");
        }

        self.gate.release();
        self.compositor.cache().clear();
        self.analyzer.reset_state();
    }

    /// Replace the published snapshot with an edited copy
    fn publish(&self, edit: impl FnOnce(&mut PipelineState)) {
        self.state.send_modify(|current| {
            let mut next = PipelineState::clone(current);
            edit(&mut next);
            *current = Arc::new(next);
        });
    }

    fn process(&self, job: Job, scratch: &mut ScratchBuffers) {
        // The frame goes back to its source once converted; the slot frees when `_permit` drops
        let Job { frame, permit: _permit } = job;

        let started = Instant::now();
        let converted = self.converter.convert(&frame, scratch);
        self.stats.record(Stage::Convert, started.elapsed());
        let original = match converted {
            Ok(image) => Arc::new(image),
            Err(e) => {
                tracing::debug!(error = %e, "dropping unconvertible frame");
                self.stats.conversion_failed();
                return;
            }
        };
        drop(frame);

        let selected = self.state.borrow().selected_filter;

        let started = Instant::now();
        let analysis = {
            let _span = tracing::debug_span!("analyze").entered();
            self.analyzer.analyze(&original)
        };
        self.stats.record(Stage::Analyze, started.elapsed());

        let analysis = match analysis {
            Ok(result) => Arc::new(result),
            Err(e) => {
                tracing::warn!(error = %e, "frame analysis failed");
                self.stats.analysis_failed();
                let message = e.to_string();
                self.publish(|state| {
                    if state.phase != PipelinePhase::Inactive {
                        state.phase = PipelinePhase::Error(message.clone());
                    }
                    state.error = Some(message);
                    state.analysis = None;
                    state.processed = Some(original);
                    state.frame_number += 1;
                    state.consecutive_analysis_failures += 1;
                });
                self.stats.frame_published();
                return;
            }
        };

        let processed = match selected {
            Some(filter) => {
                let started = Instant::now();
                let composited = self.compositor.apply(&original, filter, &analysis);
                self.stats.record(Stage::Composite, started.elapsed());
                match composited {
                    Ok(image) => Arc::new(image),
                    Err(e) => {
                        tracing::debug!(error = %e, filter = filter.id, "compositing failed, showing unfiltered frame");
                        self.stats.composite_failed(e);
                        original.clone()
                    }
                }
            }
            None => original.clone(),
        };

        self.publish(|state| {
            state.last_success = Some(ProcessedFrame {
                original: original.clone(),
                processed: processed.clone(),
                analysis: analysis.clone(),
                filter: selected,
            });
            state.original = Some(original);
            state.analysis = Some(analysis);
            state.processed = Some(processed);
            state.frame_number += 1;
            state.consecutive_analysis_failures = 0;
        });
        self.stats.frame_published();
    }
}
