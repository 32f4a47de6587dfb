use crate::convert::PackedImage;
use crate::error::CompositeError;
use crate::filters::FilterDefinition;
use crate::segmentation::AnalysisResult;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Lifecycle phase of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    #[default]
    Initializing,
    Active,
    Inactive,
    /// Analysis failed; the preview keeps running
    Error(String),
}

/// Snapshot published to observers.
///
/// Every publication replaces the whole snapshot, so `processed` is always
/// paired with the `analysis` of the frame that produced it.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub phase: PipelinePhase,
    /// Last successfully analysed frame
    pub original: Option<Arc<PackedImage>>,
    /// Analysis of the latest frame; `None` when it failed
    pub analysis: Option<Arc<AnalysisResult>>,
    /// What the preview shows: filtered, or the unfiltered latest frame
    pub processed: Option<Arc<PackedImage>>,
    /// Source for photo capture, only replaced by successful frames
    pub last_success: Option<ProcessedFrame>,
    pub error: Option<String>,
    pub selected_filter: Option<&'static FilterDefinition>,
    /// Count of published frames
    pub frame_number: u64,
    pub consecutive_analysis_failures: u32,
}

impl PipelineState {
    pub fn is_active(&self) -> bool {
        self.phase == PipelinePhase::Active
    }
}

/// A frame that made it through analysis, with what it was rendered into
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub original: Arc<PackedImage>,
    pub processed: Arc<PackedImage>,
    pub analysis: Arc<AnalysisResult>,
    pub filter: Option<&'static FilterDefinition>,
}

/// Immutable result of a photo capture
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub original: Arc<PackedImage>,
    pub processed: Arc<PackedImage>,
    pub filter_id: Option<&'static str>,
    pub analysis: Arc<AnalysisResult>,
    pub captured_at: DateTime<Local>,
}

/// Frame counters, updated by the submitting thread and the worker
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    conversion_failures: AtomicU64,
    analysis_failures: AtomicU64,
    composite_fallbacks: AtomicU64,
    published: AtomicU64,
    convert_nanos: AtomicU64,
    analyze_nanos: AtomicU64,
    composite_nanos: AtomicU64,
    last_composite_error: Mutex<Option<CompositeError>>,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub dropped: u64,
    pub conversion_failures: u64,
    pub analysis_failures: u64,
    pub composite_fallbacks: u64,
    pub published: u64,
    pub convert_time: Duration,
    pub analyze_time: Duration,
    pub composite_time: Duration,
    pub last_composite_error: Option<CompositeError>,
}

impl StatsSnapshot {
    fn average_ms(total: Duration, count: u64) -> f64 {
        if count == 0 {
            0.0
        } else {
            total.as_secs_f64() * 1000.0 / count as f64
        }
    }

    pub fn avg_convert_ms(&self) -> f64 {
        Self::average_ms(self.convert_time, self.published + self.conversion_failures)
    }

    pub fn avg_analyze_ms(&self) -> f64 {
        Self::average_ms(self.analyze_time, self.published)
    }

    pub fn avg_composite_ms(&self) -> f64 {
        Self::average_ms(self.composite_time, self.published)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Stage {
    Convert,
    Analyze,
    Composite,
}

impl PipelineStats {
    pub(crate) fn frame_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn conversion_failed(&self) {
        self.conversion_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn analysis_failed(&self) {
        self.analysis_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn composite_failed(&self, error: CompositeError) {
        self.composite_fallbacks.fetch_add(1, Ordering::Relaxed);
        *self
            .last_composite_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
    }

    pub(crate) fn frame_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, stage: Stage, elapsed: Duration) {
        let counter = match stage {
            Stage::Convert => &self.convert_nanos,
            Stage::Analyze => &self.analyze_nanos,
            Stage::Composite => &self.composite_nanos,
        };
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        counter.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            conversion_failures: self.conversion_failures.load(Ordering::Relaxed),
            analysis_failures: self.analysis_failures.load(Ordering::Relaxed),
            composite_fallbacks: self.composite_fallbacks.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            convert_time: Duration::from_nanos(self.convert_nanos.load(Ordering::Relaxed)),
            analyze_time: Duration::from_nanos(self.analyze_nanos.load(Ordering::Relaxed)),
            composite_time: Duration::from_nanos(self.composite_nanos.load(Ordering::Relaxed)),
            last_composite_error: self
                .last_composite_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }
}
