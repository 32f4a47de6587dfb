use anyhow::{Context, Result};
use clap::Parser;
use hairfx::capture::{CaptureSource, SyntheticCapture};
use hairfx::filters::{catalog, AssetStore, DirAssetStore, FilterAssetCache, MemoryAssetStore};
use hairfx::output::{OutputSink, V4L2Output};
use hairfx::pipeline::FramePipeline;
use hairfx::{segmentation, PipelineConfig, PixelFormatConverter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing `filters/{face,hair,combo}/<id>/` assets
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Filter id to apply (see --list-filters)
    #[arg(short, long)]
    filter: Option<String>,

    /// Stop after this many captured frames (runs until Ctrl+C otherwise)
    #[arg(long)]
    frames: Option<u64>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Frame width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Frame height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Memory budget in MiB; the asset cache gets an eighth of it
    #[arg(long)]
    memory_budget_mb: Option<usize>,

    /// Output v4l2loopback device path
    #[arg(short, long)]
    output_device: Option<String>,

    /// Path to hair segmentation model (ONNX file)
    /// If not provided, a fixed placeholder analysis is used
    #[arg(long)]
    model: Option<String>,

    /// Input webcam device index; a synthetic test pattern is used without it
    #[arg(short, long)]
    input_device: Option<u32>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Print the filter catalog and exit
    #[arg(long)]
    list_filters: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_filters {
        for filter in catalog::all() {
            println!(
                "{:<14} {:<16} {:?} ({:?})",
                filter.id, filter.name, filter.category, filter.blend_mode
            );
        }
        return Ok(());
    }

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("hairfx starting");
    tracing::info!("Frames: {}x{}", args.width, args.height);
    tracing::info!("Target FPS: {}", args.fps);

    let mut config = PipelineConfig::default();
    if let Some(mb) = args.memory_budget_mb {
        config = config.with_memory_budget_mb(mb);
    }
    if let Some(root) = &args.assets {
        config = config.with_asset_root(root.clone());
    }
    tracing::info!(
        "Asset cache budget: {} KiB",
        config.cache_capacity_bytes() / 1024
    );

    let store: Arc<dyn AssetStore> = match &config.asset_root {
        Some(root) => Arc::new(DirAssetStore::new(root.clone())),
        None => {
            tracing::info!("No asset directory given, filters will render without overlays");
            Arc::new(MemoryAssetStore::new())
        }
    };
    let cache = Arc::new(FilterAssetCache::from_config(store, &config));

    if let Some(model_path) = &args.model {
        tracing::info!("Loading segmentation model from {}", model_path);
    }
    let analyzer = segmentation::create_analyzer(args.model.as_deref())
        .context("Failed to initialize hair analyzer")?;

    let pipeline = FramePipeline::new(PixelFormatConverter::default(), analyzer, cache.clone());
    pipeline
        .select_filter(args.filter.as_deref())
        .context("Failed to select filter")?;
    pipeline.start().context("Failed to start frame pipeline")?;

    let ids: Vec<&str> = catalog::all().iter().map(|f| f.id).collect();
    let preloaded = cache.preload(&ids);
    tracing::info!("Preloaded {} of {} filters", preloaded, ids.len());

    // Initialize capture
    let mut capture = open_capture(&args)?;

    // Initialize output
    let mut output = match &args.output_device {
        Some(device) => Some(
            V4L2Output::new(device, args.width, args.height)
                .context("Failed to initialize v4l2loopback output")?,
        ),
        None => None,
    };

    let result = run_pipeline(
        capture.as_mut(),
        output.as_mut().map(|o| o as &mut dyn OutputSink),
        &pipeline,
        args.fps,
        args.frames,
    );

    if let Some(photo) = pipeline.capture_photo() {
        tracing::info!(
            "Last frame {}x{}, filter={:?}, captured at {}",
            photo.processed.width(),
            photo.processed.height(),
            photo.filter_id,
            photo.captured_at.format("%H:%M:%S%.3f")
        );
    }
    pipeline.stop();

    let stats = pipeline.stats();
    tracing::info!(
        "Submitted {} frames: {} published, {} dropped, {} unconvertible, {} analysis failures, {} composite fallbacks",
        stats.submitted,
        stats.published,
        stats.dropped,
        stats.conversion_failures,
        stats.analysis_failures,
        stats.composite_fallbacks
    );

    result
}

#[cfg(feature = "webcam")]
fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    if let Some(index) = args.input_device {
        let capture = hairfx::capture::WebcamCapture::new(index, args.width, args.height)
            .context("Failed to initialize webcam capture")?;
        return Ok(Box::new(capture));
    }
    synthetic_capture(args)
}

#[cfg(not(feature = "webcam"))]
fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    if args.input_device.is_some() {
        anyhow::bail!("--input-device needs hairfx built with the `webcam` feature");
    }
    synthetic_capture(args)
}

fn synthetic_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    tracing::info!("Using synthetic test pattern");
    let capture = SyntheticCapture::new(args.width, args.height)
        .context("Failed to initialize synthetic capture")?;
    Ok(Box::new(capture))
}

fn run_pipeline(
    capture: &mut dyn CaptureSource,
    mut output: Option<&mut dyn OutputSink>,
    pipeline: &FramePipeline,
    target_fps: u32,
    max_frames: Option<u64>,
) -> Result<()> {
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);
    let mut states = pipeline.subscribe();
    let mut frame_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop");
    if max_frames.is_none() {
        tracing::info!("Press Ctrl+C to stop");
    }

    while max_frames.map_or(true, |max| frame_count < max) {
        let loop_start = Instant::now();

        // Capture frame
        let capture_start = Instant::now();
        let frame = capture
            .capture_frame()
            .context("Failed to capture frame")?;
        total_capture_time += capture_start.elapsed();

        pipeline.submit_frame(frame);

        // Output whatever the worker published since the last iteration
        if states.has_changed().unwrap_or(false) {
            let state = states.borrow_and_update().clone();
            if let (Some(sink), Some(processed)) = (output.as_deref_mut(), state.processed.as_ref())
            {
                let output_start = Instant::now();
                sink.write_frame(processed)
                    .context("Failed to write frame")?;
                total_output_time += output_start.elapsed();
            }
            if let Some(error) = &state.error {
                tracing::debug!("Pipeline error: {}", error);
            }
        }

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let stats = pipeline.stats();
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!(
                "Frame {}: capture={:.1}ms, convert={:.1}ms, analyze={:.1}ms, composite={:.1}ms, output={:.1}ms, dropped={}",
                frame_count,
                avg_capture_ms,
                stats.avg_convert_ms(),
                stats.avg_analyze_ms(),
                stats.avg_composite_ms(),
                avg_output_ms,
                stats.dropped
            );
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }

    Ok(())
}
