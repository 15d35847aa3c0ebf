//! Engine orchestration - wires the transform stages behind a worker pool
//! and a shared result cache.
//!
//! Every request is hashed, optionally coalesced with an identical in-flight
//! request, then admitted through a bounded semaphore. Cache hits return the
//! stored blob; misses decode, resize and encode on the blocking pool while
//! the worker slot is held.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::palette::ColorAnalyzer;
use crate::types::{
    dimensions_label, ColorPalette, EngineStats, ImageInput, ProcessingOptions, ProcessingResult,
};

use super::decode::ImageDecoder;
use super::encode::encode_jpeg;
use super::hash::Hasher;
use super::inflight::InflightRegistry;
use super::resize;
use super::validate::{SourceFormat, Validator};

/// Output of the CPU-bound stage.
struct Transformed {
    bytes: Vec<u8>,
    format: SourceFormat,
    original: (u32, u32),
    processed: (u32, u32),
}

/// Request counters and worker gauges.
#[derive(Default)]
struct Metrics {
    requests: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cache_hits: AtomicU64,
    total_time_us: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl Metrics {
    fn enter(self: &Arc<Self>) -> ActiveWorker {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveWorker(Arc::clone(self))
    }

    fn record(&self, success: bool, elapsed: Duration) {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }
}

/// Gauge guard for a request inside the CPU-bound stage.
struct ActiveWorker(Arc<Metrics>);

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrent JPEG transform engine with a content-addressed cache.
pub struct ImageProcessingEngine {
    cache: Arc<SharedCache>,
    workers: Arc<Semaphore>,
    max_workers: usize,
    acquire_timeout: Duration,
    decoder: ImageDecoder,
    validator: Validator,
    inflight: Option<InflightRegistry>,
    metrics: Arc<Metrics>,
    started: Instant,
}

impl ImageProcessingEngine {
    /// Create an engine with its own cache sized from `config.cache`.
    pub fn new(config: &Config) -> Self {
        Self::with_cache(config, Arc::new(SharedCache::new(&config.cache)))
    }

    /// Create an engine around an existing cache.
    pub fn with_cache(config: &Config, cache: Arc<SharedCache>) -> Self {
        let max_workers = config.engine.max_workers.max(1);
        tracing::debug!(
            "Engine: {} workers, acquire timeout {}ms, single-flight {}",
            max_workers,
            config.engine.acquire_timeout_ms,
            config.engine.single_flight
        );

        Self {
            cache,
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            acquire_timeout: Duration::from_millis(config.engine.acquire_timeout_ms),
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            inflight: config.engine.single_flight.then(InflightRegistry::new),
            metrics: Arc::new(Metrics::default()),
            started: Instant::now(),
        }
    }

    /// Transform one image. Failures come back as data in the result.
    pub async fn process(&self, input: ImageInput, options: &ProcessingOptions) -> ProcessingResult {
        self.process_with_cancel(input, options, &CancellationToken::new())
            .await
    }

    /// Transform one image, giving up if `cancel` fires while the request is
    /// still waiting for a worker slot.
    pub async fn process_with_cancel(
        &self,
        input: ImageInput,
        options: &ProcessingOptions,
        cancel: &CancellationToken,
    ) -> ProcessingResult {
        let start = Instant::now();
        let mut result = ProcessingResult::new(Uuid::new_v4().to_string());
        self.metrics.requests.fetch_add(1, Ordering::Relaxed);

        let source_name = input.display_name().to_string();
        tracing::debug!("Processing: {} ({} bytes)", source_name, input.bytes.len());

        if let Err(e) = self.run(input, options, cancel, &mut result).await {
            tracing::warn!("Failed {}: {}", source_name, e);
            result.fail(&e);
        }

        let elapsed = start.elapsed();
        result.processing_time_ms = elapsed.as_secs_f64() * 1000.0;
        self.metrics.record(result.success, elapsed);
        tracing::debug!(
            "Processed {} in {:?} (success: {}, cache_hit: {})",
            source_name,
            elapsed,
            result.success,
            result.cache_hit()
        );
        result
    }

    /// Read a file under the size limit and transform it.
    pub async fn process_file(&self, path: &Path, options: &ProcessingOptions) -> ProcessingResult {
        match self.read_file(path).await {
            Ok(input) => self.process(input, options).await,
            Err(e) => {
                tracing::warn!("Failed {:?}: {}", path, e);
                let mut result = ProcessingResult::new(Uuid::new_v4().to_string());
                result.fail(&e);
                self.metrics.requests.fetch_add(1, Ordering::Relaxed);
                self.metrics.record(false, Duration::ZERO);
                result
            }
        }
    }

    /// Decode an image under a worker slot and build its palette.
    pub async fn extract_palette(
        &self,
        input: ImageInput,
        analyzer: &ColorAnalyzer,
    ) -> PipelineResult<ColorPalette> {
        let deadline = tokio::time::Instant::now() + self.acquire_timeout;
        let permit = self.acquire(&CancellationToken::new(), deadline).await?;
        let active = self.metrics.enter();
        let decoder = self.decoder.clone();
        let analyzer = analyzer.clone();

        tokio::task::spawn_blocking(move || {
            // Gauge drops before the permit so a woken waiter never overlaps it
            let _slot = (active, permit);
            let decoded = decoder.decode(&input)?;
            analyzer.extract_palette(&decoded.image)
        })
        .await?
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> EngineStats {
        let m = &self.metrics;
        let total_requests = m.requests.load(Ordering::Relaxed);
        let successful_ops = m.succeeded.load(Ordering::Relaxed);
        let failed_ops = m.failed.load(Ordering::Relaxed);
        let cache_hits = m.cache_hits.load(Ordering::Relaxed);
        let completed = successful_ops + failed_ops;

        EngineStats {
            total_requests,
            successful_ops,
            failed_ops,
            cache_hits,
            cache_hit_rate: if total_requests == 0 {
                0.0
            } else {
                cache_hits as f64 / total_requests as f64 * 100.0
            },
            avg_processing_time_ms: if completed == 0 {
                0.0
            } else {
                m.total_time_us.load(Ordering::Relaxed) as f64 / completed as f64 / 1000.0
            },
            uptime_secs: self.started.elapsed().as_secs_f64(),
            cache_entries: self.cache.len(),
            cache_bytes: self.cache.total_bytes(),
            max_workers: self.max_workers,
            active_workers: m.active.load(Ordering::SeqCst),
            peak_active_workers: m.peak_active.load(Ordering::SeqCst),
        }
    }

    /// The cache this engine reads and fills.
    pub fn cache(&self) -> &Arc<SharedCache> {
        &self.cache
    }

    /// Stop admitting work. Requests waiting for a slot fail as cancelled.
    pub fn shutdown(&self) {
        self.workers.close();
    }

    async fn run(
        &self,
        input: ImageInput,
        options: &ProcessingOptions,
        cancel: &CancellationToken,
        result: &mut ProcessingResult,
    ) -> PipelineResult<()> {
        options.validate()?;

        let input_size = input.bytes.len() as u64;
        result.input_size = input_size;

        let key = Hasher::cache_key(&input.bytes, options);
        let content_hash = key.split(':').next().unwrap_or_default().to_string();
        result.insert_metadata("content_hash", content_hash);

        // One budget covers both waiting on a leader and waiting for a slot
        let deadline = tokio::time::Instant::now() + self.acquire_timeout;

        // Held until the cache is filled so followers see the result
        let _flight = match &self.inflight {
            Some(registry) => Some(
                tokio::time::timeout_at(deadline, registry.join(&key, cancel))
                    .await
                    .map_err(|_| self.timeout_error())??,
            ),
            None => None,
        };

        let permit = self.acquire(cancel, deadline).await?;

        if let Some(cached) = self.cache.get(&key) {
            drop(permit);
            tracing::trace!("  Cache hit: {}", key);
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            result.insert_metadata("cache_hit", true);
            result.succeed(input_size, cached);
            return Ok(());
        }
        result.insert_metadata("cache_hit", false);

        let quality = options.effective_quality();
        let (max_width, max_height) = (options.max_width, options.max_height);
        let decoder = self.decoder.clone();
        let active = self.metrics.enter();

        // The slot travels with the blocking task so it is only freed when
        // the CPU work really ends. The gauge drops first.
        let transformed = tokio::task::spawn_blocking(move || {
            let _slot = (active, permit);
            transform(&decoder, &input, quality, max_width, max_height)
        })
        .await??;

        let output: Arc<[u8]> = Arc::from(transformed.bytes);
        if !self.cache.put(key, Arc::clone(&output)) {
            tracing::warn!(
                "Output of {} bytes exceeds the cache shard budget; not cached",
                output.len()
            );
        }

        let (ow, oh) = transformed.original;
        let (pw, ph) = transformed.processed;
        result.insert_metadata("format", transformed.format.as_str());
        result.insert_metadata("original_dimensions", dimensions_label(ow, oh));
        result.insert_metadata("processed_dimensions", dimensions_label(pw, ph));
        result.succeed(input_size, output);
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> PipelineResult<ImageInput> {
        self.validator.check_file(path)?;
        let bytes = tokio::fs::read(path).await.map_err(|e| PipelineError::Io {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(ImageInput::new(bytes).with_name(path.to_string_lossy()))
    }

    async fn acquire(
        &self,
        cancel: &CancellationToken,
        deadline: tokio::time::Instant,
    ) -> PipelineResult<OwnedSemaphorePermit> {
        let wait = tokio::time::timeout_at(deadline, Arc::clone(&self.workers).acquire_owned());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            acquired = wait => match acquired {
                Ok(Ok(permit)) => Ok(permit),
                // Closed by shutdown()
                Ok(Err(_)) => Err(PipelineError::Cancelled),
                Err(_) => Err(self.timeout_error()),
            },
        }
    }

    fn timeout_error(&self) -> PipelineError {
        PipelineError::Timeout {
            timeout_ms: self.acquire_timeout.as_millis() as u64,
        }
    }
}

/// Decode, constrain and encode one input.
fn transform(
    decoder: &ImageDecoder,
    input: &ImageInput,
    quality: u8,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> PipelineResult<Transformed> {
    let stage = Instant::now();
    let decoded = decoder.decode(input)?;
    tracing::trace!("  Decode: {:?}", stage.elapsed());

    let stage = Instant::now();
    let original = (decoded.width, decoded.height);
    let image: DynamicImage = resize::constrain(decoded.image, max_width, max_height);
    let processed = (image.width(), image.height());
    tracing::trace!("  Resize: {:?}", stage.elapsed());

    let stage = Instant::now();
    let bytes = encode_jpeg(&image, quality)?;
    tracing::trace!("  Encode: {:?} ({} bytes)", stage.elapsed(), bytes.len());

    Ok(Transformed {
        bytes,
        format: decoded.format,
        original,
        processed,
    })
}
