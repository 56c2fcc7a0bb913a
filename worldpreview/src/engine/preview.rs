//! The preview engine façade.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::{Rgba, RgbaImage};
use parking_lot::RwLock;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tiny_skia::Color;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{PreviewError, RenderJob};
use crate::compositor::Compositor;
use crate::config::PreviewConfig;
use crate::geometry::{world_to_tile_area, TileCoord, TileLayout};
use crate::raster::{TileError, TileImage, TileRasterizer, VisualLayer};
use crate::scheduler::TileScheduler;
use crate::source::DataSource;

/// Lifecycle state of a [`PreviewEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, nothing rendered yet.
    Constructed,
    /// At least one render is in progress.
    Rendering,
    /// Finished at least one render and is ready for more.
    Idle,
    /// Closed; every further render fails.
    Closed,
}

/// Renders world previews from a data source and a stack of visual layers.
///
/// The engine owns a fixed-size worker pool for its whole lifetime and
/// shares it between all renders. The data source and layers are shared
/// read-only by every worker.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tiny_skia::{Color, Pixmap};
/// use worldpreview::engine::{PreviewEngine, RenderJob};
/// use worldpreview::config::PreviewConfig;
/// use worldpreview::geometry::{TileLayout, TileVolume};
/// use worldpreview::raster::{LayerError, VisualLayer};
/// use worldpreview::source::{DataSource, SourceError};
///
/// struct Flat;
///
/// impl DataSource for Flat {
///     type Sample = ();
///     fn name(&self) -> &str { "flat" }
///     fn query(&self, _volume: &TileVolume) -> Result<(), SourceError> { Ok(()) }
/// }
///
/// struct Grass;
///
/// impl VisualLayer<()> for Grass {
///     fn name(&self) -> &str { "grass" }
///     fn render(&self, canvas: &mut Pixmap, _sample: &()) -> Result<(), LayerError> {
///         canvas.fill(Color::from_rgba8(0, 160, 0, 255));
///         Ok(())
///     }
/// }
///
/// let config = PreviewConfig::default()
///     .with_worker_threads(2)
///     .with_tile_layout(TileLayout::new(32, 32));
/// let engine = PreviewEngine::new(Arc::new(Flat), vec![Arc::new(Grass)], config)?;
///
/// let image = engine.render(&RenderJob::new(64, 64))?;
/// assert_eq!(image.get_pixel(0, 0).0, [0, 160, 0, 255]);
///
/// engine.close();
/// # Ok::<(), worldpreview::engine::PreviewError>(())
/// ```
pub struct PreviewEngine<D: DataSource> {
    source: Arc<D>,
    rasterizer: Arc<TileRasterizer<D::Sample>>,
    scheduler: TileScheduler,
    compositor: Compositor,
    layout: TileLayout,
    workers: usize,
    pool: RwLock<Option<Arc<ThreadPool>>>,
    interrupt: CancellationToken,
    active_renders: AtomicUsize,
    has_rendered: AtomicBool,
}

impl<D: DataSource> PreviewEngine<D> {
    /// Create an engine and start its worker pool.
    ///
    /// # Arguments
    ///
    /// * `source` - Data source queried once per tile
    /// * `layers` - Visual layers, drawn in order
    /// * `config` - Engine configuration
    pub fn new(
        source: Arc<D>,
        layers: Vec<Arc<dyn VisualLayer<D::Sample>>>,
        config: PreviewConfig,
    ) -> Result<Self, PreviewError> {
        let workers = config.worker_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("tile-worker-{}", index))
            .panic_handler(|_| error!("Tile worker panicked outside of a tile computation"))
            .build()?;

        let layout = config.tile_layout;
        debug!(
            workers,
            source = source.name(),
            layers = layers.len(),
            tile_width = layout.width(),
            tile_depth = layout.depth(),
            "Started preview engine"
        );

        let rasterizer =
            TileRasterizer::new(layers, layout).with_background(to_color(config.tile_background));
        let compositor = Compositor::new(layout)
            .with_background(to_color(config.canvas_background))
            .with_axis_color(to_color(config.axis_color));

        Ok(Self {
            source,
            rasterizer: Arc::new(rasterizer),
            scheduler: TileScheduler::new(config.poll_interval),
            compositor,
            layout,
            workers,
            pool: RwLock::new(Some(Arc::new(pool))),
            interrupt: CancellationToken::new(),
            active_renders: AtomicUsize::new(0),
            has_rendered: AtomicBool::new(false),
        })
    }

    /// Create an engine with the default configuration.
    pub fn with_defaults(
        source: Arc<D>,
        layers: Vec<Arc<dyn VisualLayer<D::Sample>>>,
    ) -> Result<Self, PreviewError> {
        Self::new(source, layers, PreviewConfig::default())
    }

    /// Render a job into a newly allocated image.
    ///
    /// # Errors
    ///
    /// - `EngineClosed` after [`close`](Self::close)
    /// - `InvalidGeometry` for empty output or zero scale, before any work
    ///   is scheduled
    /// - `Cancelled` if the job's token fires while tiles are collected
    /// - `Interrupted` if the engine is closed while tiles are collected
    pub fn render(&self, job: &RenderJob) -> Result<RgbaImage, PreviewError> {
        self.ensure_open()?;
        job.validate()?;

        let mut image = RgbaImage::new(job.width(), job.height());
        self.render_into(job, &mut image)?;
        Ok(image)
    }

    /// Render a job into a caller-owned image of the job's size.
    ///
    /// On error the target is left untouched.
    pub fn render_into(&self, job: &RenderJob, target: &mut RgbaImage) -> Result<(), PreviewError> {
        let pool = self.current_pool()?;
        job.validate()?;
        if target.dimensions() != (job.width(), job.height()) {
            return Err(PreviewError::InvalidGeometry {
                width: job.width(),
                height: job.height(),
                scale: job.scale(),
                reason: format!(
                    "target buffer is {}×{}",
                    target.width(),
                    target.height()
                ),
            });
        }

        let _active = ActiveRender::enter(self);
        let started = Instant::now();

        self.source.prepare()?;

        let viewport = job.viewport();
        let area = viewport.world_area();
        let grid = world_to_tile_area(&area, &self.layout);
        debug!(
            area = %area,
            tiles = grid.len(),
            scale = job.scale(),
            "Rendering preview"
        );

        let source = Arc::clone(&self.source);
        let rasterizer = Arc::clone(&self.rasterizer);
        let layout = self.layout;
        let compute = move |coord: TileCoord| -> Result<TileImage, TileError> {
            let sample = source.query(&coord.volume(&layout))?;
            rasterizer.rasterize(&sample)
        };

        let (tiles, stats) = self
            .scheduler
            .run(
                &pool,
                &grid,
                compute,
                job.progress().cloned(),
                job.cancellation_token().clone(),
                &self.interrupt,
            )
            .map_err(|e| {
                info!(reason = %e, "Preview render stopped");
                PreviewError::from(e)
            })?;

        self.compositor.composite(target, &viewport, &tiles);

        info!(
            tiles = stats.submitted,
            failed = stats.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered preview"
        );
        Ok(())
    }

    /// Shut down the worker pool.
    ///
    /// Idempotent. Does not wait for running tile tasks; a render collecting
    /// at the same time fails with `Interrupted`.
    pub fn close(&self) {
        let pool = self.pool.write().take();
        if pool.is_some() {
            self.interrupt.cancel();
            debug!("Preview engine closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.read().is_none()
    }

    pub fn state(&self) -> EngineState {
        if self.is_closed() {
            EngineState::Closed
        } else if self.active_renders.load(Ordering::Acquire) > 0 {
            EngineState::Rendering
        } else if self.has_rendered.load(Ordering::Acquire) {
            EngineState::Idle
        } else {
            EngineState::Constructed
        }
    }

    /// Size of the worker pool.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn source(&self) -> &Arc<D> {
        &self.source
    }

    fn ensure_open(&self) -> Result<(), PreviewError> {
        if self.is_closed() {
            return Err(PreviewError::EngineClosed);
        }
        Ok(())
    }

    fn current_pool(&self) -> Result<Arc<ThreadPool>, PreviewError> {
        self.pool.read().clone().ok_or(PreviewError::EngineClosed)
    }
}

/// Marks a render as active for [`PreviewEngine::state`].
struct ActiveRender<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ActiveRender<'a> {
    fn enter<D: DataSource>(engine: &'a PreviewEngine<D>) -> Self {
        engine.active_renders.fetch_add(1, Ordering::AcqRel);
        engine.has_rendered.store(true, Ordering::Release);
        Self {
            counter: &engine.active_renders,
        }
    }
}

impl Drop for ActiveRender<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

fn to_color(color: Rgba<u8>) -> Color {
    let [r, g, b, a] = color.0;
    Color::from_rgba8(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TileVolume;
    use crate::raster::LayerError;
    use crate::source::SourceError;
    use std::sync::atomic::AtomicU32;
    use tiny_skia::Pixmap;

    struct Counting {
        queries: AtomicU32,
    }

    impl DataSource for Counting {
        type Sample = TileVolume;

        fn name(&self) -> &str {
            "counting"
        }

        fn query(&self, volume: &TileVolume) -> Result<TileVolume, SourceError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(*volume)
        }
    }

    struct White;

    impl VisualLayer<TileVolume> for White {
        fn name(&self) -> &str {
            "white"
        }

        fn render(&self, canvas: &mut Pixmap, _sample: &TileVolume) -> Result<(), LayerError> {
            canvas.fill(Color::WHITE);
            Ok(())
        }
    }

    fn engine() -> PreviewEngine<Counting> {
        let config = PreviewConfig::default()
            .with_worker_threads(2)
            .with_tile_layout(TileLayout::new(16, 16));
        let source = Arc::new(Counting {
            queries: AtomicU32::new(0),
        });
        PreviewEngine::new(source, vec![Arc::new(White)], config).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let engine = engine();
        assert_eq!(engine.state(), EngineState::Constructed);

        engine.render(&RenderJob::new(32, 32)).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);

        engine.close();
        assert_eq!(engine.state(), EngineState::Closed);
    }

    #[test]
    fn test_one_query_per_tile() {
        let engine = engine();
        engine.render(&RenderJob::new(32, 32)).unwrap();
        // Centered 32x32 view covers [-16, 16) on both axes: 2x2 tiles of 16
        assert_eq!(engine.source().queries.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_worker_count_from_config() {
        assert_eq!(engine().worker_count(), 2);
    }

    #[test]
    fn test_render_into_rejects_mismatched_target() {
        let engine = engine();
        let mut target = RgbaImage::new(10, 10);
        let err = engine
            .render_into(&RenderJob::new(20, 20), &mut target)
            .unwrap_err();
        assert!(matches!(err, PreviewError::InvalidGeometry { .. }));
        assert_eq!(engine.source().queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_render_into_reuses_buffer() {
        let engine = engine();
        let job = RenderJob::new(8, 8);
        let mut target = RgbaImage::new(8, 8);
        engine.render_into(&job, &mut target).unwrap();
        assert_eq!(target, engine.render(&job).unwrap());
    }

    #[test]
    fn test_close_is_idempotent() {
        let engine = engine();
        engine.close();
        engine.close();
        assert!(engine.is_closed());
        assert!(matches!(
            engine.render(&RenderJob::new(4, 4)),
            Err(PreviewError::EngineClosed)
        ));
    }

    #[test]
    fn test_to_color() {
        let color = to_color(Rgba([255, 0, 0, 255]));
        assert_eq!(color.to_color_u8().red(), 255);
        assert_eq!(color.to_color_u8().alpha(), 255);
    }
}
