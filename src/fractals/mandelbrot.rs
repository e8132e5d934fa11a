use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    big_float::BigFloat,
    color_map::{ColorMapLookUpTable, ColorMapper, HsvEscapeColorMap},
    scalar::{Precision, Scalar},
    viewport::{find_precision_exhaustion, PlaneBounds, PrecisionExhausted},
    work_queue::{PixelJob, WorkQueue},
    worker_pool::WorkerPool,
};

use super::escape_time::{evaluate, EscapeResult, RenderConfig};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RenderOptions {
    /// Number of worker threads; `None` uses the hardware parallelism.
    pub worker_count: Option<usize>,
}

impl RenderOptions {
    pub fn worker_pool(&self) -> WorkerPool {
        match self.worker_count {
            Some(count) => WorkerPool::new(count),
            None => WorkerPool::with_available_parallelism(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MandelbrotParams {
    pub resolution: nalgebra::Vector2<u32>,
    pub bounds: PlaneBounds<f64>,
    #[serde(default)]
    pub render_config: RenderConfig,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub render_options: RenderOptions,
}

impl Default for MandelbrotParams {
    fn default() -> Self {
        MandelbrotParams {
            resolution: nalgebra::Vector2::new(840, 840),
            bounds: PlaneBounds {
                real_min: -1.5,
                real_max: 0.5,
                imag_min: -1.0,
                imag_max: 1.0,
            },
            render_config: RenderConfig::default(),
            precision: Precision::FixedWidth,
            render_options: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Unable to read parameter file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse parameter file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid resolution {width}x{height}: both dimensions must be positive")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid plane bounds (require finite values with max > min): {0:?}")]
    InvalidBounds(PlaneBounds<f64>),

    #[error("Invalid render config (require max_iter_count > 0 and a positive cutoff): {0:?}")]
    InvalidRenderConfig(RenderConfig),

    #[error("Invalid precision: {0}")]
    InvalidPrecision(Precision),
}

impl MandelbrotParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let (width, height) = (self.resolution[0], self.resolution[1]);
        if width == 0 || height == 0 {
            return Err(ParamsError::InvalidResolution { width, height });
        }
        let bounds = &self.bounds;
        let finite = [bounds.real_min, bounds.real_max, bounds.imag_min, bounds.imag_max]
            .iter()
            .all(|value| value.is_finite());
        if !finite || !bounds.is_valid() {
            return Err(ParamsError::InvalidBounds(bounds.clone()));
        }
        if !self.render_config.is_valid() {
            return Err(ParamsError::InvalidRenderConfig(self.render_config.clone()));
        }
        if let Precision::ArbitraryPrecision { bits: 0 } = self.precision {
            return Err(ParamsError::InvalidPrecision(self.precision));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<MandelbrotParams, ParamsError> {
        let params: MandelbrotParams = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<MandelbrotParams, ParamsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        MandelbrotParams::from_json(&text)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderDiagnostics {
    pub precision_exhausted: Option<PrecisionExhausted>,
    pub jobs_per_worker: Vec<usize>,
    pub in_set_count: usize,
}

pub struct RenderOutput {
    pub image: RgbImage,
    pub diagnostics: RenderDiagnostics,
}

/// A queued pixel carries exclusive access to the image cell it will write.
struct PendingPixel<'a> {
    job: PixelJob,
    cell: &'a mut Rgb<u8>,
}

/**
 * Compute the full escape-time image for `bounds`.
 *
 * Every pixel becomes one job on a shared queue, drained by `worker_pool`. The call
 * returns only after every worker has been joined, so the image is always complete.
 * The precision check runs afterwards and never changes the image.
 */
pub fn render<T: Scalar>(
    resolution: &nalgebra::Vector2<u32>,
    bounds: &PlaneBounds<T>,
    config: &RenderConfig,
    precision: T::Precision,
    worker_pool: &WorkerPool,
) -> RenderOutput {
    let (width, height) = (resolution[0], resolution[1]);
    assert!(width > 0 && height > 0, "Invalid resolution: {}x{}", width, height);
    assert!(bounds.is_valid(), "Invalid plane bounds: {:?}", bounds);
    assert!(config.is_valid(), "Invalid render config: {:?}", config);

    let pixel_mapper = bounds.pixel_mapper(width, height, precision);
    let cutoff = T::from_f64(config.escape_radius_squared, precision);
    let color_map = ColorMapLookUpTable::from_color_map(
        &HsvEscapeColorMap {
            max_iter_count: config.max_iter_count,
        },
        config.max_iter_count,
    );
    let in_set_count = AtomicUsize::new(0);

    let mut image = RgbImage::new(width, height);
    let jobs_per_worker = {
        let queue: WorkQueue<PendingPixel<'_>> = image
            .enumerate_pixels_mut()
            .map(|(x, y, cell)| PendingPixel {
                job: PixelJob { x, y },
                cell,
            })
            .collect();

        worker_pool.drain(&queue, |pending| {
            let (real_0, imag_0) = pixel_mapper.map(&(pending.job.x, pending.job.y));
            let result = evaluate(real_0, imag_0, &cutoff, config.max_iter_count);
            if result == EscapeResult::InSet {
                in_set_count.fetch_add(1, Ordering::Relaxed);
            }
            *pending.cell = color_map.compute_pixel(result);
        })
    };

    let precision_exhausted = find_precision_exhaustion(bounds, width, height, precision);
    if let Some(exhausted) = precision_exhausted {
        warn!(
            "Precision exhausted at this zoom level: {}. Increase the precision bits for a faithful render.",
            exhausted
        );
    }

    let diagnostics = RenderDiagnostics {
        precision_exhausted,
        jobs_per_worker,
        in_set_count: in_set_count.into_inner(),
    };
    info!(
        "Rendered {}x{} pixels with {} workers ({} in set)",
        width,
        height,
        diagnostics.jobs_per_worker.len(),
        diagnostics.in_set_count
    );
    RenderOutput { image, diagnostics }
}

/**
 * Render the parameters at the arithmetic they select. The `f64` bounds from the
 * parameter file are converted into the chosen backend before any pixel is mapped.
 */
pub fn render_with_precision(params: &MandelbrotParams) -> RenderOutput {
    let worker_pool = params.render_options.worker_pool();
    match params.precision {
        Precision::FixedWidth => render(
            &params.resolution,
            &params.bounds,
            &params.render_config,
            (),
            &worker_pool,
        ),
        Precision::ArbitraryPrecision { bits } => render(
            &params.resolution,
            &PlaneBounds::<BigFloat>::from_f64_bounds(&params.bounds, bits),
            &params.render_config,
            bits,
            &worker_pool,
        ),
    }
}
