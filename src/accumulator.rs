//! Module that paints a group of patches into a raster.
//!
//! Patches are applied in ascending order of their weight, so for the
//! overwrite modes the heaviest patch ends up on top and for `add` the
//! summation order is fixed.
//!
//! With more than one worker the raster is cut into horizontal row bands.
//! Every band is owned by one worker, which applies all patches (in the same
//! order) clipped to its rows. No cell is ever written by two workers, so the
//! result is identical to the sequential one for every mode.

use std::ops::AddAssign;

use ndarray::*;
use num_traits::Float;
use rayon::prelude::*;

use crate::diagnostics::{DiagnosticSink, Stages};
use crate::patch::{sorted_by_alpha, Footprint, Patch};
use crate::{CompositeError, CompositeMode, Raster, Result, Shape, Verbosity};

/// Raster builder for one fixed shape and mode.
#[derive(Debug, Clone)]
pub struct RasterAccumulator {
    pub(in crate) shape: Shape,
    pub(in crate) mode: CompositeMode,
    pub(in crate) workers: usize,
    pub(in crate) verbosity: Verbosity,
    pub(in crate) diagnostics: DiagnosticSink,
}

impl RasterAccumulator {
    pub fn new(shape: Shape, mode: CompositeMode) -> RasterAccumulator {
        RasterAccumulator {
            shape,
            mode,
            workers: 1,
            verbosity: Verbosity::Silent,
            diagnostics: DiagnosticSink::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> RasterAccumulator {
        self.workers = workers;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> RasterAccumulator {
        self.verbosity = verbosity;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> RasterAccumulator {
        self.diagnostics = diagnostics;
        self
    }

    /// Analog to build_raster_parallel, using this accumulator's settings.
    pub fn accumulate<F>(&self, patches: &[Patch<F>]) -> Result<Raster<F>>
    where
        F: 'static + Float + AddAssign + Send + Sync,
    {
        self.shape.validate()?;
        if self.workers == 0 {
            return Err(CompositeError::InvalidWorkerCount);
        }
        let raster = if self.workers == 1 {
            paint_patches(patches, self.shape, self.mode, 1)
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()?;
            pool.install(|| paint_patches(patches, self.shape, self.mode, self.workers))
        };
        self.report(&raster);
        Ok(raster)
    }

    pub(in crate) fn report<F: Float>(&self, raster: &Raster<F>) {
        if self.verbosity >= Verbosity::Summary {
            let stages = Stages::new(raster.view());
            stages.log_summary();
            if self.verbosity >= Verbosity::Diagnostics {
                self.diagnostics.emit(&stages);
            }
        }
    }
}

/// Paints `patches` into a zero raster of the given shape, sequentially.
///
/// Input:
/// -----------------------------------------------
/// - patches: (x, y, cx, cy, alpha), x/cx along rows, y/cy along columns
/// - shape: (width, height); the raster has `height` rows
/// - mode: how overlapping patches combine
///
/// Returns:
/// -----------------------------------------------
/// - raster of shape (height, width)
pub fn build_raster<F>(
    patches: &[Patch<F>],
    shape: Shape,
    mode: CompositeMode,
    verbosity: Verbosity,
) -> Result<Raster<F>>
where
    F: 'static + Float + AddAssign + Send + Sync,
{
    RasterAccumulator::new(shape, mode)
        .with_verbosity(verbosity)
        .accumulate(patches)
}

/// Same as [`build_raster`], with the rows split over `workers` threads.
pub fn build_raster_parallel<F>(
    patches: &[Patch<F>],
    shape: Shape,
    mode: CompositeMode,
    workers: usize,
    verbosity: Verbosity,
) -> Result<Raster<F>>
where
    F: 'static + Float + AddAssign + Send + Sync,
{
    RasterAccumulator::new(shape, mode)
        .with_workers(workers)
        .with_verbosity(verbosity)
        .accumulate(patches)
}

/// Builds the raster on the current rayon pool, cut into `bands` row bands.
/// Callers validate the shape.
pub(in crate) fn paint_patches<F>(
    patches: &[Patch<F>],
    shape: Shape,
    mode: CompositeMode,
    bands: usize,
) -> Raster<F>
where
    F: 'static + Float + AddAssign + Send + Sync,
{
    let (height, width) = shape.dim();
    let footprints: Vec<(Footprint, F)> = sorted_by_alpha(patches)
        .into_iter()
        .filter_map(|patch| match patch.clip(height, width) {
            Some(footprint) => Some((footprint, patch.alpha)),
            None => {
                log::debug!(
                    "dropping patch ({}, {}, {}, {}) outside of {}x{}",
                    patch.x,
                    patch.y,
                    patch.cx,
                    patch.cy,
                    width,
                    height
                );
                None
            }
        })
        .collect();

    let mut raster = Array::zeros((height, width));
    if bands <= 1 {
        for (footprint, alpha) in &footprints {
            paint(&mut raster.view_mut(), 0, footprint, *alpha, mode);
        }
        return raster;
    }

    let band_rows = (height + bands - 1) / bands;
    let bands: Vec<(usize, ArrayViewMut2<F>)> = raster
        .axis_chunks_iter_mut(Axis(0), band_rows)
        .enumerate()
        .map(|(i, band)| (i * band_rows, band))
        .collect();
    bands.into_par_iter().for_each(|(first_row, mut band)| {
        for (footprint, alpha) in &footprints {
            paint(&mut band, first_row, footprint, *alpha, mode);
        }
    });
    raster
}

/// Applies one patch to the rows of `band`, which start at raster row `first_row`.
fn paint<F>(
    band: &mut ArrayViewMut2<F>,
    first_row: usize,
    footprint: &Footprint,
    alpha: F,
    mode: CompositeMode,
) where
    F: Float + AddAssign,
{
    let start = footprint.row.max(first_row);
    let end = (footprint.row + footprint.rows).min(first_row + band.nrows());
    if start >= end {
        return;
    }
    let rows = start - first_row..end - first_row;
    let cols = footprint.col_range();

    match mode {
        CompositeMode::Add => band
            .slice_mut(s![rows, cols])
            .map_inplace(|v| *v += alpha),
        CompositeMode::Overwrite => band.slice_mut(s![rows, cols]).fill(alpha),
        CompositeMode::OverwritePerimeter => {
            for row in start..end {
                let local = row - first_row;
                if row == footprint.row || row == footprint.last_row() {
                    band.slice_mut(s![local, cols.clone()]).fill(alpha);
                } else {
                    band[[local, footprint.col]] = alpha;
                    band[[local, footprint.last_col()]] = alpha;
                }
            }
        }
    }
}
