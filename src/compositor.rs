//! Module that renders several patch groups with one shared normalization.
//!
//! Every group is painted into its own raster. In `add` mode each raster is
//! fitted by its own scaler and the scaler with the largest maximum is used
//! for all of them, so the groups stay comparable to the strongest one. The
//! overwrite modes hold raw weights and are not rescaled. Finally every
//! raster is mapped through the palette.

use std::ops::AddAssign;
use std::path::PathBuf;

use ndarray::Array;
use num_traits::Float;
use rayon::prelude::*;

use crate::accumulator::paint_patches;
use crate::diagnostics::{log_range, DiagnosticSink, Stages};
use crate::palette::Palette;
use crate::patch::Patch;
use crate::scaler::{GroupedNorm, MinMaxScaler};
use crate::{ColorRaster, CompositeError, CompositeMode, Raster, Result, Shape, Verbosity};

/// Output of a compositing run. All sequences are in the order of the input groups.
#[derive(Debug, Clone)]
pub struct Composite<F: Float> {
    /// Rasters as painted, before normalization.
    pub rasters: Vec<Raster<F>>,
    /// Rasters after the shared scaling; equal to `rasters` for the overwrite modes.
    pub normalized: Vec<Raster<F>>,
    /// Palette output, shape (height, width, 4) each.
    pub colored: Vec<ColorRaster<F>>,
    /// The shared scaler, if one was applied.
    pub scaler: Option<MinMaxScaler<F>>,
}

impl<F: Float> Composite<F> {
    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Raster<F>>, Vec<Raster<F>>, Vec<ColorRaster<F>>) {
        (self.rasters, self.normalized, self.colored)
    }
}

/// Compositing settings, reusable across calls.
#[derive(Debug, Clone)]
pub struct GroupedCompositor {
    pub(in crate) mode: CompositeMode,
    pub(in crate) palette: Palette,
    pub(in crate) workers: usize,
    pub(in crate) verbosity: Verbosity,
    pub(in crate) diagnostics: DiagnosticSink,
}

impl GroupedCompositor {
    pub fn new(mode: CompositeMode, palette: Palette) -> GroupedCompositor {
        GroupedCompositor {
            mode,
            palette,
            workers: 1,
            verbosity: Verbosity::Silent,
            diagnostics: DiagnosticSink::default(),
        }
    }

    /// Parses mode and palette names, f.e. `("add", "jet")`.
    pub fn from_names(mode: &str, palette: &str) -> Result<GroupedCompositor> {
        Ok(GroupedCompositor::new(mode.parse()?, palette.parse()?))
    }

    pub fn with_workers(mut self, workers: usize) -> GroupedCompositor {
        self.workers = workers;
        self
    }

    pub fn with_verbosity<V: Into<Verbosity>>(mut self, verbosity: V) -> GroupedCompositor {
        self.verbosity = verbosity.into();
        self
    }

    pub fn with_diagnostics_dir<P: Into<PathBuf>>(mut self, dir: P) -> GroupedCompositor {
        self.diagnostics = DiagnosticSink::new(dir);
        self
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Analog to composite.
    pub fn composite<F, G>(&self, groups: &[G], shape: Shape) -> Result<Composite<F>>
    where
        F: 'static + Float + AddAssign + Send + Sync,
        G: AsRef<[Patch<F>]> + Sync,
    {
        shape.validate()?;
        if self.workers == 0 {
            return Err(CompositeError::InvalidWorkerCount);
        }

        let rasters = self.build_rasters(groups, shape)?;

        let (normalized, scaler) = if self.mode.needs_scaling() {
            let mut norm = GroupedNorm::new();
            norm.compute_scaler(&rasters);
            match norm.scaler() {
                Some(_) => (norm.apply_scaling(&rasters)?, norm.into_scaler()),
                // nothing to fit, every raster is empty of values
                None => (
                    rasters.iter().map(|r| Array::zeros(r.raw_dim())).collect(),
                    None,
                ),
            }
        } else {
            (rasters.clone(), None)
        };

        let colored: Vec<ColorRaster<F>> = normalized
            .iter()
            .map(|raster| self.palette.apply(raster.view()))
            .collect();

        let output = Composite {
            rasters,
            normalized,
            colored,
            scaler,
        };
        self.report(groups, &output);
        Ok(output)
    }

    /// Renders a single group, normalized by its own range.
    pub fn composite_single<F>(&self, patches: &[Patch<F>], shape: Shape) -> Result<Composite<F>>
    where
        F: 'static + Float + AddAssign + Send + Sync,
    {
        self.composite(&[patches], shape)
    }

    fn build_rasters<F, G>(&self, groups: &[G], shape: Shape) -> Result<Vec<Raster<F>>>
    where
        F: 'static + Float + AddAssign + Send + Sync,
        G: AsRef<[Patch<F>]> + Sync,
    {
        if self.workers == 1 {
            return Ok(groups
                .iter()
                .map(|group| paint_patches(group.as_ref(), shape, self.mode, 1))
                .collect());
        }
        // Workers left over after one per group go to row bands inside each raster.
        let bands = (self.workers / groups.len().max(1)).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let rasters: Vec<Raster<F>> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| paint_patches(group.as_ref(), shape, self.mode, bands))
                .collect()
        });
        Ok(rasters)
    }

    fn report<F, G>(&self, groups: &[G], output: &Composite<F>)
    where
        F: Float,
        G: AsRef<[Patch<F>]>,
    {
        if self.verbosity < Verbosity::Summary {
            return;
        }
        for (i, group) in groups.iter().enumerate() {
            log::info!("{} patches in group {}", group.as_ref().len(), i);
            let mut stages = Stages::new(output.rasters[i].view())
                .colored(output.colored[i].view(), self.palette);
            if self.mode.needs_scaling() {
                stages = stages.normalized(output.normalized[i].view());
            }
            stages.log_summary();
            if self.verbosity >= Verbosity::Diagnostics {
                self.diagnostics
                    .with_prefix(&format!("group{}_", i))
                    .emit(&stages);
            }
        }
        log::info!("number of groups: {}", output.len());
        if let Some(max) = output.scaler.and_then(|s| s.data_max()) {
            log::info!("data_max: {}", max.to_f64().unwrap_or(f64::NAN));
        }
        for colored in &output.colored {
            log_range("Grouped", colored.view());
        }
    }
}

/// Paints every group, normalizes them against the widest-ranged group (`add`
/// mode only) and applies the palette.
///
/// Input:
/// -----------------------------------------------
/// - groups: patch groups, one raster each
/// - shape: (width, height) of every raster
/// - mode: `add`, `overwrite` or `overwrite_perimeter`
/// - palette: colour map for the normalized rasters
/// - workers: size of the worker pool, at least 1
///
/// Returns:
/// -----------------------------------------------
/// - rasters, normalized rasters and coloured rasters, in input order
pub fn composite<F, G>(
    groups: &[G],
    shape: Shape,
    mode: CompositeMode,
    palette: Palette,
    workers: usize,
    verbosity: Verbosity,
) -> Result<Composite<F>>
where
    F: 'static + Float + AddAssign + Send + Sync,
    G: AsRef<[Patch<F>]> + Sync,
{
    GroupedCompositor::new(mode, palette)
        .with_workers(workers)
        .with_verbosity(verbosity)
        .composite(groups, shape)
}
