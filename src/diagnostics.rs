//! Verbosity-gated side output: summary logging and image dumps of every stage.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};
use ndarray::*;
use num_traits::Float;

use crate::palette::Palette;
use crate::scaler::data_range;
use crate::{CompositeError, Result};

/// Directory diagnostic files go to unless configured otherwise.
pub const DEFAULT_DIR: &str = "visualization";

/// Intermediate results of one raster. Stages that were not computed are `None`.
pub struct Stages<'a, F: Float> {
    pub original: ArrayView2<'a, F>,
    pub normalized: Option<ArrayView2<'a, F>>,
    pub colored: Option<(ArrayView3<'a, F>, Palette)>,
}

impl<'a, F: Float> Stages<'a, F> {
    pub fn new(original: ArrayView2<'a, F>) -> Stages<'a, F> {
        Stages {
            original,
            normalized: None,
            colored: None,
        }
    }

    pub fn normalized(mut self, normalized: ArrayView2<'a, F>) -> Self {
        self.normalized = Some(normalized);
        self
    }

    pub fn colored(mut self, colored: ArrayView3<'a, F>, palette: Palette) -> Self {
        self.colored = Some((colored, palette));
        self
    }

    /// Logs shape and value range of every present stage at `info` level.
    pub fn log_summary(&self) {
        log_range("Original", self.original);
        if let Some(normalized) = self.normalized {
            log_range("Normalized", normalized);
        }
        if let Some((colored, _)) = self.colored {
            log_range("Colored", colored);
        }
    }
}

pub(crate) fn log_range<F: Float, D: Dimension>(label: &str, array: ArrayView<F, D>) {
    let (lo, hi) = data_range(array.view())
        .map(|(lo, hi)| (to_f64(lo), to_f64(hi)))
        .unwrap_or((f64::NAN, f64::NAN));
    log::info!(
        "[{}] shape: {:?} range: [{}, {}]",
        label,
        array.shape(),
        lo,
        hi
    );
}

/// Writes stages as files into a directory.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DiagnosticSink {
    dir: PathBuf,
    prefix: String,
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        DiagnosticSink::new(DEFAULT_DIR)
    }
}

impl DiagnosticSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> DiagnosticSink {
        DiagnosticSink {
            dir: dir.into(),
            prefix: String::new(),
        }
    }

    /// Same directory, every file name prefixed with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> DiagnosticSink {
        DiagnosticSink {
            dir: self.dir.clone(),
            prefix: prefix.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `original.npy` and `original.png`, plus `normalized.png` and
    /// `colored_<palette>.png` for the stages present. Returns the written paths.
    pub fn write<F: Float>(&self, stages: &Stages<F>) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let mut written = Vec::new();

        let path = self.path("original.npy");
        let raw: Array2<f64> = stages.original.mapv(to_f64);
        ndarray_npy::write_npy(&path, &raw)?;
        written.push(path);

        let path = self.path("original.png");
        gray_image(stages.original, F::one())?.save(&path)?;
        written.push(path);

        if let Some(normalized) = stages.normalized {
            let path = self.path("normalized.png");
            gray_image(normalized, cast(255.0))?.save(&path)?;
            written.push(path);
        }

        if let Some((colored, palette)) = stages.colored {
            let path = self.path(&format!("colored_{}.png", palette));
            rgba_image(colored)?.save(&path)?;
            written.push(path);
        }

        log::info!(
            "wrote {} diagnostic files to {}",
            written.len(),
            self.dir.display()
        );
        Ok(written)
    }

    /// Like [`DiagnosticSink::write`], but failures are only logged.
    pub(crate) fn emit<F: Float>(&self, stages: &Stages<F>) {
        if let Err(e) = self.write(stages) {
            log::warn!("failed to write diagnostics to {}: {}", self.dir.display(), e);
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, name))
    }
}

fn to_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

fn cast<F: Float>(v: f64) -> F {
    F::from(v).unwrap_or_else(F::one)
}

/// Scales by `gain` and clamps to [0, 255]; NaN becomes 0.
fn to_u8<F: Float>(v: F, gain: F) -> u8 {
    let scaled = to_f64(v * gain);
    if scaled.is_nan() {
        return 0;
    }
    scaled.max(0.0).min(255.0).round() as u8
}

fn gray_image<F: Float>(raster: ArrayView2<F>, gain: F) -> Result<GrayImage> {
    let (height, width) = raster.dim();
    let pixels = raster.iter().map(|&v| to_u8(v, gain)).collect();
    GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or(CompositeError::InvalidShape { width, height })
}

fn rgba_image<F: Float>(colored: ArrayView3<F>) -> Result<RgbaImage> {
    let (height, width, _) = colored.dim();
    let gain = cast(255.0);
    let pixels = colored.iter().map(|&v| to_u8(v, gain)).collect();
    RgbaImage::from_raw(width as u32, height as u32, pixels)
        .ok_or(CompositeError::InvalidShape { width, height })
}
