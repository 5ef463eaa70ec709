//! Named colour maps from normalized scalars to RGBA.
//!
//! The maps follow their matplotlib namesakes:
//! - <https://matplotlib.org/stable/tutorials/colors/colormaps.html>
//!
//! `jet`, `spring` and `gray` are given by matplotlib's piecewise-linear segment
//! data and are exact. `plasma` and `viridis` are perceptual lookup tables in
//! matplotlib; here they are sampled every 1/8 and interpolated linearly in between.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayView2};
use num_traits::Float;

use crate::{ColorRaster, CompositeError, Result};

/// Built-in palette names (case-sensitive).
pub const SUPPORTED: &[&str] = &["jet", "spring", "plasma", "viridis", "gray"];

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Palette {
    Jet,
    Spring,
    Plasma,
    Viridis,
    Gray,
}

/// (position, value) knots of one channel; linear in between.
type Segments = &'static [(f64, f64)];

const JET: [Segments; 3] = [
    &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
    &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ],
    &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
];

const SPRING: [Segments; 3] = [
    &[(0.0, 1.0), (1.0, 1.0)],
    &[(0.0, 0.0), (1.0, 1.0)],
    &[(0.0, 1.0), (1.0, 0.0)],
];

const GRAY: [Segments; 3] = [
    &[(0.0, 0.0), (1.0, 1.0)],
    &[(0.0, 0.0), (1.0, 1.0)],
    &[(0.0, 0.0), (1.0, 1.0)],
];

// Evenly spaced samples at 0, 1/8, ..., 1.
const PLASMA: [[f64; 3]; 9] = [
    [0.050383, 0.029803, 0.527975],
    [0.254627, 0.013882, 0.615419],
    [0.417642, 0.000564, 0.658390],
    [0.562738, 0.051545, 0.641509],
    [0.692840, 0.165141, 0.564522],
    [0.798216, 0.280197, 0.469538],
    [0.881443, 0.392529, 0.383229],
    [0.949217, 0.517763, 0.295662],
    [0.940015, 0.975158, 0.131326],
];

const VIRIDIS: [[f64; 3]; 9] = [
    [0.267004, 0.004874, 0.329415],
    [0.278826, 0.175490, 0.483397],
    [0.229739, 0.322361, 0.545706],
    [0.172719, 0.448791, 0.557885],
    [0.127568, 0.566949, 0.550556],
    [0.157851, 0.683765, 0.501686],
    [0.369214, 0.788888, 0.382914],
    [0.678489, 0.863742, 0.189503],
    [0.993248, 0.906157, 0.143936],
];

impl Palette {
    pub fn name(&self) -> &'static str {
        match self {
            Palette::Jet => "jet",
            Palette::Spring => "spring",
            Palette::Plasma => "plasma",
            Palette::Viridis => "viridis",
            Palette::Gray => "gray",
        }
    }

    /// Maps one value to RGBA. Values outside [0, 1] take the colour of the
    /// nearest end, NaN becomes transparent black.
    pub fn map<F: Float>(&self, value: F) -> [F; 4] {
        if value.is_nan() {
            return [F::zero(); 4];
        }
        let t = value.to_f64().unwrap_or(0.0).max(0.0).min(1.0);
        let [r, g, b] = match self {
            Palette::Jet => eval_segments(&JET, t),
            Palette::Spring => eval_segments(&SPRING, t),
            Palette::Gray => eval_segments(&GRAY, t),
            Palette::Plasma => eval_samples(&PLASMA, t),
            Palette::Viridis => eval_samples(&VIRIDIS, t),
        };
        [cast(r), cast(g), cast(b), F::one()]
    }

    /// Maps every cell of `raster`, producing an array of shape (height, width, 4).
    pub fn apply<F: Float>(&self, raster: ArrayView2<F>) -> ColorRaster<F> {
        let (height, width) = raster.dim();
        let mut colored = Array::zeros((height, width, 4));
        for ((row, col), value) in raster.indexed_iter() {
            for (channel, component) in self.map(*value).iter().enumerate() {
                colored[[row, col, channel]] = *component;
            }
        }
        colored
    }
}

impl FromStr for Palette {
    type Err = CompositeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jet" => Ok(Palette::Jet),
            "spring" => Ok(Palette::Spring),
            "plasma" => Ok(Palette::Plasma),
            "viridis" => Ok(Palette::Viridis),
            "gray" | "grey" => Ok(Palette::Gray),
            _ => Err(CompositeError::UnknownPalette(s.to_string())),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Jet
    }
}

fn cast<F: Float>(v: f64) -> F {
    F::from(v).unwrap_or_else(F::zero)
}

fn eval_segments(channels: &[Segments; 3], t: f64) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (dst, knots) in out.iter_mut().zip(channels.iter()) {
        *dst = interpolate(knots, t);
    }
    out
}

fn interpolate(knots: &[(f64, f64)], t: f64) -> f64 {
    for pair in knots.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if t <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (t - x0) / (x1 - x0);
        }
    }
    knots.last().map(|&(_, y)| y).unwrap_or(0.0)
}

fn eval_samples(samples: &[[f64; 3]], t: f64) -> [f64; 3] {
    let last = samples.len() - 1;
    let pos = t * last as f64;
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;
    let mut out = [0.0; 3];
    for (c, dst) in out.iter_mut().enumerate() {
        *dst = samples[lo][c] + (samples[hi][c] - samples[lo][c]) * frac;
    }
    out
}
