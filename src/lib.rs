//! This package renders heatmaps from weighted rectangular patches, as produced f.e. by an object detector.
//! Patches are aggregated into rasters, several rasters ("groups") are normalized against one shared range
//! and the result is mapped through a named colour palette.
//! Input and output are in the form of ndarrays.
//!
//! The pipeline has three stages:
//! - [`accumulator`]: paints one group of patches into a raster (`add`, `overwrite` or `overwrite_perimeter`)
//! - [`scaler`]: min-max normalization, with the widest fit shared across all groups
//! - [`palette`]: maps normalized values to RGBA
//!
//! [`compositor`] ties them together.
//!
//! Example:
//! ```
//! use patch_heatmap::compositor::*;
//! use patch_heatmap::{CompositeMode, Patch, Shape};
//! use patch_heatmap::palette::Palette;
//!
//! // Patches are (row, column, row extent, column extent, weight)
//! let first = vec![Patch::new(0, 0, 5, 5, 1.0_f32), Patch::new(2, 2, 5, 5, 1.0)];
//! let second = vec![Patch::new(4, 4, 3, 3, 0.5_f32)];
//!
//! let compositor = GroupedCompositor::new(CompositeMode::Add, Palette::Jet);
//! let output = compositor
//!     .composite(&[first, second], Shape::new(10, 10))
//!     .unwrap();
//!
//! assert_eq!(output.rasters.len(), 2);
//! assert_eq!(output.colored[0].shape(), &[10, 10, 4]);
//! println!("Normalized: {:?}", output.normalized[0]);
//! ```

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3};

pub mod accumulator;
pub mod compositor;
pub mod diagnostics;
pub mod error;
pub mod palette;
pub mod patch;
pub mod scaler;

pub use error::{CompositeError, Result};
pub use patch::Patch;

/// Dense grid of patch values, shape (height, width).
pub type Raster<F> = Array2<F>;
/// RGBA image in [0, 1], shape (height, width, 4).
pub type ColorRaster<F> = Array3<F>;
/// Ordered patches that end up in one raster.
pub type Group<F> = Vec<Patch<F>>;

/// How overlapping patches combine.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CompositeMode {
    /// Weights are summed; results are normalized afterwards.
    Add,
    /// The footprint is set to the weight, highest weight wins.
    Overwrite,
    /// Like `Overwrite`, but only the border of the footprint is painted.
    OverwritePerimeter,
}

impl CompositeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeMode::Add => "add",
            CompositeMode::Overwrite => "overwrite",
            CompositeMode::OverwritePerimeter => "overwrite_perimeter",
        }
    }

    /// Whether the raster has to be min-max normalized before colour mapping.
    pub fn needs_scaling(&self) -> bool {
        *self == CompositeMode::Add
    }
}

impl FromStr for CompositeMode {
    type Err = CompositeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(CompositeMode::Add),
            "overwrite" => Ok(CompositeMode::Overwrite),
            "overwrite_perimeter" => Ok(CompositeMode::OverwritePerimeter),
            _ => Err(CompositeError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image size. Note the order: a raster built for `Shape { width, height }`
/// has `height` rows and `width` columns.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
}

impl Shape {
    pub fn new(width: usize, height: usize) -> Shape {
        Shape { width, height }
    }

    /// Dimensions of the raster, (rows, columns).
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CompositeError::InvalidShape {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl From<(usize, usize)> for Shape {
    /// Takes `(width, height)`.
    fn from((width, height): (usize, usize)) -> Shape {
        Shape::new(width, height)
    }
}

/// Amount of output produced next to the actual computation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum Verbosity {
    Silent,
    /// Log summary statistics of every stage.
    Summary,
    /// Additionally write diagnostic images to disk.
    Diagnostics,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Verbosity {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Summary,
            _ => Verbosity::Diagnostics,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Silent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip() {
        for mode in [
            CompositeMode::Add,
            CompositeMode::Overwrite,
            CompositeMode::OverwritePerimeter,
        ]
        .iter()
        {
            assert_eq!(mode.as_str().parse::<CompositeMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        match "blend".parse::<CompositeMode>() {
            Err(CompositeError::InvalidMode(name)) => assert_eq!(name, "blend"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn shape_is_width_then_height() {
        let shape = Shape::from((7, 3));
        assert_eq!(shape.dim(), (3, 7));
        assert!(Shape::new(0, 3).validate().is_err());
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(Verbosity::from(0), Verbosity::Silent);
        assert_eq!(Verbosity::from(1), Verbosity::Summary);
        assert_eq!(Verbosity::from(2), Verbosity::Diagnostics);
        assert!(Verbosity::from(5) >= Verbosity::Diagnostics);
    }
}
