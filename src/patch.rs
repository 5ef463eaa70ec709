//! Weighted rectangular patches and their clipping against the raster bounds.

use std::cmp::Ordering;
use std::ops::Range;

use num_traits::Float;

/// A single rectangular contribution to a raster.
///
/// `x` is the row and `y` the column of the top-left corner, `cx` and `cy`
/// the extent along rows and columns respectively. This matches the
/// (row, column) convention of the detector boxes these heatmaps are drawn from.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Patch<F: Float> {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    pub alpha: F,
}

impl<F: Float> Patch<F> {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64, alpha: F) -> Patch<F> {
        Patch {
            x,
            y,
            cx,
            cy,
            alpha,
        }
    }

    /// Clips the patch to a raster with `height` rows and `width` columns.
    ///
    /// A patch reaching the far edge is shortened so that it ends one cell
    /// before it (`cx = height - x - 1`), which is how the heatmaps have always
    /// been drawn. Cells in front of the origin are cut off. Returns `None` if
    /// nothing is left.
    pub fn clip(&self, height: usize, width: usize) -> Option<Footprint> {
        let (row, rows) = clip_axis(self.x, self.cx, height as i64);
        let (col, cols) = clip_axis(self.y, self.cy, width as i64);
        if rows <= 0 || cols <= 0 {
            return None;
        }
        Some(Footprint {
            row: row as usize,
            col: col as usize,
            rows: rows as usize,
            cols: cols as usize,
        })
    }
}

impl<F: Float> From<(i64, i64, i64, i64, F)> for Patch<F> {
    fn from((x, y, cx, cy, alpha): (i64, i64, i64, i64, F)) -> Patch<F> {
        Patch::new(x, y, cx, cy, alpha)
    }
}

fn clip_axis(start: i64, extent: i64, len: i64) -> (i64, i64) {
    let (mut start, mut extent) = (start, extent);
    if start < 0 {
        extent = extent.saturating_add(start);
        start = 0;
    }
    if start.saturating_add(extent) >= len {
        extent = len - start - 1;
    }
    (start, extent)
}

/// Clipped, non-empty cell range covered by a patch.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Footprint {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Footprint {
    pub fn row_range(&self) -> Range<usize> {
        self.row..self.row + self.rows
    }

    pub fn col_range(&self) -> Range<usize> {
        self.col..self.col + self.cols
    }

    pub fn last_row(&self) -> usize {
        self.row + self.rows - 1
    }

    pub fn last_col(&self) -> usize {
        self.col + self.cols - 1
    }
}

/// Stable sort by ascending weight, so the heaviest patch is applied last.
/// NaN weights sort first.
pub(crate) fn sorted_by_alpha<F: Float>(patches: &[Patch<F>]) -> Vec<Patch<F>> {
    let mut sorted = patches.to_vec();
    sorted.sort_by(|a, b| compare_alpha(a.alpha, b.alpha));
    sorted
}

fn compare_alpha<F: Float>(a: F, b: F) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // total on non-NaN values
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
