//! Min-max normalization of rasters.
//!
//! [`MinMaxScaler`] maps a fitted range onto [0, 1]. [`GroupedNorm`] fits one
//! scaler per raster of a group and keeps the one with the largest fitted
//! maximum, so that every raster is displayed relative to the strongest one.

use ndarray::*;
use num_traits::Float;

use crate::{CompositeError, Raster, Result};

/// Min-max range holder providing the affine map `v -> (v - min) / (max - min)`.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct MinMaxScaler<F: Float> {
    range: Option<(F, F)>,
}

impl<F: Float> Default for MinMaxScaler<F> {
    fn default() -> Self {
        MinMaxScaler::new()
    }
}

impl<F: Float> MinMaxScaler<F> {
    pub fn new() -> MinMaxScaler<F> {
        MinMaxScaler { range: None }
    }

    /// Scaler with a known range. `min` and `max` are swapped if given in the wrong order.
    pub fn with_range(min: F, max: F) -> MinMaxScaler<F> {
        MinMaxScaler {
            range: Some((min.min(max), min.max(max))),
        }
    }

    /// Widens the fitted range to cover `raster`. NaN cells are ignored,
    /// a raster without any other cell leaves the scaler unchanged.
    pub fn fit<'a, T>(&mut self, raster: T)
    where
        F: 'a,
        T: AsArray<'a, F, Ix2>,
    {
        let raster: ArrayView2<F> = raster.into();
        if let Some((lo, hi)) = data_range(raster) {
            self.range = Some(match self.range {
                Some((min, max)) => (min.min(lo), max.max(hi)),
                None => (lo, hi),
            });
        }
    }

    /// Applies the fitted range. A flat fit (`max == min`) yields all zeros.
    pub fn transform<'a, T>(&self, raster: T) -> Result<Raster<F>>
    where
        F: 'a,
        T: AsArray<'a, F, Ix2>,
    {
        let raster: ArrayView2<F> = raster.into();
        let (min, max) = self.range.ok_or(CompositeError::UnfittedScaler)?;
        let span = max - min;
        if span == F::zero() {
            return Ok(Array::zeros(raster.raw_dim()));
        }
        Ok(raster.mapv(|v| (v - min) / span))
    }

    pub fn fit_transform<'a, T>(&mut self, raster: T) -> Result<Raster<F>>
    where
        F: 'a,
        T: AsArray<'a, F, Ix2>,
    {
        let raster: ArrayView2<F> = raster.into();
        self.fit(raster);
        self.transform(raster)
    }

    pub fn is_fitted(&self) -> bool {
        self.range.is_some()
    }

    pub fn data_min(&self) -> Option<F> {
        self.range.map(|(min, _)| min)
    }

    pub fn data_max(&self) -> Option<F> {
        self.range.map(|(_, max)| max)
    }

    pub fn data_range(&self) -> Option<(F, F)> {
        self.range
    }
}

/// Smallest and largest non-NaN value, `None` if there is none.
pub fn data_range<F: Float, D: Dimension>(array: ArrayView<F, D>) -> Option<(F, F)> {
    array.iter().fold(None, |acc, &v| {
        if v.is_nan() {
            return acc;
        }
        Some(match acc {
            Some((lo, hi)) => (if v < lo { v } else { lo }, if v > hi { v } else { hi }),
            None => (v, v),
        })
    })
}

/// Picks the scaler with the strictly largest fitted maximum; the first one wins ties.
/// Unfitted scalers never win.
pub fn select_widest<F, I>(scalers: I) -> Option<MinMaxScaler<F>>
where
    F: Float,
    I: IntoIterator<Item = MinMaxScaler<F>>,
{
    scalers
        .into_iter()
        .filter(MinMaxScaler::is_fitted)
        .fold(None, |best: Option<MinMaxScaler<F>>, candidate| match best {
            Some(b) if b.data_max() >= candidate.data_max() => Some(b),
            _ => Some(candidate),
        })
}

/// Shared normalization for a group of rasters.
///
/// Every raster is fitted by an independent scaler and only the one with the
/// largest maximum is kept. This is not the union of all ranges: a raster whose
/// minimum lies below the chosen minimum is mapped below zero.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct GroupedNorm<F: Float> {
    scaler: Option<MinMaxScaler<F>>,
}

impl<F: Float> Default for GroupedNorm<F> {
    fn default() -> Self {
        GroupedNorm::new()
    }
}

impl<F: Float> GroupedNorm<F> {
    pub fn new() -> GroupedNorm<F> {
        GroupedNorm { scaler: None }
    }

    /// Computes the shared scaler without applying it. Repeated calls keep
    /// competing against the scaler selected so far.
    pub fn compute_scaler(&mut self, rasters: &[Raster<F>]) -> Option<&MinMaxScaler<F>> {
        let candidates = rasters.iter().map(|raster| {
            let mut scaler = MinMaxScaler::new();
            scaler.fit(raster);
            scaler
        });
        self.scaler = select_widest(self.scaler.take().into_iter().chain(candidates));
        if let Some(max) = self.scaler.and_then(|s| s.data_max()) {
            log::debug!("selected scaler data_max: {}", max.to_f64().unwrap_or(f64::NAN));
        }
        self.scaler.as_ref()
    }

    /// Like [`GroupedNorm::compute_scaler`], with one more level of grouping.
    pub fn compute_scaler_nested(&mut self, groups: &[Vec<Raster<F>>]) -> Option<&MinMaxScaler<F>> {
        for rasters in groups {
            self.compute_scaler(rasters);
        }
        self.scaler.as_ref()
    }

    /// Normalizes every raster with the selected scaler.
    pub fn apply_scaling(&self, rasters: &[Raster<F>]) -> Result<Vec<Raster<F>>> {
        let scaler = self.scaler.as_ref().ok_or(CompositeError::UnfittedScaler)?;
        rasters.iter().map(|raster| scaler.transform(raster)).collect()
    }

    pub fn scaler(&self) -> Option<&MinMaxScaler<F>> {
        self.scaler.as_ref()
    }

    pub fn into_scaler(self) -> Option<MinMaxScaler<F>> {
        self.scaler
    }
}
