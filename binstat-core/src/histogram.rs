//! Generic N-dimensional histogram engine.
//!
//! [`Histogram`] owns one [`HistogramData`] and implements everything that
//! does not depend on a fixed dimension: configuration, addressing, weighted
//! fills, per-bin statistics, whole-histogram aggregates and arithmetic.
//!
//! An instrument is either unconfigured (dimension 0, no storage) or fully
//! configured. A failed [`Histogram::configure`] always lands in the
//! unconfigured state.

use crate::axis::{Axis, BinIndex};
use crate::config::{HistogramConfig, ValueWindow};
use crate::data::{spread, HistogramData};
use crate::error::{Error, Result};

/// Weighted histogram or profile of any dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    data: HistogramData,
}

impl Histogram {
    /// Builds a configured histogram.
    ///
    /// # Errors
    /// Returns an error if the configuration is rejected, see
    /// [`Histogram::configure`].
    pub fn new(config: &HistogramConfig) -> Result<Self> {
        let mut histogram = Self::default();
        histogram.configure(config)?;
        Ok(histogram)
    }

    /// Replaces the binning and storage with a fresh, zeroed layout.
    ///
    /// # Errors
    /// Fails with no axes, an invalid axis, or a flattened bin count that
    /// does not fit in `usize`. On failure the histogram is left
    /// unconfigured.
    pub fn configure(&mut self, config: &HistogramConfig) -> Result<()> {
        match build(config) {
            Ok(data) => {
                log::debug!(
                    "configured '{}': dimension {}, {} flattened bins{}",
                    data.title,
                    data.dimension,
                    data.bin_count,
                    if data.is_profile() { ", profile" } else { "" }
                );
                self.data = data;
                Ok(())
            }
            Err(err) => {
                log::debug!("rejected configuration '{}': {err}", config.title);
                self.clear();
                Err(err)
            }
        }
    }

    /// Adopts externally restored accumulator state.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if there are no axes, or if the array
    /// lengths or multipliers do not match them.
    pub fn from_data(data: HistogramData) -> Result<Self> {
        if data.dimension == 0 {
            return Err(Error::Configuration("restored state has no axes".into()));
        }
        if !data.is_consistent() {
            return Err(Error::Configuration(
                "accumulator layout does not match the axes".into(),
            ));
        }
        Ok(Self { data })
    }

    /// Wraps storage produced by [`HistogramData::allocate`].
    pub(crate) fn from_allocated(data: HistogramData) -> Self {
        Self { data }
    }

    /// Drops axes and storage, returning to the unconfigured state.
    pub fn clear(&mut self) {
        self.data = HistogramData::default();
    }

    /// Zeroes every accumulator, keeping the binning.
    pub fn reset(&mut self) {
        self.data.zero();
    }

    /// Returns true once configured.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data.dimension > 0
    }

    /// Raw accumulator state.
    #[must_use]
    pub fn data(&self) -> &HistogramData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut HistogramData {
        &mut self.data
    }

    /// Consumes the histogram, returning its storage.
    #[must_use]
    pub fn into_data(self) -> HistogramData {
        self.data
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.data.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.data.title = title.into();
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.dimension
    }

    /// Total flattened bin count, outflow slots included.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.data.bin_count
    }

    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.data.axes
    }

    #[must_use]
    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.data.axes.get(index)
    }

    #[must_use]
    pub fn is_profile(&self) -> bool {
        self.data.is_profile()
    }

    /// Value window of a profile, if one was set.
    #[must_use]
    pub fn value_window(&self) -> Option<ValueWindow> {
        self.data.profile.as_ref().and_then(|profile| profile.window)
    }

    // Addressing

    /// Flat offset of the bin containing `coords`.
    ///
    /// # Errors
    /// Fails if unconfigured, if `coords` has the wrong length, or if a
    /// coordinate cannot be mapped (NaN).
    pub fn offset_of_coords(&self, coords: &[f64]) -> Result<usize> {
        if !self.is_valid() {
            return Err(Error::NotConfigured);
        }
        if coords.len() != self.data.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.data.dimension,
                found: coords.len(),
            });
        }
        let mut offset = 0;
        for (axis_index, (axis, &value)) in self.data.axes.iter().zip(coords).enumerate() {
            let abs = axis.coord_to_absolute_index(value).ok_or(Error::OutOfDomain {
                axis: axis_index,
                value,
            })?;
            offset += abs * axis.multiplier();
        }
        Ok(offset)
    }

    /// Flat offset of a per-axis bin address, or `None` if the address is
    /// invalid.
    #[must_use]
    pub fn offset_of_indices(&self, indices: &[BinIndex]) -> Option<usize> {
        if !self.is_valid() || indices.len() != self.data.dimension {
            return None;
        }
        self.data
            .axes
            .iter()
            .zip(indices)
            .try_fold(0, |offset, (axis, &index)| {
                axis.in_range_to_absolute_index(index)
                    .map(|abs| offset + abs * axis.multiplier())
            })
    }

    /// Decodes `offset` into per-axis bin addresses.
    #[must_use]
    pub fn indices(&self, offset: usize) -> Vec<BinIndex> {
        let mut indices = vec![BinIndex::Underflow; self.data.dimension];
        self.indices_into(offset, &mut indices);
        indices
    }

    /// Decodes `offset` into `out`, most significant axis first.
    ///
    /// `out` must hold exactly one slot per axis.
    pub fn indices_into(&self, offset: usize, out: &mut [BinIndex]) {
        debug_assert_eq!(out.len(), self.data.dimension);
        let mut rest = offset;
        for (axis, slot) in self.data.axes.iter().zip(out.iter_mut()).rev() {
            let abs = rest / axis.multiplier();
            rest -= abs * axis.multiplier();
            *slot = axis.absolute_to_bin_index(abs);
        }
    }

    pub(crate) fn absolute_indices_into(&self, offset: usize, out: &mut [usize]) {
        debug_assert_eq!(out.len(), self.data.dimension);
        let mut rest = offset;
        for (axis, slot) in self.data.axes.iter().zip(out.iter_mut()).rev() {
            *slot = rest / axis.multiplier();
            rest -= *slot * axis.multiplier();
        }
    }

    /// Returns true if `offset` addresses an outflow bin.
    #[must_use]
    pub fn is_out(&self, offset: usize) -> bool {
        self.data.is_out(offset)
    }

    // Fills

    /// Adds one weighted sample at `coords`.
    ///
    /// On a profile this accumulates no secondary value; use
    /// [`Histogram::fill_bin_profile`] instead.
    ///
    /// # Errors
    /// See [`Histogram::offset_of_coords`]. Nothing is accumulated on error.
    pub fn fill_bin(&mut self, coords: &[f64], weight: f64) -> Result<()> {
        let offset = self.offset_of_coords(coords)?;
        self.data.accumulate(offset, coords, None, weight);
        Ok(())
    }

    /// Adds one weighted sample with secondary value `value` to a profile.
    ///
    /// Values outside the profile's window are ignored and reported as
    /// success.
    ///
    /// # Errors
    /// Fails if unconfigured, if the histogram is not a profile, or as
    /// [`Histogram::offset_of_coords`].
    pub fn fill_bin_profile(&mut self, coords: &[f64], value: f64, weight: f64) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::NotConfigured);
        }
        let Some(profile) = &self.data.profile else {
            return Err(Error::NotProfile);
        };
        if profile.window.is_some_and(|window| !window.contains(value)) {
            return Ok(());
        }
        let offset = self.offset_of_coords(coords)?;
        self.data.accumulate(offset, coords, Some(value), weight);
        Ok(())
    }

    // Per-bin statistics; invalid addresses read as 0.

    #[must_use]
    pub fn bin_entries(&self, indices: &[BinIndex]) -> i64 {
        self.offset_of_indices(indices)
            .map_or(0, |offset| self.data.entries[offset])
    }

    #[must_use]
    pub fn bin_height(&self, indices: &[BinIndex]) -> f64 {
        self.offset_of_indices(indices)
            .map_or(0.0, |offset| self.data.height_at(offset))
    }

    #[must_use]
    pub fn bin_error(&self, indices: &[BinIndex]) -> f64 {
        self.offset_of_indices(indices)
            .map_or(0.0, |offset| self.data.error_at(offset))
    }

    /// Per-axis weighted mean coordinate of one bin.
    #[must_use]
    pub fn bin_mean(&self, indices: &[BinIndex]) -> Vec<f64> {
        self.per_axis(indices, HistogramData::mean_at)
    }

    /// Per-axis weighted standard deviation of one bin.
    #[must_use]
    pub fn bin_std_dev(&self, indices: &[BinIndex]) -> Vec<f64> {
        self.per_axis(indices, HistogramData::std_dev_at)
    }

    /// RMS of the secondary value; 0 for counting histograms.
    #[must_use]
    pub fn bin_rms(&self, indices: &[BinIndex]) -> f64 {
        self.offset_of_indices(indices)
            .map_or(0.0, |offset| self.data.rms_at(offset))
    }

    fn per_axis(
        &self,
        indices: &[BinIndex],
        stat: impl Fn(&HistogramData, usize, usize) -> f64,
    ) -> Vec<f64> {
        let mut values = vec![0.0; self.data.dimension];
        if let Some(offset) = self.offset_of_indices(indices) {
            for (axis, value) in values.iter_mut().enumerate() {
                *value = stat(&self.data, offset, axis);
            }
        }
        values
    }

    // Aggregates

    fn inner_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.data.bin_count).filter(|&offset| !self.data.is_out(offset))
    }

    fn outer_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.data.bin_count).filter(|&offset| self.data.is_out(offset))
    }

    /// Entries in in-range bins.
    #[must_use]
    pub fn entries(&self) -> i64 {
        self.inner_offsets().map(|offset| self.data.entries[offset]).sum()
    }

    /// Entries in every bin.
    #[must_use]
    pub fn all_entries(&self) -> i64 {
        self.data.entries.iter().sum()
    }

    /// Entries in outflow bins.
    #[must_use]
    pub fn extra_entries(&self) -> i64 {
        self.outer_offsets().map(|offset| self.data.entries[offset]).sum()
    }

    /// Sum of weights over in-range bins.
    #[must_use]
    pub fn sum_w(&self) -> f64 {
        self.inner_offsets().map(|offset| self.data.sum_w[offset]).sum()
    }

    /// Sum of squared weights over in-range bins.
    #[must_use]
    pub fn sum_w2(&self) -> f64 {
        self.inner_offsets().map(|offset| self.data.sum_w2[offset]).sum()
    }

    /// `(sum w)^2 / sum w^2` over in-range bins.
    #[must_use]
    pub fn equivalent_bin_entries(&self) -> f64 {
        let (sw, sw2) = self.inner_offsets().fold((0.0, 0.0), |(sw, sw2), offset| {
            (sw + self.data.sum_w[offset], sw2 + self.data.sum_w2[offset])
        });
        if sw2 == 0.0 {
            return 0.0;
        }
        sw * sw / sw2
    }

    #[must_use]
    pub fn axis_sum_xw(&self, axis: usize) -> f64 {
        if axis >= self.data.dimension {
            return 0.0;
        }
        self.inner_offsets()
            .map(|offset| self.data.sum_xw_at(offset, axis))
            .sum()
    }

    #[must_use]
    pub fn axis_sum_x2w(&self, axis: usize) -> f64 {
        if axis >= self.data.dimension {
            return 0.0;
        }
        self.inner_offsets()
            .map(|offset| self.data.sum_x2w_at(offset, axis))
            .sum()
    }

    /// Weighted mean coordinate along `axis` over in-range bins.
    #[must_use]
    pub fn axis_mean(&self, axis: usize) -> f64 {
        let sw = self.sum_w();
        if axis >= self.data.dimension || sw == 0.0 {
            return 0.0;
        }
        self.axis_sum_xw(axis) / sw
    }

    /// Weighted RMS of the coordinates along `axis` over in-range bins.
    #[must_use]
    pub fn axis_rms(&self, axis: usize) -> f64 {
        let sw = self.sum_w();
        if axis >= self.data.dimension || sw == 0.0 {
            return 0.0;
        }
        spread(self.axis_sum_xw(axis), self.axis_sum_x2w(axis), sw)
    }

    /// Offsets whose index on `axis` equals `index`, outflow included.
    fn axis_slab(&self, axis: usize, index: BinIndex) -> impl Iterator<Item = usize> + '_ {
        let target = self
            .data
            .axes
            .get(axis)
            .and_then(|a| a.in_range_to_absolute_index(index).map(|abs| (a, abs)));
        (0..self.data.bin_count).filter(move |&offset| {
            target.is_some_and(|(a, abs)| (offset / a.multiplier()) % (a.bins() + 2) == abs)
        })
    }

    /// Entries summed over every bin sharing `index` on `axis`.
    #[must_use]
    pub fn axis_bin_entries(&self, axis: usize, index: BinIndex) -> i64 {
        self.axis_slab(axis, index)
            .map(|offset| self.data.entries[offset])
            .sum()
    }

    /// Heights summed over every bin sharing `index` on `axis`.
    #[must_use]
    pub fn axis_bin_height(&self, axis: usize, index: BinIndex) -> f64 {
        self.axis_slab(axis, index)
            .map(|offset| self.data.height_at(offset))
            .sum()
    }

    /// Sum of in-range bin heights. Empty profile bins contribute 0.
    #[must_use]
    pub fn sum_bin_heights(&self) -> f64 {
        self.inner_offsets().map(|offset| self.data.height_at(offset)).sum()
    }

    #[must_use]
    pub fn sum_all_bin_heights(&self) -> f64 {
        (0..self.data.bin_count)
            .map(|offset| self.data.height_at(offset))
            .sum()
    }

    #[must_use]
    pub fn sum_extra_bin_heights(&self) -> f64 {
        self.outer_offsets().map(|offset| self.data.height_at(offset)).sum()
    }

    /// Smallest in-range bin height, 0 if unconfigured.
    #[must_use]
    pub fn min_bin_height(&self) -> f64 {
        self.inner_offsets()
            .map(|offset| self.data.height_at(offset))
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Largest in-range bin height, 0 if unconfigured.
    #[must_use]
    pub fn max_bin_height(&self) -> f64 {
        self.inner_offsets()
            .map(|offset| self.data.height_at(offset))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    // Arithmetic

    fn incompatibility(&self, other: &Histogram) -> Option<&'static str> {
        if self.data.dimension != other.data.dimension {
            Some("dimension differs")
        } else if !self
            .data
            .axes
            .iter()
            .zip(&other.data.axes)
            .all(|(a, b)| a.is_compatible(b))
        {
            Some("axis binning differs")
        } else if self.is_profile() != other.is_profile() {
            Some("profile mode differs")
        } else {
            None
        }
    }

    /// Equal dimension, identical binning and the same profile mode.
    #[must_use]
    pub fn is_compatible(&self, other: &Histogram) -> bool {
        self.incompatibility(other).is_none()
    }

    fn check_compatible(&self, other: &Histogram) -> Result<()> {
        match self.incompatibility(other) {
            None => Ok(()),
            Some(reason) => {
                log::debug!(
                    "cannot combine '{}' with '{}': {reason}",
                    self.data.title,
                    other.data.title
                );
                Err(Error::Incompatible(reason))
            }
        }
    }

    /// Bin-wise sum of every accumulator.
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn add(&mut self, other: &Histogram) -> Result<()> {
        self.check_compatible(other)?;
        let (dst, src) = (&mut self.data, &other.data);
        zip_with(&mut dst.entries, &src.entries, |a, b| a + b);
        zip_with(&mut dst.sum_w, &src.sum_w, |a, b| a + b);
        zip_with(&mut dst.sum_w2, &src.sum_w2, |a, b| a + b);
        zip_with(&mut dst.sum_xw, &src.sum_xw, |a, b| a + b);
        zip_with(&mut dst.sum_x2w, &src.sum_x2w, |a, b| a + b);
        if let (Some(dst), Some(src)) = (&mut dst.profile, &src.profile) {
            zip_with(&mut dst.sum_vw, &src.sum_vw, |a, b| a + b);
            zip_with(&mut dst.sum_v2w, &src.sum_v2w, |a, b| a + b);
        }
        Ok(())
    }

    /// Bin-wise difference. `sum_w2` is added, so errors of a difference
    /// still combine in quadrature.
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn subtract(&mut self, other: &Histogram) -> Result<()> {
        self.check_compatible(other)?;
        let (dst, src) = (&mut self.data, &other.data);
        zip_with(&mut dst.entries, &src.entries, |a, b| a - b);
        zip_with(&mut dst.sum_w, &src.sum_w, |a, b| a - b);
        zip_with(&mut dst.sum_w2, &src.sum_w2, |a, b| a + b);
        zip_with(&mut dst.sum_xw, &src.sum_xw, |a, b| a - b);
        zip_with(&mut dst.sum_x2w, &src.sum_x2w, |a, b| a - b);
        if let (Some(dst), Some(src)) = (&mut dst.profile, &src.profile) {
            zip_with(&mut dst.sum_vw, &src.sum_vw, |a, b| a - b);
            zip_with(&mut dst.sum_v2w, &src.sum_v2w, |a, b| a - b);
        }
        Ok(())
    }

    /// Replaces every bin by one entry of weight `w_a * w_b`.
    ///
    /// # Errors
    /// Fails if incompatible or unconfigured; nothing is modified.
    pub fn multiply(&mut self, other: &Histogram) -> Result<()> {
        self.replace_bins(other, |swa, swb, sw2a, sw2b| {
            Some((swa * swb, sw2a * swb * swb + sw2b * swa * swa))
        })
    }

    /// Replaces every bin by one entry of weight `w_a / w_b`. Bins where
    /// `w_b` is 0 are left empty apart from their entry.
    ///
    /// # Errors
    /// Fails if incompatible or unconfigured; nothing is modified.
    pub fn divide(&mut self, other: &Histogram) -> Result<()> {
        self.replace_bins(other, |swa, swb, sw2a, sw2b| {
            if swb == 0.0 {
                return None;
            }
            let swb2 = swb * swb;
            Some((swa / swb, sw2a / swb2 + sw2b * swa * swa / (swb2 * swb2)))
        })
    }

    /// `combine(sw_a, sw_b, sw2_a, sw2_b)` yields the new `(sum_w, sum_w2)`
    /// of a bin. Moments are rebuilt from the bin centre; profile sums end
    /// up zeroed.
    fn replace_bins(
        &mut self,
        other: &Histogram,
        combine: impl Fn(f64, f64, f64, f64) -> Option<(f64, f64)>,
    ) -> Result<()> {
        self.check_compatible(other)?;
        if !self.is_valid() {
            return Err(Error::NotConfigured);
        }
        let dimension = self.data.dimension;
        let mut result = self.data.clone();
        result.zero();
        let mut abs = vec![0; dimension];
        for offset in 0..self.data.bin_count {
            result.entries[offset] = 1;
            let Some((sw, sw2)) = combine(
                self.data.sum_w[offset],
                other.data.sum_w[offset],
                self.data.sum_w2[offset],
                other.data.sum_w2[offset],
            ) else {
                continue;
            };
            result.sum_w[offset] = sw;
            result.sum_w2[offset] = sw2;
            self.absolute_indices_into(offset, &mut abs);
            for (axis_index, axis) in self.data.axes.iter().enumerate() {
                let x = axis.bin_center(axis.absolute_to_bin_index(abs[axis_index]));
                result.sum_xw[offset * dimension + axis_index] = x * sw;
                result.sum_x2w[offset * dimension + axis_index] = x * x * sw;
            }
        }
        self.data = result;
        Ok(())
    }

    /// Multiplies by a non-negative factor: weights and moments by `factor`,
    /// squared weights by `factor^2`, profile `sum_vw` by `factor`.
    ///
    /// # Errors
    /// Returns [`Error::NegativeFactor`] for `factor < 0` or NaN, leaving the
    /// histogram unchanged.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        if factor.is_nan() || factor < 0.0 {
            return Err(Error::NegativeFactor(factor));
        }
        let factor2 = factor * factor;
        self.data.sum_w.iter_mut().for_each(|w| *w *= factor);
        self.data.sum_w2.iter_mut().for_each(|w| *w *= factor2);
        self.data.sum_xw.iter_mut().for_each(|w| *w *= factor);
        self.data.sum_x2w.iter_mut().for_each(|w| *w *= factor);
        if let Some(profile) = &mut self.data.profile {
            profile.sum_vw.iter_mut().for_each(|w| *w *= factor);
        }
        Ok(())
    }
}

/// Largest per-axis moment array that can be allocated.
const MAX_SLOTS: usize = usize::MAX / 2 / std::mem::size_of::<f64>();

fn build(config: &HistogramConfig) -> Result<HistogramData> {
    if config.axes.is_empty() {
        return Err(Error::Configuration("at least one axis is required".into()));
    }
    let axes = config
        .axes
        .iter()
        .map(Axis::from_binning)
        .collect::<Result<Vec<_>>>()?;
    axes.iter()
        .try_fold(1usize, |count, axis| {
            axis.bins()
                .checked_add(2)
                .and_then(|slots| count.checked_mul(slots))
        })
        .and_then(|count| count.checked_mul(axes.len()))
        .filter(|&slots| slots <= MAX_SLOTS)
        .ok_or_else(|| Error::Configuration("flattened bin count overflows".into()))?;
    let profile = config.mode.is_profile().then(|| config.mode.window());
    Ok(HistogramData::allocate(config.title.clone(), axes, profile))
}

fn zip_with<T: Copy>(dst: &mut [T], src: &[T], op: impl Fn(T, T) -> T) {
    for (a, &b) in dst.iter_mut().zip(src) {
        *a = op(*a, b);
    }
}
