//! Fixed-dimension layers over the generic engine.
//!
//! [`Base<D>`] wraps a configured [`Histogram`] of exactly `D` axes and
//! keeps an [`InRangeSums`] cache next to it. Fills go through the
//! dimension-specific fast paths and update the cache; bulk mutations
//! (arithmetic, scaling, slicing into) rebuild it.
//!
//! Slices and projections reduce a histogram by summing every bin of the
//! retained axes, outflow slots included, over a range of the dropped axis.

use std::ops::Range;

use crate::axis::{Axis, BinIndex};
use crate::config::{HistogramConfig, ValueWindow};
use crate::data::HistogramData;
use crate::error::{Error, Result};
use crate::fast_index::{is_inner, offset_1d, offset_2d, offset_3d};
use crate::histogram::Histogram;
use crate::in_range::InRangeSums;

/// A configured histogram or profile with exactly `D` axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Base<const D: usize> {
    histogram: Histogram,
    sums: InRangeSums<D>,
}

pub type Base1D = Base<1>;
pub type Base2D = Base<2>;
pub type Base3D = Base<3>;

impl<const D: usize> Base<D> {
    /// Builds and configures a `D`-dimensional instrument.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `config` does not describe
    /// exactly `D` axes, or any configuration error of [`Histogram::new`].
    pub fn from_config(config: &HistogramConfig) -> Result<Self> {
        if config.dimension() != D {
            return Err(Error::DimensionMismatch {
                expected: D,
                found: config.dimension(),
            });
        }
        Self::from_histogram(Histogram::new(config)?)
    }

    /// Wraps a configured generic histogram.
    ///
    /// # Errors
    /// Fails if `histogram` is unconfigured or not `D`-dimensional.
    pub fn from_histogram(histogram: Histogram) -> Result<Self> {
        if !histogram.is_valid() {
            return Err(Error::NotConfigured);
        }
        if histogram.dimension() != D {
            return Err(Error::DimensionMismatch {
                expected: D,
                found: histogram.dimension(),
            });
        }
        let sums = InRangeSums::rebuild(histogram.data());
        Ok(Self { histogram, sums })
    }

    fn from_allocated(data: HistogramData) -> Self {
        Self {
            histogram: Histogram::from_allocated(data),
            sums: InRangeSums::default(),
        }
    }

    /// The generic engine, for queries not specialised here.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    #[must_use]
    pub fn into_histogram(self) -> Histogram {
        self.histogram
    }

    /// Cached in-range aggregates.
    #[must_use]
    pub fn in_range_sums(&self) -> &InRangeSums<D> {
        &self.sums
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.histogram.title()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.histogram.set_title(title);
    }

    #[must_use]
    pub fn is_profile(&self) -> bool {
        self.histogram.is_profile()
    }

    #[must_use]
    pub fn value_window(&self) -> Option<ValueWindow> {
        self.histogram.value_window()
    }

    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.histogram.bin_count()
    }

    // Aggregates

    /// Entries in in-range bins.
    #[must_use]
    pub fn entries(&self) -> i64 {
        self.sums.entries
    }

    #[must_use]
    pub fn all_entries(&self) -> i64 {
        self.histogram.all_entries()
    }

    #[must_use]
    pub fn extra_entries(&self) -> i64 {
        self.histogram.extra_entries()
    }

    /// Sum of weights over in-range bins.
    #[must_use]
    pub fn sum_w(&self) -> f64 {
        self.sums.sum_w
    }

    #[must_use]
    pub fn equivalent_bin_entries(&self) -> f64 {
        self.histogram.equivalent_bin_entries()
    }

    #[must_use]
    pub fn sum_bin_heights(&self) -> f64 {
        self.histogram.sum_bin_heights()
    }

    #[must_use]
    pub fn sum_all_bin_heights(&self) -> f64 {
        self.histogram.sum_all_bin_heights()
    }

    #[must_use]
    pub fn sum_extra_bin_heights(&self) -> f64 {
        self.histogram.sum_extra_bin_heights()
    }

    #[must_use]
    pub fn min_bin_height(&self) -> f64 {
        self.histogram.min_bin_height()
    }

    #[must_use]
    pub fn max_bin_height(&self) -> f64 {
        self.histogram.max_bin_height()
    }

    // Bulk mutations

    /// Zeroes every accumulator, keeping the binning.
    pub fn reset(&mut self) {
        self.histogram.reset();
        self.sums = InRangeSums::default();
    }

    /// See [`Histogram::scale`].
    ///
    /// # Errors
    /// Returns [`Error::NegativeFactor`] for a negative factor.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        self.histogram.scale(factor)?;
        self.refresh();
        Ok(())
    }

    /// See [`Histogram::add`].
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn add(&mut self, other: &Self) -> Result<()> {
        self.histogram.add(&other.histogram)?;
        self.refresh();
        Ok(())
    }

    /// See [`Histogram::subtract`].
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn subtract(&mut self, other: &Self) -> Result<()> {
        self.histogram.subtract(&other.histogram)?;
        self.refresh();
        Ok(())
    }

    /// See [`Histogram::multiply`].
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn multiply(&mut self, other: &Self) -> Result<()> {
        self.histogram.multiply(&other.histogram)?;
        self.refresh();
        Ok(())
    }

    /// See [`Histogram::divide`].
    ///
    /// # Errors
    /// Returns [`Error::Incompatible`]; neither operand is modified.
    pub fn divide(&mut self, other: &Self) -> Result<()> {
        self.histogram.divide(&other.histogram)?;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.sums = InRangeSums::rebuild(self.histogram.data());
    }

    // Fill path shared by the instruments

    /// True if `value` falls outside the profile window.
    #[inline]
    pub(crate) fn rejects(&self, value: f64) -> bool {
        self.value_window()
            .is_some_and(|window| !window.contains(value))
    }

    #[inline]
    fn absolute_index(&self, axis: usize, value: f64) -> Result<usize> {
        self.axis_at(axis)
            .coord_to_absolute_index(value)
            .ok_or(Error::OutOfDomain { axis, value })
    }

    #[inline]
    fn record(
        &mut self,
        offset: usize,
        inner: bool,
        coords: &[f64; D],
        value: Option<f64>,
        weight: f64,
    ) {
        self.histogram
            .data_mut()
            .accumulate(offset, coords, value, weight);
        if inner {
            self.sums.record(coords, weight);
        }
    }

    // Per-bin helpers

    #[inline]
    fn axis_at(&self, axis: usize) -> &Axis {
        &self.histogram.axes()[axis]
    }

    fn entries_at(&self, offset: Option<usize>) -> i64 {
        offset.map_or(0, |offset| self.histogram.data().entries[offset])
    }

    fn stat_at(&self, offset: Option<usize>, stat: impl Fn(&HistogramData, usize) -> f64) -> f64 {
        offset.map_or(0.0, |offset| stat(self.histogram.data(), offset))
    }

    /// Per-axis index ranges covering the whole storage with `axis` pinned
    /// to `index`. An invalid `index` pins it to an empty range.
    fn pinned_ranges(&self, axis: usize, index: BinIndex) -> [Range<usize>; D] {
        let mut ranges = std::array::from_fn(|a| 0..self.axis_at(a).bins() + 2);
        ranges[axis] = match self.axis_at(axis).in_range_to_absolute_index(index) {
            Some(abs) => abs..abs + 1,
            None => 0..0,
        };
        ranges
    }

    // Reduction

    fn empty_reduction<const R: usize>(&self, title: &str, kept: [usize; R]) -> Base<R> {
        let axes = kept.iter().map(|&axis| self.axis_at(axis).clone()).collect();
        let profile = self.histogram.data().profile.as_ref().map(|p| p.window);
        Base::from_allocated(HistogramData::allocate(title.to_owned(), axes, profile))
    }

    /// Validates a slice request, then adds the reduction into `dst`.
    fn fill_reduction<const R: usize>(
        &self,
        dst: &mut Base<R>,
        kept: [usize; R],
        dropped: usize,
        begin: BinIndex,
        end: BinIndex,
    ) -> Result<()> {
        let dropped_axis = self.axis_at(dropped);
        let range = dropped_axis
            .in_range_to_absolute_index(begin)
            .zip(dropped_axis.in_range_to_absolute_index(end))
            .filter(|(first, last)| first <= last)
            .ok_or(Error::InvalidRange { begin, end })?;
        for (dst_axis, &src_axis) in dst.histogram.axes().iter().zip(&kept) {
            let expected = self.axis_at(src_axis).bins();
            if dst_axis.bins() != expected {
                return Err(Error::BinCountMismatch {
                    expected,
                    found: dst_axis.bins(),
                });
            }
        }
        self.accumulate_reduction(dst, kept, dropped, range);
        Ok(())
    }

    fn accumulate_reduction<const R: usize>(
        &self,
        dst: &mut Base<R>,
        kept: [usize; R],
        dropped: usize,
        (first, last): (usize, usize),
    ) {
        let src = self.histogram.data();
        let stride = self.axis_at(dropped).multiplier();
        let mut abs = [0; R];
        for dst_offset in 0..dst.bin_count() {
            dst.histogram.absolute_indices_into(dst_offset, &mut abs);
            let base: usize = abs
                .iter()
                .zip(&kept)
                .map(|(&index, &axis)| index * self.axis_at(axis).multiplier())
                .sum();
            let data = dst.histogram.data_mut();
            for index in first..=last {
                data.merge_bin(dst_offset, src, base + index * stride, &kept);
            }
        }
        dst.refresh();
    }

    fn projection<const R: usize>(&self, title: &str, kept: [usize; R], dropped: usize) -> Base<R> {
        let mut projection = self.empty_reduction(title, kept);
        let last = self.axis_at(dropped).bins() + 1;
        self.accumulate_reduction(&mut projection, kept, dropped, (0, last));
        projection
    }

    fn slice<const R: usize>(
        &self,
        title: &str,
        kept: [usize; R],
        dropped: usize,
        begin: BinIndex,
        end: BinIndex,
    ) -> Result<Base<R>> {
        let mut slice = self.empty_reduction(title, kept);
        self.fill_reduction(&mut slice, kept, dropped, begin, end)?;
        Ok(slice)
    }
}

impl Base<1> {
    #[must_use]
    pub fn axis(&self) -> &Axis {
        self.axis_at(0)
    }

    /// Weighted mean of in-range fills.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.sums.mean(0)
    }

    #[must_use]
    pub fn rms(&self) -> f64 {
        self.sums.rms(0)
    }

    #[must_use]
    pub fn coord_to_index(&self, x: f64) -> Option<BinIndex> {
        self.axis().coord_to_index(x)
    }

    #[inline]
    fn offset(&self, i: BinIndex) -> Option<usize> {
        self.axis().in_range_to_absolute_index(i).map(offset_1d)
    }

    #[must_use]
    pub fn bin_entries(&self, i: BinIndex) -> i64 {
        self.entries_at(self.offset(i))
    }

    #[must_use]
    pub fn bin_height(&self, i: BinIndex) -> f64 {
        self.stat_at(self.offset(i), HistogramData::height_at)
    }

    #[must_use]
    pub fn bin_error(&self, i: BinIndex) -> f64 {
        self.stat_at(self.offset(i), HistogramData::error_at)
    }

    #[must_use]
    pub fn bin_mean(&self, i: BinIndex) -> f64 {
        self.stat_at(self.offset(i), |data, offset| data.mean_at(offset, 0))
    }

    #[must_use]
    pub fn bin_std_dev(&self, i: BinIndex) -> f64 {
        self.stat_at(self.offset(i), |data, offset| data.std_dev_at(offset, 0))
    }

    pub(crate) fn bin_rms_at(&self, i: BinIndex) -> f64 {
        self.stat_at(self.offset(i), HistogramData::rms_at)
    }

    #[must_use]
    pub fn bin_center(&self, i: BinIndex) -> f64 {
        self.axis().bin_center(i)
    }

    pub(crate) fn fill_1d(&mut self, x: f64, value: Option<f64>, weight: f64) -> Result<()> {
        if value.is_some_and(|v| self.rejects(v)) {
            return Ok(());
        }
        let i = self.absolute_index(0, x)?;
        let inner = is_inner(i, self.axis().bins());
        self.record(offset_1d(i), inner, &[x], value, weight);
        Ok(())
    }
}

impl Base<2> {
    #[must_use]
    pub fn x_axis(&self) -> &Axis {
        self.axis_at(0)
    }

    #[must_use]
    pub fn y_axis(&self) -> &Axis {
        self.axis_at(1)
    }

    #[must_use]
    pub fn mean_x(&self) -> f64 {
        self.sums.mean(0)
    }

    #[must_use]
    pub fn mean_y(&self) -> f64 {
        self.sums.mean(1)
    }

    #[must_use]
    pub fn rms_x(&self) -> f64 {
        self.sums.rms(0)
    }

    #[must_use]
    pub fn rms_y(&self) -> f64 {
        self.sums.rms(1)
    }

    #[must_use]
    pub fn coord_to_index_x(&self, x: f64) -> Option<BinIndex> {
        self.x_axis().coord_to_index(x)
    }

    #[must_use]
    pub fn coord_to_index_y(&self, y: f64) -> Option<BinIndex> {
        self.y_axis().coord_to_index(y)
    }

    #[inline]
    fn offset(&self, i: BinIndex, j: BinIndex) -> Option<usize> {
        let i = self.x_axis().in_range_to_absolute_index(i)?;
        let j = self.y_axis().in_range_to_absolute_index(j)?;
        Some(offset_2d(i, j, self.y_axis().multiplier()))
    }

    #[must_use]
    pub fn bin_entries(&self, i: BinIndex, j: BinIndex) -> i64 {
        self.entries_at(self.offset(i, j))
    }

    #[must_use]
    pub fn bin_height(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), HistogramData::height_at)
    }

    #[must_use]
    pub fn bin_error(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), HistogramData::error_at)
    }

    #[must_use]
    pub fn bin_mean_x(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), |data, offset| data.mean_at(offset, 0))
    }

    #[must_use]
    pub fn bin_mean_y(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), |data, offset| data.mean_at(offset, 1))
    }

    #[must_use]
    pub fn bin_std_dev_x(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), |data, offset| data.std_dev_at(offset, 0))
    }

    #[must_use]
    pub fn bin_std_dev_y(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), |data, offset| data.std_dev_at(offset, 1))
    }

    pub(crate) fn bin_rms_at(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j), HistogramData::rms_at)
    }

    #[must_use]
    pub fn bin_center_x(&self, i: BinIndex) -> f64 {
        self.x_axis().bin_center(i)
    }

    #[must_use]
    pub fn bin_center_y(&self, j: BinIndex) -> f64 {
        self.y_axis().bin_center(j)
    }

    /// Offsets of every bin, outflow included, with `axis` pinned to `index`.
    fn line(&self, axis: usize, index: BinIndex) -> impl Iterator<Item = usize> {
        let [xs, ys] = self.pinned_ranges(axis, index);
        let y_stride = self.y_axis().multiplier();
        xs.flat_map(move |i| ys.clone().map(move |j| offset_2d(i, j, y_stride)))
    }

    /// Entries of column `i`, summed over every y bin including outflow.
    #[must_use]
    pub fn bin_entries_x(&self, i: BinIndex) -> i64 {
        let data = self.histogram.data();
        self.line(0, i).map(|offset| data.entries[offset]).sum()
    }

    #[must_use]
    pub fn bin_entries_y(&self, j: BinIndex) -> i64 {
        let data = self.histogram.data();
        self.line(1, j).map(|offset| data.entries[offset]).sum()
    }

    /// Heights of column `i`, summed over every y bin including outflow.
    #[must_use]
    pub fn bin_height_x(&self, i: BinIndex) -> f64 {
        let data = self.histogram.data();
        self.line(0, i).map(|offset| data.height_at(offset)).sum()
    }

    #[must_use]
    pub fn bin_height_y(&self, j: BinIndex) -> f64 {
        let data = self.histogram.data();
        self.line(1, j).map(|offset| data.height_at(offset)).sum()
    }

    /// Reduces to x, summing y bins `begin..=end`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRange`] if the range is invalid on y.
    pub fn slice_x(&self, begin: BinIndex, end: BinIndex) -> Result<Base1D> {
        self.slice("SliceX", [0], 1, begin, end)
    }

    /// Reduces to y, summing x bins `begin..=end`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRange`] if the range is invalid on x.
    pub fn slice_y(&self, begin: BinIndex, end: BinIndex) -> Result<Base1D> {
        self.slice("SliceY", [1], 0, begin, end)
    }

    /// Adds y bins `begin..=end` into an existing x histogram.
    ///
    /// # Errors
    /// Fails on an invalid range or if `dst` does not have as many bins as
    /// the x axis; `dst` is left untouched.
    pub fn fill_slice_x(&self, dst: &mut Base1D, begin: BinIndex, end: BinIndex) -> Result<()> {
        self.fill_reduction(dst, [0], 1, begin, end)
    }

    /// Adds x bins `begin..=end` into an existing y histogram.
    ///
    /// # Errors
    /// As [`Base::fill_slice_x`].
    pub fn fill_slice_y(&self, dst: &mut Base1D, begin: BinIndex, end: BinIndex) -> Result<()> {
        self.fill_reduction(dst, [1], 0, begin, end)
    }

    /// Slice over the full y extent, underflow to overflow.
    #[must_use]
    pub fn projection_x(&self) -> Base1D {
        self.projection("ProjectionX", [0], 1)
    }

    #[must_use]
    pub fn projection_y(&self) -> Base1D {
        self.projection("ProjectionY", [1], 0)
    }

    pub(crate) fn fill_2d(&mut self, x: f64, y: f64, value: Option<f64>, weight: f64) -> Result<()> {
        if value.is_some_and(|v| self.rejects(v)) {
            return Ok(());
        }
        let i = self.absolute_index(0, x)?;
        let j = self.absolute_index(1, y)?;
        let inner = is_inner(i, self.x_axis().bins()) && is_inner(j, self.y_axis().bins());
        let offset = offset_2d(i, j, self.y_axis().multiplier());
        self.record(offset, inner, &[x, y], value, weight);
        Ok(())
    }
}

impl Base<3> {
    #[must_use]
    pub fn x_axis(&self) -> &Axis {
        self.axis_at(0)
    }

    #[must_use]
    pub fn y_axis(&self) -> &Axis {
        self.axis_at(1)
    }

    #[must_use]
    pub fn z_axis(&self) -> &Axis {
        self.axis_at(2)
    }

    #[must_use]
    pub fn mean_x(&self) -> f64 {
        self.sums.mean(0)
    }

    #[must_use]
    pub fn mean_y(&self) -> f64 {
        self.sums.mean(1)
    }

    #[must_use]
    pub fn mean_z(&self) -> f64 {
        self.sums.mean(2)
    }

    #[must_use]
    pub fn rms_x(&self) -> f64 {
        self.sums.rms(0)
    }

    #[must_use]
    pub fn rms_y(&self) -> f64 {
        self.sums.rms(1)
    }

    #[must_use]
    pub fn rms_z(&self) -> f64 {
        self.sums.rms(2)
    }

    #[must_use]
    pub fn coord_to_index_x(&self, x: f64) -> Option<BinIndex> {
        self.x_axis().coord_to_index(x)
    }

    #[must_use]
    pub fn coord_to_index_y(&self, y: f64) -> Option<BinIndex> {
        self.y_axis().coord_to_index(y)
    }

    #[must_use]
    pub fn coord_to_index_z(&self, z: f64) -> Option<BinIndex> {
        self.z_axis().coord_to_index(z)
    }

    #[inline]
    fn strides(&self) -> (usize, usize) {
        (self.y_axis().multiplier(), self.z_axis().multiplier())
    }

    #[inline]
    fn offset(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> Option<usize> {
        let i = self.x_axis().in_range_to_absolute_index(i)?;
        let j = self.y_axis().in_range_to_absolute_index(j)?;
        let k = self.z_axis().in_range_to_absolute_index(k)?;
        let (y_stride, z_stride) = self.strides();
        Some(offset_3d(i, j, k, y_stride, z_stride))
    }

    #[must_use]
    pub fn bin_entries(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> i64 {
        self.entries_at(self.offset(i, j, k))
    }

    #[must_use]
    pub fn bin_height(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), HistogramData::height_at)
    }

    #[must_use]
    pub fn bin_error(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), HistogramData::error_at)
    }

    #[must_use]
    pub fn bin_mean_x(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.mean_at(offset, 0))
    }

    #[must_use]
    pub fn bin_mean_y(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.mean_at(offset, 1))
    }

    #[must_use]
    pub fn bin_mean_z(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.mean_at(offset, 2))
    }

    #[must_use]
    pub fn bin_std_dev_x(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.std_dev_at(offset, 0))
    }

    #[must_use]
    pub fn bin_std_dev_y(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.std_dev_at(offset, 1))
    }

    #[must_use]
    pub fn bin_std_dev_z(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), |data, offset| data.std_dev_at(offset, 2))
    }

    pub(crate) fn bin_rms_at(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.stat_at(self.offset(i, j, k), HistogramData::rms_at)
    }

    #[must_use]
    pub fn bin_center_x(&self, i: BinIndex) -> f64 {
        self.x_axis().bin_center(i)
    }

    #[must_use]
    pub fn bin_center_y(&self, j: BinIndex) -> f64 {
        self.y_axis().bin_center(j)
    }

    #[must_use]
    pub fn bin_center_z(&self, k: BinIndex) -> f64 {
        self.z_axis().bin_center(k)
    }

    /// Offsets of every bin, outflow included, with `axis` pinned to `index`.
    fn plane(&self, axis: usize, index: BinIndex) -> impl Iterator<Item = usize> {
        let [xs, ys, zs] = self.pinned_ranges(axis, index);
        let (y_stride, z_stride) = self.strides();
        xs.flat_map(move |i| {
            let zs = zs.clone();
            ys.clone().flat_map(move |j| {
                zs.clone()
                    .map(move |k| offset_3d(i, j, k, y_stride, z_stride))
            })
        })
    }

    #[must_use]
    pub fn bin_entries_x(&self, i: BinIndex) -> i64 {
        let data = self.histogram.data();
        self.plane(0, i).map(|offset| data.entries[offset]).sum()
    }

    #[must_use]
    pub fn bin_entries_y(&self, j: BinIndex) -> i64 {
        let data = self.histogram.data();
        self.plane(1, j).map(|offset| data.entries[offset]).sum()
    }

    #[must_use]
    pub fn bin_entries_z(&self, k: BinIndex) -> i64 {
        let data = self.histogram.data();
        self.plane(2, k).map(|offset| data.entries[offset]).sum()
    }

    #[must_use]
    pub fn bin_height_x(&self, i: BinIndex) -> f64 {
        let data = self.histogram.data();
        self.plane(0, i).map(|offset| data.height_at(offset)).sum()
    }

    #[must_use]
    pub fn bin_height_y(&self, j: BinIndex) -> f64 {
        let data = self.histogram.data();
        self.plane(1, j).map(|offset| data.height_at(offset)).sum()
    }

    #[must_use]
    pub fn bin_height_z(&self, k: BinIndex) -> f64 {
        let data = self.histogram.data();
        self.plane(2, k).map(|offset| data.height_at(offset)).sum()
    }

    /// Reduces to (x, y), summing z bins `begin..=end`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRange`] if the range is invalid on z.
    pub fn slice_xy(&self, begin: BinIndex, end: BinIndex) -> Result<Base2D> {
        self.slice("SliceXY", [0, 1], 2, begin, end)
    }

    /// Reduces to (y, z), summing x bins `begin..=end`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRange`] if the range is invalid on x.
    pub fn slice_yz(&self, begin: BinIndex, end: BinIndex) -> Result<Base2D> {
        self.slice("SliceYZ", [1, 2], 0, begin, end)
    }

    /// Reduces to (x, z), summing y bins `begin..=end`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRange`] if the range is invalid on y.
    pub fn slice_xz(&self, begin: BinIndex, end: BinIndex) -> Result<Base2D> {
        self.slice("SliceXZ", [0, 2], 1, begin, end)
    }

    /// # Errors
    /// Fails on an invalid z range or if `dst` does not match the x and y
    /// bin counts; `dst` is left untouched.
    pub fn fill_slice_xy(&self, dst: &mut Base2D, begin: BinIndex, end: BinIndex) -> Result<()> {
        self.fill_reduction(dst, [0, 1], 2, begin, end)
    }

    /// # Errors
    /// As [`Base::fill_slice_xy`], with x as the dropped axis.
    pub fn fill_slice_yz(&self, dst: &mut Base2D, begin: BinIndex, end: BinIndex) -> Result<()> {
        self.fill_reduction(dst, [1, 2], 0, begin, end)
    }

    /// # Errors
    /// As [`Base::fill_slice_xy`], with y as the dropped axis.
    pub fn fill_slice_xz(&self, dst: &mut Base2D, begin: BinIndex, end: BinIndex) -> Result<()> {
        self.fill_reduction(dst, [0, 2], 1, begin, end)
    }

    #[must_use]
    pub fn projection_xy(&self) -> Base2D {
        self.projection("ProjectionXY", [0, 1], 2)
    }

    #[must_use]
    pub fn projection_yz(&self) -> Base2D {
        self.projection("ProjectionYZ", [1, 2], 0)
    }

    #[must_use]
    pub fn projection_xz(&self) -> Base2D {
        self.projection("ProjectionXZ", [0, 2], 1)
    }

    pub(crate) fn fill_3d(
        &mut self,
        [x, y, z]: [f64; 3],
        value: Option<f64>,
        weight: f64,
    ) -> Result<()> {
        if value.is_some_and(|v| self.rejects(v)) {
            return Ok(());
        }
        let i = self.absolute_index(0, x)?;
        let j = self.absolute_index(1, y)?;
        let k = self.absolute_index(2, z)?;
        let inner = is_inner(i, self.x_axis().bins())
            && is_inner(j, self.y_axis().bins())
            && is_inner(k, self.z_axis().bins());
        let (y_stride, z_stride) = self.strides();
        let offset = offset_3d(i, j, k, y_stride, z_stride);
        self.record(offset, inner, &[x, y, z], value, weight);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn base_2d(profile: bool) -> Base2D {
        let mut config = HistogramConfig::new("b2")
            .with_fixed_axis(3, 0.0, 3.0)
            .with_fixed_axis(2, 0.0, 2.0);
        if profile {
            config = config.profile();
        }
        Base2D::from_config(&config).unwrap()
    }

    #[test]
    fn test_from_config_checks_dimension() {
        let config = HistogramConfig::new("x").with_fixed_axis(2, 0.0, 1.0);
        assert_eq!(
            Base2D::from_config(&config),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        );
        assert_eq!(
            Base1D::from_histogram(Histogram::default()),
            Err(Error::NotConfigured)
        );
    }

    #[test]
    fn test_cache_tracks_generic_aggregates() {
        let mut b = base_2d(false);
        b.fill_2d(0.5, 0.5, None, 1.0).unwrap();
        b.fill_2d(2.5, 1.5, None, 2.0).unwrap();
        b.fill_2d(-1.0, 1.5, None, 4.0).unwrap();

        let h = b.histogram();
        assert_eq!(b.entries(), h.entries());
        assert_relative_eq!(b.sum_w(), h.sum_w());
        assert_relative_eq!(b.mean_x(), h.axis_mean(0));
        assert_relative_eq!(b.rms_y(), h.axis_rms(1));
        assert_eq!(b.in_range_sums(), &InRangeSums::rebuild(h.data()));
    }

    #[test]
    fn test_direct_accessors_match_generic() {
        let mut b = base_2d(false);
        b.fill_2d(1.2, 1.7, None, 3.0).unwrap();
        let (i, j) = (BinIndex::InRange(1), BinIndex::InRange(1));
        assert_relative_eq!(b.bin_height(i, j), b.histogram().bin_height(&[i, j]));
        assert_relative_eq!(b.bin_mean_y(i, j), 1.7, epsilon = 1e-12);
        assert_eq!(b.bin_entries(BinIndex::InRange(3), j), 0);
        assert_eq!(
            b.bin_entries_x(i),
            b.histogram().axis_bin_entries(0, i)
        );
    }

    #[test]
    fn test_slice_validation() {
        let b = base_2d(false);
        assert_eq!(
            b.slice_x(BinIndex::Overflow, BinIndex::Underflow),
            Err(Error::InvalidRange {
                begin: BinIndex::Overflow,
                end: BinIndex::Underflow,
            })
        );
        assert!(matches!(
            b.slice_y(BinIndex::InRange(0), BinIndex::InRange(3)),
            Err(Error::InvalidRange { .. })
        ));

        let mut wrong = Base1D::from_config(&HistogramConfig::new("w").with_fixed_axis(5, 0.0, 3.0))
            .unwrap();
        let before = wrong.clone();
        assert_eq!(
            b.fill_slice_x(&mut wrong, BinIndex::Underflow, BinIndex::Overflow),
            Err(Error::BinCountMismatch { expected: 3, found: 5 })
        );
        assert_eq!(wrong, before);
    }

    #[test]
    fn test_profile_slice_keeps_profile_sums() {
        let mut b = base_2d(true);
        b.fill_2d(0.5, 0.5, Some(2.0), 1.0).unwrap();
        b.fill_2d(0.5, 1.5, Some(4.0), 1.0).unwrap();

        let slice = b.slice_x(BinIndex::InRange(0), BinIndex::InRange(1)).unwrap();
        assert!(slice.is_profile());
        assert_relative_eq!(slice.bin_height(BinIndex::InRange(0)), 3.0);
        assert_relative_eq!(slice.bin_rms_at(BinIndex::InRange(0)), 1.0);
    }

    #[test]
    fn test_3d_reductions() {
        let config = HistogramConfig::new("b3")
            .with_fixed_axis(2, 0.0, 2.0)
            .with_fixed_axis(3, 0.0, 3.0)
            .with_edges(vec![0.0, 1.0, 10.0]);
        let mut b = Base3D::from_config(&config).unwrap();
        b.fill_3d([0.5, 2.5, 5.0], None, 1.0).unwrap();
        b.fill_3d([1.5, 0.5, 0.5], None, 2.0).unwrap();
        b.fill_3d([1.5, 0.5, 20.0], None, 1.0).unwrap();

        let xz = b.projection_xz();
        assert_eq!(xz.x_axis(), b.x_axis());
        assert_eq!(xz.y_axis().bins(), 2);
        assert_eq!(xz.all_entries(), 3);
        assert_eq!(xz.bin_entries(BinIndex::InRange(1), BinIndex::Overflow), 1);

        let yz = b.slice_yz(BinIndex::InRange(1), BinIndex::InRange(1)).unwrap();
        assert_eq!(yz.all_entries(), 2);
        assert_eq!(yz.entries(), 1);
        assert_relative_eq!(yz.mean_x(), 0.5);

        assert_eq!(b.bin_entries_z(BinIndex::Overflow), 1);
        assert_relative_eq!(b.bin_height_x(BinIndex::InRange(1)), 3.0);
        assert_eq!(b.entries(), 2);
    }

    #[test]
    fn test_2d_slice_y_sums_and_accumulates() {
        let mut b = base_2d(false);
        b.fill_2d(0.5, 0.5, None, 1.0).unwrap();
        b.fill_2d(1.5, 1.5, None, 2.0).unwrap();
        b.fill_2d(-1.0, 1.5, None, 4.0).unwrap();
        b.fill_2d(2.5, 5.0, None, 1.0).unwrap();

        let inner = b.slice_y(BinIndex::InRange(0), BinIndex::InRange(2)).unwrap();
        assert_eq!(inner.title(), "SliceY");
        assert!(inner.axis().is_compatible(b.y_axis()));
        assert_eq!(inner.all_entries(), 3);
        assert_eq!(inner.bin_entries(BinIndex::Overflow), 1);
        assert_relative_eq!(inner.bin_height(BinIndex::InRange(1)), 2.0);
        assert_relative_eq!(inner.bin_mean(BinIndex::InRange(1)), 1.5);
        assert_relative_eq!(inner.mean(), 3.5 / 3.0);

        let full = b.slice_y(BinIndex::Underflow, BinIndex::Overflow).unwrap();
        assert_relative_eq!(full.bin_height(BinIndex::InRange(1)), 6.0);
        assert_eq!(full.all_entries(), 4);
        let mut projection = b.projection_y();
        projection.set_title("SliceY");
        assert_eq!(full, projection);

        let mut dst = b.slice_y(BinIndex::InRange(0), BinIndex::InRange(0)).unwrap();
        assert_eq!(dst.all_entries(), 1);
        b.fill_slice_y(&mut dst, BinIndex::InRange(1), BinIndex::InRange(2))
            .unwrap();
        assert_eq!(dst.entries(), 2);
        assert_eq!(dst, inner);
    }

    fn base_3d() -> Base3D {
        let config = HistogramConfig::new("b3")
            .with_fixed_axis(2, 0.0, 2.0)
            .with_fixed_axis(3, 0.0, 3.0)
            .with_edges(vec![0.0, 1.0, 10.0]);
        let mut b = Base3D::from_config(&config).unwrap();
        b.fill_3d([0.5, 2.5, 5.0], None, 1.0).unwrap();
        b.fill_3d([1.5, 0.5, 0.5], None, 2.0).unwrap();
        b.fill_3d([1.5, 0.5, 20.0], None, 1.0).unwrap();
        b.fill_3d([0.5, -1.0, 0.5], None, 3.0).unwrap();
        b
    }

    #[test]
    fn test_3d_slice_xz_remaps_moments() {
        let b = base_3d();
        let (x0, x1) = (BinIndex::InRange(0), BinIndex::InRange(1));
        let (z0, z1) = (BinIndex::InRange(0), BinIndex::InRange(1));

        let xz = b.slice_xz(BinIndex::InRange(0), BinIndex::InRange(2)).unwrap();
        assert_eq!(xz.x_axis(), b.x_axis());
        assert!(xz.y_axis().is_compatible(b.z_axis()));
        assert_eq!(xz.all_entries(), 3);
        assert_eq!(xz.bin_entries(x0, z0), 0);
        assert_relative_eq!(xz.bin_height(x1, z0), 2.0);
        assert_relative_eq!(xz.bin_mean_x(x1, z0), 1.5);
        assert_relative_eq!(xz.bin_mean_y(x1, z0), 0.5);
        assert_relative_eq!(xz.bin_mean_y(x1, BinIndex::Overflow), 20.0);
        assert_relative_eq!(xz.bin_mean_y(x0, z1), 5.0);

        let projection = b.projection_xz();
        assert_eq!(projection.bin_entries(x0, z0), 1);
        assert_relative_eq!(projection.bin_height(x0, z0), 3.0);

        let mut dst = b.slice_xz(BinIndex::Underflow, BinIndex::Underflow).unwrap();
        b.fill_slice_xz(&mut dst, BinIndex::InRange(0), BinIndex::InRange(2))
            .unwrap();
        dst.set_title("ProjectionXZ");
        assert_eq!(dst, projection);
    }

    #[test]
    fn test_3d_slice_xy_and_yz_accumulate() {
        let b = base_3d();
        let (x0, x1) = (BinIndex::InRange(0), BinIndex::InRange(1));
        let (y0, y2) = (BinIndex::InRange(0), BinIndex::InRange(2));

        let xy = b.slice_xy(BinIndex::InRange(1), BinIndex::Overflow).unwrap();
        assert_eq!(xy.title(), "SliceXY");
        assert_eq!(xy.all_entries(), 2);
        assert_eq!(xy.bin_entries(x0, y2), 1);
        assert_relative_eq!(xy.bin_mean_y(x0, y2), 2.5);
        assert_relative_eq!(xy.bin_height(x1, y0), 1.0);

        let mut dst = b.slice_xy(BinIndex::Underflow, BinIndex::InRange(0)).unwrap();
        b.fill_slice_xy(&mut dst, BinIndex::InRange(1), BinIndex::Overflow)
            .unwrap();
        assert_eq!(dst.bin_entries(x1, y0), 2);
        assert_relative_eq!(dst.bin_height(x1, y0), 3.0);
        assert_eq!(dst.entries(), 3);
        dst.set_title("ProjectionXY");
        assert_eq!(dst, b.projection_xy());

        let yz = b.projection_yz();
        assert!(yz.x_axis().is_compatible(b.y_axis()));
        assert!(yz.y_axis().is_compatible(b.z_axis()));
        assert_relative_eq!(yz.bin_height(y0, BinIndex::InRange(0)), 2.0);
        assert_relative_eq!(yz.bin_mean_x(y0, BinIndex::InRange(0)), 0.5);
        assert_relative_eq!(yz.bin_height(BinIndex::Underflow, BinIndex::InRange(0)), 3.0);
        assert_eq!(yz.bin_entries_x(BinIndex::Underflow), 1);

        let mut dst = b.slice_yz(BinIndex::InRange(0), BinIndex::InRange(0)).unwrap();
        b.fill_slice_yz(&mut dst, BinIndex::InRange(1), BinIndex::Overflow)
            .unwrap();
        dst.set_title("ProjectionYZ");
        assert_eq!(dst, yz);
    }
}
