//! Cached in-range aggregates for the fixed-dimension layers.

use crate::data::{spread, HistogramData};

/// Running sums over the in-range bins of a `D`-dimensional histogram.
///
/// Updated by every in-range fill and rebuilt from scratch after bulk
/// mutations, so global means and RMS values cost O(1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InRangeSums<const D: usize> {
    pub entries: i64,
    pub sum_w: f64,
    pub sum_xw: [f64; D],
    pub sum_x2w: [f64; D],
}

impl<const D: usize> Default for InRangeSums<D> {
    fn default() -> Self {
        Self {
            entries: 0,
            sum_w: 0.0,
            sum_xw: [0.0; D],
            sum_x2w: [0.0; D],
        }
    }
}

impl<const D: usize> InRangeSums<D> {
    /// Adds one in-range fill.
    #[inline]
    pub fn record(&mut self, coords: &[f64; D], weight: f64) {
        self.entries += 1;
        self.sum_w += weight;
        for (axis, &x) in coords.iter().enumerate() {
            let xw = x * weight;
            self.sum_xw[axis] += xw;
            self.sum_x2w[axis] += x * xw;
        }
    }

    /// Recomputes the sums by scanning every in-range bin of `data`.
    #[must_use]
    pub fn rebuild(data: &HistogramData) -> Self {
        log::trace!(
            "rebuilding in-range sums for '{}' over {} bins",
            data.title,
            data.bin_count
        );
        let mut sums = Self::default();
        if data.dimension != D {
            return sums;
        }
        for offset in (0..data.bin_count).filter(|&offset| !data.is_out(offset)) {
            sums.entries += data.entries[offset];
            sums.sum_w += data.sum_w[offset];
            for axis in 0..D {
                sums.sum_xw[axis] += data.sum_xw_at(offset, axis);
                sums.sum_x2w[axis] += data.sum_x2w_at(offset, axis);
            }
        }
        sums
    }

    /// Weighted mean coordinate along `axis`.
    #[must_use]
    pub fn mean(&self, axis: usize) -> f64 {
        if self.sum_w == 0.0 {
            return 0.0;
        }
        self.sum_xw[axis] / self.sum_w
    }

    /// Weighted RMS of the coordinates along `axis`.
    #[must_use]
    pub fn rms(&self, axis: usize) -> f64 {
        if self.sum_w == 0.0 {
            return 0.0;
        }
        spread(self.sum_xw[axis], self.sum_x2w[axis], self.sum_w)
    }
}
