//! Raw statistical state of an N-dimensional histogram.
//!
//! Per-bin accumulators are stored as parallel vectors (structure of arrays)
//! indexed by the flat mixed-radix offset. Per-axis moments live in flat
//! vectors of `bin_count * dimension` values, bin-major:
//! `sum_xw[offset * dimension + axis]`.

use crate::axis::Axis;
use crate::config::ValueWindow;

/// Profile-only accumulators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileData {
    /// Weighted sum of the secondary value, per bin.
    pub sum_vw: Vec<f64>,
    /// Weighted sum of the squared secondary value, per bin.
    pub sum_v2w: Vec<f64>,
    /// Fills with a value outside this window are ignored.
    pub window: Option<ValueWindow>,
}

impl ProfileData {
    fn zeroed(bin_count: usize, window: Option<ValueWindow>) -> Self {
        Self {
            sum_vw: vec![0.0; bin_count],
            sum_v2w: vec![0.0; bin_count],
            window,
        }
    }
}

/// Accumulator storage of one histogram.
///
/// The default value is the unconfigured state: dimension 0, no axes and
/// no storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramData {
    /// Free-form title.
    pub title: String,
    /// Number of axes.
    pub dimension: usize,
    /// Total flattened bin count, `prod(bins_i + 2)`.
    pub bin_count: usize,
    /// Axes with their assigned multipliers.
    pub axes: Vec<Axis>,
    /// Entry counter per bin. Signed because subtraction may go negative.
    pub entries: Vec<i64>,
    /// Sum of weights per bin.
    pub sum_w: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sum_w2: Vec<f64>,
    /// Weighted first moment per bin and axis.
    pub sum_xw: Vec<f64>,
    /// Weighted second moment per bin and axis.
    pub sum_x2w: Vec<f64>,
    /// Present only for profile instruments.
    pub profile: Option<ProfileData>,
}

impl HistogramData {
    /// Allocates zeroed storage for `axes`, assigning their multipliers.
    pub(crate) fn allocate(
        title: String,
        mut axes: Vec<Axis>,
        profile: Option<Option<ValueWindow>>,
    ) -> Self {
        let dimension = axes.len();
        let mut multiplier = 1;
        for axis in &mut axes {
            axis.set_multiplier(multiplier);
            multiplier *= axis.bins() + 2;
        }
        let bin_count = multiplier;
        Self {
            title,
            dimension,
            bin_count,
            axes,
            entries: vec![0; bin_count],
            sum_w: vec![0.0; bin_count],
            sum_w2: vec![0.0; bin_count],
            sum_xw: vec![0.0; bin_count * dimension],
            sum_x2w: vec![0.0; bin_count * dimension],
            profile: profile.map(|window| ProfileData::zeroed(bin_count, window)),
        }
    }

    /// Re-zeroes every accumulator, keeping the binning.
    pub(crate) fn zero(&mut self) {
        self.entries.fill(0);
        self.sum_w.fill(0.0);
        self.sum_w2.fill(0.0);
        self.sum_xw.fill(0.0);
        self.sum_x2w.fill(0.0);
        if let Some(profile) = &mut self.profile {
            profile.sum_vw.fill(0.0);
            profile.sum_v2w.fill(0.0);
        }
    }

    /// Checks that every array matches the binning described by `axes`.
    pub(crate) fn is_consistent(&self) -> bool {
        if self.dimension != self.axes.len() {
            return false;
        }
        let mut multiplier = 1usize;
        for axis in &self.axes {
            if axis.multiplier() != multiplier {
                return false;
            }
            let Some(next) = axis
                .bins()
                .checked_add(2)
                .and_then(|slots| multiplier.checked_mul(slots))
            else {
                return false;
            };
            multiplier = next;
        }
        let Some(moments) = self.bin_count.checked_mul(self.dimension) else {
            return false;
        };
        multiplier == self.bin_count
            && self.entries.len() == self.bin_count
            && self.sum_w.len() == self.bin_count
            && self.sum_w2.len() == self.bin_count
            && self.sum_xw.len() == moments
            && self.sum_x2w.len() == moments
            && self.profile.as_ref().map_or(true, |profile| {
                profile.sum_vw.len() == self.bin_count && profile.sum_v2w.len() == self.bin_count
            })
    }

    /// Returns true for profile storage.
    #[inline]
    #[must_use]
    pub fn is_profile(&self) -> bool {
        self.profile.is_some()
    }

    /// Returns true if the bin at `offset` is an underflow or overflow slot
    /// on at least one axis.
    #[must_use]
    pub fn is_out(&self, offset: usize) -> bool {
        let mut rest = offset;
        for axis in self.axes.iter().rev() {
            let index = rest / axis.multiplier();
            if index == 0 || index == axis.bins() + 1 {
                return true;
            }
            rest -= index * axis.multiplier();
        }
        false
    }

    /// Adds one weighted sample to the bin at `offset`.
    #[inline]
    pub(crate) fn accumulate(&mut self, offset: usize, coords: &[f64], value: Option<f64>, weight: f64) {
        self.entries[offset] += 1;
        self.sum_w[offset] += weight;
        self.sum_w2[offset] += weight * weight;
        let base = offset * self.dimension;
        for (axis, &x) in coords.iter().enumerate() {
            let xw = x * weight;
            self.sum_xw[base + axis] += xw;
            self.sum_x2w[base + axis] += x * xw;
        }
        if let (Some(profile), Some(v)) = (&mut self.profile, value) {
            let vw = v * weight;
            profile.sum_vw[offset] += vw;
            profile.sum_v2w[offset] += v * vw;
        }
    }

    /// Adds the accumulators of `src` bin `src_offset` to bin `dst_offset`.
    ///
    /// `axis_map[i]` names the source axis feeding destination axis `i`.
    /// Profile sums are merged only when both sides are profiles.
    pub(crate) fn merge_bin(
        &mut self,
        dst_offset: usize,
        src: &HistogramData,
        src_offset: usize,
        axis_map: &[usize],
    ) {
        self.entries[dst_offset] += src.entries[src_offset];
        self.sum_w[dst_offset] += src.sum_w[src_offset];
        self.sum_w2[dst_offset] += src.sum_w2[src_offset];
        let dst_base = dst_offset * self.dimension;
        let src_base = src_offset * src.dimension;
        for (axis, &src_axis) in axis_map.iter().enumerate() {
            self.sum_xw[dst_base + axis] += src.sum_xw[src_base + src_axis];
            self.sum_x2w[dst_base + axis] += src.sum_x2w[src_base + src_axis];
        }
        if let (Some(dst), Some(from)) = (&mut self.profile, &src.profile) {
            dst.sum_vw[dst_offset] += from.sum_vw[src_offset];
            dst.sum_v2w[dst_offset] += from.sum_v2w[src_offset];
        }
    }

    /// Weighted first moment of `axis` in bin `offset`.
    #[inline]
    #[must_use]
    pub fn sum_xw_at(&self, offset: usize, axis: usize) -> f64 {
        self.sum_xw[offset * self.dimension + axis]
    }

    /// Weighted second moment of `axis` in bin `offset`.
    #[inline]
    #[must_use]
    pub fn sum_x2w_at(&self, offset: usize, axis: usize) -> f64 {
        self.sum_x2w[offset * self.dimension + axis]
    }

    /// Bin height: mean secondary value for profiles, weight sum otherwise.
    #[inline]
    #[must_use]
    pub fn height_at(&self, offset: usize) -> f64 {
        match &self.profile {
            Some(profile) => {
                let sw = self.sum_w[offset];
                if sw == 0.0 {
                    0.0
                } else {
                    profile.sum_vw[offset] / sw
                }
            }
            None => self.sum_w[offset],
        }
    }

    /// Bin error: `sqrt(sum_w2)` for counting histograms, the error on the
    /// mean `rms / sqrt(sum_w)` for profiles.
    #[must_use]
    pub fn error_at(&self, offset: usize) -> f64 {
        if self.profile.is_some() {
            let sw = self.sum_w[offset];
            if sw == 0.0 {
                return 0.0;
            }
            self.rms_at(offset) / sw.sqrt()
        } else {
            self.sum_w2[offset].sqrt()
        }
    }

    /// Weighted mean coordinate of `axis` in bin `offset`.
    #[must_use]
    pub fn mean_at(&self, offset: usize, axis: usize) -> f64 {
        let sw = self.sum_w[offset];
        if sw == 0.0 {
            return 0.0;
        }
        self.sum_xw_at(offset, axis) / sw
    }

    /// Weighted standard deviation of `axis` coordinates in bin `offset`.
    #[must_use]
    pub fn std_dev_at(&self, offset: usize, axis: usize) -> f64 {
        let sw = self.sum_w[offset];
        if sw == 0.0 {
            return 0.0;
        }
        spread(self.sum_xw_at(offset, axis), self.sum_x2w_at(offset, axis), sw)
    }

    /// RMS of the secondary value in bin `offset`; 0 for counting histograms.
    #[must_use]
    pub fn rms_at(&self, offset: usize) -> f64 {
        let Some(profile) = &self.profile else {
            return 0.0;
        };
        let sw = self.sum_w[offset];
        if sw == 0.0 {
            return 0.0;
        }
        spread(profile.sum_vw[offset], profile.sum_v2w[offset], sw)
    }
}

/// `sqrt(|s2/sw - (s1/sw)^2|)`, the spread shared by every RMS formula.
/// Callers guard `sw != 0`.
#[inline]
pub(crate) fn spread(s1: f64, s2: f64, sw: f64) -> f64 {
    let mean = s1 / sw;
    (s2 / sw - mean * mean).abs().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn data_2d(profile: bool) -> HistogramData {
        let axes = vec![
            Axis::fixed(3, 0.0, 3.0).unwrap(),
            Axis::fixed(2, 0.0, 2.0).unwrap(),
        ];
        HistogramData::allocate("test".into(), axes, profile.then_some(None))
    }

    #[test]
    fn test_allocate_assigns_mixed_radix() {
        let data = data_2d(false);
        assert_eq!(data.bin_count, 5 * 4);
        assert_eq!(data.axes[0].multiplier(), 1);
        assert_eq!(data.axes[1].multiplier(), 5);
        assert_eq!(data.sum_xw.len(), 40);
        assert!(data.profile.is_none());
        assert!(data.is_consistent());
    }

    #[test]
    fn test_is_out() {
        let data = data_2d(false);
        // (abs x, abs y) = (1, 1) is the first in-range bin.
        assert!(!data.is_out(1 + 5));
        assert!(data.is_out(0));
        assert!(data.is_out(4 + 5));
        assert!(data.is_out(2 + 3 * 5));
        assert!(!data.is_out(3 + 2 * 5));

        let inner = (0..data.bin_count).filter(|&o| !data.is_out(o)).count();
        assert_eq!(inner, 3 * 2);
    }

    #[test]
    fn test_accumulate_and_statistics() {
        let mut data = data_2d(true);
        let offset = 2 + 5;
        data.accumulate(offset, &[1.2, 0.5], Some(4.0), 1.0);
        data.accumulate(offset, &[1.8, 0.5], Some(6.0), 1.0);

        assert_eq!(data.entries[offset], 2);
        assert_relative_eq!(data.height_at(offset), 5.0);
        assert_relative_eq!(data.mean_at(offset, 0), 1.5);
        assert_relative_eq!(data.std_dev_at(offset, 0), 0.3, epsilon = 1e-12);
        assert_relative_eq!(data.rms_at(offset), 1.0, epsilon = 1e-12);
        assert_relative_eq!(data.error_at(offset), 1.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_bin_statistics_are_zero() {
        let data = data_2d(true);
        assert_relative_eq!(data.height_at(6), 0.0);
        assert_relative_eq!(data.error_at(6), 0.0);
        assert_relative_eq!(data.mean_at(6, 1), 0.0);
        assert_relative_eq!(data.std_dev_at(6, 1), 0.0);
        assert_relative_eq!(data.rms_at(6), 0.0);
    }

    #[test]
    fn test_zero_keeps_binning() {
        let mut data = data_2d(true);
        data.accumulate(7, &[1.0, 1.0], Some(2.0), 3.0);
        data.zero();
        assert_eq!(data.bin_count, 20);
        assert!(data.entries.iter().all(|&n| n == 0));
        assert!(data.sum_w2.iter().all(|&w| w == 0.0));
        assert!(data.profile.as_ref().unwrap().sum_v2w.iter().all(|&v| v == 0.0));
    }
}
