//! Single-dimension binning rules.
//!
//! An [`Axis`] maps a real coordinate onto an absolute bin index in
//! `[0, bins + 1]`, where `0` is the underflow slot and `bins + 1` the
//! overflow slot. The owning histogram assigns each axis a mixed-radix
//! multiplier so that per-axis indices flatten into one storage offset.
#![allow(clippy::cast_precision_loss)]

use crate::config::Binning;
use crate::error::{Error, Result};

/// Per-axis bin address.
///
/// Ordering follows storage order: underflow, then in-range bins by index,
/// then overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinIndex {
    /// Values below the lower edge.
    Underflow,
    /// Zero-based in-range bin.
    InRange(usize),
    /// Values at or above the upper edge.
    Overflow,
}

impl BinIndex {
    /// Returns true for the underflow and overflow slots.
    #[inline]
    #[must_use]
    pub fn is_outflow(self) -> bool {
        !matches!(self, Self::InRange(_))
    }
}

impl From<usize> for BinIndex {
    #[inline]
    fn from(index: usize) -> Self {
        Self::InRange(index)
    }
}

/// Binning rule for one axis: uniform or edge based.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    bins: usize,
    lower: f64,
    upper: f64,
    /// Bin width for uniform binning, 0 otherwise.
    width: f64,
    /// Explicit edges; empty for uniform binning.
    edges: Vec<f64>,
    multiplier: usize,
}

impl Axis {
    /// Creates a uniformly binned axis over `[min, max)`.
    ///
    /// # Errors
    /// Fails if `bins` is zero or leaves no room for the outflow slots, if a
    /// bound is not finite, if `max <= min`, or if `max - min` overflows.
    pub fn fixed(bins: usize, min: f64, max: f64) -> Result<Self> {
        if bins == 0 {
            return Err(Error::InvalidAxis("bin count must be at least 1".into()));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidAxis(format!(
                "bounds must be finite, got [{min}, {max})"
            )));
        }
        if max <= min {
            return Err(Error::InvalidAxis(format!(
                "upper bound {max} must exceed lower bound {min}"
            )));
        }
        if !(max - min).is_finite() {
            return Err(Error::InvalidAxis(format!(
                "range [{min}, {max}) is too wide"
            )));
        }
        if bins > usize::MAX - 2 {
            return Err(Error::InvalidAxis(format!("too many bins: {bins}")));
        }
        Ok(Self {
            bins,
            lower: min,
            upper: max,
            width: (max - min) / bins as f64,
            edges: Vec::new(),
            multiplier: 0,
        })
    }

    /// Creates an axis from explicit, strictly increasing edges.
    ///
    /// # Errors
    /// Fails with fewer than two edges, non-finite edges, edges that are
    /// not strictly increasing, or a span that overflows.
    pub fn variable(edges: &[f64]) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidAxis(format!(
                "need at least 2 edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|edge| !edge.is_finite()) {
            return Err(Error::InvalidAxis("edges must be finite".into()));
        }
        if let Some(pos) = edges.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidAxis(format!(
                "edges must be strictly increasing (edge {pos} >= edge {})",
                pos + 1
            )));
        }
        let bins = edges.len() - 1;
        if !(edges[bins] - edges[0]).is_finite() {
            return Err(Error::InvalidAxis(format!(
                "range [{}, {}) is too wide",
                edges[0], edges[bins]
            )));
        }
        Ok(Self {
            bins,
            lower: edges[0],
            upper: edges[bins],
            width: 0.0,
            edges: edges.to_vec(),
            multiplier: 0,
        })
    }

    /// Builds an axis from its configuration.
    ///
    /// # Errors
    /// Propagates the validation failure of [`Axis::fixed`] or [`Axis::variable`].
    pub fn from_binning(binning: &Binning) -> Result<Self> {
        match binning {
            Binning::Fixed { bins, min, max } => Self::fixed(*bins, *min, *max),
            Binning::Edges(edges) => Self::variable(edges),
        }
    }

    /// Configuration that rebuilds this axis.
    #[must_use]
    pub fn binning(&self) -> Binning {
        if self.is_fixed_binning() {
            Binning::fixed(self.bins, self.lower, self.upper)
        } else {
            Binning::Edges(self.edges.clone())
        }
    }

    /// Number of in-range bins.
    #[inline]
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Lower edge of the first bin.
    #[must_use]
    pub fn lower_edge(&self) -> f64 {
        self.lower
    }

    /// Upper edge of the last bin.
    #[must_use]
    pub fn upper_edge(&self) -> f64 {
        self.upper
    }

    /// Returns true for uniform binning.
    #[must_use]
    pub fn is_fixed_binning(&self) -> bool {
        self.edges.is_empty()
    }

    /// All `bins + 1` edges, explicit or implied by the uniform binning.
    #[must_use]
    pub fn edges(&self) -> Vec<f64> {
        if self.is_fixed_binning() {
            (0..=self.bins)
                .map(|i| self.lower + i as f64 * self.width)
                .collect()
        } else {
            self.edges.clone()
        }
    }

    /// Mixed-radix multiplier assigned by the owning histogram.
    #[inline]
    #[must_use]
    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    pub(crate) fn set_multiplier(&mut self, multiplier: usize) {
        self.multiplier = multiplier;
    }

    /// Width of an in-range bin; 0 for outflow or invalid indices.
    #[must_use]
    pub fn bin_width(&self, index: BinIndex) -> f64 {
        match index {
            BinIndex::InRange(i) if i < self.bins => {
                if self.is_fixed_binning() {
                    self.width
                } else {
                    self.edges[i + 1] - self.edges[i]
                }
            }
            _ => 0.0,
        }
    }

    /// Lower edge of an in-range bin; 0 for outflow or invalid indices.
    #[must_use]
    pub fn bin_lower_edge(&self, index: BinIndex) -> f64 {
        match index {
            BinIndex::InRange(i) if i < self.bins => {
                if self.is_fixed_binning() {
                    self.lower + i as f64 * self.width
                } else {
                    self.edges[i]
                }
            }
            _ => 0.0,
        }
    }

    /// Upper edge of an in-range bin; 0 for outflow or invalid indices.
    #[must_use]
    pub fn bin_upper_edge(&self, index: BinIndex) -> f64 {
        match index {
            BinIndex::InRange(i) if i < self.bins => {
                if self.is_fixed_binning() {
                    self.lower + (i + 1) as f64 * self.width
                } else {
                    self.edges[i + 1]
                }
            }
            _ => 0.0,
        }
    }

    /// Center of an in-range bin; 0 for outflow or invalid indices.
    #[must_use]
    pub fn bin_center(&self, index: BinIndex) -> f64 {
        match index {
            BinIndex::InRange(i) if i < self.bins => {
                if self.is_fixed_binning() {
                    self.lower + (i as f64 + 0.5) * self.width
                } else {
                    0.5 * (self.edges[i] + self.edges[i + 1])
                }
            }
            _ => 0.0,
        }
    }

    /// Bin containing `value`, or `None` if the value cannot be mapped.
    #[inline]
    #[must_use]
    pub fn coord_to_index(&self, value: f64) -> Option<BinIndex> {
        self.coord_to_absolute_index(value)
            .map(|abs| self.absolute_to_bin_index(abs))
    }

    /// Absolute index of `value`: 0 for underflow, `1..=bins` in range,
    /// `bins + 1` for overflow. `None` for NaN.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn coord_to_absolute_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        if value < self.lower {
            return Some(0);
        }
        if value >= self.upper {
            return Some(self.bins + 1);
        }
        let index = if self.is_fixed_binning() {
            // Rounding can push values just below the upper edge onto `bins`.
            (((value - self.lower) / self.width) as usize).min(self.bins - 1)
        } else {
            // First edge strictly greater than value, minus one.
            self.edges.partition_point(|edge| *edge <= value) - 1
        };
        Some(index + 1)
    }

    /// Checks a caller-supplied bin address and returns its absolute index.
    #[inline]
    #[must_use]
    pub fn in_range_to_absolute_index(&self, index: BinIndex) -> Option<usize> {
        match index {
            BinIndex::Underflow => Some(0),
            BinIndex::Overflow => Some(self.bins + 1),
            BinIndex::InRange(i) if i < self.bins => Some(i + 1),
            BinIndex::InRange(_) => None,
        }
    }

    /// Inverse of [`Axis::in_range_to_absolute_index`] for `abs <= bins + 1`.
    #[inline]
    #[must_use]
    pub fn absolute_to_bin_index(&self, abs: usize) -> BinIndex {
        if abs == 0 {
            BinIndex::Underflow
        } else if abs > self.bins {
            BinIndex::Overflow
        } else {
            BinIndex::InRange(abs - 1)
        }
    }

    /// Two axes are compatible when their binning is identical.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_compatible(&self, other: &Axis) -> bool {
        self.bins == other.bins
            && self.lower == other.lower
            && self.upper == other.upper
            && self.edges == other.edges
    }
}
