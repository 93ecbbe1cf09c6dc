//! Flat offsets for fixed small dimensions.
//!
//! The generic engine walks every axis; these helpers compute the same
//! mixed-radix offset straight from absolute per-axis indices. Axis 0
//! always has multiplier 1, so only the higher strides are passed in.

/// Offset of absolute index `i` in a 1D histogram.
#[inline]
#[must_use]
pub const fn offset_1d(i: usize) -> usize {
    i
}

/// Offset of absolute indices `(i, j)`; `y_stride` is the y-axis multiplier.
#[inline]
#[must_use]
pub const fn offset_2d(i: usize, j: usize, y_stride: usize) -> usize {
    i + j * y_stride
}

/// Offset of absolute indices `(i, j, k)`.
#[inline]
#[must_use]
pub const fn offset_3d(i: usize, j: usize, k: usize, y_stride: usize, z_stride: usize) -> usize {
    i + j * y_stride + k * z_stride
}

/// Returns true if absolute index `abs` is an in-range bin of an axis with
/// `bins` bins.
#[inline]
#[must_use]
pub const fn is_inner(abs: usize, bins: usize) -> bool {
    abs != 0 && abs <= bins
}
