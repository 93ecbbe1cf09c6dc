//! Error types for binstat-core.

use thiserror::Error;

use crate::axis::BinIndex;

/// Result type alias for binstat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for histogram operations.
///
/// Every operation that returns an error leaves the instruments involved
/// exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An axis description failed validation.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Wrong number of axes or coordinates.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Two instruments cannot be combined.
    #[error("incompatible histograms: {0}")]
    Incompatible(&'static str),

    /// A coordinate that the axis cannot map to any bin (NaN).
    #[error("coordinate {value} cannot be mapped on axis {axis}")]
    OutOfDomain { axis: usize, value: f64 },

    /// The instrument is in the unconfigured state.
    #[error("histogram is not configured")]
    NotConfigured,

    /// A profile-only operation on a counting histogram.
    #[error("histogram is not a profile")]
    NotProfile,

    /// Invalid slice range on the dropped axis.
    #[error("invalid bin range {begin:?}..={end:?}")]
    InvalidRange { begin: BinIndex, end: BinIndex },

    /// Slice destination does not match the retained axis.
    #[error("bin count mismatch: expected {expected}, found {found}")]
    BinCountMismatch { expected: usize, found: usize },

    /// Scale factors must be non-negative numbers.
    #[error("scale factor must be non-negative, got {0}")]
    NegativeFactor(f64),
}
