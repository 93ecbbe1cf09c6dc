//! binstat-core: Weighted multi-dimensional histograms and profiles.
//!
//! This crate provides 1D, 2D and 3D histogram and profile instruments
//! backed by flat mixed-radix storage with per-axis underflow and overflow
//! slots, cached in-range statistics, histogram arithmetic and
//! slicing/projection.

pub mod axis;
pub mod base;
pub mod config;
pub mod data;
pub mod error;
pub mod fast_index;
pub mod histogram;
pub mod in_range;
pub mod instruments;

pub use axis::{Axis, BinIndex};
pub use base::{Base, Base1D, Base2D, Base3D};
pub use config::{Binning, HistogramConfig, Mode, ValueWindow};
pub use data::{HistogramData, ProfileData};
pub use error::{Error, Result};
pub use histogram::Histogram;
pub use in_range::InRangeSums;
pub use instruments::{Histogram1D, Histogram2D, Histogram3D, Profile1D, Profile2D, Profile3D};
