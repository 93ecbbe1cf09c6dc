//! Concrete histograms and profiles for one, two and three dimensions.
//!
//! Each instrument is a thin newtype over its [`Base`] layer. Counting
//! histograms accumulate weights; profiles additionally average a secondary
//! value `v` per bin and may ignore values outside a [`ValueWindow`].

use std::ops::{Deref, DerefMut};

use crate::axis::BinIndex;
use crate::base::{Base, Base1D, Base2D, Base3D};
use crate::config::{Binning, HistogramConfig, Mode, ValueWindow};
use crate::error::{Error, Result};

fn profile_mode(window: Option<ValueWindow>) -> Mode {
    Mode::Profile { window }
}

fn build<const D: usize>(title: &str, axes: [Binning; D], mode: Mode) -> Result<Base<D>> {
    let config = HistogramConfig {
        title: title.to_owned(),
        axes: axes.into(),
        mode,
    };
    Base::from_config(&config)
}

macro_rules! instrument {
    ($name:ident, $dim:literal, $profile:literal) => {
        impl Deref for $name {
            type Target = Base<$dim>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$name> for Base<$dim> {
            fn from(instrument: $name) -> Self {
                instrument.0
            }
        }

        impl TryFrom<Base<$dim>> for $name {
            type Error = Error;

            fn try_from(base: Base<$dim>) -> Result<Self> {
                match (base.is_profile(), $profile) {
                    (true, true) | (false, false) => Ok(Self(base)),
                    (false, true) => Err(Error::NotProfile),
                    (true, false) => Err(Error::Incompatible("profile mode differs")),
                }
            }
        }
    };
}

/// One-dimensional weighted histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D(Base1D);

instrument!(Histogram1D, 1, false);

impl Histogram1D {
    /// `bins` equal-width bins over `[min, max)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(title: &str, bins: usize, min: f64, max: f64) -> Result<Self> {
        build(title, [Binning::fixed(bins, min, max)], Mode::Counting).map(Self)
    }

    /// Variable-width bins from explicit edges.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(title: &str, edges: &[f64]) -> Result<Self> {
        build(title, [Binning::edges(edges)], Mode::Counting).map(Self)
    }

    /// Adds `x` with unit weight.
    ///
    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64) -> Result<()> {
        self.0.fill_1d(x, None, 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, weight: f64) -> Result<()> {
        self.0.fill_1d(x, None, weight)
    }
}

/// One-dimensional profile: mean of `v` per x bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile1D(Base1D);

instrument!(Profile1D, 1, true);

impl Profile1D {
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(
        title: &str,
        bins: usize,
        min: f64,
        max: f64,
        window: Option<ValueWindow>,
    ) -> Result<Self> {
        build(title, [Binning::fixed(bins, min, max)], profile_mode(window)).map(Self)
    }

    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(title: &str, edges: &[f64], window: Option<ValueWindow>) -> Result<Self> {
        build(title, [Binning::edges(edges)], profile_mode(window)).map(Self)
    }

    /// Adds value `v` at `x` with unit weight. Values outside the window
    /// are ignored.
    ///
    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64, v: f64) -> Result<()> {
        self.0.fill_1d(x, Some(v), 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, v: f64, weight: f64) -> Result<()> {
        self.0.fill_1d(x, Some(v), weight)
    }

    /// RMS of `v` in bin `i`.
    #[must_use]
    pub fn bin_rms(&self, i: BinIndex) -> f64 {
        self.0.bin_rms_at(i)
    }
}

/// Two-dimensional weighted histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D(Base2D);

instrument!(Histogram2D, 2, false);

impl Histogram2D {
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(title: &str, x: Binning, y: Binning) -> Result<Self> {
        build(title, [x, y], Mode::Counting).map(Self)
    }

    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(title: &str, x_edges: &[f64], y_edges: &[f64]) -> Result<Self> {
        Self::new(title, Binning::edges(x_edges), Binning::edges(y_edges))
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64, y: f64) -> Result<()> {
        self.0.fill_2d(x, y, None, 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) -> Result<()> {
        self.0.fill_2d(x, y, None, weight)
    }
}

/// Two-dimensional profile: mean of `v` per (x, y) bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D(Base2D);

instrument!(Profile2D, 2, true);

impl Profile2D {
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(title: &str, x: Binning, y: Binning, window: Option<ValueWindow>) -> Result<Self> {
        build(title, [x, y], profile_mode(window)).map(Self)
    }

    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(
        title: &str,
        x_edges: &[f64],
        y_edges: &[f64],
        window: Option<ValueWindow>,
    ) -> Result<Self> {
        Self::new(title, Binning::edges(x_edges), Binning::edges(y_edges), window)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64, y: f64, v: f64) -> Result<()> {
        self.0.fill_2d(x, y, Some(v), 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, y: f64, v: f64, weight: f64) -> Result<()> {
        self.0.fill_2d(x, y, Some(v), weight)
    }

    #[must_use]
    pub fn bin_rms(&self, i: BinIndex, j: BinIndex) -> f64 {
        self.0.bin_rms_at(i, j)
    }
}

/// Three-dimensional weighted histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram3D(Base3D);

instrument!(Histogram3D, 3, false);

impl Histogram3D {
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(title: &str, x: Binning, y: Binning, z: Binning) -> Result<Self> {
        build(title, [x, y, z], Mode::Counting).map(Self)
    }

    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(
        title: &str,
        x_edges: &[f64],
        y_edges: &[f64],
        z_edges: &[f64],
    ) -> Result<Self> {
        Self::new(
            title,
            Binning::edges(x_edges),
            Binning::edges(y_edges),
            Binning::edges(z_edges),
        )
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.0.fill_3d([x, y, z], None, 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, y: f64, z: f64, weight: f64) -> Result<()> {
        self.0.fill_3d([x, y, z], None, weight)
    }
}

/// Three-dimensional profile: mean of `v` per (x, y, z) bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile3D(Base3D);

instrument!(Profile3D, 3, true);

impl Profile3D {
    /// # Errors
    /// Returns [`Error::InvalidAxis`] for an invalid binning.
    pub fn new(
        title: &str,
        x: Binning,
        y: Binning,
        z: Binning,
        window: Option<ValueWindow>,
    ) -> Result<Self> {
        build(title, [x, y, z], profile_mode(window)).map(Self)
    }

    /// # Errors
    /// Returns [`Error::InvalidAxis`] for invalid edges.
    pub fn with_edges(
        title: &str,
        x_edges: &[f64],
        y_edges: &[f64],
        z_edges: &[f64],
        window: Option<ValueWindow>,
    ) -> Result<Self> {
        Self::new(
            title,
            Binning::edges(x_edges),
            Binning::edges(y_edges),
            Binning::edges(z_edges),
            window,
        )
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill(&mut self, x: f64, y: f64, z: f64, v: f64) -> Result<()> {
        self.0.fill_3d([x, y, z], Some(v), 1.0)
    }

    /// # Errors
    /// Returns [`Error::OutOfDomain`] for a NaN coordinate.
    pub fn fill_weighted(&mut self, x: f64, y: f64, z: f64, v: f64, weight: f64) -> Result<()> {
        self.0.fill_3d([x, y, z], Some(v), weight)
    }

    #[must_use]
    pub fn bin_rms(&self, i: BinIndex, j: BinIndex, k: BinIndex) -> f64 {
        self.0.bin_rms_at(i, j, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_histogram1d_fill() {
        let mut h = Histogram1D::new("h", 4, 0.0, 4.0).unwrap();
        h.fill(1.5).unwrap();
        h.fill_weighted(1.5, 2.0).unwrap();
        assert_eq!(h.bin_entries(BinIndex::InRange(1)), 2);
        assert_relative_eq!(h.bin_height(BinIndex::InRange(1)), 3.0);
        assert_relative_eq!(h.bin_error(BinIndex::InRange(1)), 5.0_f64.sqrt());
        assert!(matches!(h.fill(f64::NAN), Err(Error::OutOfDomain { axis: 0, .. })));
    }

    #[test]
    fn test_profile1d_window() {
        let window = ValueWindow::new(0.0, 5.0);
        let mut p = Profile1D::with_edges("p", &[0.0, 1.0, 3.0], Some(window)).unwrap();
        p.fill(2.0, 1.0).unwrap();
        p.fill(2.0, 3.0).unwrap();
        p.fill(2.0, 5.0).unwrap();
        assert_eq!(p.all_entries(), 2);
        assert_relative_eq!(p.bin_height(BinIndex::InRange(1)), 2.0);
        assert_relative_eq!(p.bin_rms(BinIndex::InRange(1)), 1.0);
        assert_eq!(p.value_window(), Some(window));
    }

    #[test]
    fn test_invalid_binning_is_rejected() {
        assert!(matches!(
            Histogram2D::with_edges("h", &[0.0, 1.0], &[1.0]),
            Err(Error::InvalidAxis(_))
        ));
        assert!(Profile3D::new(
            "p",
            Binning::fixed(0, 0.0, 1.0),
            Binning::fixed(1, 0.0, 1.0),
            Binning::fixed(1, 0.0, 1.0),
            None,
        )
        .is_err());
    }

    #[test]
    fn test_try_from_base_checks_mode() {
        let p = Profile2D::new("p", Binning::fixed(2, 0.0, 2.0), Binning::fixed(2, 0.0, 2.0), None)
            .unwrap();
        let slice = p.slice_x(BinIndex::Underflow, BinIndex::Overflow).unwrap();
        assert_eq!(
            Histogram1D::try_from(slice.clone()),
            Err(Error::Incompatible("profile mode differs"))
        );
        assert!(Profile1D::try_from(slice).is_ok());

        let h = Histogram3D::new(
            "h",
            Binning::fixed(1, 0.0, 1.0),
            Binning::fixed(1, 0.0, 1.0),
            Binning::fixed(1, 0.0, 1.0),
        )
        .unwrap();
        assert_eq!(Profile2D::try_from(h.projection_xy()), Err(Error::NotProfile));
    }

    #[test]
    fn test_profile3d_fill() {
        let axis = Binning::fixed(2, 0.0, 2.0);
        let mut p = Profile3D::new("p", axis.clone(), axis.clone(), axis, None).unwrap();
        p.fill_weighted(0.5, 1.5, 0.5, 10.0, 2.0).unwrap();
        let (i, j, k) = (BinIndex::InRange(0), BinIndex::InRange(1), BinIndex::InRange(0));
        assert_relative_eq!(p.bin_height(i, j, k), 10.0);
        assert_relative_eq!(p.bin_rms(i, j, k), 0.0);
        assert_relative_eq!(p.mean_y(), 1.5);
        assert_eq!(p.entries(), 1);
    }
}
