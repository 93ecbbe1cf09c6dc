//! Configuration types for building instruments.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Binning rule for one axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Binning {
    /// `bins` equal-width bins covering `[min, max)`.
    Fixed { bins: usize, min: f64, max: f64 },
    /// Explicit bin edges; `n + 1` strictly increasing values for `n` bins.
    Edges(Vec<f64>),
}

impl Binning {
    /// Uniform binning.
    #[must_use]
    pub fn fixed(bins: usize, min: f64, max: f64) -> Self {
        Self::Fixed { bins, min, max }
    }

    /// Edge-list binning.
    #[must_use]
    pub fn edges(edges: impl Into<Vec<f64>>) -> Self {
        Self::Edges(edges.into())
    }
}

/// Half-open `[min, max)` window on the secondary value of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueWindow {
    /// Inclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl ValueWindow {
    /// Creates a new value window.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `v` lies inside the window.
    #[inline]
    #[must_use]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v < self.max
    }
}

/// Accumulation mode of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Plain weight counting.
    #[default]
    Counting,
    /// Averages a secondary value per bin, optionally rejecting values
    /// outside `window`.
    Profile {
        #[cfg_attr(feature = "serde", serde(default))]
        window: Option<ValueWindow>,
    },
}

impl Mode {
    /// Returns true for profile mode.
    #[must_use]
    pub fn is_profile(&self) -> bool {
        matches!(self, Self::Profile { .. })
    }

    /// Value window, if any.
    #[must_use]
    pub fn window(&self) -> Option<ValueWindow> {
        match self {
            Self::Counting => None,
            Self::Profile { window } => *window,
        }
    }
}

/// Full description of an instrument: title, one binning per axis and mode.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramConfig {
    /// Free-form title.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    /// Binning of each axis, x first.
    pub axes: Vec<Binning>,
    /// Counting or profile accumulation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: Mode,
}

impl HistogramConfig {
    /// Creates an empty configuration with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Appends an axis.
    #[must_use]
    pub fn with_axis(mut self, binning: Binning) -> Self {
        self.axes.push(binning);
        self
    }

    /// Appends a uniformly binned axis.
    #[must_use]
    pub fn with_fixed_axis(self, bins: usize, min: f64, max: f64) -> Self {
        self.with_axis(Binning::fixed(bins, min, max))
    }

    /// Appends an edge-list axis.
    #[must_use]
    pub fn with_edges(self, edges: impl Into<Vec<f64>>) -> Self {
        self.with_axis(Binning::edges(edges))
    }

    /// Switches to profile mode, keeping any window already set.
    #[must_use]
    pub fn profile(mut self) -> Self {
        if !self.mode.is_profile() {
            self.mode = Mode::Profile { window: None };
        }
        self
    }

    /// Switches to profile mode with a `[min, max)` value window.
    #[must_use]
    pub fn with_value_window(mut self, min: f64, max: f64) -> Self {
        self.mode = Mode::Profile {
            window: Some(ValueWindow::new(min, max)),
        };
        self
    }

    /// Number of axes.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_window_is_half_open() {
        let window = ValueWindow::new(1.0, 2.0);
        assert!(window.contains(1.0));
        assert!(window.contains(1.5));
        assert!(!window.contains(2.0));
        assert!(!window.contains(0.999));
        assert!(!window.contains(f64::NAN));
    }

    #[test]
    fn test_config_builder() {
        let config = HistogramConfig::new("energy")
            .with_fixed_axis(10, 0.0, 10.0)
            .with_edges(vec![0.0, 1.0, 4.0])
            .with_value_window(-1.0, 1.0);

        assert_eq!(config.title, "energy");
        assert_eq!(config.dimension(), 2);
        assert!(config.mode.is_profile());
        assert_eq!(config.mode.window(), Some(ValueWindow::new(-1.0, 1.0)));
    }

    #[test]
    fn test_profile_keeps_window() {
        let config = HistogramConfig::new("p")
            .with_value_window(0.0, 5.0)
            .profile();
        assert_eq!(config.mode.window(), Some(ValueWindow::new(0.0, 5.0)));

        let plain = HistogramConfig::new("h").profile();
        assert_eq!(plain.mode, Mode::Profile { window: None });
        assert_eq!(Mode::default().window(), None);
    }
}
