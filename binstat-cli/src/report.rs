//! Text and JSON summaries of a filled histogram.

use std::io::Write;

use binstat_core::{BinIndex, Histogram};
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSummary {
    pub bins: usize,
    pub lower: f64,
    pub upper: f64,
    pub multiplier: usize,
    pub mean: f64,
    pub rms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRow {
    /// `"underflow"`, `"overflow"` or the zero-based bin number.
    pub bin: String,
    pub lower: f64,
    pub upper: f64,
    pub entries: i64,
    pub height: f64,
    pub error: f64,
}

/// Everything printed by `binstat fill`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub title: String,
    pub dimension: usize,
    pub profile: bool,
    pub bin_count: usize,
    pub entries: i64,
    pub extra_entries: i64,
    pub all_entries: i64,
    pub sum_w: f64,
    pub equivalent_bin_entries: f64,
    pub axes: Vec<AxisSummary>,
    /// Per-bin table, 1D only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bins: Vec<BinRow>,
}

impl Summary {
    pub fn new(histogram: &Histogram) -> Self {
        let axes = histogram
            .axes()
            .iter()
            .enumerate()
            .map(|(index, axis)| AxisSummary {
                bins: axis.bins(),
                lower: axis.lower_edge(),
                upper: axis.upper_edge(),
                multiplier: axis.multiplier(),
                mean: histogram.axis_mean(index),
                rms: histogram.axis_rms(index),
            })
            .collect();

        Self {
            title: histogram.title().to_owned(),
            dimension: histogram.dimension(),
            profile: histogram.is_profile(),
            bin_count: histogram.bin_count(),
            entries: histogram.entries(),
            extra_entries: histogram.extra_entries(),
            all_entries: histogram.all_entries(),
            sum_w: histogram.sum_w(),
            equivalent_bin_entries: histogram.equivalent_bin_entries(),
            axes,
            bins: bin_rows(histogram),
        }
    }
}

fn bin_rows(histogram: &Histogram) -> Vec<BinRow> {
    let [axis] = histogram.axes() else {
        return Vec::new();
    };
    std::iter::once(BinIndex::Underflow)
        .chain((0..axis.bins()).map(BinIndex::InRange))
        .chain(std::iter::once(BinIndex::Overflow))
        .map(|index| {
            let (bin, lower, upper) = match index {
                BinIndex::Underflow => ("underflow".to_owned(), f64::NEG_INFINITY, axis.lower_edge()),
                BinIndex::Overflow => ("overflow".to_owned(), axis.upper_edge(), f64::INFINITY),
                BinIndex::InRange(i) => (
                    i.to_string(),
                    axis.bin_lower_edge(index),
                    axis.bin_upper_edge(index),
                ),
            };
            BinRow {
                bin,
                lower,
                upper,
                entries: histogram.bin_entries(&[index]),
                height: histogram.bin_height(&[index]),
                error: histogram.bin_error(&[index]),
            }
        })
        .collect()
}

/// Prints the binning layout of a configured histogram.
pub fn write_layout(histogram: &Histogram, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Title: {}", histogram.title())?;
    writeln!(out, "Dimension: {}", histogram.dimension())?;
    writeln!(
        out,
        "Mode: {}",
        if histogram.is_profile() { "profile" } else { "counting" }
    )?;
    if let Some(window) = histogram.value_window() {
        writeln!(out, "Value window: [{}, {})", window.min, window.max)?;
    }
    for (index, axis) in histogram.axes().iter().enumerate() {
        writeln!(
            out,
            "Axis {index}: {} bins over [{}, {}), {} binning, multiplier {}",
            axis.bins(),
            axis.lower_edge(),
            axis.upper_edge(),
            if axis.is_fixed_binning() { "fixed" } else { "variable" },
            axis.multiplier()
        )?;
    }
    writeln!(out, "Flattened bins: {}", histogram.bin_count())?;
    Ok(())
}

/// Prints `summary` as plain text.
pub fn write_text(summary: &Summary, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Title: {}", summary.title)?;
    writeln!(
        out,
        "Entries: {} in range, {} outflow, {} total",
        summary.entries, summary.extra_entries, summary.all_entries
    )?;
    writeln!(out, "Sum of weights: {:.6}", summary.sum_w)?;
    writeln!(
        out,
        "Equivalent entries: {:.3}",
        summary.equivalent_bin_entries
    )?;
    for (index, axis) in summary.axes.iter().enumerate() {
        writeln!(
            out,
            "Axis {index}: mean {:.6}, rms {:.6}",
            axis.mean, axis.rms
        )?;
    }
    if !summary.bins.is_empty() {
        writeln!(
            out,
            "{:>10} {:>12} {:>12} {:>10} {:>14} {:>14}",
            "bin", "lower", "upper", "entries", "height", "error"
        )?;
        writeln!(out, "{:-<77}", "")?;
        for row in &summary.bins {
            writeln!(
                out,
                "{:>10} {:>12.4} {:>12.4} {:>10} {:>14.6} {:>14.6}",
                row.bin, row.lower, row.upper, row.entries, row.height, row.error
            )?;
        }
    }
    Ok(())
}

/// Prints `summary` as pretty JSON.
pub fn write_json(summary: &Summary, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)?;
    Ok(())
}
