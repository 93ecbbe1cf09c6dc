//! Parallel filling: one histogram per chunk, merged with `add`.

use binstat_core::Histogram;
use rayon::prelude::*;

use crate::input::SampleBatch;
use crate::{CliError, Result};

/// Fills a copy of the empty `template` with every sample in `batch`.
///
/// Samples are split into chunks processed on the current rayon pool;
/// the partial histograms are combined with [`Histogram::add`].
pub fn accumulate(template: &Histogram, batch: &SampleBatch) -> Result<Histogram> {
    let chunk = chunk_size(batch.len(), rayon::current_num_threads());
    let rows: Vec<usize> = (0..batch.len()).step_by(chunk).collect();
    log::debug!(
        "filling {} samples in {} chunks of up to {chunk}",
        batch.len(),
        rows.len()
    );

    rows.into_par_iter()
        .map(|start| fill_rows(template, batch, start..(start + chunk).min(batch.len())))
        .try_reduce(
            || template.clone(),
            |mut merged, part| {
                merged.add(&part)?;
                Ok(merged)
            },
        )
}

/// Sequential fill of `rows`.
pub fn fill_rows(
    template: &Histogram,
    batch: &SampleBatch,
    rows: std::ops::Range<usize>,
) -> Result<Histogram> {
    let mut histogram = template.clone();
    for row in rows {
        let coords = batch.coords(row);
        let weight = batch.weights[row];
        let filled = match batch.value(row) {
            Some(v) => histogram.fill_bin_profile(coords, v, weight),
            None => histogram.fill_bin(coords, weight),
        };
        filled.map_err(|source| CliError::Sample {
            line: batch.lines[row],
            source,
        })?;
    }
    Ok(histogram)
}

/// Splits `len` samples into a few chunks per worker.
fn chunk_size(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1) * 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{parse_samples, RowLayout};
    use approx::assert_relative_eq;
    use binstat_core::{BinIndex, HistogramConfig};
    use std::fmt::Write;
    use std::io::Cursor;

    fn layout(profile: bool) -> RowLayout {
        RowLayout {
            dimension: 1,
            profile,
            weighted: true,
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut text = String::new();
        for n in 0..1000 {
            writeln!(text, "{} {}", f64::from(n % 97) / 9.0 - 1.0, 1.0 + f64::from(n % 3)).unwrap();
        }
        let batch = parse_samples(Cursor::new(text), layout(false)).unwrap();
        let template =
            Histogram::new(&HistogramConfig::new("h").with_fixed_axis(8, 0.0, 8.0)).unwrap();

        let parallel = accumulate(&template, &batch).unwrap();
        let sequential = fill_rows(&template, &batch, 0..batch.len()).unwrap();

        assert_eq!(parallel.data().entries, sequential.data().entries);
        assert_relative_eq!(parallel.sum_w(), sequential.sum_w(), epsilon = 1e-9);
        assert_relative_eq!(parallel.axis_mean(0), sequential.axis_mean(0), epsilon = 1e-9);
        assert_eq!(parallel.all_entries(), 1000);
    }

    #[test]
    fn test_profile_rows_use_values() {
        let batch = parse_samples(Cursor::new("0.5 2 1\n0.5 4 1\n"), layout(true)).unwrap();
        let template =
            Histogram::new(&HistogramConfig::new("p").with_fixed_axis(1, 0.0, 1.0).profile())
                .unwrap();
        let filled = accumulate(&template, &batch).unwrap();
        assert_relative_eq!(filled.bin_height(&[BinIndex::InRange(0)]), 3.0);
    }

    #[test]
    fn test_unmappable_sample_reports_line() {
        let batch = parse_samples(Cursor::new("0.5 1\nNaN 1\n"), layout(false)).unwrap();
        let template =
            Histogram::new(&HistogramConfig::new("h").with_fixed_axis(2, 0.0, 1.0)).unwrap();
        let err = accumulate(&template, &batch).unwrap_err();
        assert!(matches!(err, CliError::Sample { line: 2, .. }));
    }

    #[test]
    fn test_empty_batch_yields_template() {
        let template =
            Histogram::new(&HistogramConfig::new("h").with_fixed_axis(2, 0.0, 1.0)).unwrap();
        let filled = accumulate(&template, &SampleBatch::default()).unwrap();
        assert_eq!(filled, template);
        assert_eq!(chunk_size(0, 8), 1);
        assert_eq!(chunk_size(100, 5), 5);
    }
}
