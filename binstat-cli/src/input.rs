//! Sample file parsing.
//!
//! One sample per line: `D` coordinates, then `v` for profiles, then the
//! weight when weighted input is requested. Fields are separated by
//! whitespace or commas; blank lines and lines starting with `#` are
//! skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{CliError, Result};

/// Column layout of a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub dimension: usize,
    pub profile: bool,
    pub weighted: bool,
}

impl RowLayout {
    /// Number of fields expected on every line.
    pub fn columns(self) -> usize {
        self.dimension + usize::from(self.profile) + usize::from(self.weighted)
    }
}

/// Samples stored column-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBatch {
    pub dimension: usize,
    /// Coordinates, `dimension` values per sample.
    pub coords: Vec<f64>,
    /// Secondary values; empty unless the layout is a profile.
    pub values: Vec<f64>,
    pub weights: Vec<f64>,
    /// Source line of each sample, 1-based.
    pub lines: Vec<usize>,
}

impl SampleBatch {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Coordinates of sample `row`.
    pub fn coords(&self, row: usize) -> &[f64] {
        &self.coords[row * self.dimension..(row + 1) * self.dimension]
    }

    pub fn value(&self, row: usize) -> Option<f64> {
        self.values.get(row).copied()
    }
}

/// Reads every sample of `path`.
pub fn read_samples(path: &Path, layout: RowLayout) -> Result<SampleBatch> {
    let file = File::open(path)?;
    parse_samples(BufReader::new(file), layout)
}

/// Parses samples from any buffered reader.
pub fn parse_samples(reader: impl BufRead, layout: RowLayout) -> Result<SampleBatch> {
    let mut batch = SampleBatch {
        dimension: layout.dimension,
        ..SampleBatch::default()
    };
    let mut fields = Vec::with_capacity(layout.columns());

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        fields.clear();
        for token in trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            let value = token.parse::<f64>().map_err(|err| CliError::Parse {
                line: number,
                message: format!("'{token}': {err}"),
            })?;
            fields.push(value);
        }
        if fields.len() != layout.columns() {
            return Err(CliError::Parse {
                line: number,
                message: format!(
                    "expected {} fields, found {}",
                    layout.columns(),
                    fields.len()
                ),
            });
        }

        let (coords, rest) = fields.split_at(layout.dimension);
        batch.coords.extend_from_slice(coords);
        if layout.profile {
            batch.values.push(rest[0]);
        }
        batch
            .weights
            .push(if layout.weighted { rest[rest.len() - 1] } else { 1.0 });
        batch.lines.push(number);
    }

    Ok(batch)
}
