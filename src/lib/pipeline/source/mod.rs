//! Input formats that can be converted into loom files.
//!
//! Each format implements [`MatrixSource`] and yields a [`SourceMatrix`]: the
//! canonical cells × features CSR matrix plus whatever cell and feature
//! identifiers the format carries. Format-specific layouts never leave this
//! module.
//!
//! - [`mtx`]: Matrix Market text
//! - [`csv`]: dense CSV tables with a bookkeeping index column
//! - [`eds`]: the EDS bit-vector format

pub mod csv;
pub mod eds;
pub mod mtx;

pub use self::csv::CsvSource;
pub use self::eds::EdsSource;
pub use self::mtx::MatrixMarketSource;

use crate::core::error::{LoomError, Result};
use crate::core::fs::is_gzipped;
use nalgebra_sparse::CsrMatrix;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A matrix as loaded from disk, before reorientation.
#[derive(Debug, Clone)]
pub struct SourceMatrix {
    /// Counts with one row per cell and one column per feature.
    pub counts: CsrMatrix<f32>,
    pub cell_names: Option<Vec<String>>,
    pub feature_names: Option<Vec<String>>,
}

impl SourceMatrix {
    pub fn n_cells(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.counts.ncols()
    }
}

/// Loads one on-disk matrix format.
pub trait MatrixSource {
    fn format(&self) -> SourceFormat;

    fn load(&self) -> Result<SourceMatrix>;
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    MatrixMarket,
    Csv,
    Eds,
}

impl SourceFormat {
    /// Infer the format from a file name such as `quants_mat.mtx.gz`.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = if is_gzipped(path) {
            path.file_stem()
        } else {
            path.file_name()
        };
        let name = name
            .and_then(|n| n.to_str())
            .map(|n| n.to_ascii_lowercase())
            .unwrap_or_default();

        let matches: Vec<SourceFormat> = [
            SourceFormat::MatrixMarket,
            SourceFormat::Csv,
            SourceFormat::Eds,
        ]
        .into_iter()
        .filter(|format| name.ends_with(format.extension()))
        .collect();

        match matches.as_slice() {
            [format] => Ok(*format),
            _ => Err(LoomError::InvalidInput(format!(
                "can't infer input format of {}; pass --format mtx|csv|eds",
                path.display()
            ))),
        }
    }

    /// File extension without compression suffix.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::MatrixMarket => ".mtx",
            SourceFormat::Csv => ".csv",
            SourceFormat::Eds => ".eds",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mtx" | "matrixmarket" | "matrix-market" => Ok(SourceFormat::MatrixMarket),
            "csv" => Ok(SourceFormat::Csv),
            "eds" => Ok(SourceFormat::Eds),
            other => Err(format!(
                "Unknown input format '{}'. Expected one of: mtx, csv, eds",
                other
            )),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::MatrixMarket => "mtx",
            SourceFormat::Csv => "csv",
            SourceFormat::Eds => "eds",
        };
        f.write_str(name)
    }
}
