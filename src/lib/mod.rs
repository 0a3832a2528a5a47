//! mtx2loom: count matrices to loom files
//!
//! The library loads single-cell count matrices (cells × features) from
//! Matrix Market, CSV, or EDS files, reorients them to the features × cells
//! layout loom expects, and writes them with one label array per axis.
//!
//! # Modules
//!
//! - [`core`]: errors, gzip-aware readers, filesystem and sparse-matrix helpers
//! - [`pipeline`]: input sources, label arrays, loom I/O and the converter

pub mod core;
pub mod pipeline;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::pipeline::{
        convert, read_loom, AxisLabels, ConversionSummary, ConverterConfig, LabelValues,
        LoomContents, LoomOptions, MatrixSource, MatrixToLoomConverter, SourceFormat,
        SourceMatrix,
    };
}
