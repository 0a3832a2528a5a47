//! Conversion pipeline from count matrices to loom files
//!
//! # Key Components
//!
//! - [`source`]: input loaders behind the [`source::MatrixSource`] trait
//! - [`labels`]: row and column label arrays
//! - [`loom`]: loom container writer and reader
//! - [`converter`]: configuration and the load → transpose → label → write flow

pub mod converter;
pub mod labels;
pub mod loom;
pub mod source;


pub use converter::{convert, ConversionSummary, ConverterConfig, MatrixToLoomConverter};
pub use labels::{AxisLabels, LabelValues};
pub use loom::{read_loom, write_loom, LoomContents, LoomOptions};
pub use source::{MatrixSource, SourceFormat, SourceMatrix};
