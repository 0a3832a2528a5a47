//! Matrix-to-loom conversion: load, transpose, label, write.

use crate::core::error::{LoomError, Result};
use crate::core::fs::make_parent_dirs;
use crate::core::sparse::SparseOps;
use crate::pipeline::labels::{AxisLabels, DEFAULT_COL_ATTR, DEFAULT_ROW_ATTR};
use crate::pipeline::loom::{write_loom, LoomOptions};
use crate::pipeline::source::csv::DEFAULT_INDEX_COLUMN;
use crate::pipeline::source::{
    CsvSource, EdsSource, MatrixMarketSource, MatrixSource, SourceFormat, SourceMatrix,
};
use log::{info, warn};
use nalgebra_sparse::CsrMatrix;
use std::path::PathBuf;

/// Everything a single conversion needs.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Input format; inferred from the input file name when `None`.
    pub format: Option<SourceFormat>,
    /// Header of the CSV bookkeeping index column.
    pub index_column: String,
    /// CSV field delimiter.
    pub delimiter: u8,
    /// Expected `(cells, features)`. Required for EDS, checked for Matrix Market.
    pub shape: Option<(usize, usize)>,
    pub row_attr: String,
    pub col_attr: String,
    pub loom: LoomOptions,
}

impl ConverterConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            format: None,
            index_column: DEFAULT_INDEX_COLUMN.to_string(),
            delimiter: b',',
            shape: None,
            row_attr: DEFAULT_ROW_ATTR.to_string(),
            col_attr: DEFAULT_COL_ATTR.to_string(),
            loom: LoomOptions::default(),
        }
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn resolved_format(&self) -> Result<SourceFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => SourceFormat::detect(&self.input),
        }
    }

    /// Check the configuration before any file is read.
    pub fn validate(&self) -> Result<()> {
        if self.input == self.output {
            return Err(LoomError::Config(format!(
                "output path {} would overwrite the input",
                self.output.display()
            )));
        }
        if self.row_attr.is_empty() || self.col_attr.is_empty() {
            return Err(LoomError::Config(
                "row and column attribute names must not be empty".to_string(),
            ));
        }
        if self.loom.compression > 9 {
            return Err(LoomError::Config(format!(
                "compression level must be 0-9, got {}",
                self.loom.compression
            )));
        }

        let format = self.resolved_format()?;
        if format == SourceFormat::Eds && self.shape.is_none() {
            return Err(LoomError::Config(
                "EDS input needs --cells and --features".to_string(),
            ));
        }
        if format != SourceFormat::Csv && self.index_column != DEFAULT_INDEX_COLUMN {
            warn!(
                "--index-column only applies to CSV input; ignoring {:?}",
                self.index_column
            );
        }
        if self
            .output
            .extension()
            .map_or(true, |ext| !ext.eq_ignore_ascii_case("loom"))
        {
            warn!(
                "Output path {} does not end in .loom",
                self.output.display()
            );
        }
        Ok(())
    }
}

/// Shape of a finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub n_features: usize,
    pub n_cells: usize,
    pub nnz: usize,
}

/// Converts one input matrix into one loom file.
pub struct MatrixToLoomConverter {
    config: ConverterConfig,
}

impl MatrixToLoomConverter {
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Pick the loader matching the configured format.
    pub fn source(&self) -> Result<Box<dyn MatrixSource>> {
        let config = &self.config;
        let source: Box<dyn MatrixSource> = match config.resolved_format()? {
            SourceFormat::MatrixMarket => Box::new(
                MatrixMarketSource::new(&config.input).with_expected_shape(config.shape),
            ),
            SourceFormat::Csv => Box::new(
                CsvSource::new(&config.input)
                    .with_index_column(config.index_column.clone())
                    .with_delimiter(config.delimiter),
            ),
            SourceFormat::Eds => {
                let (cells, features) = config.shape.ok_or_else(|| {
                    LoomError::Config("EDS input needs --cells and --features".to_string())
                })?;
                Box::new(EdsSource::new(&config.input, cells, features))
            }
        };
        Ok(source)
    }

    pub fn load_matrix(&self) -> Result<SourceMatrix> {
        let source = self.source()?;
        info!("Reading {} input {}", source.format(), self.config.input.display());
        let matrix = source.load()?;

        if matrix.n_cells() == 0 || matrix.n_features() == 0 {
            return Err(LoomError::EmptyData(format!(
                "{} has {} cells × {} features",
                self.config.input.display(),
                matrix.n_cells(),
                matrix.n_features()
            )));
        }
        Ok(matrix)
    }

    /// Reorient cells × features into features × cells.
    pub fn transpose(counts: &CsrMatrix<f32>) -> CsrMatrix<f32> {
        SparseOps::transpose(counts)
    }

    /// Build `(row labels, column labels)` for a features × cells matrix.
    pub fn build_labels(
        &self,
        matrix: &CsrMatrix<f32>,
        feature_names: Option<Vec<String>>,
        cell_names: Option<Vec<String>>,
    ) -> Result<(AxisLabels, AxisLabels)> {
        let rows = AxisLabels::names_or_range(&self.config.row_attr, feature_names, matrix.nrows());
        let cols = AxisLabels::names_or_range(&self.config.col_attr, cell_names, matrix.ncols());

        rows.ensure_len(matrix.nrows(), "row")?;
        cols.ensure_len(matrix.ncols(), "column")?;

        for labels in [&rows, &cols] {
            let duplicates = labels.duplicate_count();
            if duplicates > 0 {
                warn!(
                    "Attribute '{}' repeats {} names; loom keeps them as-is",
                    labels.name(),
                    duplicates
                );
            }
        }
        Ok((rows, cols))
    }

    pub fn write(
        &self,
        matrix: &CsrMatrix<f32>,
        rows: &AxisLabels,
        cols: &AxisLabels,
    ) -> Result<()> {
        make_parent_dirs(&self.config.output)?;
        write_loom(&self.config.output, matrix, rows, cols, &self.config.loom)
    }

    /// Load → transpose → label → write.
    pub fn run(&self) -> Result<ConversionSummary> {
        let SourceMatrix {
            counts,
            cell_names,
            feature_names,
        } = self.load_matrix()?;

        let matrix = Self::transpose(&counts);
        drop(counts);

        let (density, nnz, _) = SparseOps::get_density_stats(&matrix);
        info!(
            "Transposed to {} features × {} cells ({} non-zero, density {:.4}, {:.2} total counts)",
            matrix.nrows(),
            matrix.ncols(),
            nnz,
            density,
            SparseOps::total_counts(&matrix)
        );

        let (rows, cols) = self.build_labels(&matrix, feature_names, cell_names)?;
        self.write(&matrix, &rows, &cols)?;

        Ok(ConversionSummary {
            output: self.config.output.clone(),
            n_features: matrix.nrows(),
            n_cells: matrix.ncols(),
            nnz,
        })
    }
}

/// Convert with a one-off converter.
pub fn convert(config: ConverterConfig) -> Result<ConversionSummary> {
    MatrixToLoomConverter::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::labels::LabelValues;

    fn converter(format: SourceFormat) -> MatrixToLoomConverter {
        let mut config = ConverterConfig::new("in.data", "out.loom").with_format(format);
        config.shape = Some((3, 2));
        MatrixToLoomConverter::new(config).unwrap()
    }

    #[test]
    fn eds_without_shape_is_a_config_error() {
        let config = ConverterConfig::new("in.eds.gz", "out.loom");
        let err = MatrixToLoomConverter::new(config).err().unwrap();
        assert!(matches!(err, LoomError::Config(_)));
    }

    #[test]
    fn output_must_differ_from_input() {
        let config = ConverterConfig::new("same.mtx", "same.mtx");
        assert!(matches!(config.validate().unwrap_err(), LoomError::Config(_)));
    }

    #[test]
    fn unknown_input_extension_needs_format() {
        let config = ConverterConfig::new("counts.txt", "out.loom");
        assert!(matches!(
            config.validate().unwrap_err(),
            LoomError::InvalidInput(_)
        ));
    }

    #[test]
    fn synthesized_labels_follow_transposed_shape() {
        let converter = converter(SourceFormat::MatrixMarket);
        let counts = SparseOps::from_triplets(3, 2, vec![(0, 1, 1.0)]).unwrap();
        let matrix = MatrixToLoomConverter::transpose(&counts);

        let (rows, cols) = converter.build_labels(&matrix, None, None).unwrap();
        assert_eq!(rows.name(), "rname");
        assert_eq!(rows.values(), &LabelValues::Index(vec![0, 1]));
        assert_eq!(cols.name(), "cname");
        assert_eq!(cols.values(), &LabelValues::Index(vec![0, 1, 2]));
    }

    #[test]
    fn supplied_names_must_match_axis() {
        let converter = converter(SourceFormat::Csv);
        let matrix = CsrMatrix::<f32>::zeros(2, 3);
        let err = converter
            .build_labels(&matrix, Some(vec!["only-one".into()]), None)
            .unwrap_err();
        assert!(matches!(err, LoomError::DimensionMismatch { .. }));
    }

    #[test]
    fn duplicate_names_are_kept_in_order() {
        let converter = converter(SourceFormat::Csv);
        let matrix = CsrMatrix::<f32>::zeros(2, 3);
        let genes = vec!["MT-CO1".to_string(), "MT-CO1".to_string()];
        let cells = vec!["AAAC".to_string(), "AAAG".to_string(), "AAAC".to_string()];

        let (rows, cols) = converter
            .build_labels(&matrix, Some(genes.clone()), Some(cells.clone()))
            .unwrap();
        assert_eq!((rows.duplicate_count(), cols.duplicate_count()), (1, 1));
        assert_eq!(rows.values(), &LabelValues::Names(genes));
        assert_eq!(cols.values(), &LabelValues::Names(cells));
    }
}
