//! Dense CSV reader.
//!
//! The table is cells × features. The header names the features and one
//! bookkeeping index column holds the cell names; that column must be present
//! under the configured name and is removed from the numeric block.

use crate::core::error::{LoomError, Result};
use crate::core::io::open_input;
use crate::core::sparse::SparseOps;
use crate::pipeline::source::{MatrixSource, SourceFormat, SourceMatrix};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Header of the index column written by pandas and R for an unnamed index.
pub const DEFAULT_INDEX_COLUMN: &str = "";

/// Loads a (possibly gzip-compressed) CSV count table.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    index_column: String,
    delimiter: u8,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            index_column: DEFAULT_INDEX_COLUMN.to_string(),
            delimiter: b',',
        }
    }

    pub fn with_index_column(mut self, name: impl Into<String>) -> Self {
        self.index_column = name.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a CSV table from any reader.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<SourceMatrix> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let index_pos = headers
            .iter()
            .position(|h| h == self.index_column)
            .ok_or_else(|| {
                LoomError::InvalidInput(format!(
                    "CSV header has no bookkeeping index column named {:?}",
                    self.index_column
                ))
            })?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(pos, _)| pos != index_pos)
            .map(|(_, name)| name.to_string())
            .collect();
        let n_features = feature_names.len();

        let mut cell_names = Vec::new();
        let mut triplets = Vec::new();

        for result in reader.records() {
            let record = result?;
            let line_no = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or_default();
            let cell = cell_names.len();

            let mut feature = 0usize;
            for (pos, field) in record.iter().enumerate() {
                if pos == index_pos {
                    cell_names.push(field.to_string());
                    continue;
                }
                let value: f32 = field.trim().parse().map_err(|_| {
                    LoomError::parse(
                        line_no,
                        format!("invalid value {:?} in column {:?}", field, &headers[pos]),
                    )
                })?;
                if value != 0.0 {
                    triplets.push((cell, feature, value));
                }
                feature += 1;
            }
        }

        info!(
            "Found {} cells × {} features in CSV table (dropped index column {:?})",
            cell_names.len(),
            n_features,
            self.index_column
        );

        let counts = SparseOps::from_triplets(cell_names.len(), n_features, triplets)?;
        Ok(SourceMatrix {
            counts,
            cell_names: Some(cell_names),
            feature_names: Some(feature_names),
        })
    }
}

impl MatrixSource for CsvSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn load(&self) -> Result<SourceMatrix> {
        info!("Using {} as input CSV file", self.path.display());
        let reader = open_input(&self.path)?;
        self.read_from(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(source: &CsvSource, text: &str) -> Result<SourceMatrix> {
        source.read_from(Cursor::new(text.to_string()))
    }

    #[test]
    fn drops_index_column_and_keeps_names() {
        let text = "\"\",gene1,gene2,gene3\ncell1,0,2,0\ncell2,1.5,0,3\n";
        let matrix = load(&CsvSource::new("inline.csv"), text).unwrap();

        assert_eq!((matrix.n_cells(), matrix.n_features()), (2, 3));
        assert_eq!(
            matrix.feature_names.as_deref(),
            Some(&["gene1".to_string(), "gene2".into(), "gene3".into()][..])
        );
        assert_eq!(
            matrix.cell_names.as_deref(),
            Some(&["cell1".to_string(), "cell2".into()][..])
        );
        let entries: Vec<_> = matrix
            .counts
            .triplet_iter()
            .map(|(r, c, v)| (r, c, *v))
            .collect();
        assert_eq!(entries, vec![(0, 1, 2.0), (1, 0, 1.5), (1, 2, 3.0)]);
    }

    #[test]
    fn named_index_column_may_sit_anywhere() {
        let source = CsvSource::new("inline.tsv")
            .with_index_column("barcode")
            .with_delimiter(b'\t');
        let text = "g1\tbarcode\tg2\n4\tAAAC\t0\n";
        let matrix = load(&source, text).unwrap();
        assert_eq!(
            matrix.feature_names,
            Some(vec!["g1".to_string(), "g2".to_string()])
        );
        assert_eq!(matrix.cell_names, Some(vec!["AAAC".to_string()]));
    }

    #[test]
    fn missing_index_column_is_a_precondition_failure() {
        let text = "gene1,gene2\n1,2\n";
        let err = load(&CsvSource::new("inline.csv"), text).unwrap_err();
        assert!(matches!(err, LoomError::InvalidInput(ref msg) if msg.contains("index column")));
    }

    #[test]
    fn non_numeric_value_reports_line() {
        let text = ",g1\nc1,1\nc2,abc\n";
        let err = load(&CsvSource::new("inline.csv"), text).unwrap_err();
        assert!(matches!(err, LoomError::Parse { line: 3, .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = ",g1,g2\nc1,1\n";
        let err = load(&CsvSource::new("inline.csv"), text).unwrap_err();
        assert!(matches!(err, LoomError::Csv(_)));
    }
}
