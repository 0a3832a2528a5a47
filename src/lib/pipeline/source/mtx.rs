//! Matrix Market reader.
//!
//! Rows of the file are cells and columns are features. Supported headers:
//!
//! - `%%MatrixMarket matrix coordinate {real|integer|pattern} {general|symmetric|skew-symmetric}`
//! - `%%MatrixMarket matrix array {real|integer} general`
//!
//! Indices are 1-based. Duplicate coordinates are summed and `pattern`
//! entries count as 1.

use crate::core::error::{LoomError, Result};
use crate::core::io::open_input;
use crate::core::sparse::SparseOps;
use crate::pipeline::source::{MatrixSource, SourceFormat, SourceMatrix};
use log::{debug, info};
use std::io::BufRead;
use std::path::{Path, PathBuf};

const BANNER: &str = "%%matrixmarket";
const MAX_RESERVE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Coordinate,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Real,
    Integer,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    layout: Layout,
    field: Field,
    symmetry: Symmetry,
}

impl Header {
    fn parse(line: &str, line_no: usize) -> Result<Self> {
        let lowered = line.trim().to_ascii_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        if tokens.first() != Some(&BANNER) {
            return Err(LoomError::parse(
                line_no,
                "missing %%MatrixMarket banner",
            ));
        }
        if tokens.len() != 5 {
            return Err(LoomError::parse(
                line_no,
                format!("expected 5 banner fields, found {}", tokens.len()),
            ));
        }
        if tokens[1] != "matrix" {
            return Err(LoomError::parse(
                line_no,
                format!("unsupported object '{}'", tokens[1]),
            ));
        }

        let layout = match tokens[2] {
            "coordinate" => Layout::Coordinate,
            "array" => Layout::Array,
            other => {
                return Err(LoomError::parse(
                    line_no,
                    format!("unsupported format '{}'", other),
                ))
            }
        };
        let field = match tokens[3] {
            "real" | "double" => Field::Real,
            "integer" => Field::Integer,
            "pattern" => Field::Pattern,
            other => {
                return Err(LoomError::parse(
                    line_no,
                    format!("unsupported field '{}'", other),
                ))
            }
        };
        let symmetry = match tokens[4] {
            "general" => Symmetry::General,
            "symmetric" => Symmetry::Symmetric,
            "skew-symmetric" => Symmetry::SkewSymmetric,
            other => {
                return Err(LoomError::parse(
                    line_no,
                    format!("unsupported symmetry '{}'", other),
                ))
            }
        };

        if layout == Layout::Array && (field == Field::Pattern || symmetry != Symmetry::General) {
            return Err(LoomError::parse(
                line_no,
                "array matrices must be real or integer and general",
            ));
        }

        Ok(Self {
            layout,
            field,
            symmetry,
        })
    }
}

/// Loads a (possibly gzip-compressed) Matrix Market file.
#[derive(Debug, Clone)]
pub struct MatrixMarketSource {
    path: PathBuf,
    expected_shape: Option<(usize, usize)>,
}

impl MatrixMarketSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            expected_shape: None,
        }
    }

    /// Require the size line to declare exactly `(cells, features)`.
    pub fn with_expected_shape(mut self, shape: Option<(usize, usize)>) -> Self {
        self.expected_shape = shape;
        self
    }

    /// Parse Matrix Market text from any buffered reader.
    pub fn read_from<R: BufRead>(&self, reader: R) -> Result<SourceMatrix> {
        let mut lines = reader.lines().enumerate().map(|(idx, line)| (idx + 1, line));

        let header = match lines.next() {
            Some((line_no, line)) => Header::parse(&line?, line_no)?,
            None => return Err(LoomError::EmptyData("Matrix Market input is empty".into())),
        };
        debug!("Matrix Market header: {:?}", header);

        let mut size: Option<(usize, usize, usize)> = None;
        let mut triplets: Vec<(usize, usize, f32)> = Vec::new();
        let mut seen = 0usize;

        for (line_no, line) in lines {
            let line = line?;
            let record = line.trim();
            if record.is_empty() || record.starts_with('%') {
                continue;
            }
            let fields: Vec<&str> = record.split_whitespace().collect();

            let (nrows, ncols, expected) = match size {
                Some(size) => size,
                None => {
                    let parsed = parse_size_line(&fields, header.layout, line_no)?;
                    self.check_expected_shape(parsed.0, parsed.1)?;
                    triplets.reserve(reserve_hint(parsed));
                    size = Some(parsed);
                    continue;
                }
            };

            if seen == expected {
                return Err(LoomError::parse(
                    line_no,
                    format!("more than the declared {} entries", expected),
                ));
            }

            match header.layout {
                Layout::Coordinate => {
                    let (row, col, value) =
                        parse_coordinate_entry(&fields, header.field, nrows, ncols, line_no)?;
                    triplets.push((row, col, value));
                    if row != col {
                        match header.symmetry {
                            Symmetry::General => {}
                            Symmetry::Symmetric => triplets.push((col, row, value)),
                            Symmetry::SkewSymmetric => triplets.push((col, row, -value)),
                        }
                    }
                }
                Layout::Array => {
                    if fields.len() != 1 {
                        return Err(LoomError::parse(
                            line_no,
                            format!("expected 1 value, found {}", fields.len()),
                        ));
                    }
                    // Column-major order.
                    let row = seen % nrows;
                    let col = seen / nrows;
                    triplets.push((row, col, parse_value(fields[0], line_no)?));
                }
            }
            seen += 1;
        }

        let (nrows, ncols, expected) = size.ok_or_else(|| {
            LoomError::EmptyData("Matrix Market input has no size line".to_string())
        })?;
        if seen != expected {
            return Err(LoomError::DimensionMismatch {
                expected: format!("{} entries", expected),
                actual: format!("{} entries", seen),
            });
        }

        let counts = SparseOps::from_triplets(nrows, ncols, triplets)?;
        info!(
            "Found {} cells × {} features with {} stored entries",
            nrows,
            ncols,
            counts.nnz()
        );

        Ok(SourceMatrix {
            counts,
            cell_names: None,
            feature_names: None,
        })
    }

    fn check_expected_shape(&self, nrows: usize, ncols: usize) -> Result<()> {
        match self.expected_shape {
            Some((cells, features)) if (cells, features) != (nrows, ncols) => {
                Err(LoomError::DimensionMismatch {
                    expected: format!("{} cells × {} features", cells, features),
                    actual: format!("{} × {}", nrows, ncols),
                })
            }
            _ => Ok(()),
        }
    }
}

impl MatrixSource for MatrixMarketSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::MatrixMarket
    }

    fn load(&self) -> Result<SourceMatrix> {
        info!("Using {} as input MTX file", self.path.display());
        let reader = open_input(&self.path)?;
        self.read_from(reader)
    }
}

fn parse_size_line(
    fields: &[&str],
    layout: Layout,
    line_no: usize,
) -> Result<(usize, usize, usize)> {
    let wanted = match layout {
        Layout::Coordinate => 3,
        Layout::Array => 2,
    };
    if fields.len() != wanted {
        return Err(LoomError::parse(
            line_no,
            format!("size line needs {} fields, found {}", wanted, fields.len()),
        ));
    }

    let mut dims = [0usize; 3];
    for (slot, field) in dims.iter_mut().zip(fields) {
        *slot = field
            .parse()
            .map_err(|_| LoomError::parse(line_no, format!("invalid dimension '{}'", field)))?;
    }

    match layout {
        Layout::Coordinate => Ok((dims[0], dims[1], dims[2])),
        Layout::Array => {
            let entries = dims[0].checked_mul(dims[1]).ok_or_else(|| {
                LoomError::parse(
                    line_no,
                    format!("array of {} × {} entries is too large", dims[0], dims[1]),
                )
            })?;
            Ok((dims[0], dims[1], entries))
        }
    }
}

/// Entry counts come from the file, so never trust them for allocation.
fn reserve_hint((nrows, ncols, entries): (usize, usize, usize)) -> usize {
    entries.min(nrows.saturating_mul(ncols)).min(MAX_RESERVE)
}

fn parse_coordinate_entry(
    fields: &[&str],
    field: Field,
    nrows: usize,
    ncols: usize,
    line_no: usize,
) -> Result<(usize, usize, f32)> {
    let wanted = if field == Field::Pattern { 2 } else { 3 };
    if fields.len() != wanted {
        return Err(LoomError::parse(
            line_no,
            format!("expected {} fields, found {}", wanted, fields.len()),
        ));
    }

    let row = parse_index(fields[0], nrows, line_no)?;
    let col = parse_index(fields[1], ncols, line_no)?;
    let value = match field {
        Field::Pattern => 1.0,
        Field::Real | Field::Integer => parse_value(fields[2], line_no)?,
    };
    Ok((row, col, value))
}

fn parse_index(token: &str, bound: usize, line_no: usize) -> Result<usize> {
    let index: usize = token
        .parse()
        .map_err(|_| LoomError::parse(line_no, format!("invalid index '{}'", token)))?;
    if index == 0 || index > bound {
        return Err(LoomError::parse(
            line_no,
            format!("index {} outside 1..={}", index, bound),
        ));
    }
    Ok(index - 1)
}

fn parse_value(token: &str, line_no: usize) -> Result<f32> {
    token
        .parse::<f32>()
        .map_err(|_| LoomError::parse(line_no, format!("invalid value '{}'", token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(text: &str) -> Result<SourceMatrix> {
        MatrixMarketSource::new("inline.mtx").read_from(Cursor::new(text.to_string()))
    }

    fn entries(matrix: &SourceMatrix) -> Vec<(usize, usize, f32)> {
        matrix
            .counts
            .triplet_iter()
            .map(|(r, c, v)| (r, c, *v))
            .collect()
    }

    #[test]
    fn parses_tab_separated_coordinate_file() {
        let text = "%%MatrixMarket\tmatrix\tcoordinate\treal\tgeneral\n\
                    % written by alevin\n\
                    3\t2\t3\n\
                    1\t1\t2.5\n\
                    2\t2\t1\n\
                    3\t1\t4\n";
        let matrix = load(text).unwrap();
        assert_eq!((matrix.n_cells(), matrix.n_features()), (3, 2));
        assert_eq!(entries(&matrix), vec![(0, 0, 2.5), (1, 1, 1.0), (2, 0, 4.0)]);
        assert!(matrix.cell_names.is_none());
    }

    #[test]
    fn pattern_entries_count_as_one() {
        let text = "%%MatrixMarket matrix coordinate pattern general\n2 2 2\n1 2\n2 1\n";
        let matrix = load(text).unwrap();
        assert_eq!(entries(&matrix), vec![(0, 1, 1.0), (1, 0, 1.0)]);
    }

    #[test]
    fn symmetric_entries_are_mirrored() {
        let text = "%%MatrixMarket matrix coordinate integer symmetric\n3 3 2\n2 1 5\n3 3 1\n";
        let matrix = load(text).unwrap();
        assert_eq!(
            entries(&matrix),
            vec![(0, 1, 5.0), (1, 0, 5.0), (2, 2, 1.0)]
        );
    }

    #[test]
    fn array_layout_is_column_major() {
        let text = "%%MatrixMarket matrix array real general\n2 2\n1\n2\n3\n0\n";
        let matrix = load(text).unwrap();
        assert_eq!(entries(&matrix), vec![(0, 0, 1.0), (0, 1, 3.0), (1, 0, 2.0)]);
    }

    #[test]
    fn absurd_entry_count_is_reported_not_allocated() {
        let text = "%%MatrixMarket matrix coordinate real general\n3 2 18446744073709551615\n1 1 1\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoomError::DimensionMismatch { .. }));
        assert_eq!(reserve_hint((3, 2, usize::MAX)), 6);
        assert_eq!(reserve_hint((usize::MAX, usize::MAX, usize::MAX)), MAX_RESERVE);
    }

    #[test]
    fn overflowing_array_size_is_a_parse_error() {
        let text = "%%MatrixMarket matrix array real general\n18446744073709551615 2\n1\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoomError::Parse { line: 2, .. }));
    }

    #[test]
    fn out_of_range_index_is_a_parse_error() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 1.0\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, LoomError::Parse { line: 3, .. }));
    }

    #[test]
    fn entry_count_must_match_size_line() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 1.0\n";
        assert!(matches!(
            load(text).unwrap_err(),
            LoomError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn missing_banner_is_rejected() {
        let err = load("2 2 0\n").unwrap_err();
        assert!(matches!(err, LoomError::Parse { line: 1, .. }));
    }

    #[test]
    fn expected_shape_is_enforced() {
        let source =
            MatrixMarketSource::new("inline.mtx").with_expected_shape(Some((4, 2)));
        let text = "%%MatrixMarket matrix coordinate real general\n3 2 0\n";
        let err = source.read_from(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, LoomError::DimensionMismatch { .. }));
    }
}
