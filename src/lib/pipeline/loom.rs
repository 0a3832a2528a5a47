//! Loom container I/O.
//!
//! Layout written (loompy 3 conventions):
//!
//! ```text
//! /matrix                 f32, features × cells, chunked + deflate
//! /row_attrs/<row attr>   one label per feature
//! /col_attrs/<col attr>   one label per cell
//! /layers /row_graphs /col_graphs /attrs   (empty)
//! @LOOM_SPEC_VERSION      "3.0.0"
//! ```
//!
//! Integer labels are stored as `i64`, names as variable-length UTF-8 strings.

use crate::core::error::{LoomError, Result};
use crate::core::sparse::SparseOps;
use crate::pipeline::labels::{AxisLabels, LabelValues};
use hdf5::types::{TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{File, Group};
use log::{debug, info};
use nalgebra_sparse::CsrMatrix;
use ndarray::Array2;
use std::fs::{self, Permissions};
use std::path::Path;

pub const LOOM_SPEC_VERSION: &str = "3.0.0";

const MATRIX: &str = "matrix";
const ROW_ATTRS: &str = "row_attrs";
const COL_ATTRS: &str = "col_attrs";
const EMPTY_GROUPS: [&str; 4] = ["layers", "row_graphs", "col_graphs", "attrs"];

/// Storage options for the `/matrix` dataset.
#[derive(Debug, Clone)]
pub struct LoomOptions {
    /// Deflate level 0-9; 0 disables compression.
    pub compression: u8,
    /// Upper bound of the chunk edge on both axes.
    pub chunk_size: usize,
}

impl Default for LoomOptions {
    fn default() -> Self {
        Self {
            compression: 2,
            chunk_size: 64,
        }
    }
}

/// Everything read back from a loom file.
#[derive(Debug, Clone)]
pub struct LoomContents {
    pub spec_version: Option<String>,
    pub matrix: Array2<f32>,
    pub row_labels: AxisLabels,
    pub col_labels: AxisLabels,
}

impl LoomContents {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.dim()
    }
}

/// Write `matrix` (features × cells) and its labels to a loom file at `path`.
///
/// The file is assembled under a temporary name in the destination directory
/// and renamed over `path` once complete, so an existing file is only replaced
/// by a fully written one.
pub fn write_loom(
    path: &Path,
    matrix: &CsrMatrix<f32>,
    row_labels: &AxisLabels,
    col_labels: &AxisLabels,
    options: &LoomOptions,
) -> Result<()> {
    let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
    if nrows == 0 || ncols == 0 {
        return Err(LoomError::EmptyData(format!(
            "refusing to write a {} × {} matrix",
            nrows, ncols
        )));
    }
    row_labels.ensure_len(nrows, "row")?;
    col_labels.ensure_len(ncols, "column")?;
    if options.compression > 9 {
        return Err(LoomError::Config(format!(
            "compression level must be 0-9, got {}",
            options.compression
        )));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let previous = fs::metadata(path).ok().map(|meta| meta.permissions());
    let mut builder = tempfile::Builder::new();
    builder.prefix(".mtx2loom-").suffix(".loom.tmp");
    if let Some(permissions) = default_permissions() {
        builder.permissions(permissions);
    }
    let staging = builder.tempfile_in(parent)?;
    debug!("Staging loom output at {}", staging.path().display());

    let file = File::create(staging.path())?;
    write_matrix(&file, matrix, options)?;

    let row_group = file.create_group(ROW_ATTRS)?;
    write_labels(&row_group, row_labels)?;
    let col_group = file.create_group(COL_ATTRS)?;
    write_labels(&col_group, col_labels)?;

    for name in EMPTY_GROUPS {
        file.create_group(name)?;
    }

    let version = to_unicode(LOOM_SPEC_VERSION)?;
    file.new_attr::<VarLenUnicode>()
        .create("LOOM_SPEC_VERSION")?
        .write_scalar(&version)?;

    drop(row_group);
    drop(col_group);
    file.close()?;

    if let Some(permissions) = previous {
        fs::set_permissions(staging.path(), permissions)?;
    }
    staging.persist(path).map_err(|err| LoomError::Io(err.error))?;
    info!("Wrote {} × {} loom matrix to {}", nrows, ncols, path.display());
    Ok(())
}

/// Mode for a fresh output file; the process umask still applies.
#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

fn write_matrix(file: &File, matrix: &CsrMatrix<f32>, options: &LoomOptions) -> Result<()> {
    let dense = SparseOps::to_dense(matrix);
    let edge = options.chunk_size.max(1);
    let chunk = (dense.nrows().min(edge), dense.ncols().min(edge));

    let builder = file.new_dataset_builder().with_data(&dense).chunk(chunk);
    if options.compression > 0 {
        builder
            .shuffle()
            .deflate(options.compression)
            .create(MATRIX)?;
    } else {
        builder.create(MATRIX)?;
    }
    Ok(())
}

fn write_labels(group: &Group, labels: &AxisLabels) -> Result<()> {
    match labels.values() {
        LabelValues::Index(values) => {
            group
                .new_dataset_builder()
                .with_data(values.as_slice())
                .create(labels.name())?;
        }
        LabelValues::Names(names) => {
            let encoded = names
                .iter()
                .map(|name| to_unicode(name))
                .collect::<Result<Vec<_>>>()?;
            group
                .new_dataset_builder()
                .with_data(encoded.as_slice())
                .create(labels.name())?;
        }
    }
    Ok(())
}

fn to_unicode(value: &str) -> Result<VarLenUnicode> {
    value.parse::<VarLenUnicode>().map_err(|err| {
        LoomError::InvalidInput(format!("label {:?} can't be stored: {}", value, err))
    })
}

/// Read a loom file back, including the named row and column attributes.
pub fn read_loom(path: &Path, row_attr: &str, col_attr: &str) -> Result<LoomContents> {
    if !path.exists() {
        return Err(LoomError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;

    let matrix = file.dataset(MATRIX)?.read_2d::<f32>()?;
    let row_labels = read_labels(&file.group(ROW_ATTRS)?, row_attr)?;
    let col_labels = read_labels(&file.group(COL_ATTRS)?, col_attr)?;
    let spec_version = file
        .attr("LOOM_SPEC_VERSION")
        .ok()
        .and_then(|attr| attr.read_scalar::<VarLenUnicode>().ok())
        .map(|value| value.as_str().to_string());

    Ok(LoomContents {
        spec_version,
        matrix,
        row_labels,
        col_labels,
    })
}

fn read_labels(group: &Group, name: &str) -> Result<AxisLabels> {
    let dataset = group.dataset(name)?;
    let values = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            LabelValues::Index(dataset.read_raw::<i64>()?)
        }
        TypeDescriptor::VarLenUnicode => LabelValues::Names(
            dataset
                .read_raw::<VarLenUnicode>()?
                .iter()
                .map(|value| value.as_str().to_string())
                .collect(),
        ),
        TypeDescriptor::VarLenAscii => LabelValues::Names(
            dataset
                .read_raw::<VarLenAscii>()?
                .iter()
                .map(|value| value.as_str().to_string())
                .collect(),
        ),
        other => {
            return Err(LoomError::InvalidInput(format!(
                "attribute '{}' has unsupported type {:?}",
                name, other
            )))
        }
    };
    Ok(AxisLabels::from_values(name, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::labels::{DEFAULT_COL_ATTR, DEFAULT_ROW_ATTR};
    use tempfile::tempdir;

    fn sample_matrix() -> CsrMatrix<f32> {
        SparseOps::from_triplets(2, 3, vec![(0, 0, 1.0), (1, 2, 4.0)]).unwrap()
    }

    #[test]
    fn writes_matrix_and_named_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("named.loom");
        let rows = AxisLabels::names(DEFAULT_ROW_ATTR, vec!["g1".into(), "g2".into()]);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default()).unwrap();

        let loaded = read_loom(&path, DEFAULT_ROW_ATTR, DEFAULT_COL_ATTR).unwrap();
        assert_eq!(loaded.shape(), (2, 3));
        assert_eq!(loaded.matrix[[1, 2]], 4.0);
        assert_eq!(loaded.matrix[[0, 1]], 0.0);
        assert_eq!(loaded.row_labels, rows);
        assert_eq!(loaded.col_labels, cols);
        assert_eq!(loaded.spec_version.as_deref(), Some(LOOM_SPEC_VERSION));
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn new_output_gets_regular_file_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.loom");
        let reference = dir.path().join("reference");
        fs::File::create(&reference).unwrap();
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 2);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default()).unwrap();

        assert_eq!(mode(&path), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("quants_mat.loom");
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 2);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default()).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();
        write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default()).unwrap();

        assert_eq!(mode(&path), 0o640);
        assert_eq!(read_loom(&path, DEFAULT_ROW_ATTR, DEFAULT_COL_ATTR).unwrap().shape(), (2, 3));
    }

    #[test]
    fn uncompressed_output_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.loom");
        let options = LoomOptions {
            compression: 0,
            chunk_size: 1,
        };
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 2);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        write_loom(&path, &sample_matrix(), &rows, &cols, &options).unwrap();
        let loaded = read_loom(&path, DEFAULT_ROW_ATTR, DEFAULT_COL_ATTR).unwrap();
        assert_eq!(loaded.matrix.sum(), 5.0);
    }

    #[test]
    fn label_length_mismatch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.loom");
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 3);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        let err = write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoomError::DimensionMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.loom");
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 0);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);

        let err = write_loom(
            &path,
            &CsrMatrix::zeros(0, 3),
            &rows,
            &cols,
            &LoomOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoomError::EmptyData(_)));
        assert!(!path.exists());
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attrs.loom");
        let rows = AxisLabels::range(DEFAULT_ROW_ATTR, 2);
        let cols = AxisLabels::range(DEFAULT_COL_ATTR, 3);
        write_loom(&path, &sample_matrix(), &rows, &cols, &LoomOptions::default()).unwrap();

        assert!(read_loom(&path, "Gene", DEFAULT_COL_ATTR).is_err());
    }
}
