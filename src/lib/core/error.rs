//! Error types for the mtx2loom library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sparse matrix error: {0}")]
    SparseMatrix(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty data: {0}")]
    EmptyData(String),
}

pub type Result<T> = std::result::Result<T, LoomError>;

impl LoomError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LoomError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<nalgebra_sparse::SparseFormatError> for LoomError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        LoomError::SparseMatrix(format!("Sparse format error: {:?}", err))
    }
}

impl From<ndarray::ShapeError> for LoomError {
    fn from(err: ndarray::ShapeError) -> Self {
        LoomError::DimensionMismatch {
            expected: "dense buffer matching matrix shape".to_string(),
            actual: err.to_string(),
        }
    }
}
