//! EDS reader.
//!
//! An EDS stream stores one record per cell: a bit-vector of
//! `ceil(features / 8)` bytes flagging the expressed features, followed by one
//! little-endian `f32` per set bit. Bit `128 >> i` of byte `k` flags feature
//! `8k + i`. The stream carries no dimensions, so both counts are required.

use crate::core::error::{LoomError, Result};
use crate::core::io::open_binary;
use crate::core::sparse::SparseOps;
use crate::pipeline::source::{MatrixSource, SourceFormat, SourceMatrix};
use log::info;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Loads a (possibly gzip-compressed) EDS file of known shape.
#[derive(Debug, Clone)]
pub struct EdsSource {
    path: PathBuf,
    num_cells: usize,
    num_features: usize,
}

impl EdsSource {
    pub fn new<P: AsRef<Path>>(path: P, num_cells: usize, num_features: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            num_cells,
            num_features,
        }
    }

    /// Decode an EDS byte stream.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<SourceMatrix> {
        let num_bit_vecs = (self.num_features + 7) / 8;
        let mut bit_vec = vec![0u8; num_bit_vecs];
        let mut triplets = Vec::new();
        let mut total_molecules = 0.0f64;

        for cell in 0..self.num_cells {
            read_record(&mut reader, &mut bit_vec, cell)?;

            let mut features = Vec::new();
            for (byte_id, &flag) in bit_vec.iter().enumerate() {
                for offset in 0..8 {
                    if flag & (128u8 >> offset) != 0 {
                        features.push(byte_id * 8 + offset);
                    }
                }
            }
            if let Some(&last) = features.last() {
                if last >= self.num_features {
                    return Err(LoomError::InvalidInput(format!(
                        "cell {} flags feature {} but only {} features exist",
                        cell, last, self.num_features
                    )));
                }
            }

            let mut expression = vec![0u8; 4 * features.len()];
            read_record(&mut reader, &mut expression, cell)?;

            for (feature, bytes) in features.into_iter().zip(expression.chunks_exact(4)) {
                let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                total_molecules += value as f64;
                triplets.push((cell, feature, value));
            }
        }

        let mut trailing = [0u8; 1];
        if reader.read(&mut trailing)? != 0 {
            return Err(LoomError::DimensionMismatch {
                expected: format!("{} cells", self.num_cells),
                actual: "trailing bytes after the last cell".to_string(),
            });
        }

        info!(
            "Found {} expressed entries and {:.2} molecules over {} cells",
            triplets.len(),
            total_molecules,
            self.num_cells
        );

        let counts = SparseOps::from_triplets(self.num_cells, self.num_features, triplets)?;
        Ok(SourceMatrix {
            counts,
            cell_names: None,
            feature_names: None,
        })
    }
}

impl MatrixSource for EdsSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Eds
    }

    fn load(&self) -> Result<SourceMatrix> {
        info!("Using {} as input EDS file", self.path.display());
        info!(
            "Using {} Rows (cells) and {} Columns (features)",
            self.num_cells, self.num_features
        );
        let reader = open_binary(&self.path)?;
        self.read_from(reader)
    }
}

fn read_record<R: Read>(reader: &mut R, buf: &mut [u8], cell: usize) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            LoomError::DimensionMismatch {
                expected: format!("record for cell {}", cell),
                actual: "end of stream".to_string(),
            }
        } else {
            LoomError::Io(err)
        }
    })
}
