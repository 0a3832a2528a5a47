use anyhow::{bail, Result};
use mtx2loom_lib::core::fs::with_output_extension;
use std::path::{Path, PathBuf};

/// Extension of every file this tool writes.
pub const LOOM_EXTENSION: &str = ".loom";

/// Use `output` when given, otherwise derive `<input stem>.loom` next to the input.
///
/// `quants_mat.mtx.gz` and `quants_mat.csv` both map to `quants_mat.loom`.
pub fn resolve_output(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => with_output_extension(input, LOOM_EXTENSION),
    }
}

/// Validate a CSV delimiter supplied on the command line.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("CSV delimiter must be a single ASCII character, got {:?}", delimiter);
    }
    Ok(delimiter as u8)
}
