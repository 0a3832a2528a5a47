use crate::core::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// File-name suffixes recognised as matrix inputs, longest first so that
/// `.mtx.gz` wins over `.gz`.
pub const INPUT_SUFFIXES: &[&str] = &[
    ".mtx.gz", ".csv.gz", ".eds.gz", ".mtx", ".csv", ".eds",
];

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

/// Replace a recognised input suffix with `extension`.
///
/// `data/pbmc/quants_mat.mtx.gz` becomes `data/pbmc/quants_mat.loom`. Paths
/// without a recognised suffix get `extension` appended to the full file name.
pub fn with_output_extension<P: AsRef<Path>>(path: P, extension: &str) -> PathBuf {
    let path = path.as_ref();
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return path.with_extension(extension.trim_start_matches('.')),
    };

    let lowered = name.to_ascii_lowercase();
    let stem = INPUT_SUFFIXES
        .iter()
        .find(|suffix| lowered.ends_with(*suffix) && lowered.len() > suffix.len())
        .map(|suffix| &name[..name.len() - suffix.len()])
        .unwrap_or(name);

    path.with_file_name(format!("{}{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_compressed_matrix_market_suffix() {
        let out = with_output_extension("data/pbmc/quants_mat.mtx.gz", ".loom");
        assert_eq!(out, PathBuf::from("data/pbmc/quants_mat.loom"));
    }

    #[test]
    fn replaces_plain_csv_suffix_case_insensitively() {
        let out = with_output_extension("counts.CSV", ".loom");
        assert_eq!(out, PathBuf::from("counts.loom"));
    }

    #[test]
    fn appends_when_suffix_is_unknown() {
        let out = with_output_extension("matrix.txt", ".loom");
        assert_eq!(out, PathBuf::from("matrix.txt.loom"));
    }

    #[test]
    fn recognises_gzip_extensions() {
        assert!(is_gzipped("a/b.mtx.gz"));
        assert!(!is_gzipped("a/b.mtx"));
    }
}
