//! Dataset-directory conversion.
//!
//! Benchmark datasets live in `<base>/<name>/` and hold a single
//! `quants_mat.<format>.gz` matrix. The loom file is written next to it as
//! `<base>/<name>/quants_mat.loom`.

use anyhow::{Context, Result};
use log::info;
use mtx2loom_lib::pipeline::{ConverterConfig, MatrixToLoomConverter, SourceFormat};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use crate::commands::common::LOOM_EXTENSION;

/// File stem shared by every matrix in a dataset directory.
pub const MATRIX_STEM: &str = "quants_mat";

/// Arguments for the `dataset` command.
#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "dataset", about = "Convert <base>/<name>/quants_mat.*.gz into quants_mat.loom")]
pub struct DatasetArgs {
    /// Dataset name; the directory under `--base-dir`.
    pub name: String,

    /// Directory holding the dataset directories.
    #[structopt(long, short = "b", parse(from_os_str), default_value = ".")]
    pub base_dir: PathBuf,

    /// Input format, one of mtx, csv, eds.
    #[structopt(long, default_value = "mtx")]
    pub format: SourceFormat,

    /// Number of cells (required for eds).
    #[structopt(long, short = "c", requires = "features")]
    pub cells: Option<usize>,

    /// Number of features (required for eds).
    #[structopt(long, short = "f", requires = "cells")]
    pub features: Option<usize>,
}

/// Input and output paths for dataset `name` under `base`.
pub fn dataset_paths(base: &Path, name: &str, format: SourceFormat) -> (PathBuf, PathBuf) {
    let dir = base.join(name);
    let input = dir.join(format!("{}{}.gz", MATRIX_STEM, format.extension()));
    let output = dir.join(format!("{}{}", MATRIX_STEM, LOOM_EXTENSION));
    (input, output)
}

/// Execute the `dataset` command.
pub fn run_dataset(args: DatasetArgs) -> Result<()> {
    let (input, output) = dataset_paths(&args.base_dir, &args.name, args.format);
    info!("Converting dataset '{}': {:?} -> {:?}", args.name, input, output);

    let mut config = ConverterConfig::new(&input, &output).with_format(args.format);
    config.shape = args.cells.zip(args.features);

    let summary = MatrixToLoomConverter::new(config)
        .and_then(|converter| converter.run())
        .with_context(|| format!("Failed to convert dataset '{}'", args.name))?;

    info!(
        "Dataset '{}' done: {} features × {} cells",
        args.name, summary.n_features, summary.n_cells
    );
    Ok(())
}
