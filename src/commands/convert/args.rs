use anyhow::Result;
use mtx2loom_lib::pipeline::{ConverterConfig, LoomOptions, SourceFormat};
use std::path::PathBuf;
use structopt::StructOpt;

use crate::commands::common;

/// Arguments for the `convert` command.
#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "convert", about = "Convert a count matrix into a loom file")]
pub struct ConvertArgs {
    /// Input matrix (.mtx[.gz], .csv[.gz] or .eds[.gz]), cells as rows.
    #[structopt(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Output loom path. Defaults to the input with its format extension replaced by `.loom`.
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Input format, one of mtx, csv, eds. Inferred from the file name when omitted.
    #[structopt(long)]
    pub format: Option<SourceFormat>,

    /// Header of the CSV bookkeeping index column holding cell names (default: empty header).
    #[structopt(long)]
    pub index_column: Option<String>,

    /// CSV field delimiter.
    #[structopt(long, default_value = ",")]
    pub delimiter: char,

    /// Number of cells. Required for EDS, checked against Matrix Market headers.
    #[structopt(long, short = "c", requires = "features")]
    pub cells: Option<usize>,

    /// Number of features. Required for EDS, checked against Matrix Market headers.
    #[structopt(long, short = "f", requires = "cells")]
    pub features: Option<usize>,

    /// Row attribute name for feature labels.
    #[structopt(long, default_value = "rname")]
    pub row_attr: String,

    /// Column attribute name for cell labels.
    #[structopt(long, default_value = "cname")]
    pub col_attr: String,

    /// Deflate level for the loom matrix (0 disables compression).
    #[structopt(long, default_value = "2")]
    pub compression: u8,

    /// Maximum chunk edge of the loom matrix.
    #[structopt(long, default_value = "64")]
    pub chunk_size: usize,

    /// Dry run - validate arguments without converting.
    #[structopt(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Output path after applying the default derivation.
    pub fn output_path(&self) -> PathBuf {
        common::resolve_output(&self.input, self.output.as_deref())
    }

    pub fn to_config(&self) -> Result<ConverterConfig> {
        let mut config = ConverterConfig::new(&self.input, self.output_path());
        config.format = self.format;
        if let Some(index_column) = &self.index_column {
            config.index_column = index_column.clone();
        }
        config.delimiter = common::delimiter_byte(self.delimiter)?;
        config.shape = self.cells.zip(self.features);
        config.row_attr = self.row_attr.clone();
        config.col_attr = self.col_attr.clone();
        config.loom = LoomOptions {
            compression: self.compression,
            chunk_size: self.chunk_size,
        };
        Ok(config)
    }
}
