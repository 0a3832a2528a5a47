//! mtx2loom - single-cell count matrices to loom
//!
//! Converts a cells × features count matrix into a loom file laid out
//! features × cells, with one label array per axis (`rname` for features,
//! `cname` for cells).
//!
//! # Tools
//!
//! - `convert`: convert one Matrix Market, CSV, or EDS file
//! - `dataset`: convert `<base>/<name>/quants_mat.*.gz` in a benchmark directory
//! - `inspect`: summarise an existing loom file
//!
//! # Usage
//!
//! ```bash
//! # Matrix Market input, output written next to it as quants_mat.loom
//! mtx2loom convert --input data/pbmc/quants_mat.mtx.gz
//!
//! # CSV input whose cell-name column has the header "barcode"
//! mtx2loom convert --input counts.csv.gz --index-column barcode --output counts.loom
//!
//! # EDS input needs its dimensions
//! mtx2loom convert --input quants_mat.eds.gz --cells 900 --features 52325
//!
//! # Dataset directory convention
//! mtx2loom dataset pbmc4k --base-dir /data/benchmarks
//!
//! # Read a loom file back
//! mtx2loom inspect --input data/pbmc/quants_mat.loom
//! ```

extern crate mtx2loom_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use mtx2loom_lib::core::errors::is_broken_pipe;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Convert single-cell count matrices into loom files
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Convert a Matrix Market, CSV, or EDS matrix into a loom file
    Convert(commands::ConvertArgs),
    /// Convert the quants_mat matrix of a dataset directory
    Dataset(commands::DatasetArgs),
    /// Summarise a loom file
    Inspect(commands::InspectArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Convert(args) => commands::run_convert(args)?,
            Subcommand::Dataset(args) => commands::run_dataset(args)?,
            Subcommand::Inspect(args) => commands::run_inspect(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
