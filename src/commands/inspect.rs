use anyhow::{Context, Result};
use log::info;
use mtx2loom_lib::pipeline::read_loom;
use std::path::PathBuf;
use structopt::StructOpt;

/// Arguments for the `inspect` command.
#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "inspect", about = "Summarise a loom file")]
pub struct InspectArgs {
    /// Loom file to read.
    #[structopt(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Row attribute holding feature labels.
    #[structopt(long, default_value = "rname")]
    pub row_attr: String,

    /// Column attribute holding cell labels.
    #[structopt(long, default_value = "cname")]
    pub col_attr: String,

    /// Number of leading labels to show per axis.
    #[structopt(long, default_value = "5")]
    pub preview: usize,
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let loom = read_loom(&args.input, &args.row_attr, &args.col_attr)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let (features, cells) = loom.shape();
    info!("{}: {} features × {} cells", args.input.display(), features, cells);
    info!(
        "LOOM_SPEC_VERSION: {}",
        loom.spec_version.as_deref().unwrap_or("<missing>")
    );
    info!("Total counts: {:.2}", loom.matrix.iter().map(|&v| v as f64).sum::<f64>());
    info!(
        "{} (rows): {:?}",
        loom.row_labels.name(),
        loom.row_labels.preview(args.preview)
    );
    info!(
        "{} (columns): {:?}",
        loom.col_labels.name(),
        loom.col_labels.preview(args.preview)
    );
    Ok(())
}
