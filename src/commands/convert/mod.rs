mod args;

use anyhow::{Context, Result};
use log::{error, info};
use mtx2loom_lib::pipeline::MatrixToLoomConverter;

pub use args::ConvertArgs;

/// Execute the `convert` command end-to-end.
pub fn run_convert(args: ConvertArgs) -> Result<()> {
    info!("Starting mtx2loom convert");
    info!("Arguments: {:?}", args);

    let config = args.to_config()?;
    let converter = MatrixToLoomConverter::new(config).context("Invalid conversion settings")?;

    if args.dry_run {
        let config = converter.config();
        info!(
            "Would convert {} ({}) -> {}",
            config.input.display(),
            config.resolved_format()?,
            config.output.display()
        );
        info!("Dry run completed successfully - all validations passed");
        return Ok(());
    }

    match converter.run() {
        Ok(summary) => {
            info!(
                "Conversion complete: {} features × {} cells -> {}",
                summary.n_features,
                summary.n_cells,
                summary.output.display()
            );
            Ok(())
        }
        Err(err) => {
            error!("Conversion of {} failed", args.input.display());
            Err(err.into())
        }
    }
}
