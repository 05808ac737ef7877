use anyhow::Result;
use clap::Parser;
use medit_streak::{
    cli::{run_cli, Args},
    utils::{
        dir::{create_application_default_path, create_application_path},
        logging::{enable_logging, CLI_PREFIX},
        runtime::single_thread_runtime,
    },
};
use tracing::{error, warn};

fn main() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, create_application_path);

    let log_dir = app_dir.as_ref().ok().map(|dir| dir.join("logs"));
    enable_logging(CLI_PREFIX, log_dir.as_deref(), args.log, args.log_console)?;

    let app_dir = app_dir
        .inspect_err(|e| warn!("No application directory, records won't be kept {e:?}"))
        .ok();

    let runtime = single_thread_runtime()?;
    let result = runtime
        .block_on(run_cli(args, app_dir))
        .inspect_err(|e| error!("Error running cli {e:?}"));
    // Stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    result
}
