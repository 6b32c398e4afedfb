use anyhow::Result;
use sidekick::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli());
    // Reading stdin blocks a thread that can't be interrupted, don't wait for it.
    runtime.shutdown_background();

    result.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })
}
