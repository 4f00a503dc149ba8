pub mod cli;
pub mod core;
pub mod notion;

use tracing_subscriber::EnvFilter;

/// Initialize logging
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` when verbose.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
