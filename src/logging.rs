use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber writing to stderr.
///
/// stdout stays reserved for command output and the countdown line.
pub fn init_logging() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    Ok(())
}
