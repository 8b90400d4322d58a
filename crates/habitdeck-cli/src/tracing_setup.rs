//! Console tracing for the CLI.
//!
//!   habitdeck --debug ...               # Debug logging
//!   RUST_LOG=habitdeck_core=trace ...   # Fine-grained log control
//!
//! Logs go to stderr so stdout stays one JSON document per line.

use tracing_subscriber::EnvFilter;

pub fn init_tracing(debug: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(Into::into)
}
