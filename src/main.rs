use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

use lorifier::{Config, transform};

fn main() -> Result<()> {
    // Logs go to stderr; stdout is the message the mail client displays
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Config::load();

    let mut raw = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut raw)
        .context("failed to read message from stdin")?;

    let output = transform(&raw, &config).context("failed to transform message")?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|_| stdout.flush())
        .context("failed to write message to stdout")?;

    Ok(())
}
