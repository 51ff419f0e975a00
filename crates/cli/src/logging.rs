use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr and to `log_file`, truncating the file from any previous run.
///
/// Stdout is left to the report. `RUST_LOG` overrides the default `info` level.
pub fn init(log_file: &Path) -> Result<()> {
    let file = create_log_file(log_file)?;
    subscriber(file, std::io::stderr)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn create_log_file(log_file: &Path) -> Result<File> {
    if let Some(dir) = log_file.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))
}

/// Console layer on `console`, plain-text layer on `file`
fn subscriber<W>(file: File, console: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console)
        .with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}
