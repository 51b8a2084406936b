use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the republisher.
///
/// Output always goes to stdout; when `log_file` is set, the same lines are
/// appended to that file as well.
pub fn init(service_name: &str, log_file: Option<&Path>) -> Result<()> {
    // Default: info for our crates. Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,tgwp_core=info,tgwp_telegram=info,tgwp_wordpress=info,{service_name}=info"
        ))
    });

    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::io::stdout.and(Mutex::new(file)))
                .try_init()
        }
        None => builder.with_ansi(true).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))
}
