use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// Installs the global subscriber. Formatted messages go to stdout, so logs are written to stderr
/// or, when configured, to a daily rolling file. Keep the returned guard alive until exit.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, "josefine-reader.log"))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().compact().with_ansi(config.directory.is_none()).with_writer(writer));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
