//! Subscriber setup shared by the edge server and the CLI.

use shared::config::{LogFormat, LoggingConfig};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, fmt::MakeWriter};

/// Installs the global subscriber and returns the configured level.
///
/// `RUST_LOG` wins over the configured level. A second call leaves the
/// first subscriber in place.
pub fn initialize_tracing(config: &LoggingConfig) -> String {
    if tracing::subscriber::set_global_default(build_subscriber(config, std::io::stderr)).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    config.level.clone()
}

/// Builds the subscriber without installing it.
pub fn build_subscriber<W>(config: &LoggingConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = fmt()
        .with_env_filter(build_env_filter(config))
        .with_writer(writer)
        .with_target(false)
        .with_level(true);

    match config.format {
        LogFormat::Json => Box::new(builder.json().with_ansi(false).finish()),
        LogFormat::Text => Box::new(builder.with_ansi(true).finish()),
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let default_level = config
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .parse_lossy("")
    })
}
