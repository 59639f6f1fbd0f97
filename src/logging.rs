use crate::config::ActorConfig;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber for a process embedding the runtime.
///
/// The filter is derived from [`ActorConfig::log_level`]: the runtime logs
/// at the configured level while dependencies stay at `warn`. Records go to
/// `log_path` without ANSI escapes; `with_stdout` mirrors a compact view to
/// the terminal. Call once per process.
pub fn init_logging(
    config: &ActorConfig,
    log_path: impl AsRef<Path>,
    with_stdout: bool,
) -> Result<()> {
    let log_path = log_path.as_ref();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(log_path)
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;

    let file_log = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::sync::Mutex::new(file))
        .with_filter(runtime_filter(config)?);

    let stdout_mirror = if with_stdout {
        Some(
            fmt::layer()
                .compact()
                .with_writer(io::stdout)
                .with_filter(runtime_filter(config)?),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_log)
        .with(stdout_mirror)
        .try_init()?;
    Ok(())
}

/// The configured level applies to this crate; everything else logs at warn
fn runtime_filter(config: &ActorConfig) -> Result<EnvFilter> {
    let directive = format!("warn,troupe={}", config.log_level);
    EnvFilter::builder()
        .parse(&directive)
        .with_context(|| format!("bad log level {:?} in config", config.log_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_creates_log_file() {
        let path = std::env::temp_dir().join("troupe-logging-test/actor.log");
        init_logging(&ActorConfig::default(), &path, false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_bad_level_is_rejected() {
        let config = ActorConfig {
            log_level: "chatty".to_string(),
            ..ActorConfig::default()
        };
        assert!(runtime_filter(&config).is_err());
    }
}
