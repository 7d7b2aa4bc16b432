//! File logging for stagehand.
//!
//! The terminal belongs to the UI, so logs only go to a file.
//!
//! Filter priority: `STAGEHAND_LOG` > `RUST_LOG` > `warn` globally with
//! `info` for the stagehand crates.
//!
//! Default file: `<data dir>/stagehand/logs/stagehand.log`, overridden by
//! `--log-file` or the `log_file` config key.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "warn,stagehand=info,stagehand_mirror=info,stagehand_bridge=info";
const DEFAULT_FILE_NAME: &str = "stagehand.log";

/// Must be held for the life of the program; dropping it flushes the file.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

pub fn init(log_file: Option<&Path>) -> anyhow::Result<LogGuard> {
    let log_file = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_file);
    let (dir, name) = split_log_path(&log_file);
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, &name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(create_filter()?);

    Registry::default().with(layer).try_init()?;

    Ok(LogGuard {
        _file_guard: guard,
        log_file,
    })
}

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stagehand")
        .join("logs")
        .join(DEFAULT_FILE_NAME)
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    (dir, name)
}

fn create_filter() -> anyhow::Result<EnvFilter> {
    if let Ok(spec) = std::env::var("STAGEHAND_LOG") {
        return Ok(EnvFilter::try_new(spec)?);
    }
    if let Ok(spec) = std::env::var("RUST_LOG") {
        return Ok(EnvFilter::try_new(spec)?);
    }
    Ok(EnvFilter::try_new(DEFAULT_FILTER)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_nested_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/stagehand/run.log"));
        assert_eq!(dir, PathBuf::from("/var/log/stagehand"));
        assert_eq!(name, "run.log");
    }

    #[test]
    fn split_bare_file_name_uses_cwd() {
        let (dir, name) = split_log_path(Path::new("run.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "run.log");
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
