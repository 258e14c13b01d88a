//! Logging setup.
//!
//! Logs go to stderr so that command output on stdout stays clean. When
//! `[logging] file` is set, the same lines are appended to that file too,
//! which keeps a record across repeated `agg` runs.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Per-query statements from sqlx are only useful when chasing database bugs.
const QUIET_SQLX: &str = "sqlx::query=warn";

/// Map a configured level name to a filter. Unknown names mean `info`.
fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn build_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());
    match QUIET_SQLX.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Open the log file for appending, creating missing parent directories.
///
/// Returns `None` when no file is configured.
fn open_log_file(file: Option<&str>) -> Result<Option<File>> {
    let Some(file) = file else {
        return Ok(None);
    };

    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new().create(true).append(true).open(file)?;
    Ok(Some(log_file))
}

/// Install the global subscriber for `config`.
///
/// Without a configured file this is the same as [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let Some(log_file) = open_log_file(config.file.as_deref())? else {
        init_console_only(&config.level);
        return Ok(());
    };

    let writer = std::io::stderr.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Install a stderr-only subscriber.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(build_filter(level))
        .init();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level(" TRACE "), LevelFilter::TRACE);
        assert_eq!(parse_level("warning"), LevelFilter::WARN);
        assert_eq!(parse_level("error"), LevelFilter::ERROR);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
    }

    #[test]
    fn test_parse_level_unknown_is_info() {
        assert_eq!(parse_level("verbose"), LevelFilter::INFO);
        assert_eq!(parse_level(""), LevelFilter::INFO);
    }

    #[test]
    fn test_no_log_file_configured() {
        assert!(open_log_file(None).unwrap().is_none());
    }

    #[test]
    fn test_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/feedmill.log");

        let file = open_log_file(path.to_str()).unwrap();
        assert!(file.is_some());
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedmill.log");

        for line in ["first agg run\n", "second agg run\n"] {
            let mut file = open_log_file(path.to_str()).unwrap().unwrap();
            file.write_all(line.as_bytes()).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first agg run\nsecond agg run\n");
    }
}
