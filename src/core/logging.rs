//! Tracing setup for both binaries.
//!
//! Events go to stdout and to a daily rolling file under `AppPaths::log_dir`.
//! `RUST_LOG` overrides the per-binary default filter.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Server,
    Ingest,
}

impl LogTarget {
    pub fn file_prefix(self) -> &'static str {
        match self {
            LogTarget::Server => "server.log",
            LogTarget::Ingest => "ingest.log",
        }
    }

    /// Request spans from tower-http only matter for the server.
    pub fn default_directives(self) -> &'static str {
        match self {
            LogTarget::Server => "info,tower_http=debug",
            LogTarget::Ingest => "info",
        }
    }
}

fn filter_for(target: LogTarget) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(target.default_directives()))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(paths: &AppPaths, target: LogTarget) -> Result<(), TryInitError> {
    let _ = std::fs::create_dir_all(&paths.log_dir);

    let appender = RollingFileAppender::new(Rotation::DAILY, &paths.log_dir, target.file_prefix());
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter_for(target))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
}
