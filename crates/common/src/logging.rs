// NDB - Neo Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging configuration for NDB components
//!
//! Console output is pretty-printed and honours `RUST_LOG` (default `info`).
//! File output, when enabled, goes to `<tmp>/ndb-logs/<component>/` with daily
//! rotation and no ANSI colouring.

use std::{env, fs, path::PathBuf, sync::Once};

use eyre::{Result, WrapErr};
use tracing::Level;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Where log records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Console only
    Console,
    /// Console and a rotating file in the temp directory
    ConsoleAndFile,
}

/// Initialize logging for an NDB component
///
/// # Examples
/// ```rust,no_run
/// use ndb_common::logging::{self, LogOutput};
///
/// fn main() -> eyre::Result<()> {
///     logging::init_logging("ndb", LogOutput::Console)?;
///     tracing::info!("Application started");
///     Ok(())
/// }
/// ```
pub fn init_logging(component_name: &str, output: LogOutput) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .pretty()
        .with_filter(default_filter(Level::INFO));

    match output {
        LogOutput::Console => {
            tracing_subscriber::registry()
                .with(console_layer)
                .try_init()
                .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {e}"))?;

            tracing::info!(component = component_name, "Logging initialized with console output");
        }
        LogOutput::ConsoleAndFile => {
            let log_dir = create_log_directory(component_name)?;
            let (writer, guard) =
                non_blocking(rolling::daily(&log_dir, format!("{component_name}.log")));
            // The guard flushes on drop; logging lives for the whole process.
            std::mem::forget(guard);

            let file_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(default_filter(Level::DEBUG));

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {e}"))?;

            tracing::info!(
                component = component_name,
                log_dir = %log_dir.display(),
                "Logging initialized with console and file output"
            );
        }
    }

    Ok(())
}

/// `RUST_LOG` if set, otherwise `level`
fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join("ndb-logs").join(component_name);
    fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    Ok(log_dir)
}

/// Initialize compact console logging, for tests and small utilities
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(level))
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize simple logging: {e}"))
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Idempotent logging setup for tests
///
/// ```rust
/// ndb_common::logging::ensure_test_logging(None);
/// tracing::info!("safe to call from every test");
/// ```
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        // A subscriber installed elsewhere is fine.
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}
