//! Logging setup
//!
//! Console output always; with a log directory, daily rotating files:
//! - `app/app.YYYY-MM-DD` - everything except security events
//! - `security/security.YYYY-MM-DD` - events on the `security` target

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system
///
/// `RUST_LOG` overrides `level` when set.
///
/// ```ignore
/// // Development: pretty console only
/// init_logger_with_file("debug", false, None)?;
///
/// // Production: JSON console + files
/// init_logger_with_file("info", true, Some(Path::new("./logs")))?;
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(json_format)];

    if let Some(dir) = log_dir {
        let app_dir = dir.join("app");
        let security_dir = dir.join("security");
        fs::create_dir_all(&app_dir)?;
        fs::create_dir_all(&security_dir)?;

        let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "app");
        layers.push(file_layer(
            app_log,
            json_format,
            |target| target != "security",
        ));

        let security_log = RollingFileAppender::new(Rotation::DAILY, security_dir, "security");
        layers.push(file_layer(
            security_log,
            json_format,
            |target| target == "security",
        ));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    if let Some(dir) = log_dir {
        tracing::info!(dir = %dir.display(), "File logging enabled");
    }
    Ok(())
}

/// Console only
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

fn console_layer(json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    }
}

fn file_layer(
    appender: RollingFileAppender,
    json_format: bool,
    accept_target: fn(&str) -> bool,
) -> BoxedLayer {
    let filter = filter_fn(move |meta| accept_target(meta.target()));
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    }
}
