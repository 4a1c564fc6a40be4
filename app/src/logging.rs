use std::fs;
use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "QGRID_LOG";
const LOG_FILE: &str = "qgrid.log";

/// Installs a daily-rolling file logger under `<config_dir>/logs`. The
/// terminal belongs to the grid, so nothing is logged to stdout or stderr.
/// Without a usable directory the process simply runs unlogged.
pub fn init(config_dir: Option<&Path>) {
    let Some(config_dir) = config_dir else {
        return;
    };
    let logs_dir = config_dir.join("logs");
    if fs::create_dir_all(&logs_dir).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
}
