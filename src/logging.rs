use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Set up tracing for stdout and file logging.
///
/// In quiet mode the stdout layer is dropped entirely so the primary output
/// stream stays machine-parseable; diagnostics still reach the file log.
pub fn init_logger(quiet: bool) -> impl Drop {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/orphansweep.log".to_string());
    if let Some(parent) = std::path::Path::new(&log_file_path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer);

    if quiet {
        registry.init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .pretty()
                    .with_file(false)
                    .without_time()
                    .with_ansi(true),
            )
            .init();
    }

    guard
}
