use tracing_subscriber::EnvFilter;

/// Install the log subscriber. Debug builds, or `debug_logging` in the
/// settings, log at `debug` and let `RUST_LOG` override the filter; otherwise
/// `info` is forced so a stray `RUST_LOG` does not flood the terminal.
pub fn init(debug: bool) {
    let debug = debug || cfg!(debug_assertions);
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
