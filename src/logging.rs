use env_logger::{Builder, Env};

/// Initializes the process wide logger.
///
/// Filtering follows the conventional `RUST_LOG` variable and defaults to
/// `info` when unset.
pub fn setup_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
