//! Logging setup

/// Initialize the logging system with a default level filter
///
/// `RUST_LOG` still overrides `level` when it is set. Unknown level strings
/// fall back to `info`.
pub fn init_with_level(level: &str) {
    let filter = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}
