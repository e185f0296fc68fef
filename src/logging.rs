//! Logging setup
//!
//! Log records go to stderr through `env_logger`, so command output on
//! stdout stays clean. `RUST_LOG`, when set, wins over the configured level.

use log::LevelFilter;

/// Environment variable read by `env_logger`
const LOG_ENV: &str = "RUST_LOG";

/// Map a configured level name to a filter; unknown names fall back to `info`
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize the global logger
///
/// Calling it a second time is a no-op.
pub fn init(level: &str) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os(LOG_ENV).is_none() {
        builder.filter_level(parse_level(level));
    }

    let initialized = builder
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .is_ok();

    if initialized {
        log::debug!("Logging initialized at level {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info"), LevelFilter::Info);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init("error");
        init("debug");
    }
}
