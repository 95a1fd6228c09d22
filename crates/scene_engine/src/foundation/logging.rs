//! Logging utilities
//!
//! The engine logs through the `log` facade; `env_logger` is the backend
//! applications install at startup.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with an explicit default level
///
/// `level` uses the usual filter syntax (`"info"`, `"scene_engine=trace"`).
/// `RUST_LOG` still wins when set. Calling this twice is harmless.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

/// Parse a configured level name into a filter, falling back to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or_else(|_| {
        log::warn!("Unknown log level '{}', using info", level);
        LevelFilter::Info
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_with_level("debug");
        init_with_level("info");
        init();
    }
}
