//! Tracing subscriber setup.

use std::str::FromStr;

use tracing::Level;

/// Parse a configured level name, falling back to `warn` for unknown values.
pub fn parse_level(value: &str) -> Level {
    Level::from_str(value.trim()).unwrap_or(Level::WARN)
}

/// Raise `base` by one step per verbosity flag.
pub fn with_verbosity(base: Level, verbose: u8) -> Level {
    let mut level = base;
    for _ in 0..verbose {
        level = match level {
            Level::ERROR => Level::WARN,
            Level::WARN => Level::INFO,
            Level::INFO => Level::DEBUG,
            _ => Level::TRACE,
        };
    }
    level
}

/// Install a stderr fmt subscriber. Later calls are ignored.
pub fn init_with_level(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels_and_defaults_unknown() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level(" INFO "), Level::INFO);
        assert_eq!(parse_level("chatty"), Level::WARN);
    }

    #[test]
    fn verbosity_raises_level_and_saturates() {
        assert_eq!(with_verbosity(Level::WARN, 0), Level::WARN);
        assert_eq!(with_verbosity(Level::WARN, 2), Level::DEBUG);
        assert_eq!(with_verbosity(Level::WARN, 9), Level::TRACE);
    }
}
