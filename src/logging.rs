//! Tracing subscriber setup for the `rexsl` binary.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Logs go to stderr so that the
/// `http` subcommand can print response bodies on stdout. Only the first
/// call in a process has any effect.
pub fn init_logging(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
            .ok();
    }
}

/// Map the CLI `-v` count to a default level.
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0, false), Level::INFO);
        assert_eq!(level_from_verbosity(1, false), Level::DEBUG);
        assert_eq!(level_from_verbosity(5, false), Level::TRACE);
        assert_eq!(level_from_verbosity(2, true), Level::ERROR);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(false, Level::WARN);
        init_logging(true, Level::DEBUG);
    }
}
