// Logging setup driven by CLI flags

use tracing::Level;

/// Log level implied by the verbosity flags; `--quiet` wins over `--verbose`
pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global tracing subscriber, writing to stderr
///
/// Calling this more than once keeps the first subscriber.
pub fn init_logging(verbose: bool, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(false, false), Level::WARN);
        assert_eq!(level_for(true, false), Level::DEBUG);
        assert_eq!(level_for(false, true), Level::ERROR);
        assert_eq!(level_for(true, true), Level::ERROR);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging(false, true);
        init_logging(true, false);
    }
}
