//! Diagnostic logging setup

use tracing::Level;

/// Log level for the `-v`/`-q` flags
pub fn level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber
pub fn init(verbose: u8, quiet: bool, color: bool) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok();

    // The first subscriber stays in place
    if !installed {
        tracing::debug!("A tracing subscriber was already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0, false), Level::WARN);
        assert_eq!(level(1, false), Level::INFO);
        assert_eq!(level(2, false), Level::DEBUG);
        assert_eq!(level(5, false), Level::TRACE);
        assert_eq!(level(3, true), Level::ERROR);
    }

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        init(2, false, false);
        init(0, true, false);
        assert!(tracing::enabled!(Level::DEBUG));
    }
}
