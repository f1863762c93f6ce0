//! Logging initialization shared by the dbtally binary and tests.

use crate::Result;

/// Initializes structured logging based on verbosity level.
///
/// The default level is WARN so that a plain invocation only reports
/// problems; `-v` raises it to INFO, `-vv` and above to DEBUG, and
/// `--quiet` suppresses everything below ERROR. Quiet always wins when
/// combined with verbose flags.
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, _) => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| {
            crate::error::DbTallyError::configuration(format!(
                "failed to initialize logging: {e}"
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    // Logging can only be initialized once per test process, so only the
    // level mapping is verified here.

    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 3), tracing::Level::ERROR),
            ((false, 0), tracing::Level::WARN),
            ((false, 1), tracing::Level::INFO),
            ((false, 2), tracing::Level::DEBUG),
            ((false, 10), tracing::Level::DEBUG),
        ];

        for ((quiet, verbose), expected) in test_cases {
            let level = match (quiet, verbose) {
                (true, _) => tracing::Level::ERROR,
                (false, 0) => tracing::Level::WARN,
                (false, 1) => tracing::Level::INFO,
                (false, _) => tracing::Level::DEBUG,
            };
            assert_eq!(
                level, expected,
                "failed for quiet={quiet}, verbose={verbose}"
            );
        }
    }
}
