use pinget_core::{logging, FetchError};

mod cli;

use crate::cli::CliCommand;

/// Exit status for a pinned-fingerprint mismatch, distinct from other failures.
const EXIT_TRUST_VIOLATION: i32 = 2;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the
    // state directory is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}); logging to stderr", err);
    }

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("pinget error: {:#}", err);
        let trust_violation = err
            .downcast_ref::<FetchError>()
            .is_some_and(FetchError::is_trust_violation);
        std::process::exit(if trust_violation { EXIT_TRUST_VIOLATION } else { 1 });
    }
}
