//! Harness error taxonomy
//!
//! Every failure the harness can surface is a [`HarnessError`] variant.
//! Transient tool failures are classified against the retry policy *before*
//! they reach this type: by the time a `ToolInvocation` error propagates, the
//! classification has already decided it is not (or no longer) retryable.

use thiserror::Error;

/// Errors surfaced by the provisioning harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The external process returned non-zero, failed to spawn, timed out,
    /// or produced output the harness could not interpret.
    #[error("tool invocation `{command}` failed (exit {status:?}): {diagnostic}")]
    ToolInvocation {
        /// The tool subcommand that failed (without variable payloads)
        command: String,
        /// Process exit code, if the process ran to completion
        status: Option<i32>,
        /// Raw stdout/stderr text attached for the caller
        diagnostic: String,
    },

    /// A retryable pattern kept matching until the attempt budget ran out.
    #[error("`{command}` still failing after {attempts} attempts: {diagnostic}")]
    RetryExhausted {
        /// The tool subcommand that was retried
        command: String,
        /// Total attempts made, including the first
        attempts: u32,
        /// Diagnostic text from the final attempt
        diagnostic: String,
    },

    /// A queried output name was never declared or produced by the module.
    #[error("module produced no output named `{name}`")]
    OutputNotFound {
        /// The output name that was queried
        name: String,
    },

    /// An output was queried through the wrong shape accessor.
    #[error("output `{name}` is not a {expected}")]
    TypeMismatch {
        /// The output name that was queried
        name: String,
        /// The shape the accessor expected ("scalar" or "list of strings")
        expected: &'static str,
    },

    /// The validation step ran but reported the module invalid.
    #[error("module validation failed:\n{report}")]
    Validation {
        /// Raw validation report text from the tool
        report: String,
    },

    /// I/O error while talking to the external process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool's JSON output report could not be parsed.
    #[error("output report parse error: {0}")]
    OutputReport(#[from] serde_json::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
