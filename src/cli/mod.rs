//! CLI module for the groundwork harness
//!
//! This module provides the command-line interface over the harness.
//!
//! ## Commands
//!
//! - `validate <dir>` - Initialize and validate a module (no side effects)
//! - `apply <dir>` - Initialize and apply a module, printing its outputs
//! - `destroy <dir>` - Tear down previously applied state
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::GROUNDWORK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Provisioning harness for declarative infrastructure modules
#[derive(Parser, Debug)]
#[command(name = "groundwork")]
#[command(version = GROUNDWORK_VERSION)]
#[command(about = "Provisioning harness for declarative infrastructure modules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize and validate a module without touching external state
    Validate {
        /// Module directory to validate
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Initialize and apply a module, printing its outputs
    Apply {
        /// Module directory to apply
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Module variables as name=value pairs (lists as JSON arrays)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        /// Keep the provisioned state instead of destroying it on exit
        #[arg(long)]
        keep: bool,
        /// Maximum attempts for retryable failures
        #[arg(long, value_name = "N", default_value_t = 3)]
        max_attempts: u32,
        /// Per-invocation timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Tear down previously applied state
    Destroy {
        /// Module directory to destroy
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Module variables as name=value pairs (lists as JSON arrays)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Validate { dir } => commands::validate(&dir),
        Command::Apply {
            dir,
            vars,
            keep,
            max_attempts,
            timeout,
        } => commands::apply(&dir, &vars, keep, max_attempts, timeout),
        Command::Destroy { dir, vars } => commands::destroy(&dir, &vars),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::try_parse_from(["groundwork", "validate", "modules/network"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));
    }

    #[test]
    fn test_cli_parse_apply_with_vars() {
        let cli = Cli::try_parse_from([
            "groundwork",
            "apply",
            "modules/network",
            "--var",
            "vpc_name=test-vpc",
            "--var",
            r#"azs=["us-east-1a","us-east-1b"]"#,
            "--keep",
        ])
        .unwrap();
        if let Command::Apply { vars, keep, max_attempts, .. } = cli.command {
            assert_eq!(vars.len(), 2);
            assert!(keep);
            assert_eq!(max_attempts, 3);
        } else {
            panic!("Expected Apply command");
        }
    }

    #[test]
    fn test_cli_parse_apply_with_timeout() {
        let cli = Cli::try_parse_from([
            "groundwork",
            "apply",
            "modules/network",
            "--timeout",
            "120",
            "--max-attempts",
            "5",
        ])
        .unwrap();
        if let Command::Apply { timeout, max_attempts, .. } = cli.command {
            assert_eq!(timeout, Some(120));
            assert_eq!(max_attempts, 5);
        } else {
            panic!("Expected Apply command");
        }
    }

    #[test]
    fn test_cli_parse_destroy() {
        let cli = Cli::try_parse_from([
            "groundwork",
            "destroy",
            "modules/security",
            "--var",
            "vpc_id=dummy-vpc-id",
        ])
        .unwrap();
        if let Command::Destroy { vars, .. } = cli.command {
            assert_eq!(vars, vec!["vpc_id=dummy-vpc-id"]);
        } else {
            panic!("Expected Destroy command");
        }
    }

    #[test]
    fn test_cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["groundwork"]).is_err());
    }
}
