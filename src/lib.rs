#![forbid(unsafe_code)]
//! Groundwork — provisioning and validation harness for declarative
//! infrastructure modules
//!
//! Groundwork wraps an external infrastructure-as-code tool (terraform or a
//! drop-in replacement) behind a small, typed lifecycle: build a
//! [`RunOptions`] for a module, [`Harness::apply`] it with retry on
//! transient failures, read back outputs, and rely on the [`Deployment`]
//! guard to tear everything down on every exit path. A validation-only mode
//! checks modules without touching external state.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` with `?` / `ok_or` / `map_err`. The
//!   `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **True invariants**: If a panic represents a harness bug (logic error),
//!   use `.expect("INVARIANT: reason")` with a clear explanation.

pub mod cli;
pub mod error;
pub mod harness;
pub mod module;
pub mod outputs;
pub mod retry;
pub mod runner;
pub mod version;

pub use error::{HarnessError, HarnessResult};
pub use harness::{
    Deployment, Harness, VALIDATION_SUCCESS_MARKER, ValidationReport, apply_enabled,
};
pub use module::{ModuleReference, RunOptions, VarValue, Vars};
pub use outputs::OutputSet;
pub use retry::{RetryPolicy, RetryableError};
pub use runner::{CommandRunner, ToolOutput, ToolRunner, resolve_tool, tool_available};
pub use version::GROUNDWORK_VERSION;
