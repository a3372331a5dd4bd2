//! Apply/validate/destroy lifecycle over an external provisioning tool
//!
//! The harness drives two operation modes:
//!
//! - **Full lifecycle**: [`Harness::apply`] runs init + apply with retry on
//!   transient failures, parses the declared outputs, and hands back a
//!   [`Deployment`] whose teardown is guaranteed on every exit path.
//! - **Dry validation**: [`Harness::validate`] runs init + validate with no
//!   side effects on external state.
//!
//! ## Cleanup guarantee
//!
//! The [`Deployment`] guard is constructed *before* the first tool
//! invocation of the apply path, so a failed or partial apply — or an
//! assertion panic after a successful one — still tears down exactly once.
//!
//! ## Concurrency
//!
//! A harness holds no shared state; construct one per scenario. Scenarios
//! may run in parallel against distinct working directories. The harness
//! adds no locking of its own: concurrent use of one working directory is
//! governed solely by the tool's own state locking.

use std::thread;

use tracing::{info, warn};

use crate::error::HarnessError;
use crate::module::{ModuleReference, RunOptions};
use crate::outputs::OutputSet;
use crate::runner::{CommandRunner, ToolOutput, ToolRunner};

/// Canonical marker the tool prints when a configuration validates cleanly.
pub const VALIDATION_SUCCESS_MARKER: &str = "Success!";

/// Whether apply/destroy scenarios are enabled.
///
/// Provisioning scenarios mutate real external state and may incur cost, so
/// they are opt-in: set `GROUNDWORK_APPLY=1` (or `true`) to run them.
/// Validation-only scenarios ignore this flag.
pub fn apply_enabled() -> bool {
    std::env::var("GROUNDWORK_APPLY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Report returned by [`Harness::validate`].
///
/// Carries the raw tool text so callers can make substring assertions.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    raw: String,
}

impl ValidationReport {
    /// The raw textual report from the tool.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the report carries the canonical success marker.
    pub fn is_success(&self) -> bool {
        self.raw.contains(VALIDATION_SUCCESS_MARKER)
    }
}

/// The provisioning harness: a uniform, resilient interface over an external
/// declarative-infrastructure tool.
///
/// Generic over the [`ToolRunner`] boundary so tests can substitute scripted
/// runners; production code uses the default [`CommandRunner`].
#[derive(Debug)]
pub struct Harness<R: ToolRunner = CommandRunner> {
    runner: R,
}

impl Harness<CommandRunner> {
    /// Harness over the tool resolved from the environment.
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }
}

impl Default for Harness<CommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ToolRunner> Harness<R> {
    /// Harness over a specific runner implementation.
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    /// The runner this harness invokes the tool through.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Initialize and validate the module at `module`, with no side effects
    /// on external state.
    ///
    /// Succeeds iff the tool reports success; a clean run that judges the
    /// module invalid fails with [`HarnessError::Validation`] carrying the
    /// raw report.
    #[tracing::instrument(skip_all, fields(module = %module.dir().display()))]
    pub fn validate(&self, module: &ModuleReference) -> Result<ValidationReport, HarnessError> {
        self.invoke(module.dir(), &["init", "-input=false", "-no-color"])?;
        let out = self.runner.run(module.dir(), &["validate", "-no-color"])?;
        let raw = out.diagnostic();
        if out.success() {
            Ok(ValidationReport { raw })
        } else {
            Err(HarnessError::Validation { report: raw })
        }
    }

    /// Initialize and apply the module described by `opts`, returning its
    /// outputs wrapped in a teardown guard.
    ///
    /// Failures whose diagnostic text matches the options' retryable
    /// matchers are retried with exponential backoff up to the attempt
    /// budget; structural failures propagate immediately. Teardown is armed
    /// before the first invocation, so even a failed apply is destroyed
    /// best-effort when the error propagates.
    #[tracing::instrument(skip_all, fields(module = %opts.module().dir().display()))]
    pub fn apply<'h>(&'h self, opts: &'h RunOptions) -> Result<Deployment<'h, R>, HarnessError> {
        let mut deployment = Deployment::new(self, opts);
        self.run_with_retry(opts, &["init", "-input=false", "-no-color"], false)?;
        self.run_with_retry(
            opts,
            &["apply", "-input=false", "-auto-approve", "-no-color"],
            true,
        )?;
        let report = self.run_with_retry(opts, &["output", "-json"], false)?;
        deployment.outputs = OutputSet::from_report(&report.stdout)?;
        info!(outputs = deployment.outputs.len(), "apply complete");
        Ok(deployment)
    }

    /// Tear down the state previously applied for `opts`.
    ///
    /// Not retried: this runs in cleanup paths where a failure is surfaced
    /// (or logged, from the guard) rather than fought.
    #[tracing::instrument(skip_all, fields(module = %opts.module().dir().display()))]
    pub fn destroy(&self, opts: &RunOptions) -> Result<(), HarnessError> {
        let mut args: Vec<String> = ["destroy", "-input=false", "-auto-approve", "-no-color"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(opts.var_args());
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.runner.run(opts.module().dir(), &arg_refs)?;
        if out.success() {
            Ok(())
        } else {
            Err(HarnessError::ToolInvocation {
                command: "destroy".to_string(),
                status: out.status,
                diagnostic: out.diagnostic(),
            })
        }
    }

    /// Run one tool step, requiring success. Used on the validation path,
    /// which carries no retry policy.
    fn invoke(&self, dir: &std::path::Path, args: &[&str]) -> Result<ToolOutput, HarnessError> {
        let out = self.runner.run(dir, args)?;
        if out.success() {
            Ok(out)
        } else {
            Err(HarnessError::ToolInvocation {
                command: args.join(" "),
                status: out.status,
                diagnostic: out.diagnostic(),
            })
        }
    }

    /// Run one apply-path step under the options' retry policy.
    ///
    /// Each failure is classified once against the retryable matchers; a
    /// match sleeps out the backoff and tries again until the budget is
    /// exhausted, anything else propagates immediately.
    fn run_with_retry(
        &self,
        opts: &RunOptions,
        args: &[&str],
        with_vars: bool,
    ) -> Result<ToolOutput, HarnessError> {
        let policy = opts.retry();
        let command = args.join(" ");

        let mut full_args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        if with_vars {
            full_args.extend(opts.var_args());
        }
        let arg_refs: Vec<&str> = full_args.iter().map(String::as_str).collect();

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let (status, diagnostic) = match self.runner.run(opts.module().dir(), &arg_refs) {
                Ok(out) if out.success() => {
                    if attempt > 1 {
                        info!(%command, attempt, "succeeded after retry");
                    }
                    return Ok(out);
                }
                Ok(out) => (out.status, out.diagnostic()),
                // Spawn failures and timeouts carry diagnostic text too and
                // go through the same classification.
                Err(HarnessError::ToolInvocation { status, diagnostic, .. }) => (status, diagnostic),
                Err(other) => return Err(other),
            };

            match policy.classify(&diagnostic) {
                Some(reason) if attempt < policy.max_attempts() => {
                    let delay = policy.delay_for(attempt);
                    warn!(%command, attempt, reason, ?delay, "transient failure, retrying");
                    thread::sleep(delay);
                }
                Some(_) => {
                    return Err(HarnessError::RetryExhausted {
                        command,
                        attempts: attempt,
                        diagnostic,
                    });
                }
                None => {
                    return Err(HarnessError::ToolInvocation {
                        command,
                        status,
                        diagnostic,
                    });
                }
            }
        }
    }
}

/// A provisioned module plus its guaranteed teardown.
///
/// Created by [`Harness::apply`] before the first tool invocation. Dropping
/// the guard — on normal return, a failed assertion, or any other unwind —
/// tears down the provisioned state exactly once, logging (never panicking
/// on) failures. Call [`Deployment::destroy`] instead when the caller wants
/// teardown errors surfaced.
#[derive(Debug)]
pub struct Deployment<'h, R: ToolRunner> {
    harness: &'h Harness<R>,
    opts: &'h RunOptions,
    outputs: OutputSet,
    torn_down: bool,
}

impl<'h, R: ToolRunner> Deployment<'h, R> {
    fn new(harness: &'h Harness<R>, opts: &'h RunOptions) -> Self {
        Self {
            harness,
            opts,
            outputs: OutputSet::default(),
            torn_down: false,
        }
    }

    /// The outputs parsed after the successful apply.
    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    /// Scalar output accessor; see [`OutputSet::output`].
    pub fn output(&self, name: &str) -> Result<String, HarnessError> {
        self.outputs.output(name)
    }

    /// List output accessor; see [`OutputSet::output_list`].
    pub fn output_list(&self, name: &str) -> Result<Vec<String>, HarnessError> {
        self.outputs.output_list(name)
    }

    /// Tear down now, surfacing any failure.
    pub fn destroy(mut self) -> Result<(), HarnessError> {
        self.torn_down = true;
        self.harness.destroy(self.opts)
    }

    /// Disarm the teardown guard, leaving the provisioned state in place,
    /// and hand back the outputs.
    pub fn keep(mut self) -> OutputSet {
        self.torn_down = true;
        std::mem::take(&mut self.outputs)
    }
}

impl<R: ToolRunner> Drop for Deployment<'_, R> {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Err(err) = self.harness.destroy(self.opts) {
            warn!(
                module = %self.opts.module().dir().display(),
                error = %err,
                "best-effort destroy failed"
            );
        }
    }
}
