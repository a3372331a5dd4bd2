//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;
use std::time::Duration;

use crate::harness::Harness;
use crate::module::{ModuleReference, RunOptions, VarValue};
use crate::retry::RetryPolicy;
use crate::runner::CommandRunner;

use super::{CliError, CliResult, ExitCode};

/// Initialize and validate the module at `dir`, printing the tool's report.
pub fn validate(dir: &Path) -> CliResult<ExitCode> {
    let harness = Harness::new();
    let report = harness
        .validate(&ModuleReference::new(dir))
        .map_err(|e| CliError::failure(e.to_string()))?;
    println!("{}", report.raw().trim_end());
    Ok(ExitCode::SUCCESS)
}

/// Initialize and apply the module at `dir`, printing its outputs.
///
/// Unless `--keep` is given, the provisioned state is destroyed before the
/// command returns; a failed apply is also torn down best-effort by the
/// deployment guard.
pub fn apply(
    dir: &Path,
    vars: &[String],
    keep: bool,
    max_attempts: u32,
    timeout_secs: Option<u64>,
) -> CliResult<ExitCode> {
    let mut runner = CommandRunner::new();
    if let Some(secs) = timeout_secs {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }
    let harness = Harness::with_runner(runner);
    let opts = build_options(dir, vars)?
        .with_retry(RetryPolicy::default_retryable_errors().with_max_attempts(max_attempts));

    let deployment = harness
        .apply(&opts)
        .map_err(|e| CliError::failure(e.to_string()))?;

    for (name, value) in deployment.outputs().iter() {
        println!("{name} = {value}");
    }

    if keep {
        let _ = deployment.keep();
        Ok(ExitCode::SUCCESS)
    } else {
        deployment
            .destroy()
            .map_err(|e| CliError::failure(e.to_string()))?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Tear down previously applied state for the module at `dir`.
pub fn destroy(dir: &Path, vars: &[String]) -> CliResult<ExitCode> {
    let harness = Harness::new();
    let opts = build_options(dir, vars)?;
    harness
        .destroy(&opts)
        .map_err(|e| CliError::failure(e.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

fn build_options(dir: &Path, vars: &[String]) -> CliResult<RunOptions> {
    let mut opts = RunOptions::new(ModuleReference::new(dir));
    for pair in vars {
        let (name, value) = parse_var(pair)?;
        opts = opts.var(name, value);
    }
    Ok(opts)
}

/// Parse a `name=value` pair into a module variable.
///
/// Values that look like JSON string arrays become lists; `true`/`false`
/// become booleans; numeric text becomes a number; anything else stays a
/// string. The external tool does the real validation.
fn parse_var(pair: &str) -> CliResult<(String, VarValue)> {
    let Some((name, raw)) = pair.split_once('=') else {
        return Err(CliError::failure(format!(
            "invalid --var '{pair}': expected NAME=VALUE"
        )));
    };
    if name.is_empty() {
        return Err(CliError::failure(format!(
            "invalid --var '{pair}': empty variable name"
        )));
    }

    let value = if raw.trim_start().starts_with('[') {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(items) => VarValue::List(items),
            Err(e) => {
                return Err(CliError::failure(format!(
                    "invalid --var '{pair}': list values must be JSON string arrays ({e})"
                )));
            }
        }
    } else if raw == "true" || raw == "false" {
        VarValue::Bool(raw == "true")
    } else if let Ok(n) = raw.parse::<f64>() {
        VarValue::Number(n)
    } else {
        VarValue::String(raw.to_string())
    };

    Ok((name.to_string(), value))
}
