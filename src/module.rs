//! Module references and per-scenario run configuration
//!
//! A [`ModuleReference`] names a self-contained declarative-infrastructure
//! module by directory. [`RunOptions`] bundles the reference with a parameter
//! map and a retry policy; it is built once per scenario and read-only
//! afterwards. Parameter values are validated only by the external tool,
//! never locally.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::retry::RetryPolicy;

/// Identifies a declarative-infrastructure module by filesystem path.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    dir: PathBuf,
}

impl ModuleReference {
    /// Reference the module rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The module's working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// A configuration parameter value.
///
/// Covers the shapes the tool's variable-injection mechanism accepts: scalar
/// strings, numbers, booleans, and ordered string lists. No nested structure
/// is validated locally.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    /// Scalar string
    String(String),
    /// Numeric value (rendered without a fraction when integral)
    Number(f64),
    /// Boolean flag
    Bool(bool),
    /// Ordered sequence of strings
    List(Vec<String>),
}

impl VarValue {
    /// Render the value as the payload of a `-var name=value` argument.
    ///
    /// Lists are rendered as JSON arrays, which the tool accepts as list
    /// literals.
    pub(crate) fn render(&self) -> String {
        match self {
            VarValue::String(s) => s.clone(),
            VarValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            VarValue::Bool(b) => b.to_string(),
            VarValue::List(items) => {
                serde_json::Value::from(items.clone()).to_string()
            }
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Number(value as f64)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Number(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<Vec<String>> for VarValue {
    fn from(value: Vec<String>) -> Self {
        VarValue::List(value)
    }
}

impl From<Vec<&str>> for VarValue {
    fn from(value: Vec<&str>) -> Self {
        VarValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Ordered parameter map, keyed by variable name.
///
/// A `BTreeMap` keeps rendered invocations deterministic.
pub type Vars = BTreeMap<String, VarValue>;

/// Everything one scenario needs to drive the tool: module reference,
/// parameter map, and retry policy. Invocation timeouts live on the runner
/// (see [`crate::runner::CommandRunner::with_timeout`]).
///
/// Constructed once per scenario via the builder-style methods, read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct RunOptions {
    module: ModuleReference,
    vars: Vars,
    retry: RetryPolicy,
}

impl RunOptions {
    /// Options for the given module with no variables and no retries.
    pub fn new(module: ModuleReference) -> Self {
        Self {
            module,
            vars: Vars::new(),
            retry: RetryPolicy::none(),
        }
    }

    /// Set a module variable.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Install the canonical transient-error matcher set.
    pub fn with_default_retryable_errors(mut self) -> Self {
        self.retry = RetryPolicy::default_retryable_errors();
        self
    }

    /// The module this scenario runs against.
    pub fn module(&self) -> &ModuleReference {
        &self.module
    }

    /// The parameter map.
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    /// The retry policy applied around apply-path invocations.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Render the parameter map as repeated `-var name=value` arguments.
    pub(crate) fn var_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.vars.len() * 2);
        for (name, value) in &self.vars {
            args.push("-var".to_string());
            args.push(format!("{}={}", name, value.render()));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_values_render_verbatim() {
        assert_eq!(VarValue::from("10.0.0.0/16").render(), "10.0.0.0/16");
        assert_eq!(VarValue::from(true).render(), "true");
        assert_eq!(VarValue::from(80i64).render(), "80");
        assert_eq!(VarValue::from(1.5).render(), "1.5");
    }

    #[test]
    fn lists_render_as_json_arrays() {
        let value = VarValue::from(vec!["10.0.1.0/24", "10.0.2.0/24"]);
        assert_eq!(value.render(), r#"["10.0.1.0/24","10.0.2.0/24"]"#);
    }

    #[test]
    fn var_args_are_sorted_and_paired() {
        let opts = RunOptions::new(ModuleReference::new("modules/network"))
            .var("vpc_name", "test-vpc")
            .var("azs", vec!["us-east-1a", "us-east-1b"]);
        assert_eq!(
            opts.var_args(),
            vec![
                "-var".to_string(),
                r#"azs=["us-east-1a","us-east-1b"]"#.to_string(),
                "-var".to_string(),
                "vpc_name=test-vpc".to_string(),
            ]
        );
    }

    #[test]
    fn options_default_to_single_attempt() {
        let opts = RunOptions::new(ModuleReference::new("modules/network"));
        assert_eq!(opts.retry().max_attempts(), 1);
    }
}
