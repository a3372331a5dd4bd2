//! Retry policy for transient tool failures
//!
//! Provisioning tools fail transiently for reasons that have nothing to do
//! with the configuration under test: connection resets, TLS handshake
//! timeouts, registry throttling. The policy here is deliberately simple —
//! a list of diagnostic-text matchers plus an exponential backoff schedule.
//! Classification happens once per failure; the caller never re-inspects
//! the error text.

use std::time::Duration;

use regex::Regex;

/// A recognizable transient failure: a pattern over the tool's diagnostic
/// text plus a short reason used in retry logs.
#[derive(Debug, Clone)]
pub struct RetryableError {
    pattern: Regex,
    reason: String,
}

impl RetryableError {
    /// Compile a matcher from a regex pattern and a log-friendly reason.
    pub fn new(pattern: &str, reason: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            reason: reason.to_string(),
        })
    }

    /// Whether the diagnostic text matches this pattern.
    pub fn matches(&self, diagnostic: &str) -> bool {
        self.pattern.is_match(diagnostic)
    }

    /// The reason recorded when this matcher fires.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Transient patterns worth retrying regardless of the module under test.
///
/// These mirror the failure modes seen when the tool talks to registries and
/// cloud endpoints: throttling, handshake timeouts, dropped connections, and
/// plugin startup races.
const DEFAULT_RETRYABLE_PATTERNS: &[(&str, &str)] = &[
    ("connection reset by peer", "connection reset"),
    ("TLS handshake timeout", "TLS handshake timeout"),
    ("429 Too Many Requests", "registry throttling"),
    ("timeout while waiting for plugin to start", "plugin startup race"),
    ("timed out waiting for server handshake", "server handshake timeout"),
    ("could not query provider registry", "registry unreachable"),
    ("Client\\.Timeout exceeded while awaiting headers", "HTTP client timeout"),
    ("RequestError: send request failed", "request send failure"),
    ("unexpected EOF", "truncated response"),
    ("timed out after", "invocation timeout"),
];

/// Matcher list plus backoff schedule applied around tool invocations.
///
/// `max_attempts` counts the first try: a policy with `max_attempts == 1`
/// never sleeps. Non-matching failures are never retried regardless of the
/// budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    matchers: Vec<RetryableError>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            matchers: Vec::new(),
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (single attempt, no matchers).
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Build a policy from explicit matchers and an attempt budget.
    pub fn new(matchers: Vec<RetryableError>, max_attempts: u32) -> Self {
        Self {
            matchers,
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// The canonical transient-error matcher set.
    pub fn default_retryable_errors() -> Self {
        let matchers = DEFAULT_RETRYABLE_PATTERNS
            .iter()
            .map(|(pattern, reason)| {
                RetryableError::new(pattern, reason)
                    .expect("INVARIANT: default retryable patterns are valid regexes")
            })
            .collect();
        Self {
            matchers,
            ..Self::default()
        }
    }

    /// Override the backoff bounds (useful to keep tests fast).
    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Override the attempt budget. Clamped to at least one attempt.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classify a diagnostic against the matcher list.
    ///
    /// Returns the reason of the first matching pattern, or `None` for a
    /// structural failure that must propagate immediately.
    pub fn classify(&self, diagnostic: &str) -> Option<&str> {
        self.matchers
            .iter()
            .find(|m| m.matches(diagnostic))
            .map(RetryableError::reason)
    }

    /// Backoff delay after the given failed attempt (1-based).
    ///
    /// Grows exponentially from the initial delay, capped at the maximum.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}
