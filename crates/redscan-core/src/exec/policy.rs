//! Execution policy: the bounds governing one invocation
//!
//! The builder isolates the timeout precedence rule (explicit per-call
//! timeout, else the tool's own default, else the built-in default) so it
//! stays testable independently of the runner's execution mechanics.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Built-in wall-clock timeout when neither the caller nor the tool supplies one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Built-in combined stdout + stderr byte budget (50 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 50 * 1024 * 1024;

/// The timeout, output cap, and cancellation token governing one invocation
#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    /// Wall-clock budget; on expiry the process is forcibly killed
    pub timeout: Duration,
    /// Combined byte budget shared across both output streams
    pub max_output_bytes: u64,
    /// Caller-owned cooperative cancellation token, threaded through untouched
    pub cancellation: CancellationToken,
}

impl ExecutionPolicy {
    /// Start building a policy tied to the given cancellation token
    pub fn builder(cancellation: CancellationToken) -> PolicyBuilder {
        PolicyBuilder {
            cancellation,
            caller_timeout: None,
            tool_default_timeout: None,
            max_output_bytes: None,
        }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::builder(CancellationToken::new()).build()
    }
}

/// Builder merging per-call overrides with tool defaults
#[derive(Debug)]
pub struct PolicyBuilder {
    cancellation: CancellationToken,
    caller_timeout: Option<Duration>,
    tool_default_timeout: Option<Duration>,
    max_output_bytes: Option<u64>,
}

impl PolicyBuilder {
    /// Explicit per-call timeout; overrides the tool default when present.
    /// Zero durations are ignored rather than honored.
    pub fn caller_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.caller_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Tool-specific default timeout, for tools that routinely need more
    /// (or less) than the built-in default
    pub fn tool_default_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.tool_default_timeout = Some(timeout);
        }
        self
    }

    /// Override the combined output byte budget
    pub fn max_output_bytes(mut self, limit: u64) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    /// Resolve the precedence rules into a policy
    pub fn build(self) -> ExecutionPolicy {
        ExecutionPolicy {
            timeout: self
                .caller_timeout
                .or(self.tool_default_timeout)
                .unwrap_or(DEFAULT_TIMEOUT),
            max_output_bytes: self.max_output_bytes.unwrap_or(DEFAULT_MAX_OUTPUT_BYTES),
            cancellation: self.cancellation,
        }
    }
}
