//! Per-adapter configuration
//!
//! One `AdapterConfig` is constructed at startup by the transport layer and
//! passed into the adapter that owns it. No module in this crate reads
//! `std::env::args` or other ambient global state; whatever the host wants
//! configurable arrives through this value.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ExecError, ExecResult};
use crate::exec::{CommandRequest, ExecutionPolicy};
use crate::pathguard::sanitize_path;

/// Configuration for one tool adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Tool name used in responses and error messages
    pub tool_name: String,
    /// Executable name or path to invoke
    pub binary: String,
    /// Default timeout for this tool, for scans that routinely outlast the
    /// built-in default
    #[serde(default, with = "humantime_serde")]
    pub default_timeout: Option<Duration>,
    /// Override for the combined output byte budget
    #[serde(default)]
    pub max_output_bytes: Option<u64>,
    /// Root directory that caller-supplied paths (wordlists, output files)
    /// must stay within
    #[serde(default)]
    pub allowed_root: Option<PathBuf>,
    /// Environment overrides applied to every invocation of this tool
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl AdapterConfig {
    /// Minimal configuration for the named tool
    pub fn new(tool_name: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            binary: binary.into(),
            default_timeout: None,
            max_output_bytes: None,
            allowed_root: None,
            env: HashMap::new(),
        }
    }

    /// Set the tool-specific default timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Set the combined output byte budget
    pub fn with_max_output_bytes(mut self, limit: u64) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    /// Set the allowed root for caller-supplied paths
    pub fn with_allowed_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.allowed_root = Some(root.into());
        self
    }

    /// Add one environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Build the execution policy for one call: the caller's explicit
    /// timeout wins over this tool's default, which wins over the built-in
    pub fn policy_for(
        &self,
        cancellation: CancellationToken,
        caller_timeout: Option<Duration>,
    ) -> ExecutionPolicy {
        let mut builder = ExecutionPolicy::builder(cancellation).caller_timeout(caller_timeout);
        if let Some(timeout) = self.default_timeout {
            builder = builder.tool_default_timeout(timeout);
        }
        if let Some(limit) = self.max_output_bytes {
            builder = builder.max_output_bytes(limit);
        }
        builder.build()
    }

    /// Seed a request with this tool's binary and environment overrides
    pub fn request<I, S>(&self, args: I) -> CommandRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = CommandRequest::new(self.binary.as_str()).args(args);
        for (key, value) in &self.env {
            request = request.env(key.as_str(), value.as_str());
        }
        request
    }

    /// Resolve a caller-supplied path against the configured allowed root
    pub fn resolve_path(&self, candidate: impl AsRef<Path>) -> ExecResult<PathBuf> {
        let root = self.allowed_root.as_ref().ok_or_else(|| {
            ExecError::config(format!(
                "no allowed path root configured for {}",
                self.tool_name
            ))
        })?;
        sanitize_path(candidate, root)
    }
}
