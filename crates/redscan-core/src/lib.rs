//! Redscan Core Library
//!
//! Shared execution substrate for redscan's security-tool adapters. Each
//! adapter maps a structured request onto a command line for one external
//! scanning tool; this crate provides the pieces every adapter relies on:
//!
//! - a bounded, cancellable external-process runner ([`exec::ProcessRunner`]);
//! - normalization of raw process output into a uniform success-or-error
//!   response ([`normalize`]);
//! - the path-safety check used whenever a file path flows into a command
//!   line ([`pathguard`]).
//!
//! Scanned targets are untrusted, so every invocation runs under an
//! [`exec::ExecutionPolicy`]: a wall-clock timeout, a combined output byte
//! cap, and a cooperative cancellation token. Argument construction, request
//! schemas, and the protocol transport live in the adapter crates.

pub mod config;
pub mod error;
pub mod exec;
pub mod normalize;
pub mod pathguard;
pub mod sanitize;

// Re-export commonly used types
pub use config::AdapterConfig;
pub use error::{ExecError, ExecResult};
pub use exec::{
    CommandRequest, ExecutionPolicy, PolicyBuilder, ProcessOutput, ProcessRunner,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT,
};
pub use normalize::{normalize_output, FormatOptions};
pub use pathguard::sanitize_path;
pub use sanitize::{strip_ansi_codes, truncate_output};
