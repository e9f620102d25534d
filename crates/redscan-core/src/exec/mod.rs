//! Bounded, cancellable external-process execution
//!
//! One invocation is described by a [`CommandRequest`], governed by an
//! [`ExecutionPolicy`], and carried out by [`ProcessRunner`]. Arbitrarily
//! many invocations may be in flight concurrently; each owns an independent
//! child process and timer, and nothing is shared across them.

mod policy;
mod request;
mod runner;

pub use policy::{ExecutionPolicy, PolicyBuilder, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT};
pub use request::CommandRequest;
pub use runner::{ProcessOutput, ProcessRunner};
