//! Structured description of one external-command invocation

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ExecResult;
use crate::exec::policy::ExecutionPolicy;
use crate::exec::runner::{ProcessOutput, ProcessRunner};

/// One external-command invocation: the executable, its ordered argument
/// vector, and the optional process wiring (working directory, environment,
/// stdin payload, execution policy).
///
/// Created and consumed within a single invocation; nothing persists across
/// calls.
#[derive(Debug, Clone, Default)]
pub struct CommandRequest {
    /// Executable name or path
    pub program: String,
    /// Ordered argument vector, passed through verbatim
    pub args: Vec<String>,
    /// Working directory for the child; inherits the caller's when absent
    pub working_dir: Option<PathBuf>,
    /// Environment overrides applied on top of the inherited environment
    pub env: Option<HashMap<String, String>>,
    /// Payload written to the child's stdin, after which the pipe is closed
    pub stdin: Option<String>,
    /// Policy for this invocation; [`ExecutionPolicy::default`] when absent
    pub policy: Option<ExecutionPolicy>,
}

impl CommandRequest {
    /// New request for the given executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the child's working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set one environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the stdin payload for line-oriented tools (httpx, waybackurls, ...)
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Attach an execution policy
    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Execute this request under its policy
    pub async fn run(self) -> ExecResult<ProcessOutput> {
        ProcessRunner::run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_args_in_order() {
        let request = CommandRequest::new("nmap")
            .arg("-sV")
            .args(["-p", "443", "example.com"]);
        assert_eq!(request.program, "nmap");
        assert_eq!(request.args, vec!["-sV", "-p", "443", "example.com"]);
    }

    #[test]
    fn env_entries_merge_into_one_map() {
        let request = CommandRequest::new("sqlmap")
            .env("HTTP_PROXY", "http://127.0.0.1:8080")
            .env("NO_COLOR", "1");
        let env = request.env.unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env["NO_COLOR"], "1");
    }

    #[test]
    fn stdin_and_cwd_are_recorded() {
        let request = CommandRequest::new("httpx")
            .stdin("https://a.com\nhttps://b.com\n")
            .current_dir("/tmp");
        assert_eq!(request.stdin.as_deref(), Some("https://a.com\nhttps://b.com\n"));
        assert_eq!(request.working_dir, Some(PathBuf::from("/tmp")));
    }
}
