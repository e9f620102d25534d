//! The process runner: spawn, bound, and reap one external command
//!
//! Four independent event sources race for each invocation: the caller's
//! cancellation token, the policy timer, the byte-cap check on every output
//! chunk, and process exit. A single `biased` select loop owns all four, so
//! the outcome resolves exactly once and later events for a terminated
//! process are never observed. Cancellation deterministically outranks a
//! near-simultaneous timeout.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, instrument, warn};

use crate::error::{ExecError, ExecResult};
use crate::exec::policy::ExecutionPolicy;
use crate::exec::request::CommandRequest;

const READ_CHUNK_SIZE: usize = 8192;

/// Captured output of a process that ran to natural exit.
///
/// A missing exit code (killed by a signal) is not coerced to a number; the
/// result normalizer turns it into a failure status instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Accumulated stdout, lossily decoded as UTF-8
    pub stdout: String,
    /// Accumulated stderr, lossily decoded as UTF-8
    pub stderr: String,
    /// Numeric exit code, absent when the process died to a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// True when the process exited with code zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How one supervised invocation ended
enum Fate {
    Exited(ExitStatus),
    Cancelled,
    TimedOut,
    Capped,
}

/// Executes [`CommandRequest`]s under their policies
pub struct ProcessRunner;

impl ProcessRunner {
    /// Run the command to one terminal outcome.
    ///
    /// Start failure, timeout, cap overrun, and cancellation all surface as
    /// [`ExecError`] variants through this same return channel. A non-zero
    /// exit code is not a runner-level error. On timeout or cap overrun the
    /// process is forcibly killed and buffered output is discarded.
    #[instrument(skip(request), fields(program = %request.program))]
    pub async fn run(request: CommandRequest) -> ExecResult<ProcessOutput> {
        let policy = request.policy.clone().unwrap_or_default();

        // Already-withdrawn requests never spawn a process.
        if policy.cancellation.is_cancelled() {
            debug!("request cancelled before spawn");
            return Err(ExecError::cancelled(request.program));
        }

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }
        if let Some(env) = &request.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::start_failure(request.program.as_str(), e.to_string()))?;
        debug!(pid = ?child.id(), "process started");

        if let Some(payload) = request.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                // Detached writer so a child that floods its output pipes
                // before draining stdin cannot deadlock the read loop.
                tokio::spawn(async move {
                    if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                        debug!(error = %e, "stdin payload not fully written");
                    }
                    let _ = stdin.shutdown().await;
                });
            }
        }

        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| ExecError::Io("child stdout pipe unavailable".to_string()))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| ExecError::Io("child stderr pipe unavailable".to_string()))?;

        let mut stdout_buf: Vec<u8> = Vec::new();
        let mut stderr_buf: Vec<u8> = Vec::new();

        let fate = Self::supervise(
            &mut child,
            stdout_pipe,
            stderr_pipe,
            &policy,
            &mut stdout_buf,
            &mut stderr_buf,
        )
        .await?;

        match fate {
            Fate::Exited(status) => {
                let output = ProcessOutput {
                    stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                    exit_code: status.code(),
                };
                debug!(exit_code = ?output.exit_code, "process exited");
                Ok(output)
            }
            Fate::Cancelled => {
                Self::kill(&mut child, &request.program).await;
                debug!("execution cancelled by caller");
                Err(ExecError::cancelled(request.program))
            }
            Fate::TimedOut => {
                Self::kill(&mut child, &request.program).await;
                warn!(timeout = ?policy.timeout, "process timed out");
                Err(ExecError::Timeout {
                    command: request.program,
                    timeout: policy.timeout,
                })
            }
            Fate::Capped => {
                Self::kill(&mut child, &request.program).await;
                warn!(limit = policy.max_output_bytes, "combined output cap exceeded");
                Err(ExecError::OutputCapExceeded {
                    command: request.program,
                    limit: policy.max_output_bytes,
                })
            }
        }
    }

    /// Drain both pipes while racing the timer, the cancellation token, and
    /// process exit. Returns on the first terminal event; the caller kills
    /// the child for every fate except natural exit.
    ///
    /// The child is awaited only once both pipes reach EOF, so no trailing
    /// output is lost and each stream's internal ordering is preserved.
    async fn supervise(
        child: &mut Child,
        mut stdout: ChildStdout,
        mut stderr: ChildStderr,
        policy: &ExecutionPolicy,
        stdout_buf: &mut Vec<u8>,
        stderr_buf: &mut Vec<u8>,
    ) -> ExecResult<Fate> {
        let cancelled = policy.cancellation.clone();
        let deadline = tokio::time::sleep(policy.timeout);
        tokio::pin!(deadline);

        let mut out_chunk = [0u8; READ_CHUNK_SIZE];
        let mut err_chunk = [0u8; READ_CHUNK_SIZE];
        let mut out_open = true;
        let mut err_open = true;
        let mut total_bytes: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => return Ok(Fate::Cancelled),
                _ = &mut deadline => return Ok(Fate::TimedOut),
                read = stdout.read(&mut out_chunk), if out_open => {
                    match read {
                        Ok(0) | Err(_) => out_open = false,
                        Ok(n) => {
                            total_bytes += n as u64;
                            if total_bytes > policy.max_output_bytes {
                                return Ok(Fate::Capped);
                            }
                            stdout_buf.extend_from_slice(&out_chunk[..n]);
                        }
                    }
                }
                read = stderr.read(&mut err_chunk), if err_open => {
                    match read {
                        Ok(0) | Err(_) => err_open = false,
                        Ok(n) => {
                            total_bytes += n as u64;
                            if total_bytes > policy.max_output_bytes {
                                return Ok(Fate::Capped);
                            }
                            stderr_buf.extend_from_slice(&err_chunk[..n]);
                        }
                    }
                }
                status = child.wait(), if !out_open && !err_open => {
                    return Ok(Fate::Exited(status?));
                }
            }
        }
    }

    async fn kill(child: &mut Child, program: &str) {
        if let Err(e) = child.kill().await {
            warn!(program, error = %e, "failed to kill process");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn short_policy(timeout_ms: u64) -> ExecutionPolicy {
        ExecutionPolicy::builder(CancellationToken::new())
            .caller_timeout(Some(Duration::from_millis(timeout_ms)))
            .build()
    }

    #[tokio::test]
    async fn captures_stdout_from_echo() {
        let output = CommandRequest::new("echo").arg("hello world").run().await.unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "hello world");
        assert_eq!(output.stderr, "");
        assert!(output.success());
    }

    #[tokio::test]
    async fn captures_stderr_separately() {
        let output = CommandRequest::new("sh")
            .args(["-c", "echo err output 1>&2"])
            .run()
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "");
        assert_eq!(output.stderr.trim(), "err output");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_a_runner_error() {
        let output = CommandRequest::new("sh")
            .args(["-c", "exit 42"])
            .run()
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(42));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn preserves_stream_ordering() {
        let output = CommandRequest::new("sh")
            .args(["-c", "for i in 1 2 3 4 5; do echo $i; done"])
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout, "1\n2\n3\n4\n5\n");
    }

    #[tokio::test]
    async fn times_out_and_kills_promptly() {
        let started = Instant::now();
        let result = CommandRequest::new("sleep")
            .arg("10")
            .policy(short_policy(100))
            .run()
            .await;
        match result {
            Err(ExecError::Timeout { timeout, .. }) => {
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn caps_output_even_when_process_would_exit_cleanly() {
        let policy = ExecutionPolicy::builder(CancellationToken::new())
            .max_output_bytes(100)
            .build();
        let result = CommandRequest::new("sh")
            .args(["-c", "printf '%0200d' 0"])
            .policy(policy)
            .run()
            .await;
        match result {
            Err(ExecError::OutputCapExceeded { limit, .. }) => assert_eq!(limit, 100),
            other => panic!("expected OutputCapExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn caps_unbounded_output() {
        let policy = ExecutionPolicy::builder(CancellationToken::new())
            .max_output_bytes(4096)
            .build();
        let result = CommandRequest::new("sh")
            .args(["-c", "while true; do echo xxxxxxxxxxxxxxxx; done"])
            .policy(policy)
            .run()
            .await;
        assert!(matches!(result, Err(ExecError::OutputCapExceeded { .. })));
    }

    #[tokio::test]
    async fn cap_counts_both_streams_combined() {
        let policy = ExecutionPolicy::builder(CancellationToken::new())
            .max_output_bytes(150)
            .build();
        let result = CommandRequest::new("sh")
            .args(["-c", "printf '%0100d' 0; printf '%0100d' 0 1>&2; sleep 1"])
            .policy(policy)
            .run()
            .await;
        assert!(matches!(result, Err(ExecError::OutputCapExceeded { .. })));
    }

    #[tokio::test]
    async fn cancellation_mid_execution() {
        let token = CancellationToken::new();
        let policy = ExecutionPolicy::builder(token.clone()).build();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        let started = Instant::now();
        let result = CommandRequest::new("sleep")
            .arg("10")
            .policy(policy)
            .run()
            .await;
        assert!(matches!(result, Err(ExecError::Cancelled { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn pre_cancelled_token_never_spawns() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = ExecutionPolicy::builder(token).build();
        // A nonexistent binary would yield StartFailure if spawn were attempted.
        let result = CommandRequest::new("definitely-not-a-real-binary-xyz")
            .policy(policy)
            .run()
            .await;
        assert!(matches!(result, Err(ExecError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn cancellation_outranks_near_simultaneous_timeout() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = ExecutionPolicy::builder(token)
            .caller_timeout(Some(Duration::from_millis(1)))
            .build();
        let result = CommandRequest::new("sleep")
            .arg("10")
            .policy(policy)
            .run()
            .await;
        assert!(matches!(result, Err(ExecError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn missing_binary_is_a_start_failure() {
        let result = CommandRequest::new("definitely-not-a-real-binary-xyz")
            .run()
            .await;
        match result {
            Err(ExecError::StartFailure { command, message }) => {
                assert_eq!(command, "definitely-not-a-real-binary-xyz");
                assert!(!message.is_empty());
            }
            other => panic!("expected StartFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stdin_payload_round_trips() {
        let output = CommandRequest::new("cat")
            .stdin("hello from stdin")
            .run()
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "hello from stdin");
    }

    #[tokio::test]
    async fn multiline_stdin_payload() {
        let output = CommandRequest::new("cat")
            .stdin("https://a.com\nhttps://b.com\n")
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout, "https://a.com\nhttps://b.com\n");
    }

    #[tokio::test]
    async fn respects_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let output = CommandRequest::new("pwd")
            .current_dir(dir.path())
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), canonical.display().to_string());
    }

    #[tokio::test]
    async fn passes_environment_to_child() {
        let output = CommandRequest::new("sh")
            .args(["-c", "printf '%s' \"$REDSCAN_TEST_VAR\""])
            .env("REDSCAN_TEST_VAR", "hello123")
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello123");
    }

    #[tokio::test]
    async fn concurrent_invocations_are_independent() {
        let (a, b, c) = tokio::join!(
            CommandRequest::new("echo").arg("one").run(),
            CommandRequest::new("echo").arg("two").run(),
            CommandRequest::new("sh").args(["-c", "exit 3"]).run(),
        );
        assert_eq!(a.unwrap().stdout.trim(), "one");
        assert_eq!(b.unwrap().stdout.trim(), "two");
        assert_eq!(c.unwrap().exit_code, Some(3));
    }
}
