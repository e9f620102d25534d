//! Result normalizer: shape a completed process outcome into the protocol
//! response every adapter returns
//!
//! Runner-level terminal failures (timeout, cap, cancellation, start
//! failure) are surfaced upstream before this step; the normalizer consumes
//! only exit code, stdout, and stderr.

use crate::error::{ExecError, ExecResult};
use crate::exec::ProcessOutput;
use crate::sanitize::strip_ansi_codes;

/// Formatting options for one tool's normalized response
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Tool name used in error and fallback messages
    pub tool_name: String,
    /// Always append stderr to stdout in success output
    pub include_stderr: bool,
    /// Strip ANSI escape codes from the composed output (useful for tools
    /// that color their terminal output unconditionally)
    pub strip_ansi: bool,
    /// Custom message when output is empty; defaults to
    /// `No output from <tool>.`
    pub empty_message: Option<String>,
}

impl FormatOptions {
    /// Options for the named tool with all flags off
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            include_stderr: false,
            strip_ansi: false,
            empty_message: None,
        }
    }

    /// Always append stderr to success output
    pub fn include_stderr(mut self) -> Self {
        self.include_stderr = true;
        self
    }

    /// Strip ANSI escapes as a final pass over the composed text
    pub fn strip_ansi(mut self) -> Self {
        self.strip_ansi = true;
        self
    }

    /// Message to return when the tool produced no output at all
    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = Some(message.into());
        self
    }
}

/// Convert a completed process outcome into success text or a failure.
///
/// Non-zero exit raises [`ExecError::ToolFailure`] with a body chosen as
/// stderr, else stdout, else a literal "unknown error". A missing exit code
/// (signal death) raises [`ExecError::ToolSignalled`] rather than inventing
/// a numeric code. On success, ANSI stripping runs as a final pass over the
/// fully composed text, never before composition, so it cannot distort the
/// stdout/stderr concatenation boundary.
pub fn normalize_output(output: &ProcessOutput, options: &FormatOptions) -> ExecResult<String> {
    match output.exit_code {
        Some(0) => {}
        code => {
            let body = if !output.stderr.is_empty() {
                output.stderr.as_str()
            } else if !output.stdout.is_empty() {
                output.stdout.as_str()
            } else {
                "unknown error"
            };
            let detail = if options.strip_ansi {
                strip_ansi_codes(body)
            } else {
                body.to_string()
            };
            return Err(match code {
                Some(code) => ExecError::ToolFailure {
                    tool: options.tool_name.clone(),
                    code,
                    detail,
                },
                None => ExecError::ToolSignalled {
                    tool: options.tool_name.clone(),
                    detail,
                },
            });
        }
    }

    let mut text = output.stdout.clone();
    if options.include_stderr && !output.stderr.is_empty() {
        text.push_str(&output.stderr);
    } else if text.is_empty() && !output.stderr.is_empty() {
        // Some tools report exclusively on stderr even on success.
        text = output.stderr.clone();
    }

    if options.strip_ansi {
        text = strip_ansi_codes(&text);
    }

    if text.is_empty() {
        text = options
            .empty_message
            .clone()
            .unwrap_or_else(|| format!("No output from {}.", options.tool_name));
    }

    Ok(text)
}
