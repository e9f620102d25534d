//! Path guard: confine caller-supplied paths to an allowed root
//!
//! Wordlist and output-file parameters come from protocol clients, so every
//! such path is resolved against a fixed base directory before it ever
//! reaches a command line. Resolution is purely lexical (`.` and `..`
//! collapse without touching the filesystem), and rejection happens before
//! any process is spawned.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{ExecError, ExecResult};

/// Resolve `candidate` against `allowed_base` and reject traversal.
///
/// A relative candidate resolves under the base; an absolute candidate
/// stands alone. Either way the normalized result must equal the base or
/// sit strictly below it. `sanitize_path(".", base)` resolves to the base
/// itself.
pub fn sanitize_path(
    candidate: impl AsRef<Path>,
    allowed_base: impl AsRef<Path>,
) -> ExecResult<PathBuf> {
    let candidate = candidate.as_ref();
    let base = absolutize(allowed_base.as_ref())?;

    let resolved = if candidate.is_absolute() {
        normalize(candidate)
    } else {
        normalize(&base.join(candidate))
    };

    if !resolved.starts_with(&base) {
        warn!(path = %candidate.display(), base = %base.display(), "path traversal rejected");
        return Err(ExecError::PathTraversal {
            path: candidate.display().to_string(),
            base: base.display().to_string(),
        });
    }

    Ok(resolved)
}

fn absolutize(path: &Path) -> ExecResult<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Collapse `.` and `..` components lexically. Popping past the root is a
/// no-op, matching how shells resolve `/..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
