//! Out-of-process transport for everything OS-side: `osascript` queries for
//! the media players and the calendar store, and fire-and-forget `open`
//! launches. Failures here are expected operating conditions (target app not
//! installed, not running, permission refused) and callers treat them as
//! "no data".

use std::path::Path;
use std::process::{Command, ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to run osascript: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("script exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Runs a script source out of process and returns its trimmed stdout.
/// Boxed into the media worker; tests substitute canned responses.
pub trait ScriptRunner: Send {
    fn run(&self, source: &str) -> Result<String, ScriptError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsaScriptRunner;

impl ScriptRunner for OsaScriptRunner {
    fn run(&self, source: &str) -> Result<String, ScriptError> {
        let output = Command::new("osascript").arg("-e").arg(source).output()?;
        if !output.status.success() {
            return Err(ScriptError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Opens a file or application bundle through the system handler. Errors are
/// logged and swallowed; the caller never hears about them.
pub fn open_path(path: &Path) {
    match Command::new("open").arg(path).spawn() {
        Ok(_) => log::debug!("open: launched {}", path.display()),
        Err(err) => log::warn!("open: {} failed: {err}", path.display()),
    }
}
