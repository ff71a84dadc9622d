//! Script execution.
//!
//! [`ScriptRunner`] is the seam between the action applier and the host
//! shell. [`PowerShellRunner`] launches each script as a separate
//! PowerShell process.

use std::future::Future;

use tokio::process::Command;
use tracing::debug;

use crate::execute::types::ExecuteError;
use crate::iis::PowerShell;

/// Exit status and captured output of one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
  /// `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ScriptOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Runs a script and reports how it exited.
///
/// A non-zero exit is not an error at this level; the caller decides what
/// the status means.
pub trait ScriptRunner {
  fn run(&self, script: &str) -> impl Future<Output = Result<ScriptOutput, ExecuteError>> + Send;
}

/// Runs scripts through a PowerShell executable.
#[derive(Debug, Clone, Default)]
pub struct PowerShellRunner {
  powershell: PowerShell,
}

impl PowerShellRunner {
  pub fn new(powershell: PowerShell) -> Self {
    Self { powershell }
  }
}

impl ScriptRunner for PowerShellRunner {
  async fn run(&self, script: &str) -> Result<ScriptOutput, ExecuteError> {
    let program = &self.powershell.executable;
    debug!(program = %program, script = %script, "spawning script");

    let output = Command::new(program)
      .args(&self.powershell.args)
      .arg(script)
      .output()
      .await
      .map_err(|source| ExecuteError::Spawn {
        program: program.clone(),
        source,
      })?;

    let result = ScriptOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };

    if !result.stderr.is_empty() {
      debug!(stderr = %result.stderr, "script stderr");
    }
    if !result.stdout.is_empty() {
      debug!(stdout = %result.stdout, "script stdout");
    }

    Ok(result)
  }
}
