//! Types for applying actions.
//!
//! This module defines the error type, per-action outcomes and the
//! configuration shared by the store-backed and PowerShell-backed appliers.

use serde::Serialize;
use thiserror::Error;

use crate::iis::{PowerShell, StoreError};

/// Errors that can occur while applying actions.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The script interpreter could not be started.
  #[error("failed to launch {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// A mutating script exited unsuccessfully.
  #[error("action {action} failed with exit code {code:?}: {stderr}")]
  ScriptFailed {
    action: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The binding store rejected a guard or operation.
  #[error("action {action} failed: {source}")]
  Store {
    action: String,
    #[source]
    source: StoreError,
  },
}

/// What happened to a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
  /// Guard said proceed and the operation ran.
  Applied,
  /// Guard reported the live state already satisfied.
  Skipped,
  /// Guard said proceed but this was a dry run.
  WouldApply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
  pub name: String,
  pub status: ActionStatus,
}

/// Result of applying a list of actions, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
  pub outcomes: Vec<ActionOutcome>,
}

impl ApplyReport {
  pub(crate) fn record(&mut self, name: &str, status: ActionStatus) {
    self.outcomes.push(ActionOutcome {
      name: name.to_string(),
      status,
    });
  }

  pub fn count(&self, status: ActionStatus) -> usize {
    self.outcomes.iter().filter(|o| o.status == status).count()
  }

  pub fn applied(&self) -> usize {
    self.count(ActionStatus::Applied)
  }

  pub fn skipped(&self) -> usize {
    self.count(ActionStatus::Skipped)
  }

  /// Returns true if nothing needed to change.
  pub fn is_converged(&self) -> bool {
    self.outcomes.iter().all(|o| o.status == ActionStatus::Skipped)
  }

  pub fn merge(&mut self, other: ApplyReport) {
    self.outcomes.extend(other.outcomes);
  }
}

/// Configuration for action execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteConfig {
  /// How PowerShell is launched.
  pub powershell: PowerShell,

  /// Evaluate guards but never run mutating scripts.
  pub dry_run: bool,
}
