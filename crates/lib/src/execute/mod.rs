//! Applying guarded actions.
//!
//! Two appliers consume the [`Action`] lists produced by
//! [`crate::reconcile`]:
//!
//! - [`apply_actions`] evaluates guards and operations directly against a
//!   [`BindingStore`]
//! - [`run_actions`] renders both halves to PowerShell and runs them through a
//!   [`ScriptRunner`]; a guard exiting 0 means "proceed"
//!
//! Both stop at the first failing operation. A guard that says "skip" is not
//! a failure.

mod runner;
mod types;

pub use runner::{PowerShellRunner, ScriptOutput, ScriptRunner};
pub use types::*;

use tracing::{debug, info};

use crate::action::{Action, GuardDecision};
use crate::iis::BindingStore;
use crate::iis::powershell::{guard_script, operation_script};

/// Apply `actions` in order against `store`.
pub fn apply_actions<S: BindingStore + ?Sized>(
  store: &mut S,
  actions: &[Action],
  dry_run: bool,
) -> Result<ApplyReport, ExecuteError> {
  let mut report = ApplyReport::default();

  for action in actions {
    let store_error = |source| ExecuteError::Store {
      action: action.name.clone(),
      source,
    };

    let decision = action.guard.evaluate(&*store).map_err(store_error)?;
    let status = match decision {
      GuardDecision::Skip => ActionStatus::Skipped,
      GuardDecision::Proceed if dry_run => ActionStatus::WouldApply,
      GuardDecision::Proceed => {
        action.operation.apply(&mut *store).map_err(store_error)?;
        ActionStatus::Applied
      }
    };

    log_outcome(action, status);
    report.record(&action.name, status);
  }

  Ok(report)
}

/// Run `actions` in order through `runner`.
pub async fn run_actions<R: ScriptRunner>(
  runner: &R,
  actions: &[Action],
  config: &ExecuteConfig,
) -> Result<ApplyReport, ExecuteError> {
  let mut report = ApplyReport::default();

  for action in actions {
    let guard = runner.run(&guard_script(&action.guard)).await?;
    let status = if !guard.success() {
      ActionStatus::Skipped
    } else if config.dry_run {
      ActionStatus::WouldApply
    } else {
      let output = runner.run(&operation_script(&action.operation)).await?;
      if !output.success() {
        return Err(ExecuteError::ScriptFailed {
          action: action.name.clone(),
          code: output.code,
          stderr: output.stderr,
        });
      }
      ActionStatus::Applied
    };

    log_outcome(action, status);
    report.record(&action.name, status);
  }

  Ok(report)
}

fn log_outcome(action: &Action, status: ActionStatus) {
  match status {
    ActionStatus::Applied => info!(action = %action.name, "action applied"),
    ActionStatus::WouldApply => info!(action = %action.name, "action would apply (dry run)"),
    ActionStatus::Skipped => debug!(action = %action.name, "guard satisfied, skipping"),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::sync::Mutex;

  use tracing_test::traced_test;

  use super::*;
  use crate::binding::BindingSpec;
  use crate::iis::{Certificate, MemoryStore};
  use crate::reconcile::reconcile;

  fn https_actions() -> Vec<Action> {
    let descriptor = BindingSpec::new("myWebSite", "https", 443)
      .with_ip_address("127.0.0.1")
      .with_certificate_name("myCertificate")
      .validate()
      .unwrap();
    reconcile(&descriptor)
  }

  /// Runner answering from a table of exit codes per script (default 0) and
  /// recording every script it was given.
  #[derive(Default)]
  struct FakeRunner {
    codes: HashMap<String, i32>,
    ran: Mutex<Vec<String>>,
  }

  impl FakeRunner {
    fn exit(mut self, script: String, code: i32) -> Self {
      self.codes.insert(script, code);
      self
    }

    fn ran(&self) -> Vec<String> {
      self.ran.lock().unwrap().clone()
    }
  }

  impl ScriptRunner for FakeRunner {
    async fn run(&self, script: &str) -> Result<ScriptOutput, ExecuteError> {
      self.ran.lock().unwrap().push(script.to_string());
      Ok(ScriptOutput {
        code: Some(self.codes.get(script).copied().unwrap_or(0)),
        stdout: String::new(),
        stderr: String::new(),
      })
    }
  }

  #[test]
  fn applying_twice_converges() {
    let mut store = MemoryStore::new().with_certificate(Certificate::new("myCertificate", "AB12"));
    let actions = https_actions();

    let first = apply_actions(&mut store, &actions, false).unwrap();
    assert_eq!(first.applied(), 2);

    let second = apply_actions(&mut store, &actions, false).unwrap();
    assert!(second.is_converged());
    assert_eq!(second.skipped(), 2);
  }

  #[test]
  fn missing_certificate_skips_attach() {
    let mut store = MemoryStore::new();

    let report = apply_actions(&mut store, &https_actions(), false).unwrap();

    assert_eq!(
      report.outcomes.iter().map(|o| o.status).collect::<Vec<_>>(),
      vec![ActionStatus::Applied, ActionStatus::Skipped]
    );
  }

  #[test]
  fn dry_run_leaves_store_untouched() {
    let mut store = MemoryStore::new();

    let report = apply_actions(&mut store, &https_actions()[..1], true).unwrap();

    assert_eq!(report.count(ActionStatus::WouldApply), 1);
    assert!(store.bindings().is_empty());
  }

  #[traced_test]
  #[test]
  fn applied_actions_are_logged() {
    let mut store = MemoryStore::new();

    apply_actions(&mut store, &https_actions()[..1], false).unwrap();

    assert!(logs_contain("action applied"));
    assert!(logs_contain("CreateBinding-myWebSite-port-443"));
  }

  #[tokio::test]
  async fn runner_runs_guard_before_operation() {
    let actions = https_actions();
    let runner = FakeRunner::default();

    let report = run_actions(&runner, &actions, &ExecuteConfig::default()).await.unwrap();

    assert_eq!(report.applied(), 2);
    assert_eq!(
      runner.ran(),
      vec![
        guard_script(&actions[0].guard),
        operation_script(&actions[0].operation),
        guard_script(&actions[1].guard),
        operation_script(&actions[1].operation),
      ]
    );
  }

  #[tokio::test]
  async fn nonzero_guard_skips_operation() {
    let actions = https_actions();
    let runner = FakeRunner::default().exit(guard_script(&actions[0].guard), 1);

    let report = run_actions(&runner, &actions[..1], &ExecuteConfig::default()).await.unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(runner.ran(), vec![guard_script(&actions[0].guard)]);
  }

  #[tokio::test]
  async fn failed_operation_stops_run() {
    let actions = https_actions();
    let runner = FakeRunner::default().exit(operation_script(&actions[0].operation), 5);

    let result = run_actions(&runner, &actions, &ExecuteConfig::default()).await;

    assert!(matches!(
      result,
      Err(ExecuteError::ScriptFailed { action, code: Some(5), .. }) if action == "CreateBinding-myWebSite-port-443"
    ));
    assert_eq!(runner.ran().len(), 2);
  }

  #[tokio::test]
  async fn dry_run_only_runs_guards() {
    let actions = https_actions();
    let runner = FakeRunner::default();
    let config = ExecuteConfig {
      dry_run: true,
      ..Default::default()
    };

    let report = run_actions(&runner, &actions, &config).await.unwrap();

    assert_eq!(report.count(ActionStatus::WouldApply), 2);
    assert_eq!(runner.ran().len(), 2);
  }
}
