//! Implementation of the `iisbind apply` command.
//!
//! Runs every planned action through PowerShell: each guard first, then the
//! mutating command when the guard exits 0.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::info;

use iisbind_lib::execute::{ActionStatus, ExecuteConfig, PowerShellRunner, run_actions};

use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, symbols};

pub fn cmd_apply(path: &Path, dry_run: bool, format: OutputFormat) -> Result<()> {
  let (manifest, plan) = super::load_plan(path)?;

  let config = ExecuteConfig {
    powershell: manifest.powershell(),
    dry_run,
  };
  let runner = PowerShellRunner::new(config.powershell.clone());
  let actions: Vec<_> = plan.actions().cloned().collect();

  info!(actions = actions.len(), dry_run, "applying manifest");

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(run_actions(&runner, &actions, &config))
    .context("Apply failed")?;
  let elapsed = start.elapsed();

  if format.is_json() {
    return print_json(&report);
  }

  for outcome in &report.outcomes {
    let symbol = match outcome.status {
      ActionStatus::Applied => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
      ActionStatus::WouldApply => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
      ActionStatus::Skipped => symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
    };
    println!("  {} {}", symbol, outcome.name);
  }

  println!();
  if dry_run {
    print_success("Dry run complete");
    print_stat("Would apply", &report.count(ActionStatus::WouldApply).to_string());
  } else {
    print_success("Apply complete");
    print_stat("Applied", &report.applied().to_string());
  }
  print_stat("Unchanged", &report.skipped().to_string());
  print_stat("Took", &format_duration(elapsed));

  Ok(())
}
