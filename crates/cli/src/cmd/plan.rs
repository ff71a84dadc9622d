//! Implementation of the `iisbind plan` command.
//!
//! Prints, for every declared binding, the PowerShell command each action
//! would run and the guard (`onlyif`) deciding whether it runs.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use iisbind_lib::action::ActionVerb;
use iisbind_lib::iis::powershell::{RenderedAction, render_action};

use crate::output::{OutputFormat, print_info, print_json, symbols};

#[derive(Serialize)]
struct PlannedOutput<'a> {
  title: &'a str,
  key: String,
  actions: Vec<RenderedAction>,
}

pub fn cmd_plan(path: &Path, format: OutputFormat) -> Result<()> {
  let (manifest, plan) = super::load_plan(path)?;
  let powershell = manifest.powershell();

  let planned: Vec<_> = plan
    .bindings
    .iter()
    .map(|b| PlannedOutput {
      title: &b.title,
      key: b.descriptor.key().to_string(),
      actions: b.actions.iter().map(|a| render_action(a, &powershell)).collect(),
    })
    .collect();

  if format.is_json() {
    return print_json(&planned);
  }

  for (binding, output) in plan.bindings.iter().zip(&planned) {
    println!("{} [{}]", output.title, output.key);
    for (action, rendered) in binding.actions.iter().zip(&output.actions) {
      let symbol = match action.verb() {
        ActionVerb::DeleteBinding => symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
        _ => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
      };
      println!("  {} {}", symbol, rendered.name);
      println!("      command: {}", rendered.command);
      println!("      onlyif:  {}", rendered.onlyif);
    }
  }

  println!();
  print_info(&format!(
    "{} binding(s), {} action(s)",
    plan.bindings.len(),
    plan.action_count()
  ));

  Ok(())
}
