//! Implementation of the `iisbind validate` command.
//!
//! Loads a manifest, validates every binding and prints the identity each
//! one resolves to.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct ValidatedBinding<'a> {
  title: &'a str,
  site_name: &'a str,
  protocol: &'a str,
  key: String,
  ensure: &'a str,
}

pub fn cmd_validate(path: &Path, format: OutputFormat) -> Result<()> {
  let (_, plan) = super::load_plan(path)?;

  let validated: Vec<_> = plan
    .bindings
    .iter()
    .map(|b| ValidatedBinding {
      title: &b.title,
      site_name: b.descriptor.site_name(),
      protocol: b.descriptor.protocol().as_str(),
      key: b.descriptor.key().to_string(),
      ensure: b.descriptor.ensure().as_str(),
    })
    .collect();

  if format.is_json() {
    return print_json(&validated);
  }

  print_success(&format!("{} binding(s) valid", validated.len()));
  for binding in &validated {
    print_stat(
      binding.title,
      &format!(
        "{} {} {} ({})",
        binding.site_name, binding.protocol, binding.key, binding.ensure
      ),
    );
  }

  Ok(())
}
