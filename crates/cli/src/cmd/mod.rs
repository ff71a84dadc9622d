mod apply;
mod plan;
mod validate;

pub use apply::cmd_apply;
pub use plan::cmd_plan;
pub use validate::cmd_validate;

use std::path::Path;

use anyhow::{Context, Result};

use iisbind_lib::manifest::{Manifest, Plan};

/// Load a manifest and plan it, with CLI-friendly error context.
fn load_plan(path: &Path) -> Result<(Manifest, Plan)> {
  let manifest = Manifest::load(path).with_context(|| format!("Failed to load manifest: {}", path.display()))?;
  let plan = manifest
    .plan()
    .with_context(|| format!("Invalid manifest: {}", path.display()))?;
  Ok((manifest, plan))
}
