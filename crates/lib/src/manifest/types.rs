//! Manifest types.
//!
//! A manifest is the declared set of bindings for one host, keyed by a
//! unique title. It is read from JSON (or YAML, chosen by file extension)
//! and planned into per-binding action lists.
//!
//! # Example
//!
//! ```json
//! {
//!   "bindings": {
//!     "myWebSite-port-80": {
//!       "site_name": "myWebSite",
//!       "protocol": "http",
//!       "port": 80,
//!       "host_header": "myHost.example.com"
//!     },
//!     "myWebSite-port-443": {
//!       "site_name": "myWebSite",
//!       "protocol": "https",
//!       "port": 443,
//!       "ip_address": "127.0.0.1",
//!       "certificate_name": "myCertificate"
//!     }
//!   }
//! }
//! ```
//!
//! Uses [`BTreeMap`] so bindings are always planned in title order.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::action::Action;
use crate::binding::{BindingDescriptor, BindingError, BindingSpec};
use crate::iis::PowerShell;
use crate::reconcile::reconcile;

/// Errors that can occur when loading or planning a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse manifest: {0}")]
  Json(#[from] serde_json::Error),

  #[error("failed to parse manifest: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("binding '{title}': {source}")]
  InvalidBinding {
    title: String,
    #[source]
    source: BindingError,
  },

  #[error("bindings '{first}' and '{second}' both declare action {action}")]
  DuplicateAction {
    action: String,
    first: String,
    second: String,
  },
}

/// The declared bindings of one host.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
  /// Overrides how PowerShell is launched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub powershell: Option<PowerShell>,
  /// Declared bindings, keyed by title.
  #[serde(default)]
  pub bindings: BTreeMap<String, BindingSpec>,
}

impl Manifest {
  /// Load a manifest file. `.yaml`/`.yml` files are parsed as YAML, anything
  /// else as JSON.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let is_yaml = matches!(
      path.extension().and_then(|e| e.to_str()),
      Some("yaml") | Some("yml")
    );
    let manifest = if is_yaml {
      Self::from_yaml(&content)?
    } else {
      Self::from_json(&content)?
    };

    debug!(path = %path.display(), bindings = manifest.bindings.len(), "manifest loaded");
    Ok(manifest)
  }

  pub fn from_json(content: &str) -> Result<Self, ManifestError> {
    Ok(serde_json::from_str(content)?)
  }

  pub fn from_yaml(content: &str) -> Result<Self, ManifestError> {
    Ok(serde_yaml::from_str(content)?)
  }

  /// PowerShell settings in effect for this manifest.
  pub fn powershell(&self) -> PowerShell {
    self.powershell.clone().unwrap_or_default()
  }

  /// Validate every binding and compute its actions.
  ///
  /// Fails on the first invalid binding (in title order), or when two
  /// bindings would produce an action with the same name.
  pub fn plan(&self) -> Result<Plan, ManifestError> {
    let mut bindings = Vec::with_capacity(self.bindings.len());
    let mut owners: HashMap<String, String> = HashMap::new();

    for (title, spec) in &self.bindings {
      let descriptor = spec.validate().map_err(|source| ManifestError::InvalidBinding {
        title: title.clone(),
        source,
      })?;
      let actions = reconcile(&descriptor);

      for action in &actions {
        if let Some(first) = owners.insert(action.name.clone(), title.clone()) {
          return Err(ManifestError::DuplicateAction {
            action: action.name.clone(),
            first,
            second: title.clone(),
          });
        }
      }

      bindings.push(PlannedBinding {
        title: title.clone(),
        descriptor,
        actions,
      });
    }

    let plan = Plan { bindings };
    info!(bindings = plan.bindings.len(), actions = plan.action_count(), "manifest planned");
    Ok(plan)
  }
}

/// A validated binding and the actions reconciling it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedBinding {
  pub title: String,
  pub descriptor: BindingDescriptor,
  pub actions: Vec<Action>,
}

/// Every binding of a manifest, planned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
  pub bindings: Vec<PlannedBinding>,
}

impl Plan {
  pub fn action_count(&self) -> usize {
    self.bindings.iter().map(|b| b.actions.len()).sum()
  }

  /// All actions, in binding order.
  pub fn actions(&self) -> impl Iterator<Item = &Action> {
    self.bindings.iter().flat_map(|b| b.actions.iter())
  }
}
