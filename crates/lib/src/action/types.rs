use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::binding::{BindingQuery, SslEndpoint};
use crate::iis::{BindingStore, StoreError};

/// What an action does, independent of the binding it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionVerb {
  CreateBinding,
  DeleteBinding,
  AttachCertificate,
}

impl ActionVerb {
  /// Prefix used when naming an action.
  pub fn prefix(&self) -> &'static str {
    match self {
      Self::CreateBinding => "CreateBinding",
      Self::DeleteBinding => "DeleteBinding",
      Self::AttachCertificate => "Attach-Certificate",
    }
  }

  /// Build the action name: `<prefix>-<site_name>-port-<port>`.
  pub fn action_name(&self, site_name: &str, port: u16) -> String {
    format!("{}-{}-port-{}", self.prefix(), site_name, port)
  }
}

impl fmt::Display for ActionVerb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.prefix())
  }
}

/// Outcome of evaluating a [`Guard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardDecision {
  /// The live state already matches; skip the operation.
  Skip,
  /// The operation is needed.
  Proceed,
}

/// Side-effect-free check deciding whether an [`Operation`] must run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Guard {
  /// Proceed only if no binding of the site/protocol carries the query's key.
  BindingMissing(BindingQuery),
  /// Proceed only if a binding of the site/protocol carries the query's key.
  BindingExists(BindingQuery),
  /// Proceed only if the certificate can be found and the endpoint has no
  /// SSL binding yet.
  CertificateAttachable {
    certificate_name: String,
    endpoint: SslEndpoint,
  },
}

impl Guard {
  pub fn evaluate<S: BindingStore + ?Sized>(&self, store: &S) -> Result<GuardDecision, StoreError> {
    let proceed = match self {
      Guard::BindingMissing(query) => !binding_matches(store, query)?,
      Guard::BindingExists(query) => binding_matches(store, query)?,
      Guard::CertificateAttachable {
        certificate_name,
        endpoint,
      } => {
        let found = store.find_certificate(certificate_name)?.is_some();
        if !found {
          debug!(certificate = %certificate_name, "certificate not found, attachment not yet possible");
        }
        found && !store.ssl_binding_exists(endpoint)?
      }
    };

    Ok(if proceed { GuardDecision::Proceed } else { GuardDecision::Skip })
  }
}

/// Exact match on `bindingInformation` among the bindings the query returns.
fn binding_matches<S: BindingStore + ?Sized>(store: &S, query: &BindingQuery) -> Result<bool, StoreError> {
  let key = query.key().to_string();
  Ok(
    store
      .get_web_bindings(query)?
      .iter()
      .any(|binding| binding.binding_information == key),
  )
}

/// The mutating half of an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
  NewWebBinding(BindingQuery),
  RemoveWebBinding(BindingQuery),
  /// Bind the first certificate whose friendly name matches to `endpoint`.
  AttachCertificate {
    certificate_name: String,
    endpoint: SslEndpoint,
  },
}

impl Operation {
  pub fn verb(&self) -> ActionVerb {
    match self {
      Operation::NewWebBinding(_) => ActionVerb::CreateBinding,
      Operation::RemoveWebBinding(_) => ActionVerb::DeleteBinding,
      Operation::AttachCertificate { .. } => ActionVerb::AttachCertificate,
    }
  }

  pub fn apply<S: BindingStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
    match self {
      Operation::NewWebBinding(query) => store.new_web_binding(query),
      Operation::RemoveWebBinding(query) => store.remove_web_binding(query),
      Operation::AttachCertificate {
        certificate_name,
        endpoint,
      } => {
        let certificate = store
          .find_certificate(certificate_name)?
          .ok_or_else(|| StoreError::CertificateNotFound(certificate_name.clone()))?;
        store.new_ssl_binding(endpoint, &certificate)
      }
    }
  }
}

/// A named, guarded unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
  /// Unique name, e.g. `CreateBinding-myWebSite-port-80`.
  pub name: String,
  pub guard: Guard,
  pub operation: Operation,
}

impl Action {
  pub fn new(site_name: &str, port: u16, guard: Guard, operation: Operation) -> Self {
    Self {
      name: operation.verb().action_name(site_name, port),
      guard,
      operation,
    }
  }

  pub fn verb(&self) -> ActionVerb {
    self.operation.verb()
  }
}

#[cfg(test)]
mod tests {
  use std::net::{IpAddr, Ipv4Addr};

  use super::*;
  use crate::binding::{IpSpec, Protocol};
  use crate::iis::{Certificate, MemoryStore};

  fn query() -> BindingQuery {
    BindingQuery {
      site_name: "myWebSite".to_string(),
      port: 80,
      protocol: Protocol::Http,
      host_header: "myHost.example.com".to_string(),
      ip_address: IpSpec::Any,
    }
  }

  fn endpoint() -> SslEndpoint {
    SslEndpoint {
      ip_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: 443,
    }
  }

  #[test]
  fn action_names() {
    assert_eq!(
      ActionVerb::CreateBinding.action_name("myWebSite", 80),
      "CreateBinding-myWebSite-port-80"
    );
    assert_eq!(
      ActionVerb::AttachCertificate.action_name("myWebSite", 443),
      "Attach-Certificate-myWebSite-port-443"
    );
    assert_eq!(
      ActionVerb::DeleteBinding.action_name("myWebSite", 80),
      "DeleteBinding-myWebSite-port-80"
    );
  }

  #[test]
  fn binding_missing_guard_flips_after_create() {
    let mut store = MemoryStore::new();
    let guard = Guard::BindingMissing(query());

    assert_eq!(guard.evaluate(&store).unwrap(), GuardDecision::Proceed);
    Operation::NewWebBinding(query()).apply(&mut store).unwrap();
    assert_eq!(guard.evaluate(&store).unwrap(), GuardDecision::Skip);
  }

  #[test]
  fn binding_guard_requires_exact_key() {
    let mut store = MemoryStore::new();
    let mut other = query();
    other.host_header = "other.example.com".to_string();
    store.new_web_binding(&other).unwrap();

    assert_eq!(Guard::BindingMissing(query()).evaluate(&store).unwrap(), GuardDecision::Proceed);
    assert_eq!(Guard::BindingExists(query()).evaluate(&store).unwrap(), GuardDecision::Skip);
  }

  #[test]
  fn certificate_guard_skips_without_certificate() {
    let store = MemoryStore::new();
    let guard = Guard::CertificateAttachable {
      certificate_name: "myCertificate".to_string(),
      endpoint: endpoint(),
    };

    assert_eq!(guard.evaluate(&store).unwrap(), GuardDecision::Skip);
  }

  #[test]
  fn certificate_guard_skips_bound_endpoint() {
    let mut store = MemoryStore::new().with_certificate(Certificate::new("myCertificate", "AB12"));
    let guard = Guard::CertificateAttachable {
      certificate_name: "myCertificate".to_string(),
      endpoint: endpoint(),
    };
    let attach = Operation::AttachCertificate {
      certificate_name: "myCertificate".to_string(),
      endpoint: endpoint(),
    };

    assert_eq!(guard.evaluate(&store).unwrap(), GuardDecision::Proceed);
    attach.apply(&mut store).unwrap();
    assert_eq!(guard.evaluate(&store).unwrap(), GuardDecision::Skip);
    assert_eq!(store.ssl_binding(&endpoint()).map(|c| c.thumbprint.as_str()), Some("AB12"));
  }

  #[test]
  fn attach_without_certificate_is_store_error() {
    let mut store = MemoryStore::new();
    let attach = Operation::AttachCertificate {
      certificate_name: "missing".to_string(),
      endpoint: endpoint(),
    };

    assert!(matches!(
      attach.apply(&mut store),
      Err(StoreError::CertificateNotFound(name)) if name == "missing"
    ));
  }
}
