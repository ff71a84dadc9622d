//! The IIS binding store.
//!
//! IIS is treated as a black box reachable through a handful of
//! WebAdministration verbs. [`BindingStore`] names exactly those verbs;
//! guards and operations in [`crate::action`] are written against it.
//!
//! - [`MemoryStore`] keeps the state in memory (tests, dry runs)
//! - [`powershell`] renders the same verbs as WebAdministration scripts

mod memory;
pub mod powershell;

pub use memory::MemoryStore;
pub use powershell::PowerShell;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binding::{BindingQuery, Protocol, SslEndpoint};

/// Errors reported by a [`BindingStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  #[error("binding '{key}' already exists on site '{site_name}'")]
  BindingExists { site_name: String, key: String },

  #[error("binding '{key}' not found on site '{site_name}'")]
  BindingNotFound { site_name: String, key: String },

  #[error("no certificate with friendly name '{0}'")]
  CertificateNotFound(String),

  #[error("ssl binding already exists at {0}")]
  SslBindingExists(String),

  #[error("binding store error: {0}")]
  Backend(String),
}

/// A binding record as `Get-WebBinding` reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebBinding {
  pub site_name: String,
  pub protocol: Protocol,
  /// `"<ip>:<port>:<host>"`
  pub binding_information: String,
}

impl WebBinding {
  pub fn from_query(query: &BindingQuery) -> Self {
    Self {
      site_name: query.site_name.clone(),
      protocol: query.protocol,
      binding_information: query.key().to_string(),
    }
  }
}

/// A certificate in the machine's certificate store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
  pub friendly_name: String,
  pub thumbprint: String,
}

impl Certificate {
  pub fn new(friendly_name: impl Into<String>, thumbprint: impl Into<String>) -> Self {
    Self {
      friendly_name: friendly_name.into(),
      thumbprint: thumbprint.into(),
    }
  }
}

/// The verbs the reconciler may use against IIS.
pub trait BindingStore {
  /// `Get-WebBinding`: bindings of the query's site and protocol.
  ///
  /// Callers test the returned `binding_information` for an exact key match;
  /// implementations may return a superset.
  fn get_web_bindings(&self, query: &BindingQuery) -> Result<Vec<WebBinding>, StoreError>;

  /// `New-WebBinding`
  fn new_web_binding(&mut self, query: &BindingQuery) -> Result<(), StoreError>;

  /// `Remove-WebBinding`
  fn remove_web_binding(&mut self, query: &BindingQuery) -> Result<(), StoreError>;

  /// First certificate whose friendly name equals `friendly_name`.
  fn find_certificate(&self, friendly_name: &str) -> Result<Option<Certificate>, StoreError>;

  /// `Test-Path IIS:\SslBindings\<ip>!<port>`
  fn ssl_binding_exists(&self, endpoint: &SslEndpoint) -> Result<bool, StoreError>;

  /// `New-Item IIS:\SslBindings\<ip>!<port> -Value <certificate>`
  fn new_ssl_binding(&mut self, endpoint: &SslEndpoint, certificate: &Certificate) -> Result<(), StoreError>;
}
