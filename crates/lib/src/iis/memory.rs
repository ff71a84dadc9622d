use std::collections::BTreeMap;

use tracing::debug;

use crate::binding::{BindingQuery, SslEndpoint};
use crate::iis::{BindingStore, Certificate, StoreError, WebBinding};

/// In-memory [`BindingStore`].
///
/// Certificates are searched in insertion order, so the first one added
/// wins when several share a friendly name.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  bindings: Vec<WebBinding>,
  certificates: Vec<Certificate>,
  ssl_bindings: BTreeMap<String, Certificate>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_binding(mut self, binding: WebBinding) -> Self {
    self.bindings.push(binding);
    self
  }

  pub fn with_certificate(mut self, certificate: Certificate) -> Self {
    self.certificates.push(certificate);
    self
  }

  pub fn bindings(&self) -> &[WebBinding] {
    &self.bindings
  }

  /// Certificate attached at `endpoint`, if any.
  pub fn ssl_binding(&self, endpoint: &SslEndpoint) -> Option<&Certificate> {
    self.ssl_bindings.get(&endpoint.to_string())
  }

  fn position(&self, query: &BindingQuery) -> Option<usize> {
    let key = query.key().to_string();
    self.bindings.iter().position(|b| {
      b.site_name == query.site_name && b.protocol == query.protocol && b.binding_information == key
    })
  }
}

impl BindingStore for MemoryStore {
  fn get_web_bindings(&self, query: &BindingQuery) -> Result<Vec<WebBinding>, StoreError> {
    Ok(
      self
        .bindings
        .iter()
        .filter(|b| b.site_name == query.site_name && b.protocol == query.protocol)
        .cloned()
        .collect(),
    )
  }

  fn new_web_binding(&mut self, query: &BindingQuery) -> Result<(), StoreError> {
    if self.position(query).is_some() {
      return Err(StoreError::BindingExists {
        site_name: query.site_name.clone(),
        key: query.key().to_string(),
      });
    }
    debug!(site_name = %query.site_name, key = %query.key(), "binding added");
    self.bindings.push(WebBinding::from_query(query));
    Ok(())
  }

  fn remove_web_binding(&mut self, query: &BindingQuery) -> Result<(), StoreError> {
    let index = self.position(query).ok_or_else(|| StoreError::BindingNotFound {
      site_name: query.site_name.clone(),
      key: query.key().to_string(),
    })?;
    debug!(site_name = %query.site_name, key = %query.key(), "binding removed");
    self.bindings.remove(index);
    Ok(())
  }

  fn find_certificate(&self, friendly_name: &str) -> Result<Option<Certificate>, StoreError> {
    Ok(
      self
        .certificates
        .iter()
        .find(|c| c.friendly_name == friendly_name)
        .cloned(),
    )
  }

  fn ssl_binding_exists(&self, endpoint: &SslEndpoint) -> Result<bool, StoreError> {
    Ok(self.ssl_bindings.contains_key(&endpoint.to_string()))
  }

  fn new_ssl_binding(&mut self, endpoint: &SslEndpoint, certificate: &Certificate) -> Result<(), StoreError> {
    let path = endpoint.to_string();
    if self.ssl_bindings.contains_key(&path) {
      return Err(StoreError::SslBindingExists(path));
    }
    debug!(endpoint = %path, certificate = %certificate.friendly_name, "ssl binding added");
    self.ssl_bindings.insert(path, certificate.clone());
    Ok(())
  }
}
