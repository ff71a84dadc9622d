//! Binding validation.
//!
//! [`BindingSpec`] mirrors the declared resource surface: every field is a
//! plain string (or, for `port`, a number or a string) exactly as it appears
//! in a manifest. [`BindingSpec::validate`] checks the fields in a fixed order
//! and reports the first violation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::binding::{BindingDescriptor, Ensure, IpSpec, Protocol};
use crate::consts::DEFAULT_ENSURE;

/// Errors produced while validating a declared binding.
///
/// Messages are stable; callers and tests match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
  #[error("site_name must not be empty")]
  EmptySiteName,

  #[error(
    "invalid protocol '{0}': valid protocols 'http', 'https', 'net.tcp', 'net.pipe', 'netmsmq', 'msmq.formatname'"
  )]
  InvalidProtocol(String),

  #[error("invalid port '{0}': port must be an integer between 1 and 65535")]
  InvalidPort(String),

  #[error("invalid ensure '{0}': valid values 'present', 'installed', 'absent', 'purged'")]
  InvalidEnsure(String),

  #[error("\"{0}\" is not a valid ip address")]
  InvalidIpAddress(String),

  #[error("certificate_name required for https bindings")]
  CertificateRequired,

  #[error("https bindings require a valid ip_address")]
  HttpsRequiresIpAddress,
}

/// A port as declared: manifests may write either `80` or `"80"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
  Number(i64),
  Text(String),
}

impl PortSpec {
  fn parse(&self) -> Result<u16, BindingError> {
    let port = match self {
      PortSpec::Number(n) => u16::try_from(*n).ok(),
      PortSpec::Text(s) => s.trim().parse::<u16>().ok(),
    };
    port
      .filter(|p| *p > 0)
      .ok_or_else(|| BindingError::InvalidPort(self.to_string()))
  }
}

impl Default for PortSpec {
  fn default() -> Self {
    PortSpec::Text(String::new())
  }
}

impl fmt::Display for PortSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PortSpec::Number(n) => write!(f, "{}", n),
      PortSpec::Text(s) => f.write_str(s),
    }
  }
}

impl From<u16> for PortSpec {
  fn from(port: u16) -> Self {
    PortSpec::Number(i64::from(port))
  }
}

impl From<&str> for PortSpec {
  fn from(port: &str) -> Self {
    PortSpec::Text(port.to_string())
  }
}

/// Raw, unvalidated binding parameters.
///
/// # Example
///
/// ```json
/// {
///   "site_name": "myWebSite",
///   "protocol": "https",
///   "port": "443",
///   "ip_address": "127.0.0.1",
///   "certificate_name": "myCertificate"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingSpec {
  pub site_name: String,
  pub protocol: String,
  pub port: PortSpec,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub host_header: Option<String>,
  /// Defaults to `*` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ip_address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub certificate_name: Option<String>,
  /// Defaults to `present` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ensure: Option<String>,
}

impl BindingSpec {
  pub fn new(site_name: impl Into<String>, protocol: impl Into<String>, port: impl Into<PortSpec>) -> Self {
    Self {
      site_name: site_name.into(),
      protocol: protocol.into(),
      port: port.into(),
      ..Default::default()
    }
  }

  pub fn with_host_header(mut self, host_header: impl Into<String>) -> Self {
    self.host_header = Some(host_header.into());
    self
  }

  pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
    self.ip_address = Some(ip_address.into());
    self
  }

  pub fn with_certificate_name(mut self, certificate_name: impl Into<String>) -> Self {
    self.certificate_name = Some(certificate_name.into());
    self
  }

  pub fn with_ensure(mut self, ensure: impl Into<String>) -> Self {
    self.ensure = Some(ensure.into());
    self
  }

  /// Validate and normalize into a [`BindingDescriptor`].
  ///
  /// Rules are checked in this order and the first violation is returned:
  ///
  /// 1. `site_name` is non-empty
  /// 2. `protocol` is one of the six IIS protocols
  /// 3. `port` is an integer in `1..=65535`
  /// 4. `ensure` is one of `present`, `installed`, `absent`, `purged`
  /// 5. `ip_address` is `*` or an IPv4/IPv6 literal
  /// 6. https bindings carry a non-empty `certificate_name`
  /// 7. https bindings name a concrete address (not `*`, `0.0.0.0` or `::`)
  pub fn validate(&self) -> Result<BindingDescriptor, BindingError> {
    let result = self.check();
    match &result {
      Ok(descriptor) => debug!(
        site_name = %descriptor.site_name(),
        key = %descriptor.key(),
        ensure = %descriptor.ensure(),
        "binding validated"
      ),
      Err(err) => warn!(site_name = %self.site_name, error = %err, "binding rejected"),
    }
    result
  }

  fn check(&self) -> Result<BindingDescriptor, BindingError> {
    if self.site_name.is_empty() {
      return Err(BindingError::EmptySiteName);
    }

    let protocol: Protocol = self.protocol.parse()?;
    let port = self.port.parse()?;
    let ensure: Ensure = self.ensure.as_deref().unwrap_or(DEFAULT_ENSURE).parse()?;

    let ip_address = match self.ip_address.as_deref() {
      Some(ip) => IpSpec::parse(ip)?,
      None => IpSpec::Any,
    };

    let certificate_name = self.certificate_name.clone().filter(|name| !name.is_empty());

    if protocol.is_https() {
      if certificate_name.is_none() {
        return Err(BindingError::CertificateRequired);
      }
      if ip_address.concrete().is_none() {
        return Err(BindingError::HttpsRequiresIpAddress);
      }
    }

    Ok(BindingDescriptor {
      site_name: self.site_name.clone(),
      protocol,
      port,
      host_header: self.host_header.clone().filter(|h| !h.is_empty()),
      ip_address,
      certificate_name,
      ensure,
    })
  }
}
