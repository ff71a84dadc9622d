//! Binding data model.
//!
//! Closed enumerations ([`Protocol`], [`Ensure`]) and the wildcard-aware
//! [`IpSpec`] make invalid values unrepresentable once a binding has been
//! validated.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::binding::BindingError;
use crate::consts::ANY_ADDRESS;

/// Protocols IIS accepts for a site binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
  #[serde(rename = "http")]
  Http,
  #[serde(rename = "https")]
  Https,
  #[serde(rename = "net.tcp")]
  NetTcp,
  #[serde(rename = "net.pipe")]
  NetPipe,
  #[serde(rename = "netmsmq")]
  NetMsmq,
  #[serde(rename = "msmq.formatname")]
  MsmqFormatName,
}

impl Protocol {
  /// Every accepted protocol, in the order error messages list them.
  pub const ALL: [Protocol; 6] = [
    Protocol::Http,
    Protocol::Https,
    Protocol::NetTcp,
    Protocol::NetPipe,
    Protocol::NetMsmq,
    Protocol::MsmqFormatName,
  ];

  /// Returns the identifier IIS uses for this protocol.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Http => "http",
      Self::Https => "https",
      Self::NetTcp => "net.tcp",
      Self::NetPipe => "net.pipe",
      Self::NetMsmq => "netmsmq",
      Self::MsmqFormatName => "msmq.formatname",
    }
  }

  pub fn is_https(&self) -> bool {
    matches!(self, Self::Https)
  }
}

impl fmt::Display for Protocol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Protocol {
  type Err = BindingError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Protocol::ALL
      .into_iter()
      .find(|p| p.as_str() == s)
      .ok_or_else(|| BindingError::InvalidProtocol(s.to_string()))
  }
}

/// Desired lifecycle state of a binding.
///
/// `Present`/`Installed` and `Absent`/`Purged` are synonyms; the declared
/// spelling is kept so it can be echoed back, but the reconciler only looks
/// at [`Ensure::wants_present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
  #[default]
  Present,
  Installed,
  Absent,
  Purged,
}

impl Ensure {
  pub const ALL: [Ensure; 4] = [Ensure::Present, Ensure::Installed, Ensure::Absent, Ensure::Purged];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Present => "present",
      Self::Installed => "installed",
      Self::Absent => "absent",
      Self::Purged => "purged",
    }
  }

  /// True when the binding (and its certificate, for https) must exist.
  pub fn wants_present(&self) -> bool {
    matches!(self, Self::Present | Self::Installed)
  }
}

impl fmt::Display for Ensure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Ensure {
  type Err = BindingError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ensure::ALL
      .into_iter()
      .find(|e| e.as_str() == s)
      .ok_or_else(|| BindingError::InvalidEnsure(s.to_string()))
  }
}

/// The address part of a binding: either the `*` wildcard or a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IpSpec {
  #[default]
  Any,
  Specific(IpAddr),
}

impl IpSpec {
  /// Parse a user-supplied address. `*` is the wildcard; anything else must
  /// be an IPv4 or IPv6 literal.
  pub fn parse(s: &str) -> Result<Self, BindingError> {
    if s == ANY_ADDRESS {
      return Ok(Self::Any);
    }
    IpAddr::from_str(s)
      .map(Self::Specific)
      .map_err(|_| BindingError::InvalidIpAddress(s.to_string()))
  }

  /// Returns the address when it names one specific, non-zero interface.
  ///
  /// SSL attachment needs such an address; `*`, `0.0.0.0` and `::` do not
  /// qualify.
  pub fn concrete(&self) -> Option<IpAddr> {
    match self {
      Self::Specific(ip) if !ip.is_unspecified() => Some(*ip),
      _ => None,
    }
  }

  /// The form IIS writes inside `bindingInformation` (IPv6 is bracketed).
  pub fn binding_host(&self) -> String {
    match self {
      Self::Specific(IpAddr::V6(v6)) => format!("[{}]", v6),
      other => other.to_string(),
    }
  }
}

impl fmt::Display for IpSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Any => f.write_str(ANY_ADDRESS),
      Self::Specific(ip) => write!(f, "{}", ip),
    }
  }
}

impl Serialize for IpSpec {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// Identity IIS uses to match an existing binding: `"<ip>:<port>:<host>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
  pub ip_address: IpSpec,
  pub port: u16,
  pub host_header: String,
}

impl fmt::Display for BindingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.ip_address.binding_host(), self.port, self.host_header)
  }
}

impl Serialize for BindingKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// The parameter set shared by `Get-WebBinding`, `New-WebBinding` and
/// `Remove-WebBinding`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BindingQuery {
  pub site_name: String,
  pub port: u16,
  pub protocol: Protocol,
  pub host_header: String,
  pub ip_address: IpSpec,
}

impl BindingQuery {
  pub fn key(&self) -> BindingKey {
    BindingKey {
      ip_address: self.ip_address,
      port: self.port,
      host_header: self.host_header.clone(),
    }
  }
}

/// An `ip!port` endpoint in the SSL binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SslEndpoint {
  pub ip_address: IpAddr,
  pub port: u16,
}

impl SslEndpoint {
  /// Provider path of this endpoint, e.g. `IIS:\SslBindings\127.0.0.1!443`.
  pub fn provider_path(&self) -> String {
    format!("IIS:\\SslBindings\\{}", self)
  }
}

impl fmt::Display for SslEndpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}!{}", self.ip_address, self.port)
  }
}

impl Serialize for SslEndpoint {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// A validated binding.
///
/// Only [`BindingSpec::validate`](crate::binding::BindingSpec::validate)
/// constructs one, so the invariants below always hold:
/// - `site_name` is non-empty
/// - for https, `certificate_name` is non-empty and `ip_address` is concrete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDescriptor {
  pub(super) site_name: String,
  pub(super) protocol: Protocol,
  pub(super) port: u16,
  pub(super) host_header: Option<String>,
  pub(super) ip_address: IpSpec,
  pub(super) certificate_name: Option<String>,
  pub(super) ensure: Ensure,
}

impl BindingDescriptor {
  pub fn site_name(&self) -> &str {
    &self.site_name
  }

  pub fn protocol(&self) -> Protocol {
    self.protocol
  }

  pub fn port(&self) -> u16 {
    self.port
  }

  pub fn host_header(&self) -> Option<&str> {
    self.host_header.as_deref()
  }

  pub fn ip_address(&self) -> IpSpec {
    self.ip_address
  }

  pub fn certificate_name(&self) -> Option<&str> {
    self.certificate_name.as_deref()
  }

  pub fn ensure(&self) -> Ensure {
    self.ensure
  }

  pub fn query(&self) -> BindingQuery {
    BindingQuery {
      site_name: self.site_name.clone(),
      port: self.port,
      protocol: self.protocol,
      host_header: self.host_header.clone().unwrap_or_default(),
      ip_address: self.ip_address,
    }
  }

  pub fn key(&self) -> BindingKey {
    self.query().key()
  }

  /// The SSL endpoint a certificate is attached to. `None` unless the
  /// binding is https.
  pub fn ssl_endpoint(&self) -> Option<SslEndpoint> {
    if !self.protocol.is_https() {
      return None;
    }
    self.ip_address.concrete().map(|ip_address| SslEndpoint {
      ip_address,
      port: self.port,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::net::{Ipv4Addr, Ipv6Addr};

  use super::*;

  #[test]
  fn protocol_round_trips_through_identifier() {
    for protocol in Protocol::ALL {
      assert_eq!(protocol.as_str().parse::<Protocol>().unwrap(), protocol);
    }
  }

  #[test]
  fn protocol_is_case_sensitive() {
    assert!(matches!(
      "HTTP".parse::<Protocol>(),
      Err(BindingError::InvalidProtocol(p)) if p == "HTTP"
    ));
  }

  #[test]
  fn ensure_synonyms() {
    assert!(Ensure::Present.wants_present());
    assert!(Ensure::Installed.wants_present());
    assert!(!Ensure::Absent.wants_present());
    assert!(!Ensure::Purged.wants_present());
  }

  #[test]
  fn wildcard_is_not_concrete() {
    assert_eq!(IpSpec::parse("*").unwrap(), IpSpec::Any);
    assert_eq!(IpSpec::Any.concrete(), None);
    assert_eq!(IpSpec::parse("0.0.0.0").unwrap().concrete(), None);
    assert_eq!(IpSpec::parse("::").unwrap().concrete(), None);
  }

  #[test]
  fn binding_key_formats_like_iis() {
    let key = BindingKey {
      ip_address: IpSpec::Specific(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5))),
      port: 80,
      host_header: "myHost.example.com".to_string(),
    };
    assert_eq!(key.to_string(), "192.168.1.5:80:myHost.example.com");

    let v6 = BindingKey {
      ip_address: IpSpec::Specific(IpAddr::V6(Ipv6Addr::LOCALHOST)),
      port: 443,
      host_header: String::new(),
    };
    assert_eq!(v6.to_string(), "[::1]:443:");
  }

  #[test]
  fn ssl_endpoint_provider_path() {
    let endpoint = SslEndpoint {
      ip_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: 443,
    };
    assert_eq!(endpoint.to_string(), "127.0.0.1!443");
    assert_eq!(endpoint.provider_path(), r"IIS:\SslBindings\127.0.0.1!443");
  }
}
