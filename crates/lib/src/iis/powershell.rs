//! PowerShell rendering of guards and operations.
//!
//! Every script starts with `Import-Module WebAdministration; `. Guard
//! scripts follow the exit-status convention of an `onlyif` check: exit 0
//! means "run the operation", any other status means "already satisfied".
//!
//! # Example
//!
//! The create action for `myWebSite` on port 80 renders as:
//!
//! ```text
//! powershell.exe -ExecutionPolicy RemoteSigned -Command "Import-Module WebAdministration; New-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"*\""
//! ```

use serde::{Deserialize, Serialize};

use crate::action::{Action, Guard, Operation};
use crate::binding::{BindingQuery, SslEndpoint};
use crate::consts::{POWERSHELL_ARGS, POWERSHELL_EXE, WEB_ADMINISTRATION_PRELUDE};

/// How scripts are launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerShell {
  pub executable: String,
  /// Arguments placed before the script; the last one is normally `-Command`.
  pub args: Vec<String>,
}

impl Default for PowerShell {
  fn default() -> Self {
    Self {
      executable: POWERSHELL_EXE.to_string(),
      args: POWERSHELL_ARGS.iter().map(|a| a.to_string()).collect(),
    }
  }
}

impl PowerShell {
  /// Full command line for `script`, with the script double-quoted and its
  /// inner quotes backslash-escaped.
  pub fn command_line(&self, script: &str) -> String {
    let mut line = self.executable.clone();
    for arg in &self.args {
      line.push(' ');
      line.push_str(arg);
    }
    line.push_str(" \"");
    line.push_str(&script.replace('"', "\\\""));
    line.push('"');
    line
  }
}

/// An action rendered as the pair of command lines a shell executor runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedAction {
  pub name: String,
  pub command: String,
  pub onlyif: String,
}

pub fn render_action(action: &Action, powershell: &PowerShell) -> RenderedAction {
  RenderedAction {
    name: action.name.clone(),
    command: powershell.command_line(&operation_script(&action.operation)),
    onlyif: powershell.command_line(&guard_script(&action.guard)),
  }
}

/// Script performing `operation`.
pub fn operation_script(operation: &Operation) -> String {
  let body = match operation {
    Operation::NewWebBinding(query) => format!("New-WebBinding {}", binding_params(query)),
    Operation::RemoveWebBinding(query) => format!("Remove-WebBinding {}", binding_params(query)),
    Operation::AttachCertificate {
      certificate_name,
      endpoint,
    } => format!(
      "New-Item {} -Value ({})",
      quote(&endpoint.provider_path()),
      certificate_lookup(certificate_name)
    ),
  };
  format!("{}{}", WEB_ADMINISTRATION_PRELUDE, body)
}

/// Script evaluating `guard`; exits 0 when the operation should run.
pub fn guard_script(guard: &Guard) -> String {
  let body = match guard {
    Guard::BindingMissing(query) => format!("if ({}) {{ exit 1 }} else {{ exit 0 }}", binding_lookup(query)),
    Guard::BindingExists(query) => format!("if (!({})) {{ exit 1 }} else {{ exit 0 }}", binding_lookup(query)),
    Guard::CertificateAttachable {
      certificate_name,
      endpoint,
    } => format!(
      "if(({}) -and ({})) {{ exit 0 }} else {{ exit 1 }}",
      certificate_lookup(certificate_name),
      endpoint_unbound(endpoint)
    ),
  };
  format!("{}{}", WEB_ADMINISTRATION_PRELUDE, body)
}

fn binding_params(query: &BindingQuery) -> String {
  format!(
    "-Name {} -Port {} -Protocol {} -HostHeader {} -IPAddress {}",
    quote(&query.site_name),
    query.port,
    quote(query.protocol.as_str()),
    quote(&query.host_header),
    quote(&query.ip_address.to_string())
  )
}

fn binding_lookup(query: &BindingQuery) -> String {
  format!(
    "Get-WebBinding {} | Where-Object {{$_.bindingInformation -eq {}}}",
    binding_params(query),
    quote(&query.key().to_string())
  )
}

fn certificate_lookup(certificate_name: &str) -> String {
  format!(
    "Get-ChildItem cert:\\ -Recurse | Where-Object {{$_.FriendlyName.Equals({})}} | Select-Object -First 1",
    quote(certificate_name)
  )
}

fn endpoint_unbound(endpoint: &SslEndpoint) -> String {
  format!("(Test-Path {}) -eq $false", quote(&endpoint.provider_path()))
}

/// Double-quote a value for PowerShell, neutralising the characters that
/// are special inside an expandable string.
fn quote(value: &str) -> String {
  let mut quoted = String::with_capacity(value.len() + 2);
  quoted.push('"');
  for c in value.chars() {
    if matches!(c, '`' | '"' | '$') {
      quoted.push('`');
    }
    quoted.push(c);
  }
  quoted.push('"');
  quoted
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::binding::BindingSpec;
  use crate::reconcile::reconcile;

  const PS: &str = "powershell.exe -ExecutionPolicy RemoteSigned";

  fn rendered(spec: BindingSpec) -> Vec<RenderedAction> {
    let descriptor = spec.validate().unwrap();
    reconcile(&descriptor)
      .iter()
      .map(|a| render_action(a, &PowerShell::default()))
      .collect()
  }

  fn http_spec() -> BindingSpec {
    BindingSpec::new("myWebSite", "http", "80").with_host_header("myHost.example.com")
  }

  #[test]
  fn create_binding_with_default_ip() {
    let actions = rendered(http_spec());

    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].name, "CreateBinding-myWebSite-port-80");
    assert_eq!(
      actions[0].command,
      format!(
        r#"{PS} -Command "Import-Module WebAdministration; New-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"*\"""#
      )
    );
    assert_eq!(
      actions[0].onlyif,
      format!(
        r#"{PS} -Command "Import-Module WebAdministration; if (Get-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"*\" | Where-Object {{$_.bindingInformation -eq \"*:80:myHost.example.com\"}}) {{ exit 1 }} else {{ exit 0 }}""#
      )
    );
  }

  #[test]
  fn create_binding_with_ip_address() {
    let actions = rendered(http_spec().with_ip_address("192.168.1.5"));

    assert_eq!(
      actions[0].command,
      format!(
        r#"{PS} -Command "Import-Module WebAdministration; New-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"192.168.1.5\"""#
      )
    );
    assert!(
      actions[0]
        .onlyif
        .contains(r#"Where-Object {$_.bindingInformation -eq \"192.168.1.5:80:myHost.example.com\"}"#)
    );
  }

  #[test]
  fn attach_certificate() {
    let actions = rendered(
      BindingSpec::new("myWebSite", "https", "443")
        .with_ip_address("127.0.0.1")
        .with_certificate_name("myCertificate"),
    );

    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1].name, "Attach-Certificate-myWebSite-port-443");
    assert_eq!(
      actions[1].command,
      format!(
        r#"{PS} -Command "Import-Module WebAdministration; New-Item \"IIS:\SslBindings\127.0.0.1!443\" -Value (Get-ChildItem cert:\ -Recurse | Where-Object {{$_.FriendlyName.Equals(\"myCertificate\")}} | Select-Object -First 1)""#
      )
    );
    assert_eq!(
      actions[1].onlyif,
      format!(
        r#"{PS} -Command "Import-Module WebAdministration; if((Get-ChildItem cert:\ -Recurse | Where-Object {{$_.FriendlyName.Equals(\"myCertificate\")}} | Select-Object -First 1) -and ((Test-Path \"IIS:\SslBindings\127.0.0.1!443\") -eq $false)) {{ exit 0 }} else {{ exit 1 }}""#
      )
    );
  }

  #[test]
  fn delete_binding() {
    for ensure in ["absent", "purged"] {
      let actions = rendered(http_spec().with_ensure(ensure));

      assert_eq!(actions.len(), 1);
      assert_eq!(actions[0].name, "DeleteBinding-myWebSite-port-80");
      assert_eq!(
        actions[0].command,
        format!(
          r#"{PS} -Command "Import-Module WebAdministration; Remove-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"*\"""#
        )
      );
      assert_eq!(
        actions[0].onlyif,
        format!(
          r#"{PS} -Command "Import-Module WebAdministration; if (!(Get-WebBinding -Name \"myWebSite\" -Port 80 -Protocol \"http\" -HostHeader \"myHost.example.com\" -IPAddress \"*\" | Where-Object {{$_.bindingInformation -eq \"*:80:myHost.example.com\"}})) {{ exit 1 }} else {{ exit 0 }}""#
        )
      );
    }
  }

  #[test]
  fn missing_host_header_renders_empty() {
    let actions = rendered(BindingSpec::new("s", "http", 80));
    assert!(actions[0].command.ends_with(r#"-HostHeader \"\" -IPAddress \"*\"""#));
  }

  #[test]
  fn special_characters_are_escaped() {
    assert_eq!(quote("a$b"), "\"a`$b\"");
    assert_eq!(quote("say \"hi\""), "\"say `\"hi`\"\"");
  }

  #[test]
  fn custom_executable() {
    let powershell = PowerShell {
      executable: "pwsh".to_string(),
      args: vec!["-NoProfile".to_string(), "-Command".to_string()],
    };
    assert_eq!(powershell.command_line("exit 0"), r#"pwsh -NoProfile -Command "exit 0""#);
  }
}
