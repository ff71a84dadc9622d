//! Binding reconciliation.
//!
//! Turns a validated [`BindingDescriptor`] into the ordered list of guarded
//! [`Action`]s that bring IIS to the descriptor's `ensure` state.
//!
//! | ensure                | actions                                          |
//! |-----------------------|--------------------------------------------------|
//! | `present`/`installed` | `CreateBinding`, then `Attach-Certificate` (https only) |
//! | `absent`/`purged`     | `DeleteBinding`                                  |
//!
//! Removing a binding never detaches its SSL certificate; an attachment left
//! behind by a deleted https binding stays in place.

use tracing::debug;

use crate::action::{Action, Guard, Operation};
use crate::binding::BindingDescriptor;

/// Compute the actions for one binding. Pure; the result depends only on
/// `descriptor`.
pub fn reconcile(descriptor: &BindingDescriptor) -> Vec<Action> {
  let site_name = descriptor.site_name();
  let port = descriptor.port();
  let query = descriptor.query();

  let mut actions = Vec::with_capacity(2);

  if descriptor.ensure().wants_present() {
    actions.push(Action::new(
      site_name,
      port,
      Guard::BindingMissing(query.clone()),
      Operation::NewWebBinding(query),
    ));

    // Validation guarantees both for https.
    if let (Some(endpoint), Some(certificate_name)) = (descriptor.ssl_endpoint(), descriptor.certificate_name()) {
      actions.push(Action::new(
        site_name,
        port,
        Guard::CertificateAttachable {
          certificate_name: certificate_name.to_string(),
          endpoint,
        },
        Operation::AttachCertificate {
          certificate_name: certificate_name.to_string(),
          endpoint,
        },
      ));
    }
  } else {
    actions.push(Action::new(
      site_name,
      port,
      Guard::BindingExists(query.clone()),
      Operation::RemoveWebBinding(query),
    ));
  }

  debug!(
    site_name = %site_name,
    key = %descriptor.key(),
    ensure = %descriptor.ensure(),
    actions = actions.len(),
    "binding reconciled"
  );

  actions
}
