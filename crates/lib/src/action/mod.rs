//! Guarded actions.
//!
//! An [`Action`] is the unit of work the reconciler emits: a mutating
//! [`Operation`] paired with a side-effect-free [`Guard`]. Consumers evaluate
//! the guard first and only run the operation when it answers
//! [`GuardDecision::Proceed`].
//!
//! # Action Types
//!
//! - `CreateBinding` - `New-WebBinding`, guarded by "no binding with this key"
//! - `DeleteBinding` - `Remove-WebBinding`, guarded by "a binding with this key exists"
//! - `Attach-Certificate` - SSL attachment, guarded by "certificate found and endpoint unbound"
//!
//! Guards and operations talk to IIS only through
//! [`BindingStore`](crate::iis::BindingStore), so either half can be exercised
//! against an in-memory store. The same values render to PowerShell through
//! [`crate::iis::powershell`].

mod types;

pub use types::*;
