//! Declared IIS site bindings.
//!
//! A binding starts life as a loosely-typed [`BindingSpec`] (strings as they
//! appear in a manifest) and is turned into an immutable
//! [`BindingDescriptor`] by [`BindingSpec::validate`]. Only descriptors are
//! handed to the reconciler, so every value downstream is already known to be
//! well formed.

mod types;
mod validate;

pub use types::*;
pub use validate::*;
