//! Manifests of declared bindings and the plans computed from them.

mod types;

pub use types::*;
