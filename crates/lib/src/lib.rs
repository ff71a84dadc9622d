//! iisbind-lib: Core types and logic for declaring IIS site bindings.
//!
//! This crate turns a declared binding into the guarded actions that bring a
//! Windows host's IIS configuration to the declared state:
//! - `binding`: raw input, validation, and the immutable [`binding::BindingDescriptor`]
//! - `reconcile`: the decision procedure producing [`action::Action`] lists
//! - `iis`: the IIS binding store abstraction and PowerShell rendering
//! - `execute`: applying actions against a store or through PowerShell
//! - `manifest`: loading and planning a file of declared bindings

pub mod action;
pub mod binding;
pub mod consts;
pub mod execute;
pub mod iis;
pub mod manifest;
pub mod reconcile;
