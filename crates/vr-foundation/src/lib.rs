//! # View Runtime Foundation
//!
//! Base identifiers, error types, and flag bitsets shared by the rest of
//! the view runtime (`vr-tree`, `vr-core`). Kept deliberately small and
//! low-dependency, matching the role a foundation crate plays in a larger
//! UI framework workspace: other crates build on these types, this crate
//! builds on nothing but `std` and a handful of leaf dependencies.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod flags;
pub mod ids;

pub use error::{Result, ViewRuntimeError};
pub use flags::{InitPhaseState, LViewFlags};
pub use ids::{ContainerHandle, ContainerTag, DirectiveIndex, Handle, SlotIndex, ViewHandle, ViewTag};
