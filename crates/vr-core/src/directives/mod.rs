//! Directive matching, resolution, and input/output aliasing (§4.4, §4.5).

pub mod aliasing;
pub mod registry;
pub mod resolver;

pub use registry::DirectiveRegistry;
pub use resolver::{resolve_directives, resolve_local_refs};
