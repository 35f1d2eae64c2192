//! # View Runtime Core
//!
//! The shape table / instance buffer engine described in the view-runtime
//! core specification: [`shape`] builds and freezes `TView`/`TNode`,
//! [`instance`] holds the per-instantiation `LView`/`LContainer` pair,
//! [`directives`] matches and aliases directives onto a node, [`passes`]
//! runs the creation and refresh traversals and the dirty/transplant
//! propagator, and [`hostbinding`] interprets a `TView`'s host-binding
//! opcode stream. [`engine`] is the arena that owns every live view and
//! container; [`factory`] builds fresh ones against it; [`app`] is the
//! single top-level entry point a host calls to drive one change-detection
//! tick end to end.
//!
//! `vr-core` never constructs a renderer, an injector, or a sanitizer
//! itself — those are consumed through the traits in [`external`], exactly
//! as external collaborators described in the specification.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod app;
pub mod cursor;
pub mod defs;
pub mod directives;
pub mod engine;
pub mod external;
pub mod factory;
pub mod hostbinding;
pub mod instance;
pub mod ops;
pub mod passes;
pub mod queries;
pub mod shape;

pub use app::{detect_changes, ErrorHandler};
pub use defs::{
    AnyDirectiveDef, ChangeDetectionStrategy, ComponentDef, DirectiveDef, DirectiveHooks, EmbeddedTemplateDef,
    FactoryFn, HostBindingsFn, HostDirectiveAliasMap, Instance, PipeDef, QueryFn, QueryMode, ResolvedDirective,
    TemplateCreateFn, TemplateUpdateFn,
};
pub use directives::{resolve_directives, resolve_local_refs, DirectiveRegistry};
pub use engine::ViewEngine;
pub use external::{Injector, Renderer, Sanitizer, SanitizationContext};
pub use factory::ViewFactory;
pub use ops::{TemplateOps, UpdateOps};
pub use passes::{mark_dirty_if_on_push, mark_view_dirty, run_creation_pass, run_refresh_pass};
pub use queries::{run_content_queries, run_view_query, ContentQueryEntry};
