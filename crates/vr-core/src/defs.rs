//! Compiler-contract types: `DirectiveDef`, `ComponentDef`, `PipeDef`.
//!
//! These are produced by the compiler and consumed by the runtime; building
//! the compiler itself is out of scope. What's modeled here is the
//! shape a def takes by the time the runtime sees it: function pointers for
//! the operations the runtime calls into (factory, template, host bindings,
//! lifecycle hooks), plus the static metadata directive resolution and
//! aliasing need.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use vr_foundation::{DirectiveIndex, Result, SlotIndex};

use crate::shape::hooks::HookFn;

/// Opaque directive/component instance. The runtime never inspects an
/// instance's contents directly; it only stores the box and hands it back
/// to the def's own function pointers.
pub type Instance = Box<dyn Any>;

/// Allocates a fresh, default-initialized directive or component instance.
pub type FactoryFn = fn() -> Instance;

/// Evaluates one directive's host bindings, given its instance and the
/// first binding slot reserved for it.
pub type HostBindingsFn = fn(&mut Instance, SlotIndex);

/// Runs a component's template creation instructions, mirroring the
/// `RenderFlags.Create` branch a compiled template switches on. Returns a
/// `Result` so a directive-resolution failure three levels down
/// (`MultipleComponentsForHost`, `ExportNotFound`) propagates out of the
/// template the same way it would out of any other `TemplateOps` call.
pub type TemplateCreateFn = fn(&mut dyn crate::ops::TemplateOps, &mut Instance) -> Result<()>;

/// Runs a component's template update instructions, mirroring the
/// `RenderFlags.Update` branch a compiled template switches on.
pub type TemplateUpdateFn = fn(&mut dyn crate::ops::UpdateOps, &mut Instance) -> Result<()>;

/// Which phase a query evaluation function is being invoked for.
///
/// Mirrors the `rf: RenderFlags` parameter a compiled `viewQuery`/content
/// query function switches on in the source: `Create` materializes a
/// query's results for the first time, `Update` re-evaluates them against
/// whatever may have changed since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// First evaluation, during the owning view's creation pass.
    Create,
    /// Re-evaluation, during a refresh pass.
    Update,
}

/// A view- or content-query evaluation function.
///
/// Query *matching* — which descendant nodes/directives satisfy a given
/// query descriptor (`ViewChild`/`ContentChildren`-equivalent) — is
/// compiler/host territory the same way template compilation itself is.
/// This is the hook a compiled query descriptor's
/// instructions would target; it receives the owning directive or
/// component instance directly; because query results are an instance
/// detail (written into whatever field the descriptor targets) rather than
/// a host-binding/DOM operation, it needs no `TemplateOps`/`UpdateOps`
/// access the way host bindings and template instructions do.
pub type QueryFn = fn(&mut Instance, QueryMode);

/// Whether a component re-renders on every refresh pass or only when an
/// `@Input`-equivalent reference changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDetectionStrategy {
    /// Always included in the owning view's refresh walk.
    Default,
    /// Skipped unless explicitly marked dirty or an input reference
    /// changed.
    OnPush,
}

/// Static metadata shared by directives and components.
#[derive(Debug, Clone)]
pub struct DirectiveDef {
    /// Type name, used in diagnostics (`MultipleComponentsForHost`, etc.).
    pub name: String,
    /// Selector this directive matches against, e.g. `[appHighlight]`.
    pub selector: String,
    /// Builds a fresh instance.
    pub factory: FactoryFn,
    /// Evaluates this directive's host bindings, if it declares any.
    pub host_bindings: Option<HostBindingsFn>,
    /// Number of host-binding slots this directive needs reserved.
    pub host_vars: usize,
    /// Public input name -> private (instance field) name.
    pub inputs: HashMap<String, String>,
    /// Public output name -> private (instance field) name.
    pub outputs: HashMap<String, String>,
    /// Names this directive can be referred to as via a local template
    /// reference (`exportAs`).
    pub exports_as: Vec<String>,
    /// Static host attributes merged onto the host node.
    pub host_attrs: Vec<(String, String)>,
    /// Lifecycle hook function pointers, present only for the hooks this
    /// directive actually implements.
    pub hooks: DirectiveHooks,
    /// Content-query evaluation function, present only if this directive
    /// declares a `ContentChildren`-equivalent query. Run once in
    /// `Create` mode and on every refresh pass thereafter in `Update`
    /// mode, after embedded views refresh and before content hooks, so
    /// hook code observes up-to-date results.
    pub content_queries: Option<QueryFn>,
    /// Host-directive alias map, present only when this def is applied to
    /// a host as a *host directive* rather than matched directly: an
    /// allow-list restricting which of its inputs/outputs are exposed on
    /// the host, and a remapping of their public names.
    pub host_directive_aliases: Option<HostDirectiveAliasMap>,
}

/// A host-directive's input/output exposure map.
///
/// Absent entries are not exposed on the host at all; present entries
/// remap the directive's own public name to the name the host exposes it
/// under (identical remap for "expose unrenamed").
#[derive(Debug, Clone, Default)]
pub struct HostDirectiveAliasMap {
    /// Own input public name -> host-exposed public name.
    pub inputs: HashMap<String, String>,
    /// Own output public name -> host-exposed public name.
    pub outputs: HashMap<String, String>,
}

/// Which lifecycle hooks a `DirectiveDef` implements. `None` means the
/// compiler determined the directive has no such method, so the runtime
/// never needs to schedule it.
#[derive(Debug, Clone, Default)]
pub struct DirectiveHooks {
    /// `ngOnInit`-equivalent.
    pub on_init: Option<HookFn>,
    /// `ngDoCheck`-equivalent.
    pub do_check: Option<HookFn>,
    /// `ngAfterContentInit`-equivalent.
    pub after_content_init: Option<HookFn>,
    /// `ngAfterContentChecked`-equivalent.
    pub after_content_checked: Option<HookFn>,
    /// `ngAfterViewInit`-equivalent.
    pub after_view_init: Option<HookFn>,
    /// `ngAfterViewChecked`-equivalent.
    pub after_view_checked: Option<HookFn>,
    /// `ngOnDestroy`-equivalent.
    pub on_destroy: Option<HookFn>,
}

/// A `DirectiveDef` plus the additional metadata a component needs: its own
/// template and the decl/var counts that size its `TView`.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    /// Shared directive metadata.
    pub directive: DirectiveDef,
    /// The component's creation-pass template instructions, if it has any
    /// static structure to build (an empty template has none).
    pub create: Option<TemplateCreateFn>,
    /// The component's refresh-pass template instructions, if it has any
    /// bindings to evaluate.
    pub update: Option<TemplateUpdateFn>,
    /// Number of node/directive slots the template declares.
    pub decls: usize,
    /// Number of binding var slots the template declares.
    pub vars: usize,
    /// Change detection policy.
    pub change_detection: ChangeDetectionStrategy,
    /// View-query evaluation function, run in create mode once (before
    /// the template itself runs) and in update mode on every refresh pass
    /// that reaches this component (after child component refresh — a
    /// template declared in this view may have been inserted into a
    /// child component, so view queries must observe that child's state
    /// before re-evaluating).
    pub view_query: Option<QueryFn>,
}

/// A `<ng-template>`-equivalent embedded template: decls/vars and
/// create/update instructions with no directive or component identity of
/// its own. Instantiated dynamically into an [`crate::instance::LContainer`]
/// rather than declared as a static child the way a component host is.
#[derive(Debug, Clone)]
pub struct EmbeddedTemplateDef {
    /// Number of node/directive slots the template declares.
    pub decls: usize,
    /// Number of binding var slots the template declares.
    pub vars: usize,
    /// Creation-pass instructions.
    pub create: Option<TemplateCreateFn>,
    /// Refresh-pass instructions.
    pub update: Option<TemplateUpdateFn>,
}

/// A pure value-transform def (`|async`-equivalent pipes). Pipes don't
/// participate in directive resolution; they're looked up by name when a
/// template's binding expression references one.
#[derive(Debug, Clone)]
pub struct PipeDef {
    /// The name a template binding expression references.
    pub name: String,
    /// Builds a fresh pipe instance.
    pub factory: FactoryFn,
    /// Whether repeated calls with the same input may be skipped (a pure
    /// pipe is only re-evaluated when its arguments change).
    pub pure: bool,
}

/// Either kind of def a matched directive range slot can hold, as stored in
/// `TView.data`.
#[derive(Debug, Clone)]
pub enum AnyDirectiveDef {
    /// A plain directive, no template of its own.
    Directive(Rc<DirectiveDef>),
    /// A component, which also owns a nested `TView`.
    Component(Rc<ComponentDef>),
}

impl AnyDirectiveDef {
    /// The shared directive metadata, regardless of which variant this is.
    #[must_use]
    pub fn directive(&self) -> &DirectiveDef {
        match self {
            Self::Directive(d) => d,
            Self::Component(c) => &c.directive,
        }
    }

    /// The component def, if this slot holds one.
    #[must_use]
    pub fn as_component(&self) -> Option<&Rc<ComponentDef>> {
        match self {
            Self::Component(c) => Some(c),
            Self::Directive(_) => None,
        }
    }
}

/// Directive-range entry paired with its slot offset, as produced by
/// directive resolution before being written into a node's
/// `directive_start..directive_end` range.
#[derive(Debug, Clone)]
pub struct ResolvedDirective {
    /// Offset within the host node's directive range.
    pub offset: DirectiveIndex,
    /// The matched def.
    pub def: AnyDirectiveDef,
}
