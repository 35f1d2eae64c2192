//! The instruction traits a compiled template's create/update functions are
//! generated against.
//!
//! A real compiler emits calls like `element_start("div", ...)` /
//! `property("value", x)` directly into the functions stored on
//! [`crate::defs::ComponentDef`]; building that compiler is out of scope
//! (§6), but the instruction surface it would target is exactly
//! [`TemplateOps`] (creation pass) and [`UpdateOps`] (refresh pass). Tests
//! and any hand-written "compiled" template in this crate drive these
//! traits directly.

use vr_foundation::Result;

use crate::shape::consts::NodeIndex;

/// Instructions available while a view's creation pass is running (§4.6).
pub trait TemplateOps {
    /// Open an element node, optionally with static attributes.
    ///
    /// # Errors
    ///
    /// Propagates directive-resolution failures, e.g.
    /// [`vr_foundation::ViewRuntimeError::MultipleComponentsForHost`].
    fn element_start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeIndex>;

    /// Close the most recently opened element node.
    fn element_end(&mut self);

    /// Create a text node with the given initial content.
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`Self::element_start`].
    fn text(&mut self, content: &str) -> Result<NodeIndex>;

    /// Open a view-container anchor node (a `<ng-template>`-equivalent
    /// host), ready to have embedded views inserted into it later via
    /// [`crate::factory::ViewFactory::create_embedded_view`].
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`Self::element_start`].
    fn container(&mut self, attrs: &[(&str, &str)]) -> Result<NodeIndex>;

    /// Declare a local template reference (`#foo` / `#foo="exportAs"`)
    /// against the most recently opened element or container — mirroring
    /// how a compiled template emits a reference instruction immediately
    /// after the node instruction it names, rather than as part of
    /// `element_start`/`container` themselves.
    ///
    /// `export_as` of `None` means the bare `#foo` form: the element
    /// itself, or the component instance if the node hosts one. The
    /// default implementation is a no-op so existing `TemplateOps`
    /// implementors (test harnesses with no local refs to declare) need no
    /// changes.
    ///
    /// # Errors
    ///
    /// Propagates [`vr_foundation::ViewRuntimeError::ExportNotFound`] if
    /// `export_as` names no matched directive's `exports_as` list.
    fn local_ref(&mut self, _name: &str, _export_as: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// Instructions available while a view's refresh pass is running (§4.7).
pub trait UpdateOps {
    /// Move the binding cursor's "current node" to `node` (the
    /// `ɵɵadvance`-equivalent instruction). Every `property`/
    /// `text_interpolate` call that follows targets this node until the
    /// next `advance`.
    fn advance(&mut self, node: NodeIndex);

    /// Evaluate a property binding against the current node; if the value
    /// differs from the previous pass, writes it through to the renderer
    /// (§4.9). Schema validation against unrecognized property names
    /// (`vr_foundation::ViewRuntimeError::UnknownProperty`) is a
    /// host/compiler concern the core does not enforce itself — HTML
    /// schema data is explicitly out of scope (§1) — so this only ever
    /// fails if the current node cannot be resolved at all.
    fn property(&mut self, name: &str, value: &str) -> Result<()>;

    /// Evaluate a text node's interpolated content against the current
    /// node.
    fn text_interpolate(&mut self, value: &str);
}
