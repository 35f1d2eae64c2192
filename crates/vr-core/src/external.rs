//! Host-provided interfaces the runtime consumes but never defines.
//!
//! A concrete renderer, DI container, and sanitizer are all out of scope:
//! the runtime only needs to call into them at fixed points (creating a
//! node, resolving an injected token, sanitizing a bound value before it
//! reaches a DOM-equivalent sink). Modeling them as plain traits keeps
//! `vr-core` from depending on any particular host surface, the same way
//! the view runtime's own rendering backend is a separate, swappable
//! concern from its element tree.

use std::any::{Any, TypeId};

/// A host-provided element/text-node factory and mutator.
///
/// `NodeRef` is left abstract (`Any`) because the runtime never inspects a
/// node beyond holding its handle; only the host's renderer implementation
/// knows what a `NodeRef` concretely is (a DOM element, a retained-mode
/// scene node, ...).
pub trait Renderer {
    /// Create a native node for an element `TNode`.
    fn create_element(&mut self, tag: &str) -> Box<dyn Any>;

    /// Create a native text node with the given initial content.
    fn create_text(&mut self, content: &str) -> Box<dyn Any>;

    /// Set a property on a previously created node.
    fn set_property(&mut self, node: &dyn Any, name: &str, value: &str);

    /// Overwrite a previously created text node's content.
    fn set_text(&mut self, node: &dyn Any, content: &str);

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &dyn Any, child: &dyn Any);

    /// Remove `child` from `parent`.
    fn remove_child(&mut self, parent: &dyn Any, child: &dyn Any);

    /// Optional hook bracketing the start of a top-level change-detection
    /// cycle. Most renderers have nothing to do here; the default is a
    /// no-op.
    fn begin(&mut self) {}

    /// Optional hook bracketing the end of a top-level change-detection
    /// cycle, called on every exit path including an error — the runtime
    /// calls it from within [`crate::app::detect_changes`]'s own
    /// exception-safe bracketing, not the other way around.
    fn end(&mut self) {}
}

/// A host-provided dependency lookup, consulted when a directive factory
/// requests a token it does not construct itself.
pub trait Injector {
    /// Resolve a token by type id, or `None` if nothing provides it at or
    /// above this injector's position in the view hierarchy.
    fn get(&self, token: TypeId) -> Option<&dyn Any>;
}

/// A host-provided sanitizer, consulted before a bound value reaches a
/// context that can execute or navigate (`innerHTML`-equivalent
/// properties, `href`/`src`-style URL attributes, and similar).
pub trait Sanitizer {
    /// Sanitize `value` for the given property/context name, returning the
    /// value that is safe to set on the native node.
    fn sanitize(&self, context: SanitizationContext, value: &str) -> String;
}

/// The binding context a sanitizer needs to know about to pick the right
/// rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationContext {
    /// Raw markup destined for an `innerHTML`-equivalent sink.
    Html,
    /// A URL-valued attribute such as `href` or `src`.
    Url,
    /// A URL that will be loaded as executable or embeddable content
    /// (`iframe src`, `script src`).
    ResourceUrl,
    /// Inline style text.
    Style,
}
