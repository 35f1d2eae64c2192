//! View- and content-query evaluation.
//!
//! Query *matching* — deciding which descendant nodes or directive
//! instances satisfy a `ViewChild`/`ContentChildren`-equivalent descriptor —
//! is compiler/host territory, the same as template compilation itself (see
//! [`crate::defs::QueryFn`]). What belongs here is *when* an already-matched
//! query's evaluation function runs against a live instance: once in
//! `Create` mode during the owning view's creation pass, and again in
//! `Update` mode on every refresh pass that reaches it afterward.

use vr_foundation::{DirectiveIndex, Result, SlotIndex, ViewHandle};

use crate::defs::{QueryFn, QueryMode};
use crate::engine::ViewEngine;
use crate::instance::BindingSlot;

/// One content-query registration: the directive slot whose instance the
/// query function is invoked against.
#[derive(Debug, Clone, Copy)]
pub struct ContentQueryEntry {
    /// Directive slot the query function belongs to.
    pub directive: DirectiveIndex,
    /// The compiled query's evaluation function.
    pub query: QueryFn,
}

/// Run every registered content query against `view` in `mode`. A slot
/// whose directive instance is no longer present is skipped, the same
/// tolerance the hook queues and host-binding interpreter give a torn-down
/// view.
///
/// # Errors
///
/// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if `view` is
/// no longer live.
pub fn run_content_queries(engine: &mut ViewEngine, view: ViewHandle, queries: &[ContentQueryEntry], mode: QueryMode) -> Result<()> {
    for entry in queries {
        let lview = engine.view_mut(view)?;
        let slot = SlotIndex::new(entry.directive.get());
        if let BindingSlot::Directive(instance) = lview.get_mut(slot) {
            (entry.query)(instance, mode);
        }
    }
    Ok(())
}

/// Run a component's view-query function, if it has one, against its own
/// root context instance. Unlike a content query, a view query belongs to
/// the component itself rather than to one of several matched directives,
/// so it is invoked directly against the context the component's own
/// template update function also receives.
pub fn run_view_query(query: QueryFn, context: &mut crate::defs::Instance, mode: QueryMode) {
    query(context, mode);
}
