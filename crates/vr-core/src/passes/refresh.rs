//! The Refresh Pass (§4.7, C8): binding evaluation, lifecycle hooks, and
//! recursive descent into child components and embedded views.
//!
//! Runs in one of two modes. The ordinary mode commits changed binding
//! values to their slots and writes them through to the renderer, runs
//! lifecycle hooks, and clears `DIRTY`/`FIRST_LVIEW_PASS` on the way out.
//! The `check_no_changes` mode instead re-evaluates every binding as a pure
//! assertion: nothing is written to a slot or the renderer, no hook runs,
//! and a binding that disagrees with what was already stored there turns
//! into an [`vr_foundation::ViewRuntimeError::ExpressionChangedAfterCheck`]
//! rather than a silent overwrite.

use std::any::Any;
use std::rc::Rc;

use vr_foundation::{InitPhaseState, LViewFlags, Result, SlotIndex, ViewHandle, ViewRuntimeError};

use crate::defs::QueryMode;
use crate::engine::ViewEngine;
use crate::external::Renderer;
use crate::hostbinding::interpreter::run_host_binding_opcodes;
use crate::instance::{BindingSlot, BindingValue};
use crate::ops::UpdateOps;
use crate::queries::{run_content_queries, run_view_query};
use crate::shape::consts::NodeIndex;
use crate::shape::hooks::HookEntry;
use crate::shape::tview::TViewRef;

/// Resolve the native node a binding slot ultimately targets: either the
/// slot's own `NodeRef`, or — for a component host, whose own slot holds
/// the child view instead (§4.7/§4.11 component host slot representation)
/// — the child view's own host node.
fn native_node(engine: &ViewEngine, view: ViewHandle, node: NodeIndex) -> Option<Rc<dyn Any>> {
    let lview = engine.view(view).ok()?;
    match lview.get(node) {
        BindingSlot::NodeRef(rc) => Some(rc.clone()),
        BindingSlot::ComponentView(child) => engine.view(child).ok()?.header.host.clone(),
        _ => None,
    }
}

/// Drives one view's refresh-pass instructions: binding evaluation against
/// the current node set by `advance`, with change detection against each
/// binding's previously stored value.
pub struct RefreshContext<'e> {
    engine: &'e mut ViewEngine,
    renderer: &'e mut dyn Renderer,
    view: ViewHandle,
    current: Option<NodeIndex>,
    next_binding: SlotIndex,
    check_no_changes: bool,
    check_error: Option<ViewRuntimeError>,
}

impl<'e> RefreshContext<'e> {
    fn new(
        engine: &'e mut ViewEngine,
        renderer: &'e mut dyn Renderer,
        view: ViewHandle,
        binding_start_index: SlotIndex,
        check_no_changes: bool,
    ) -> Self {
        Self {
            engine,
            renderer,
            view,
            current: None,
            next_binding: binding_start_index,
            check_no_changes,
            check_error: None,
        }
    }

    /// The first mismatch observed while running in `check_no_changes`
    /// mode, if any.
    fn take_check_error(&mut self) -> Option<ViewRuntimeError> {
        self.check_error.take()
    }

    /// Compare `new` against the binding slot at the next binding index,
    /// advancing that index by one regardless of outcome. Commits the new
    /// value and reports "changed" in ordinary mode; in `check_no_changes`
    /// mode leaves the slot untouched and records a mismatch instead of
    /// reporting a change the caller could act on.
    fn write_if_changed(&mut self, node: NodeIndex, property: &str, new: BindingValue) -> bool {
        let slot = self.next_binding;
        self.next_binding = self.next_binding + 1;

        let lview = self
            .engine
            .view_mut(self.view)
            .expect("the view being refreshed stays live for the duration of its own refresh pass");
        let previous = lview.get(slot);
        let changed = match previous {
            BindingSlot::Value(old) => *old != new,
            _ => true,
        };

        if self.check_no_changes {
            if changed && self.check_error.is_none() {
                self.check_error = Some(ViewRuntimeError::ExpressionChangedAfterCheck {
                    property: property.to_string(),
                    owner: format!("{node:?}"),
                    previous: format!("{previous:?}"),
                    current: format!("{new:?}"),
                });
            }
            false
        } else {
            if changed {
                lview.set(slot, BindingSlot::Value(new));
            }
            changed
        }
    }
}

impl UpdateOps for RefreshContext<'_> {
    fn advance(&mut self, node: NodeIndex) {
        self.current = Some(node);
    }

    fn property(&mut self, name: &str, value: &str) -> Result<()> {
        let node = self
            .current
            .expect("property called before advance selected a node");
        let changed = self.write_if_changed(node, name, BindingValue::Text(Rc::from(value)));
        if changed {
            if let Some(native) = native_node(self.engine, self.view, node) {
                self.renderer.set_property(&*native, name, value);
            }
        }
        Ok(())
    }

    fn text_interpolate(&mut self, value: &str) {
        let node = self
            .current
            .expect("text_interpolate called before advance selected a node");
        let changed = self.write_if_changed(node, "textContent", BindingValue::Text(Rc::from(value)));
        if changed {
            if let Some(native) = native_node(self.engine, self.view, node) {
                self.renderer.set_text(&*native, value);
            }
        }
    }
}

/// Run every hook in `queue` against directive instances currently held by
/// `view`. A slot that no longer holds a directive instance is skipped,
/// the same tolerance [`run_host_binding_opcodes`] gives a torn-down view.
fn run_hook_queue(engine: &mut ViewEngine, view: ViewHandle, queue: &[HookEntry]) -> Result<()> {
    for entry in queue {
        let lview = engine.view_mut(view)?;
        let slot = SlotIndex::new(entry.directive.get());
        if let BindingSlot::Directive(instance) = lview.get_mut(slot) {
            (entry.hook)(instance);
        }
    }
    Ok(())
}

/// Whether `child`'s own refresh should run as part of `view`'s descent:
/// unconditionally on its first pass (a freshly created child has never
/// had its bindings evaluated at all), unconditionally for a `CheckAlways`
/// component, and otherwise only if something has marked it dirty.
fn should_descend_into(engine: &ViewEngine, child: ViewHandle) -> Result<bool> {
    let lview = engine.view(child)?;
    Ok(lview.header.flags.contains(LViewFlags::FIRST_LVIEW_PASS)
        || lview.header.flags.contains(LViewFlags::CHECK_ALWAYS)
        || lview.is_dirty())
}

/// Whether `view`'s subtree holds any transplanted view still waiting for
/// its out-of-band refresh, without running that refresh.
///
/// A clean `OnPush` component that `should_descend_into` skips may still
/// host a container with a pending transplanted view further down (§4.8):
/// that view's declaring ancestor is elsewhere in the tree and will never
/// walk down into this subtree on its own, so something has to check for
/// it before giving up on this branch entirely.
fn transplanted_views_pending(engine: &ViewEngine, view: ViewHandle) -> Result<bool> {
    let lview = engine.view(view)?;
    let tview: TViewRef = lview.header.tview.clone();

    let containers = tview.borrow().containers.clone();
    for host_index in containers {
        let container = match engine.view(view)?.get(host_index) {
            BindingSlot::Container(c) => *c,
            _ => continue,
        };
        if engine.container(container)?.transplanted_views_to_refresh() > 0 {
            return Ok(true);
        }
        let declared: Vec<ViewHandle> = engine.container(container)?.iter().collect();
        for embedded in declared {
            if transplanted_views_pending(engine, embedded)? {
                return Ok(true);
            }
        }
    }

    let components = tview.borrow().components.clone();
    for host_index in components {
        let child = match engine.view(view)?.get(host_index) {
            BindingSlot::ComponentView(child) => *child,
            _ => continue,
        };
        if transplanted_views_pending(engine, child)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Walk `view`'s subtree refreshing only the transplanted views still
/// pending an out-of-band refresh, without running a full refresh of
/// `view` itself or any clean descendant along the way (§4.8).
///
/// Reached only when `should_descend_into(view)` is `false` but
/// [`transplanted_views_pending`] found work further down; a descendant
/// that itself satisfies `should_descend_into` gets its full
/// `run_refresh_pass` instead, which refreshes its own pending
/// transplants as part of the ordinary container loop.
fn refresh_contains_dirty_view(
    engine: &mut ViewEngine,
    renderer: &mut dyn Renderer,
    view: ViewHandle,
    check_no_changes: bool,
) -> Result<()> {
    let tview: TViewRef = engine.view(view)?.header.tview.clone();

    let containers = tview.borrow().containers.clone();
    for host_index in containers {
        let container = match engine.view(view)?.get(host_index) {
            BindingSlot::Container(c) => *c,
            _ => continue,
        };

        let pending: Vec<(usize, ViewHandle)> = engine.container(container)?.pending_transplants().collect();
        for (index, embedded) in pending {
            run_refresh_pass(engine, renderer, embedded, check_no_changes)?;
            if !check_no_changes {
                engine.container_mut(container)?.mark_transplant_refreshed(index);
            }
        }

        let declared: Vec<ViewHandle> = engine.container(container)?.iter().collect();
        for embedded in declared {
            if transplanted_views_pending(engine, embedded)? {
                refresh_contains_dirty_view(engine, renderer, embedded, check_no_changes)?;
            }
        }
    }

    let components = tview.borrow().components.clone();
    for host_index in components {
        let child = match engine.view(view)?.get(host_index) {
            BindingSlot::ComponentView(child) => *child,
            _ => continue,
        };
        if should_descend_into(engine, child)? {
            run_refresh_pass(engine, renderer, child, check_no_changes)?;
        } else if transplanted_views_pending(engine, child)? {
            refresh_contains_dirty_view(engine, renderer, child, check_no_changes)?;
        }
    }

    Ok(())
}

/// Run `view`'s refresh pass: evaluate its own bindings, run its due
/// lifecycle hooks, interpret its host-binding opcode stream, then
/// recurse into child components and containers in that order (§4.7).
///
/// # Errors
///
/// Propagates a child's [`ViewRuntimeError::ExpressionChangedAfterCheck`]
/// (or any other failure) unchanged; a `check_no_changes` pass stops at
/// the first mismatch found anywhere in the subtree rather than
/// collecting every one.
pub fn run_refresh_pass(
    engine: &mut ViewEngine,
    renderer: &mut dyn Renderer,
    view: ViewHandle,
    check_no_changes: bool,
) -> Result<()> {
    let lview = engine.view(view)?;
    if !lview.is_attached() || lview.header.flags.contains(LViewFlags::DESTROYED) {
        return Ok(());
    }
    tracing::trace!(?view, check_no_changes, "running refresh pass");

    let tview: TViewRef = lview.header.tview.clone();
    let binding_start_index = tview.borrow().binding_start_index;

    if let Some(update_fn) = engine.view(view)?.header.update_fn() {
        let mut context = engine
            .view_mut(view)?
            .header
            .context
            .take()
            .expect("a view with an update function was created with a context instance");
        let mut ctx = RefreshContext::new(engine, renderer, view, binding_start_index, check_no_changes);
        let result = update_fn(&mut ctx, &mut context);
        let check_error = ctx.take_check_error();
        engine.view_mut(view)?.header.context = Some(context);
        result?;
        if let Some(err) = check_error {
            return Err(err);
        }
    }

    if !check_no_changes {
        let init_phase = engine.view(view)?.header.flags.init_phase();
        {
            let hooks = tview.borrow();
            if init_phase == InitPhaseState::OnInitPending {
                run_hook_queue(engine, view, &hooks.on_init)?;
            }
            run_hook_queue(engine, view, &hooks.do_check)?;
        }
        if init_phase == InitPhaseState::OnInitPending {
            let flags = engine.view(view)?.header.flags;
            engine.view_mut(view)?.header.flags = flags.with_init_phase(init_phase.advance());
        }
    }

    // Embedded views and containers refresh before this view's own content
    // queries/hooks and host bindings: a content query or `ngAfterContent*`
    // hook observing projected content needs that content already up to
    // date, and a host binding may read state a transplanted view just
    // wrote into a shared ancestor.
    let containers = tview.borrow().containers.clone();
    for host_index in containers {
        let container = match engine.view(view)?.get(host_index) {
            BindingSlot::Container(c) => *c,
            _ => continue,
        };

        let declared: Vec<ViewHandle> = engine.container(container)?.iter().collect();
        for embedded in declared {
            if engine.view(embedded)?.needs_transplant_refresh() {
                // Driven out of band below; its declaring view's own
                // top-down descent never reaches it (§4.11).
                continue;
            }
            if should_descend_into(engine, embedded)? {
                run_refresh_pass(engine, renderer, embedded, check_no_changes)?;
            }
        }

        let pending: Vec<(usize, ViewHandle)> = engine.container(container)?.pending_transplants().collect();
        for (index, embedded) in pending {
            run_refresh_pass(engine, renderer, embedded, check_no_changes)?;
            if !check_no_changes {
                engine.container_mut(container)?.mark_transplant_refreshed(index);
            }
        }
    }

    if !check_no_changes {
        let content_queries = tview.borrow().content_queries.clone();
        run_content_queries(engine, view, &content_queries, QueryMode::Update)?;

        let init_phase = engine.view(view)?.header.flags.init_phase();
        {
            let hooks = tview.borrow();
            if init_phase == InitPhaseState::AfterContentInitPending {
                run_hook_queue(engine, view, &hooks.after_content_init)?;
            }
            run_hook_queue(engine, view, &hooks.after_content_checked)?;
        }
        if init_phase == InitPhaseState::AfterContentInitPending {
            let flags = engine.view(view)?.header.flags;
            engine.view_mut(view)?.header.flags = flags.with_init_phase(init_phase.advance());
        }

        let lview = engine.view_mut(view)?;
        run_host_binding_opcodes(&tview.borrow(), lview);
    }

    let components = tview.borrow().components.clone();
    for host_index in components {
        let child = match engine.view(view)?.get(host_index) {
            BindingSlot::ComponentView(child) => *child,
            _ => continue,
        };
        if should_descend_into(engine, child)? {
            run_refresh_pass(engine, renderer, child, check_no_changes)?;
        } else if transplanted_views_pending(engine, child)? {
            refresh_contains_dirty_view(engine, renderer, child, check_no_changes)?;
        }
    }

    if !check_no_changes {
        let view_query = engine.view(view)?.header.component_def.as_ref().and_then(|def| def.view_query);
        if let Some(view_query) = view_query {
            let mut context = engine
                .view_mut(view)?
                .header
                .context
                .take()
                .expect("a component with a view query was created with a context instance");
            run_view_query(view_query, &mut context, QueryMode::Update);
            engine.view_mut(view)?.header.context = Some(context);
        }

        let init_phase = engine.view(view)?.header.flags.init_phase();
        {
            let hooks = tview.borrow();
            if init_phase == InitPhaseState::AfterViewInitPending {
                run_hook_queue(engine, view, &hooks.after_view_init)?;
            }
            run_hook_queue(engine, view, &hooks.after_view_checked)?;
        }
        if init_phase == InitPhaseState::AfterViewInitPending {
            let flags = engine.view(view)?.header.flags;
            engine.view_mut(view)?.header.flags = flags.with_init_phase(init_phase.advance());
        }

        tview.borrow_mut().complete_update_pass();
        let lview = engine.view_mut(view)?;
        lview.header.flags.remove(LViewFlags::FIRST_LVIEW_PASS);
        lview.header.flags.remove(LViewFlags::CREATION_MODE);
        lview.clear_dirty();
    }

    Ok(())
}
