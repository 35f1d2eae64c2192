//! The dirty/transplant propagator (C9).
//!
//! When a binding changes a value the ordinary top-down refresh walk
//! wouldn't otherwise revisit — an event handler mutating component state
//! outside any refresh pass, for instance — something has to mark the path
//! from that view back up to the root dirty, so the next refresh actually
//! reaches it. [`mark_view_dirty`] is that walk. A view whose declaration
//! view differs from the view holding its container (a transplanted view)
//! needs an extra step: marking its declaring ancestors dirty alone
//! doesn't reach it, since the container that owns it lives in a different
//! branch of the tree, so the container's own pending-refresh bookkeeping
//! has to be re-armed too.

use vr_foundation::{LViewFlags, Result, ViewHandle};

use crate::engine::ViewEngine;

/// Mark `view` dirty and walk up through its declaring ancestors doing the
/// same, stopping once an already-dirty view is reached (its own ancestors
/// were already marked on a previous call) or the root is hit.
///
/// If `view` is itself a transplanted view awaiting an out-of-band
/// refresh, re-arms its container's pending count in case a previous
/// out-of-band refresh had already cleared it.
///
/// Returns the highest view reached.
///
/// # Errors
///
/// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if `view`
/// is no longer live.
pub fn mark_view_dirty(engine: &mut ViewEngine, view: ViewHandle) -> Result<ViewHandle> {
    tracing::trace!(?view, "marking view dirty");
    let mut current = view;
    loop {
        let lview = engine.view_mut(current)?;
        let already_dirty = lview.is_dirty();
        lview.set_dirty();
        let is_transplanted = lview.needs_transplant_refresh();
        let container = lview.header.container;
        let parent = lview.header.parent;

        if is_transplanted {
            if let Some(container) = container {
                if let Some(index) = engine.container(container)?.index_of(current) {
                    tracing::debug!(?container, index, "re-arming transplanted view for out-of-band refresh");
                    engine.container_mut(container)?.mark_transplant_pending(index);
                }
            }
        }

        match parent {
            Some(next) if !already_dirty => current = next,
            _ => return Ok(current),
        }
    }
}

/// Mark `view` dirty only if it actually needs it: an `OnPush` view only
/// requires a fresh refresh when one of its `@Input`-equivalent bindings
/// changed reference since the last pass (`CheckAlways` views are always
/// walked regardless, so marking them here would be redundant, not wrong,
/// but callers should prefer skipping the call entirely for those).
///
/// # Errors
///
/// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if `view`
/// is no longer live.
pub fn mark_dirty_if_on_push(engine: &mut ViewEngine, view: ViewHandle, input_changed: bool) -> Result<()> {
    if !input_changed {
        return Ok(());
    }
    let is_check_always = engine.view(view)?.header.flags.contains(LViewFlags::CHECK_ALWAYS);
    if !is_check_always {
        mark_view_dirty(engine, view)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ViewFactory;
    use crate::instance::BindingSlot;

    #[test]
    fn marking_a_child_dirty_propagates_up_to_the_root() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let root = factory.create_root_view(&mut engine, 1, 0);

        let def = std::rc::Rc::new(crate::defs::ComponentDef {
            directive: crate::defs::DirectiveDef {
                name: "Child".to_string(),
                selector: "app-child".to_string(),
                factory: || Box::new(()),
                host_bindings: None,
                host_vars: 0,
                inputs: std::collections::HashMap::new(),
                outputs: std::collections::HashMap::new(),
                exports_as: Vec::new(),
                host_attrs: Vec::new(),
                hooks: crate::defs::DirectiveHooks::default(),
                content_queries: None,
                host_directive_aliases: None,
            },
            create: None,
            update: None,
            decls: 0,
            vars: 0,
            change_detection: crate::defs::ChangeDetectionStrategy::Default,
            view_query: None,
        });
        let child = factory
            .create_component_view(&mut engine, &def, root, crate::shape::consts::first_node_index())
            .unwrap();

        engine.view_mut(root).unwrap().clear_dirty();
        mark_view_dirty(&mut engine, child).unwrap();

        assert!(engine.view(child).unwrap().is_dirty());
        assert!(engine.view(root).unwrap().is_dirty());
    }

    #[test]
    fn on_push_view_is_untouched_when_no_input_changed() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let root = factory.create_root_view(&mut engine, 1, 0);
        engine.view_mut(root).unwrap().clear_dirty();

        mark_dirty_if_on_push(&mut engine, root, false).unwrap();
        assert!(!engine.view(root).unwrap().is_dirty());
    }

    #[test]
    fn transplanted_view_re_arms_its_container_on_dirty_mark() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let declaring_root = factory.create_root_view(&mut engine, 1, 0);
        let hosting_root = factory.create_root_view(&mut engine, 1, 0);

        let container = factory
            .create_container(&mut engine, hosting_root, crate::shape::consts::first_node_index())
            .unwrap();
        let template = crate::defs::EmbeddedTemplateDef {
            decls: 0,
            vars: 0,
            create: None,
            update: None,
        };
        let embedded = factory
            .create_embedded_view(&mut engine, &template, container, 0, declaring_root)
            .unwrap();

        engine.container_mut(container).unwrap().mark_transplant_refreshed(0);
        assert_eq!(engine.container(container).unwrap().transplanted_views_to_refresh(), 0);

        mark_view_dirty(&mut engine, embedded).unwrap();
        assert_eq!(engine.container(container).unwrap().transplanted_views_to_refresh(), 1);

        // BindingSlot::Container set on the hosting root's own node slot.
        assert!(matches!(
            engine.view(hosting_root).unwrap().get(crate::shape::consts::first_node_index()),
            BindingSlot::Container(_)
        ));
    }
}
