//! The view factory: `createTView`/`createLView`.
//!
//! `TView`s are built once per component def and cached by the def's `Rc`
//! identity — compiling the same component twice (two instances of the
//! same type in the tree) must reuse one shape table, never build a
//! second.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use vr_foundation::{LViewFlags, Result, ViewHandle};

use crate::defs::{ChangeDetectionStrategy, ComponentDef};
use crate::engine::ViewEngine;
use crate::instance::{LContainer, LView};
use crate::shape::consts::NodeIndex;
use crate::shape::tview::{TView, TViewRef};

/// Caches one `TView` per distinct `ComponentDef`.
#[derive(Debug, Default)]
pub struct ViewFactory {
    tviews: AHashMap<usize, TViewRef>,
}

impl ViewFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get this component's cached `TView`, building it on first use.
    ///
    /// Keyed by `Rc::as_ptr` identity rather than by name: two distinct
    /// `ComponentDef` values that happen to share a name must not share a
    /// shape table.
    pub fn tview_for_component(&mut self, def: &Rc<ComponentDef>) -> TViewRef {
        let key = Rc::as_ptr(def) as usize;
        self.tviews
            .entry(key)
            .or_insert_with(|| Rc::new(RefCell::new(TView::new(def.decls, def.vars))))
            .clone()
    }

    /// Build a standalone root `TView`/`LView` pair for top-level bootstrap
    /// (no declaring parent node).
    pub fn create_root_view(&mut self, engine: &mut ViewEngine, decls: usize, vars: usize) -> ViewHandle {
        let tview = Rc::new(RefCell::new(TView::new(decls, vars)));
        let lview = LView::new(tview, None, None);
        let handle = engine.insert_view(lview);
        engine.root = Some(handle);
        tracing::trace!(view = ?handle, "created root view");
        handle
    }

    /// Build a component's `LView` from its (possibly newly built) `TView`,
    /// and link it into `parent`'s child-view chain so ordinary top-down
    /// traversal reaches it.
    ///
    /// The new view's `declaration_view` and `declaration_component_view`
    /// are both `parent`: a component's own view is always declared by the
    /// view that hosts it, never transplanted.
    ///
    /// # Errors
    ///
    /// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if
    /// `parent` is no longer live.
    pub fn create_component_view(
        &mut self,
        engine: &mut ViewEngine,
        def: &Rc<ComponentDef>,
        parent: ViewHandle,
        t_host: NodeIndex,
    ) -> Result<ViewHandle> {
        let tview = self.tview_for_component(def);
        let mut lview = LView::new(tview, Some(parent), Some(t_host));
        lview.header.context = Some((def.directive.factory)());
        lview.header.component_def = Some(def.clone());
        lview.header.declaration_view = Some(parent);
        if def.change_detection == ChangeDetectionStrategy::Default {
            lview.header.flags.insert(LViewFlags::CHECK_ALWAYS);
        }
        let handle = engine.insert_view(lview);

        let parent_view = engine.view(parent)?;
        let declaration_component_view = if parent_view.header.component_def.is_some() {
            Some(parent)
        } else {
            parent_view.header.declaration_component_view
        };
        engine.view_mut(handle)?.header.declaration_component_view = declaration_component_view;

        let parent_view = engine.view_mut(parent)?;
        match parent_view.header.child_tail {
            None => {
                parent_view.header.child_head = Some(handle);
                parent_view.header.child_tail = Some(handle);
            }
            Some(tail) => {
                parent_view.header.child_tail = Some(handle);
                let tail_view = engine.view_mut(tail)?;
                tail_view.header.next = Some(handle);
            }
        }
        tracing::trace!(?parent, child = ?handle, component = %def.directive.name, "created component view");
        Ok(handle)
    }

    /// Build a fresh embedded view from `template` and insert it into
    /// `container` at `index`. `declaration_view` is the view whose
    /// template lexically owns this embedded template, which may differ
    /// from `container`'s own host view when the view is transplanted
    /// (content projected into a structural directive declared elsewhere).
    ///
    /// # Errors
    ///
    /// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if
    /// `container`'s own host view is no longer live.
    pub fn create_embedded_view(
        &mut self,
        engine: &mut ViewEngine,
        template: &crate::defs::EmbeddedTemplateDef,
        container: vr_foundation::ContainerHandle,
        index: usize,
        declaration_view: ViewHandle,
    ) -> Result<ViewHandle> {
        let tview = Rc::new(std::cell::RefCell::new(TView::new(template.decls, template.vars)));
        let mut lview = LView::new(tview, Some(declaration_view), None);
        lview.header.declaration_view = Some(declaration_view);
        lview.header.declaration_component_view = engine.view(declaration_view)?.header.declaration_component_view;
        lview.header.embedded_update = template.update;
        let handle = engine.insert_view(lview);

        let host_view = engine.container(container)?.host_view;
        engine.container_mut(container)?.insert(index, handle, declaration_view);
        let view = engine.view_mut(handle)?;
        view.header.container = Some(container);
        if declaration_view != host_view {
            view.header.flags.insert(LViewFlags::REFRESH_TRANSPLANTED_VIEW);
        }
        Ok(handle)
    }

    /// Create an empty container anchored at `host_index` within `owner`,
    /// and store its handle at that node's binding slot.
    ///
    /// # Errors
    ///
    /// Propagates [`vr_foundation::ViewRuntimeError::StaleHandle`] if
    /// `owner` is no longer live.
    pub fn create_container(
        &mut self,
        engine: &mut ViewEngine,
        owner: ViewHandle,
        host_index: NodeIndex,
    ) -> Result<vr_foundation::ContainerHandle> {
        let handle = engine.insert_container(LContainer::new(owner));
        let lview = engine.view_mut(owner)?;
        lview.set(host_index, crate::instance::BindingSlot::Container(handle));
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{ChangeDetectionStrategy, DirectiveDef, DirectiveHooks};
    use std::collections::HashMap as Map;

    fn component_def() -> Rc<ComponentDef> {
        Rc::new(ComponentDef {
            directive: DirectiveDef {
                name: "Child".to_string(),
                selector: "app-child".to_string(),
                factory: || Box::new(()),
                host_bindings: None,
                host_vars: 0,
                inputs: Map::new(),
                outputs: Map::new(),
                exports_as: Vec::new(),
                host_attrs: Vec::new(),
                hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
            },
            create: None,
            update: None,
            decls: 3,
            vars: 2,
            change_detection: ChangeDetectionStrategy::Default,
            view_query: None,
        })
    }

    #[test]
    fn same_component_def_shares_one_tview() {
        let mut factory = ViewFactory::new();
        let def = component_def();
        let a = factory.tview_for_component(&def);
        let b = factory.tview_for_component(&def);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_defs_get_distinct_tviews_even_with_same_shape() {
        let mut factory = ViewFactory::new();
        let def_a = component_def();
        let def_b = component_def();
        let a = factory.tview_for_component(&def_a);
        let b = factory.tview_for_component(&def_b);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn component_view_links_into_parent_child_chain() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let root = factory.create_root_view(&mut engine, 1, 0);

        let def = component_def();
        let child = factory
            .create_component_view(&mut engine, &def, root, NodeIndex::new(12))
            .unwrap();

        let root_view = engine.view(root).unwrap();
        assert_eq!(root_view.header.child_head, Some(child));
        assert_eq!(root_view.header.child_tail, Some(child));
    }
}
