//! The Creation Pass (§4.6, C7).
//!
//! Walks one view's template instructions exactly once per `LView`. While
//! the owning `TView` is still on its first creation pass, each
//! `TemplateOps` call also builds the corresponding shape (`TNode`,
//! directive defs, sibling/child links) into the `TView`; once the shape
//! is frozen, later instances replay the same instruction sequence purely
//! to populate their own `LView` (native nodes, fresh directive
//! instances) against the shape that's already there.

use vr_foundation::{DirectiveIndex, Result, ViewRuntimeError};

use crate::cursor::FrameStack;
use crate::defs::AnyDirectiveDef;
use crate::directives::registry::DirectiveRegistry;
use crate::directives::resolver::{resolve_directives, resolve_local_refs};
use crate::engine::ViewEngine;
use crate::external::Renderer;
use crate::factory::ViewFactory;
use crate::instance::BindingSlot;
use crate::ops::TemplateOps;
use crate::defs::DirectiveHooks;
use crate::shape::consts::{first_node_index, NodeIndex};
use crate::shape::hooks::{HookEntry, HookQueues};
use crate::shape::host_binding_ops::HostBindingOp;
use crate::shape::tnode::{TNode, TNodeType};
use crate::shape::tview::TData;
use vr_foundation::ViewHandle;

/// Append one directive's implemented lifecycle hooks to `hooks`, in the
/// four fixed queues the refresh pass walks in order (§4.7, §4.13).
fn register_hooks(hooks: &mut HookQueues, node: NodeIndex, directive: DirectiveIndex, def_hooks: &DirectiveHooks) {
    let entry = |hook| HookEntry { node, directive, hook };
    if let Some(hook) = def_hooks.on_init {
        hooks.on_init.push(entry(hook));
    }
    if let Some(hook) = def_hooks.do_check {
        hooks.do_check.push(entry(hook));
    }
    if let Some(hook) = def_hooks.after_content_init {
        hooks.after_content_init.push(entry(hook));
    }
    if let Some(hook) = def_hooks.after_content_checked {
        hooks.after_content_checked.push(entry(hook));
    }
    if let Some(hook) = def_hooks.after_view_init {
        hooks.after_view_init.push(entry(hook));
    }
    if let Some(hook) = def_hooks.after_view_checked {
        hooks.after_view_checked.push(entry(hook));
    }
    if let Some(hook) = def_hooks.on_destroy {
        hooks.destroy.push(entry(hook));
    }
}

/// Drives one view's creation-pass instructions.
pub struct CreationContext<'e> {
    engine: &'e mut ViewEngine,
    factory: &'e mut ViewFactory,
    registry: &'e DirectiveRegistry,
    renderer: &'e mut dyn Renderer,
    view: ViewHandle,
    frames: FrameStack,
    next_index: NodeIndex,
    parent_stack: Vec<NodeIndex>,
    last_sibling: Option<NodeIndex>,
    last_opened: Option<NodeIndex>,
}

impl<'e> CreationContext<'e> {
    /// Begin a creation pass for `view`.
    pub fn new(
        engine: &'e mut ViewEngine,
        factory: &'e mut ViewFactory,
        registry: &'e DirectiveRegistry,
        renderer: &'e mut dyn Renderer,
        view: ViewHandle,
    ) -> Self {
        let mut frames = FrameStack::new();
        frames.push(view);
        Self {
            engine,
            factory,
            registry,
            renderer,
            view,
            frames,
            next_index: first_node_index(),
            parent_stack: Vec::new(),
            last_sibling: None,
            last_opened: None,
        }
    }

    fn first_create_pass(&self) -> Result<bool> {
        Ok(self.engine.view(self.view)?.header.tview.borrow().first_create_pass)
    }

    fn reserve_index(&mut self) -> NodeIndex {
        let index = self.next_index;
        self.next_index = self.next_index + 1;
        index
    }

    fn link_sibling(&mut self, index: NodeIndex) -> Result<()> {
        let tview = self.engine.view(self.view)?.header.tview.clone();
        if let Some(last) = self.last_sibling {
            tview.borrow_mut().node_mut(last).next = Some(index);
        } else if let Some(&parent) = self.parent_stack.last() {
            tview.borrow_mut().node_mut(parent).child = Some(index);
        } else {
            tview.borrow_mut().first_child = Some(index);
        }
        self.last_sibling = Some(index);
        Ok(())
    }

    fn build_node_shape(
        &mut self,
        index: NodeIndex,
        node_type: TNodeType,
        tag: Option<&str>,
        attrs: &[(&str, &str)],
    ) -> Result<Vec<(NodeIndex, AnyDirectiveDef)>> {
        let tview = self.engine.view(self.view)?.header.tview.clone();
        let owned_attrs: Vec<(String, String)> = attrs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut node = TNode::new(index, node_type, tag.map(str::to_string), owned_attrs);
        node.parent = self.parent_stack.last().copied();
        node.directive_start = DirectiveIndex::new(index.get());

        let resolved = resolve_directives(&mut node, self.registry, &[], false)?;
        let mut directive_slots = Vec::with_capacity(resolved.len());
        for resolved_dir in &resolved {
            let d_index = self.reserve_index();
            directive_slots.push((d_index, resolved_dir.def.clone()));
        }
        node.directive_end = DirectiveIndex::new(self.next_index.get());

        {
            let mut t = tview.borrow_mut();
            t.write_slot(index, TData::Node(node));
            let mut selected = false;
            for (d_index, def) in &directive_slots {
                t.write_slot(*d_index, TData::Directive(def.clone()));
                let directive_index = vr_foundation::DirectiveIndex::new(d_index.get());
                let directive = def.directive();
                if let Some(host_bindings) = directive.host_bindings {
                    if !selected {
                        t.host_binding_opcodes.push(HostBindingOp::SelectElement(index));
                        selected = true;
                    }
                    let mut binding_root = None;
                    for _ in 0..directive.host_vars {
                        let slot = t.push_slot(TData::Empty, BindingSlot::NoChange);
                        // Mirror the growth onto this in-flight LView too: it
                        // was cloned from the pre-growth blueprint in
                        // `LView::new`, so every expando slot `TView.data`
                        // gains here must gain a matching slot on the
                        // instance side or the two arrays fall out of
                        // lockstep for this, the very first, instance (§3).
                        let lview_slot = self.engine.view_mut(self.view)?.push_slot(BindingSlot::NoChange)?;
                        debug_assert_eq!(slot, lview_slot, "expando slot diverged between TView and its first LView");
                        binding_root.get_or_insert(slot);
                    }
                    let binding_root = binding_root.unwrap_or(t.expando_start_index);
                    t.host_binding_opcodes.push(HostBindingOp::InvokeHostBinding {
                        directive: directive_index,
                        binding_root,
                        eval: host_bindings,
                    });
                }
                register_hooks(&mut t.hooks, index, directive_index, &directive.hooks);
                if let Some(query) = directive.content_queries {
                    t.content_queries.push(crate::queries::ContentQueryEntry {
                        directive: directive_index,
                        query,
                    });
                }
            }
        }
        self.link_sibling(index)?;
        Ok(directive_slots)
    }

    fn existing_directive_slots(&self, index: NodeIndex) -> Result<Vec<NodeIndex>> {
        let tview = self.engine.view(self.view)?.header.tview.clone();
        let tview = tview.borrow();
        let node = tview.node(index)?;
        let range = node.directive_range();
        Ok(range.map(vr_foundation::SlotIndex::new).collect())
    }

    /// Instantiate every directive matched on `host_index`, writing each
    /// instance into its own directive slot. A matched component also gets
    /// its own child `LView` created here, linked into the parent's child
    /// chain, and recorded at `host_index`'s own slot as
    /// [`BindingSlot::ComponentView`] — replacing the `NodeRef` placed
    /// there moments earlier, the same way the node's own slot holds the
    /// component's view rather than its bare native element once the node
    /// turns out to be a component host.
    fn instantiate_directives(&mut self, host_index: NodeIndex, directive_slots: &[NodeIndex]) -> Result<()> {
        for d_index in directive_slots {
            let tview = self.engine.view(self.view)?.header.tview.clone();
            let def = {
                let t = tview.borrow();
                let offset = t.content_offset(*d_index);
                t.data[offset]
                    .as_directive()
                    .cloned()
                    .expect("directive slot holds a directive/component def")
            };
            let instance = (def.directive().factory)();
            let lview = self.engine.view_mut(self.view)?;
            lview.set(*d_index, BindingSlot::Directive(instance));

            if let Some(query) = def.directive().content_queries {
                let slot = vr_foundation::SlotIndex::new(d_index.get());
                if let BindingSlot::Directive(instance) = self.engine.view_mut(self.view)?.get_mut(slot) {
                    query(instance, crate::defs::QueryMode::Create);
                }
            }

            if let AnyDirectiveDef::Component(component_def) = &def {
                let child = self
                    .factory
                    .create_component_view(self.engine, component_def, self.view, host_index)?;
                if self.first_create_pass()? {
                    tview.borrow_mut().components.push(host_index);
                }
                let native = match self.engine.view(self.view)?.get(host_index) {
                    BindingSlot::NodeRef(rc) => rc.clone(),
                    other => panic!("component host slot must hold a native node ref, found {other:?}"),
                };
                self.engine.view_mut(child)?.header.host = Some(native);
                self.engine.view_mut(self.view)?.set(host_index, BindingSlot::ComponentView(child));

                if component_def.create.is_some() || component_def.view_query.is_some() {
                    let mut context = self
                        .engine
                        .view_mut(child)?
                        .header
                        .context
                        .take()
                        .expect("component view created with a context instance");

                    if let Some(view_query) = component_def.view_query {
                        crate::queries::run_view_query(view_query, &mut context, crate::defs::QueryMode::Create);
                    }

                    let result = if let Some(create_fn) = component_def.create {
                        run_creation_pass(
                            &mut *self.engine,
                            &mut *self.factory,
                            self.registry,
                            &mut *self.renderer,
                            child,
                            |ops| create_fn(ops, &mut context),
                        )
                    } else {
                        Ok(())
                    };
                    self.engine.view_mut(child)?.header.context = Some(context);
                    result?;
                }
            }
        }
        Ok(())
    }

    /// Current traversal depth, exposed for diagnostics/tests.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.depth()
    }
}

impl TemplateOps for CreationContext<'_> {
    fn element_start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeIndex> {
        let index = self.reserve_index();
        let directive_slots = if self.first_create_pass()? {
            let slots = self.build_node_shape(index, TNodeType::Element, Some(tag), attrs)?;
            slots.into_iter().map(|(i, _)| i).collect::<Vec<_>>()
        } else {
            self.existing_directive_slots(index)?
        };

        let native = self.renderer.create_element(tag);
        let lview = self.engine.view_mut(self.view)?;
        lview.set(index, BindingSlot::NodeRef(std::rc::Rc::from(native)));

        self.instantiate_directives(index, &directive_slots)?;
        self.parent_stack.push(index);
        self.last_sibling = None;
        self.last_opened = Some(index);
        Ok(index)
    }

    fn element_end(&mut self) {
        self.last_sibling = self.parent_stack.pop();
    }

    fn text(&mut self, content: &str) -> Result<NodeIndex> {
        let index = self.reserve_index();
        if self.first_create_pass()? {
            self.build_node_shape(index, TNodeType::Text, None, &[])?;
        }
        let native = self.renderer.create_text(content);
        let lview = self.engine.view_mut(self.view)?;
        lview.set(index, BindingSlot::NodeRef(std::rc::Rc::from(native)));
        Ok(index)
    }

    fn container(&mut self, attrs: &[(&str, &str)]) -> Result<NodeIndex> {
        let index = self.reserve_index();
        let first_pass = self.first_create_pass()?;
        let directive_slots = if first_pass {
            let slots = self.build_node_shape(index, TNodeType::Container, None, attrs)?;
            slots.into_iter().map(|(i, _)| i).collect::<Vec<_>>()
        } else {
            self.existing_directive_slots(index)?
        };
        if first_pass {
            let tview = self.engine.view(self.view)?.header.tview.clone();
            tview.borrow_mut().containers.push(index);
        }

        self.factory.create_container(self.engine, self.view, index)?;
        self.instantiate_directives(index, &directive_slots)?;
        self.last_opened = Some(index);
        // A container anchor has no children of its own in the declaring
        // template; embedded views inserted into it are separate LViews,
        // not nodes in this shape tree, so there is no matching
        // `element_end` for it.
        Ok(index)
    }

    fn local_ref(&mut self, name: &str, export_as: Option<&str>) -> Result<()> {
        if !self.first_create_pass()? {
            return Ok(());
        }
        let index = self
            .last_opened
            .expect("local_ref must follow element_start/container within the same creation pass");
        let tview = self.engine.view(self.view)?.header.tview.clone();

        let resolved = {
            let t = tview.borrow();
            let node = t.node(index)?;
            node.directive_range()
                .map(|offset| {
                    let def = t.data[t.content_offset(NodeIndex::new(offset))]
                        .as_directive()
                        .cloned()
                        .expect("directive slot holds a directive/component def");
                    crate::defs::ResolvedDirective {
                        offset: DirectiveIndex::new(offset),
                        def,
                    }
                })
                .collect::<Vec<_>>()
        };

        let mut t = tview.borrow_mut();
        let node = t.node_mut(index);
        resolve_local_refs(node, &resolved, &[(name, export_as)])
    }
}

/// Run the creation pass for `view`, then freeze its `TView`'s first-pass
/// flag on success.
///
/// # Errors
///
/// On failure, marks the `TView` [`crate::shape::tview::TView::mark_incomplete`]
/// rather than leaving it silently half-built (§4 edge case: "a first
/// creation pass must not partially succeed").
pub fn run_creation_pass(
    engine: &mut ViewEngine,
    factory: &mut ViewFactory,
    registry: &DirectiveRegistry,
    renderer: &mut dyn Renderer,
    view: ViewHandle,
    template: impl FnOnce(&mut dyn TemplateOps) -> Result<()>,
) -> Result<()> {
    tracing::trace!(?view, "running creation pass");
    let tview = engine.view(view)?.header.tview.clone();
    let mut ctx = CreationContext::new(engine, factory, registry, renderer, view);
    let result = template(&mut ctx);

    match result {
        Ok(()) => {
            tview.borrow_mut().complete_create_pass();
            Ok(())
        }
        Err(err) => {
            tracing::debug!(?view, error = %err, "creation pass failed, marking TView incomplete");
            tview.borrow_mut().mark_incomplete();
            Err(err)
        }
    }
}

/// A programmer-error guard used by tests and diagnostics: asserts a view's
/// shape and instance arrays are still in lockstep after a creation pass.
///
/// # Errors
///
/// Returns [`ViewRuntimeError::IncompleteFirstPass`] if the arrays have
/// diverged, which should be structurally impossible if `write_slot` and
/// `push_slot` are always called in pairs.
pub fn assert_arrays_in_sync(engine: &ViewEngine, view: ViewHandle) -> Result<()> {
    let lview = engine.view(view)?;
    let tview = lview.header.tview.borrow();
    if tview.arrays_in_sync() && lview.slots.len() == tview.data.len() {
        Ok(())
    } else {
        Err(ViewRuntimeError::IncompleteFirstPass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::DirectiveDef;
    use std::any::Any;
    use std::collections::HashMap;
    use std::rc::Rc;

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn create_element(&mut self, _tag: &str) -> Box<dyn Any> {
            Box::new(())
        }
        fn create_text(&mut self, _content: &str) -> Box<dyn Any> {
            Box::new(())
        }
        fn set_property(&mut self, _node: &dyn Any, _name: &str, _value: &str) {}
        fn set_text(&mut self, _node: &dyn Any, _content: &str) {}
        fn append_child(&mut self, _parent: &dyn Any, _child: &dyn Any) {}
        fn remove_child(&mut self, _parent: &dyn Any, _child: &dyn Any) {}
    }

    fn registry_with(def: AnyDirectiveDef) -> DirectiveRegistry {
        let mut registry = DirectiveRegistry::new();
        match def {
            AnyDirectiveDef::Directive(d) => registry.register_directive(d),
            AnyDirectiveDef::Component(c) => registry.register_component(c),
        }
        registry
    }

    fn directive_with_export_as(export_as: &[&str]) -> AnyDirectiveDef {
        AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: "Tooltip".to_string(),
            selector: "[appTooltip]".to_string(),
            factory: || Box::new(()),
            host_bindings: None,
            host_vars: 0,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            exports_as: export_as.iter().map(|s| (*s).to_string()).collect(),
            host_attrs: Vec::new(),
            hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
        }))
    }

    #[test]
    fn local_ref_resolves_against_the_just_opened_elements_export_as() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let registry = registry_with(directive_with_export_as(&["tooltip"]));
        let root = factory.create_root_view(&mut engine, 2, 0);

        let mut renderer = NullRenderer;
        run_creation_pass(&mut engine, &mut factory, &registry, &mut renderer, root, |ops| {
            let node = ops.element_start("div", &[("appTooltip", "")])?;
            ops.local_ref("t", Some("tooltip"))?;
            ops.element_end();
            assert_eq!(node, first_node_index());
            Ok(())
        })
        .unwrap();

        let tview = engine.view(root).unwrap().header.tview.clone();
        let node = tview.borrow().node(first_node_index()).unwrap().clone();
        assert_eq!(node.local_names, vec![("t".to_string(), Some(0))]);
    }

    #[test]
    fn local_ref_propagates_export_not_found() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let registry = registry_with(directive_with_export_as(&["tooltip"]));
        let root = factory.create_root_view(&mut engine, 2, 0);

        let mut renderer = NullRenderer;
        let result = run_creation_pass(&mut engine, &mut factory, &registry, &mut renderer, root, |ops| {
            ops.element_start("div", &[("appTooltip", "")])?;
            ops.local_ref("t", Some("nope"))?;
            ops.element_end();
            Ok(())
        });

        assert!(matches!(result, Err(ViewRuntimeError::ExportNotFound { .. })));
    }
}
