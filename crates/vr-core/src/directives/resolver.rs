//! Directive resolution (§4.4): matches a node's tag/attributes against a
//! [`DirectiveRegistry`], orders the matches, and writes the result into
//! the node's directive range and flags.
//!
//! Matching order, in priority:
//! 1. A node's own host directives (directives applied directly via the
//!    compiler, ahead of anything selector-matched) come first.
//! 2. A matched component, if any, comes immediately after host
//!    directives and before plain selector-matched directives.
//! 3. Remaining selector-matched directives follow in registration order.
//!
//! At most one component may match a given host node; a second match is
//! [`ViewRuntimeError::MultipleComponentsForHost`], not a silent
//! last-one-wins overwrite, because which component owns the node changes
//! the node's entire downstream behavior (its own `TView`, its own
//! `LView`).

use vr_foundation::{DirectiveIndex, Result, ViewRuntimeError};

use crate::defs::{AnyDirectiveDef, ResolvedDirective};
use crate::directives::aliasing::{extract_initial_inputs, merge_aliases};
use crate::directives::registry::DirectiveRegistry;
use crate::shape::tnode::{TNode, TNodeFlags};

/// Resolve and write directives for one node.
///
/// `host_directives` are applied unconditionally ahead of registry
/// matches (directives the compiler attaches directly, as opposed to ones
/// that matched by selector). `is_inline_template` suppresses initial
/// input extraction per §4.5's inline-template edge case.
///
/// # Errors
///
/// Returns [`ViewRuntimeError::MultipleComponentsForHost`] if more than
/// one component def would match this node.
pub fn resolve_directives(
    node: &mut TNode,
    registry: &DirectiveRegistry,
    host_directives: &[AnyDirectiveDef],
    is_inline_template: bool,
) -> Result<Vec<ResolvedDirective>> {
    let tag = node.name.as_deref().unwrap_or("");
    let selector_matches: Vec<AnyDirectiveDef> = registry.matching(tag, &node.attrs).cloned().collect();

    let mut ordered: Vec<AnyDirectiveDef> = Vec::with_capacity(host_directives.len() + selector_matches.len());
    ordered.extend(host_directives.iter().cloned());

    let mut component_slot: Option<usize> = None;
    for def in selector_matches {
        if matches!(def, AnyDirectiveDef::Component(_)) {
            if let Some(existing) = component_slot {
                let AnyDirectiveDef::Component(first) = &ordered[existing] else {
                    unreachable!("component_slot always indexes a Component variant")
                };
                let AnyDirectiveDef::Component(second) = &def else {
                    unreachable!("just matched on Component above")
                };
                return Err(ViewRuntimeError::MultipleComponentsForHost {
                    first: first.directive.name.clone(),
                    second: second.directive.name.clone(),
                });
            }
            // A component goes immediately after any host directives,
            // ahead of plain selector-matched directives already pushed.
            let insert_at = ordered
                .iter()
                .position(|d| !host_directives_contains(host_directives, d))
                .unwrap_or(ordered.len());
            ordered.insert(insert_at, def);
            component_slot = Some(insert_at);
        } else {
            ordered.push(def);
        }
    }

    let start = node.directive_start;
    let mut resolved = Vec::with_capacity(ordered.len());
    for (i, def) in ordered.into_iter().enumerate() {
        let offset = DirectiveIndex::new(i);
        merge_aliases(node, start + i, &def);

        // Component is iterated first (it was inserted ahead of plain
        // selector-matched directives above), so its hostAttrs land here
        // first and are overwritten by any later directive's same-named
        // attribute: component hostAttrs end up lowest priority (§4.4
        // step 6).
        for (name, value) in &def.directive().host_attrs {
            node.merged_attrs.retain(|(n, _)| n != name);
            node.merged_attrs.push((name.clone(), value.clone()));
        }

        let initial = extract_initial_inputs(node, offset, &def, is_inline_template);
        if node.initial_inputs.len() <= i {
            node.initial_inputs.resize(i + 1, Vec::new());
        }
        node.initial_inputs[i] = initial;

        if let AnyDirectiveDef::Component(_) = &def {
            node.component_offset = Some(i as u16);
        }
        resolved.push(ResolvedDirective { offset, def });
    }

    node.directive_end = start + resolved.len();
    if !resolved.is_empty() {
        node.flags.insert(TNodeFlags::IS_DIRECTIVE_HOST);
    }
    if resolved
        .iter()
        .any(|r| r.def.directive().host_bindings.is_some())
    {
        node.flags.insert(TNodeFlags::HAS_HOST_BINDINGS);
    }
    if node.inputs.contains_key("class") {
        node.flags.insert(TNodeFlags::HAS_CLASS_INPUT);
    }
    if node.inputs.contains_key("style") {
        node.flags.insert(TNodeFlags::HAS_STYLE_INPUT);
    }
    if resolved
        .iter()
        .any(|r| r.def.directive().content_queries.is_some())
    {
        node.flags.insert(TNodeFlags::HAS_CONTENT_QUERY);
    }

    Ok(resolved)
}

fn host_directives_contains(host_directives: &[AnyDirectiveDef], needle: &AnyDirectiveDef) -> bool {
    host_directives
        .iter()
        .any(|d| std::ptr::eq(d.directive(), needle.directive()))
}

/// Resolve a node's local template references (`#foo` / `#foo="exportAs"`)
/// against its already-resolved directive range, writing the result into
/// `node.local_names` (§4.4 step 8).
///
/// `refs` pairs a local name with the export name it requests, or `None`
/// to mean "the element itself, or the component if this node hosts one"
/// (the un-parameterized `#foo` form). `resolved` must be the directive
/// list [`resolve_directives`] just produced for this same node.
///
/// # Errors
///
/// Returns [`ViewRuntimeError::ExportNotFound`] if a requested export name
/// matches no resolved directive's `exports_as` list.
pub fn resolve_local_refs(
    node: &mut TNode,
    resolved: &[ResolvedDirective],
    refs: &[(&str, Option<&str>)],
) -> Result<()> {
    for (name, export_as) in refs {
        let directive_offset = match export_as {
            None => node.component_offset,
            Some(requested) => {
                let found = resolved
                    .iter()
                    .find(|r| r.def.directive().exports_as.iter().any(|e| e == requested));
                match found {
                    Some(r) => Some(r.offset.get() as u16),
                    None => {
                        return Err(ViewRuntimeError::ExportNotFound {
                            name: (*requested).to_string(),
                        })
                    }
                }
            }
        };
        node.local_names.push(((*name).to_string(), directive_offset));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{ChangeDetectionStrategy, ComponentDef, DirectiveDef, DirectiveHooks};
    use crate::shape::consts::NodeIndex;
    use crate::shape::tnode::TNodeType;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn plain_directive(name: &str, selector: &str) -> AnyDirectiveDef {
        AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: name.to_string(),
            selector: selector.to_string(),
            factory: || Box::new(()),
            host_bindings: None,
            host_vars: 0,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            exports_as: Vec::new(),
            host_attrs: Vec::new(),
            hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
        }))
    }

    fn component(name: &str, selector: &str) -> AnyDirectiveDef {
        AnyDirectiveDef::Component(Rc::new(ComponentDef {
            directive: DirectiveDef {
                name: name.to_string(),
                selector: selector.to_string(),
                factory: || Box::new(()),
                host_bindings: None,
                host_vars: 0,
                inputs: HashMap::new(),
                outputs: HashMap::new(),
                exports_as: Vec::new(),
                host_attrs: Vec::new(),
                hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
            },
            create: None,
            update: None,
            decls: 0,
            vars: 0,
            change_detection: ChangeDetectionStrategy::Default,
            view_query: None,
        }))
    }

    fn registry_with(defs: Vec<AnyDirectiveDef>) -> DirectiveRegistry {
        let mut reg = DirectiveRegistry::new();
        for def in defs {
            match def {
                AnyDirectiveDef::Directive(d) => reg.register_directive(d),
                AnyDirectiveDef::Component(c) => reg.register_component(c),
            }
        }
        reg
    }

    #[test]
    fn single_component_resolves_and_sets_component_offset() {
        let registry = registry_with(vec![component("AppRoot", "app-root")]);
        let mut node = TNode::new(NodeIndex::new(12), TNodeType::Element, Some("app-root".to_string()), vec![]);

        let resolved = resolve_directives(&mut node, &registry, &[], false).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(node.component_offset, Some(0));
        assert!(node.flags.contains(TNodeFlags::IS_DIRECTIVE_HOST));
    }

    #[test]
    fn two_components_on_one_host_is_an_error() {
        let registry = registry_with(vec![component("A", "[dual]"), component("B", "[dual]")]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("div".to_string()),
            vec![("dual".to_string(), String::new())],
        );

        let err = resolve_directives(&mut node, &registry, &[], false).unwrap_err();
        assert!(matches!(err, ViewRuntimeError::MultipleComponentsForHost { .. }));
    }

    #[test]
    fn plain_directives_and_component_can_coexist() {
        let registry = registry_with(vec![
            plain_directive("Highlight", "[appHighlight]"),
            component("Widget", "[appHighlight]"),
        ]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("div".to_string()),
            vec![("appHighlight".to_string(), String::new())],
        );

        let resolved = resolve_directives(&mut node, &registry, &[], false).unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(node.component_offset.is_some());
    }

    fn directive_with_export_as(name: &str, selector: &str, export_as: &[&str]) -> AnyDirectiveDef {
        AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: name.to_string(),
            selector: selector.to_string(),
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
    fn resolve_local_refs_finds_matching_export_as() {
        let registry = registry_with(vec![directive_with_export_as("Tooltip", "[appTooltip]", &["tooltip"])]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("div".to_string()),
            vec![("appTooltip".to_string(), String::new())],
        );

        let resolved = resolve_directives(&mut node, &registry, &[], false).unwrap();
        resolve_local_refs(&mut node, &resolved, &[("t", Some("tooltip"))]).unwrap();

        assert_eq!(node.local_names, vec![("t".to_string(), Some(0))]);
    }

    #[test]
    fn resolve_local_refs_defaults_to_component_offset_when_unparameterized() {
        let registry = registry_with(vec![component("Widget", "app-widget")]);
        let mut node = TNode::new(NodeIndex::new(12), TNodeType::Element, Some("app-widget".to_string()), vec![]);

        let resolved = resolve_directives(&mut node, &registry, &[], false).unwrap();
        resolve_local_refs(&mut node, &resolved, &[("w", None)]).unwrap();

        assert_eq!(node.local_names, vec![("w".to_string(), node.component_offset)]);
        assert!(node.component_offset.is_some());
    }

    #[test]
    fn host_attrs_merge_into_node_with_component_as_lowest_priority() {
        let component_def = AnyDirectiveDef::Component(Rc::new(ComponentDef {
            directive: DirectiveDef {
                name: "Widget".to_string(),
                selector: "app-widget".to_string(),
                factory: || Box::new(()),
                host_bindings: None,
                host_vars: 0,
                inputs: HashMap::new(),
                outputs: HashMap::new(),
                exports_as: Vec::new(),
                host_attrs: vec![("role".to_string(), "region".to_string())],
                hooks: DirectiveHooks::default(),
                content_queries: None,
                host_directive_aliases: None,
            },
            create: None,
            update: None,
            decls: 0,
            vars: 0,
            change_detection: ChangeDetectionStrategy::Default,
            view_query: None,
        }));
        let directive_def = AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: "Highlight".to_string(),
            selector: "[appHighlight]".to_string(),
            factory: || Box::new(()),
            host_bindings: None,
            host_vars: 0,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            exports_as: Vec::new(),
            host_attrs: vec![("role".to_string(), "button".to_string())],
            hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
        }));

        let registry = registry_with(vec![component_def, directive_def]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("app-widget".to_string()),
            vec![("appHighlight".to_string(), String::new())],
        );

        resolve_directives(&mut node, &registry, &[], false).unwrap();

        // The plain directive matches after the component, so its
        // `role` overwrites the component's: component hostAttrs end up
        // lowest priority.
        assert_eq!(node.merged_attrs, vec![("role".to_string(), "button".to_string())]);
    }

    #[test]
    fn class_style_and_content_query_flags_are_set_from_matched_directives() {
        let mut queried_inputs = HashMap::new();
        queried_inputs.insert("class".to_string(), "klass".to_string());
        let queried = AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: "Query".to_string(),
            selector: "[q]".to_string(),
            factory: || Box::new(()),
            host_bindings: None,
            host_vars: 0,
            inputs: queried_inputs,
            outputs: HashMap::new(),
            exports_as: Vec::new(),
            host_attrs: Vec::new(),
            hooks: DirectiveHooks::default(),
            content_queries: Some(|_, _| {}),
            host_directive_aliases: None,
        }));

        let mut styled_inputs = HashMap::new();
        styled_inputs.insert("style".to_string(), "style_".to_string());
        let styled = AnyDirectiveDef::Directive(Rc::new(DirectiveDef {
            name: "Styled".to_string(),
            selector: "[s]".to_string(),
            factory: || Box::new(()),
            host_bindings: None,
            host_vars: 0,
            inputs: styled_inputs,
            outputs: HashMap::new(),
            exports_as: Vec::new(),
            host_attrs: Vec::new(),
            hooks: DirectiveHooks::default(),
            content_queries: None,
            host_directive_aliases: None,
        }));

        let registry = registry_with(vec![queried, styled]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("div".to_string()),
            vec![("q".to_string(), String::new()), ("s".to_string(), String::new())],
        );

        resolve_directives(&mut node, &registry, &[], false).unwrap();

        assert!(node.flags.contains(TNodeFlags::HAS_CLASS_INPUT));
        assert!(node.flags.contains(TNodeFlags::HAS_STYLE_INPUT));
        assert!(node.flags.contains(TNodeFlags::HAS_CONTENT_QUERY));
    }

    #[test]
    fn resolve_local_refs_errors_on_unknown_export_name() {
        let registry = registry_with(vec![directive_with_export_as("Tooltip", "[appTooltip]", &["tooltip"])]);
        let mut node = TNode::new(
            NodeIndex::new(12),
            TNodeType::Element,
            Some("div".to_string()),
            vec![("appTooltip".to_string(), String::new())],
        );

        let resolved = resolve_directives(&mut node, &registry, &[], false).unwrap();
        let err = resolve_local_refs(&mut node, &resolved, &[("t", Some("nope"))]).unwrap_err();

        assert!(matches!(err, ViewRuntimeError::ExportNotFound { name } if name == "nope"));
    }
}
