//! The set of directive/component defs a compiled template may match
//! against, and simple selector matching over it.
//!
//! Selector syntax here is deliberately minimal — attribute selectors
//! (`[appHighlight]`) and tag selectors (`button`) — covering what §4.4's
//! matching order actually needs to demonstrate. A full CSS-selector
//! dialect is compiler territory, out of scope for the runtime itself.

use std::rc::Rc;

use ahash::AHashMap;

use crate::defs::{AnyDirectiveDef, ComponentDef, DirectiveDef, PipeDef};

/// A parsed selector: either a bare tag name or an attribute presence
/// check.
#[derive(Debug, Clone)]
enum Selector {
    Tag(String),
    Attr(String),
}

fn parse_selector(raw: &str) -> Selector {
    if let Some(attr) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Selector::Attr(attr.to_string())
    } else {
        Selector::Tag(raw.to_string())
    }
}

impl Selector {
    fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        match self {
            Self::Tag(name) => name == tag,
            Self::Attr(name) => attrs.iter().any(|(k, _)| k == name),
        }
    }
}

/// The defs a single compilation unit (an application, in practice) may
/// resolve directives from.
#[derive(Debug, Default)]
pub struct DirectiveRegistry {
    entries: Vec<(Selector, AnyDirectiveDef)>,
    pipes: AHashMap<String, Rc<PipeDef>>,
}

impl DirectiveRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain directive.
    pub fn register_directive(&mut self, def: Rc<DirectiveDef>) {
        let selector = parse_selector(&def.selector);
        self.entries.push((selector, AnyDirectiveDef::Directive(def)));
    }

    /// Register a component.
    pub fn register_component(&mut self, def: Rc<ComponentDef>) {
        let selector = parse_selector(&def.directive.selector);
        self.entries.push((selector, AnyDirectiveDef::Component(def)));
    }

    /// Register a pipe def, keyed by the name a binding expression
    /// references it by (`| async`-equivalent). A second registration
    /// under the same name replaces the first, matching how a compiled
    /// module's own pipe list is just the last-registered-wins lookup
    /// table the compiler hands the runtime (pipe *matching* by name is
    /// unambiguous, unlike directive selector matching, so there is no
    /// §4.4-style ordering concern here).
    pub fn register_pipe(&mut self, def: Rc<PipeDef>) {
        self.pipes.insert(def.name.clone(), def);
    }

    /// Look up a pipe by the name a binding expression references.
    #[must_use]
    pub fn pipe(&self, name: &str) -> Option<&Rc<PipeDef>> {
        self.pipes.get(name)
    }

    /// Every registered def whose selector matches `tag`/`attrs`, in
    /// registration order. Registration order is significant: it is the
    /// order matching precedence falls back to once component-first and
    /// host-directives-before-component (§4.4) have been applied by the
    /// caller.
    pub fn matching<'a>(
        &'a self,
        tag: &'a str,
        attrs: &'a [(String, String)],
    ) -> impl Iterator<Item = &'a AnyDirectiveDef> + 'a {
        self.entries
            .iter()
            .filter(move |(selector, _)| selector.matches(tag, attrs))
            .map(|(_, def)| def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{ChangeDetectionStrategy, DirectiveHooks};
    use std::collections::HashMap;

    fn directive(name: &str, selector: &str) -> Rc<DirectiveDef> {
        Rc::new(DirectiveDef {
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
        })
    }

    fn component(name: &str, selector: &str) -> Rc<ComponentDef> {
        Rc::new(ComponentDef {
            directive: (*directive(name, selector)).clone(),
            create: None,
            update: None,
            decls: 0,
            vars: 0,
            change_detection: ChangeDetectionStrategy::Default,
            view_query: None,
        })
    }

    #[test]
    fn attr_selector_matches_any_element_carrying_the_attribute() {
        let mut reg = DirectiveRegistry::new();
        reg.register_directive(directive("Highlight", "[appHighlight]"));

        let attrs = vec![("appHighlight".to_string(), String::new())];
        let matches: Vec<_> = reg.matching("div", &attrs).collect();
        assert_eq!(matches.len(), 1);

        let no_attrs: Vec<(String, String)> = Vec::new();
        assert_eq!(reg.matching("div", &no_attrs).count(), 0);
    }

    #[test]
    fn component_tag_selector_matches_exact_tag() {
        let mut reg = DirectiveRegistry::new();
        reg.register_component(component("AppRoot", "app-root"));
        assert_eq!(reg.matching("app-root", &[]).count(), 1);
        assert_eq!(reg.matching("app-other", &[]).count(), 0);
    }

    #[test]
    fn pipe_lookup_finds_a_registered_pipe_by_name() {
        let mut reg = DirectiveRegistry::new();
        reg.register_pipe(Rc::new(crate::defs::PipeDef {
            name: "uppercase".to_string(),
            factory: || Box::new(()),
            pure: true,
        }));

        assert!(reg.pipe("uppercase").is_some());
        assert!(reg.pipe("lowercase").is_none());
    }

    #[test]
    fn re_registering_a_pipe_name_replaces_the_previous_def() {
        let mut reg = DirectiveRegistry::new();
        reg.register_pipe(Rc::new(crate::defs::PipeDef {
            name: "async".to_string(),
            factory: || Box::new(1u32),
            pure: true,
        }));
        reg.register_pipe(Rc::new(crate::defs::PipeDef {
            name: "async".to_string(),
            factory: || Box::new(2u32),
            pure: false,
        }));

        assert!(!reg.pipe("async").unwrap().pure);
    }
}
