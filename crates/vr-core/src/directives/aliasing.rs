//! Input/output alias table construction (§4.5).
//!
//! Once a node's directive range is known, each matched directive's
//! `inputs`/`outputs` maps (public name -> private/instance name) are
//! folded into the node's combined [`AliasTable`]s, and any declared
//! initial input values are extracted from the node's static attributes —
//! except on an inline template node (`<ng-template>`-anchored structural
//! directive host), where static attributes belong to the template
//! instruction itself, not to a bindable input (§4.5 edge case).

use smallvec::SmallVec;
use vr_foundation::DirectiveIndex;

use crate::defs::AnyDirectiveDef;
use crate::shape::tnode::TNode;

/// Fold one matched directive's alias maps into `node`'s combined input
/// and output tables, at directive-range offset `offset`.
///
/// When the directive carries a `host_directive_aliases` map (it was
/// applied to this host *as a host directive*, not matched directly), that
/// map acts as both an allow-list and a rename: only inputs/outputs with
/// an entry in the map are exposed on the host at all, under the name the
/// map gives them rather than the directive's own public name (§4.5).
/// Without such a map every public name is exposed unchanged, the
/// ordinary selector-matched case.
pub fn merge_aliases(node: &mut TNode, offset: DirectiveIndex, def: &AnyDirectiveDef) {
    let directive = def.directive();
    let aliases = directive.host_directive_aliases.as_ref();

    for (public, private) in &directive.inputs {
        let Some(exposed) = exposed_name(aliases.map(|a| &a.inputs), public) else {
            continue;
        };
        node.inputs
            .entry(exposed)
            .or_insert_with(SmallVec::new)
            .push((offset, private.clone()));
    }
    for (public, private) in &directive.outputs {
        let Some(exposed) = exposed_name(aliases.map(|a| &a.outputs), public) else {
            continue;
        };
        node.outputs
            .entry(exposed)
            .or_insert_with(SmallVec::new)
            .push((offset, private.clone()));
    }
}

/// Resolve the public name a directive's own `public` input/output name is
/// exposed under on the host, given an optional host-directive allow-list.
///
/// Returns `None` when an allow-list is present but has no entry for
/// `public` — the binding is simply not reachable from outside the host
/// directive in that case. Returns `Some(public)` unchanged when there is
/// no allow-list at all.
fn exposed_name(allow_list: Option<&std::collections::HashMap<String, String>>, public: &str) -> Option<String> {
    match allow_list {
        None => Some(public.to_string()),
        Some(map) => map.get(public).cloned(),
    }
}

/// Extract initial input values for one directive's offset from the
/// node's static attributes, skipping extraction entirely when
/// `is_inline_template` is set.
///
/// Returns one `(public name, attr value)` pair per statically-bound
/// attribute this directive claims as an input.
#[must_use]
pub fn extract_initial_inputs(
    node: &TNode,
    offset: DirectiveIndex,
    def: &AnyDirectiveDef,
    is_inline_template: bool,
) -> Vec<(String, String)> {
    if is_inline_template {
        return Vec::new();
    }
    let directive = def.directive();
    let mut found = Vec::new();
    for (attr_name, attr_value) in &node.attrs {
        if directive.inputs.contains_key(attr_name) {
            found.push((attr_name.clone(), attr_value.clone()));
        }
    }
    let _ = offset;
    found
}
