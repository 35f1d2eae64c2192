//! `TView` — the immutable shape table shared by every instance of one
//! template.
//!
//! One `TView` is built the first time a template (a root, a component, or
//! an embedded `<ng-template>`-equivalent) is instantiated, and reused by
//! every later instance. `TView.data` and `TView.blueprint` stay the same
//! length as every `LView` built from this `TView` for as long as the
//! program runs (§3 Dual-buffer invariant); nothing after the first
//! creation pass may change either array's length.

use std::rc::Rc;

use vr_foundation::{Result, SlotIndex, ViewRuntimeError};

use crate::defs::AnyDirectiveDef;
use crate::instance::lview::BindingSlot;
use crate::queries::ContentQueryEntry;

use super::consts::{NodeIndex, HEADER_OFFSET};
use super::hooks::HookQueues;
use super::host_binding_ops::HostBindingOp;
use super::tnode::TNode;

/// One entry in `TView.data`, parallel by position to the corresponding
/// `LView` content slot.
#[derive(Debug, Clone, Default)]
pub enum TData {
    /// Reserved header region, or a slot not yet assigned a shape.
    #[default]
    Empty,
    /// A node's shape descriptor.
    Node(TNode),
    /// A matched directive or component def occupying one directive slot.
    Directive(AnyDirectiveDef),
}

impl TData {
    /// Borrow this slot as a `TNode`, if it holds one.
    #[must_use]
    pub fn as_node(&self) -> Option<&TNode> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Mutably borrow this slot as a `TNode`, if it holds one.
    pub fn as_node_mut(&mut self) -> Option<&mut TNode> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Borrow this slot as a directive/component def, if it holds one.
    #[must_use]
    pub fn as_directive(&self) -> Option<&AnyDirectiveDef> {
        match self {
            Self::Directive(d) => Some(d),
            _ => None,
        }
    }
}

/// The immutable shape table for one template.
///
/// Everything below `data`/`blueprint` is write-once: filled in while
/// `first_create_pass` is still `true`, then frozen. `first_create_pass`
/// and `first_update_pass` are themselves one-way flags (§4 Monotonic
/// one-way flags design note) — once flipped to `false` they never flip
/// back, even if a later creation pass partially fails.
#[derive(Debug)]
pub struct TView {
    /// Number of node/directive declaration slots the template declares.
    pub decls: usize,
    /// Number of pure binding var slots the template declares.
    pub vars: usize,
    /// First slot index at which binding values (as opposed to
    /// decls/expando) begin.
    pub binding_start_index: SlotIndex,
    /// First slot index at which the expando region (dynamically grown
    /// host-binding/pipe slots) begins.
    pub expando_start_index: SlotIndex,

    /// Per-slot shape/def content, parallel to every `LView`'s content
    /// region. Length is fixed once `first_create_pass` flips to `false`.
    pub data: Vec<TData>,
    /// Template for a fresh `LView`'s content region; copied wholesale
    /// into every new instance (§4.2).
    pub blueprint: Vec<BindingSlot>,

    /// Flattened host-binding opcode stream (§4.10), built incrementally
    /// across the first creation pass as each node's directives resolve.
    pub host_binding_opcodes: Vec<HostBindingOp>,

    /// Lifecycle hook queues (§4.13).
    pub hooks: HookQueues,

    /// Content-query registrations contributed by matched directives, in
    /// match order. Run once in `Create` mode per owning view, then again
    /// in `Update` mode on every refresh pass that reaches it, after
    /// embedded views refresh and before content hooks so hook code
    /// observes up-to-date results.
    pub content_queries: Vec<ContentQueryEntry>,

    /// First node's index, the root of this template's shape tree.
    pub first_child: Option<NodeIndex>,

    /// Every node in this template that hosts a component, in creation
    /// order. The refresh pass walks this list to find each child
    /// component view without re-scanning the whole node tree.
    pub components: Vec<NodeIndex>,
    /// Every node in this template that anchors a view container, in
    /// creation order. The refresh pass walks this list to find embedded
    /// views to refresh without re-scanning the whole node tree.
    pub containers: Vec<NodeIndex>,

    /// `true` until the first `LView` built from this `TView` completes
    /// its creation pass without error. Drives whether `TNode`s get built
    /// or merely looked up (§4.1/§4.6).
    pub first_create_pass: bool,
    /// `true` until the first `LView` built from this `TView` completes
    /// its refresh pass without error. Drives whether binding var slots
    /// get allocated as bindings are first evaluated (§4.7).
    pub first_update_pass: bool,
    /// Set permanently if a first creation pass fails partway through,
    /// per the "first pass must not partially succeed silently" edge
    /// case: the `TView` is left in a known-bad state rather than reused
    /// as if complete.
    pub incomplete_first_pass: bool,
}

impl TView {
    /// Build an empty `TView` for a template declaring `decls` node slots
    /// and `vars` binding slots. The header region is accounted for in
    /// public indices (`binding_start_index`, etc.) but not materialized
    /// in `data`/`blueprint`, which hold only the content region (see the
    /// module doc on [`super::consts`]).
    #[must_use]
    pub fn new(decls: usize, vars: usize) -> Self {
        let binding_start_index = SlotIndex::new(HEADER_OFFSET + decls);
        let expando_start_index = binding_start_index + vars;
        let content_len = decls + vars;
        Self {
            decls,
            vars,
            binding_start_index,
            expando_start_index,
            data: vec![TData::Empty; content_len],
            blueprint: vec![BindingSlot::Empty; content_len],
            host_binding_opcodes: Vec::new(),
            hooks: HookQueues::default(),
            content_queries: Vec::new(),
            first_child: None,
            components: Vec::new(),
            containers: Vec::new(),
            first_create_pass: true,
            first_update_pass: true,
            incomplete_first_pass: false,
        }
    }

    /// Convert a public (header-relative) node index into an offset into
    /// `data`/`blueprint`.
    #[inline]
    #[must_use]
    pub fn content_offset(&self, index: NodeIndex) -> usize {
        index.get() - HEADER_OFFSET
    }

    /// Grow `data` and `blueprint` together by one slot, preserving the
    /// invariant that they always have equal length (§3).
    ///
    /// Used by the expando allocator when a directive's host bindings need
    /// more slots than were declared statically.
    pub fn push_slot(&mut self, data: TData, blueprint: BindingSlot) -> NodeIndex {
        debug_assert_eq!(
            self.data.len(),
            self.blueprint.len(),
            "TView.data and TView.blueprint diverged in length"
        );
        let offset = self.data.len();
        self.data.push(data);
        self.blueprint.push(blueprint);
        SlotIndex::new(HEADER_OFFSET + offset)
    }

    /// Fetch the `TNode` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::IncompleteFirstPass`] if this `TView`
    /// was left incomplete by a failed first creation pass — reading it
    /// further would observe a partially built shape.
    pub fn node(&self, index: NodeIndex) -> Result<&TNode> {
        if self.incomplete_first_pass {
            return Err(ViewRuntimeError::IncompleteFirstPass);
        }
        let offset = self.content_offset(index);
        Ok(self.data[offset]
            .as_node()
            .unwrap_or_else(|| panic!("slot {index} is not a TNode")))
    }

    /// Fetch the `TNode` at `index` mutably, for use only during the first
    /// creation pass.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TNode {
        let offset = self.content_offset(index);
        self.data[offset]
            .as_node_mut()
            .unwrap_or_else(|| panic!("slot {index} is not a TNode"))
    }

    /// Overwrite the slot at `index` with freshly built shape/def content.
    ///
    /// Only valid within the declared `decls` region during the first
    /// creation pass — decls are sized by the compiler up front, so this
    /// never needs to grow `data`/`blueprint` the way expando allocation
    /// does.
    ///
    /// # Panics
    ///
    /// Panics if `index` falls outside the decls region; that indicates
    /// the template declared too few `decls` for its own node count, a
    /// compiler-contract violation this layer cannot repair.
    pub fn write_slot(&mut self, index: NodeIndex, data: TData) {
        let offset = self.content_offset(index);
        assert!(
            offset < self.decls,
            "node/directive slot {index} falls outside the declared decls region (decls={})",
            self.decls
        );
        self.data[offset] = data;
    }

    /// Whether `data` and `blueprint` currently agree in length — the
    /// central dual-buffer invariant (§3, §8 Universal invariants).
    #[must_use]
    pub fn arrays_in_sync(&self) -> bool {
        self.data.len() == self.blueprint.len()
    }

    /// Mark this `TView`'s first creation pass as permanently failed.
    pub fn mark_incomplete(&mut self) {
        self.incomplete_first_pass = true;
    }

    /// Advance `first_create_pass` to `false`. One-way: calling this again
    /// is a no-op, never a re-opening of the pass.
    pub fn complete_create_pass(&mut self) {
        self.first_create_pass = false;
    }

    /// Advance `first_update_pass` to `false`. One-way, same as
    /// [`Self::complete_create_pass`].
    pub fn complete_update_pass(&mut self) {
        self.first_update_pass = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::tnode::TNodeType;
    use proptest::prelude::*;

    #[test]
    fn new_tview_starts_with_data_and_blueprint_in_sync() {
        let tview = TView::new(5, 3);
        assert!(tview.arrays_in_sync());
        assert_eq!(tview.data.len(), 8);
    }

    proptest! {
        /// No sequence of declared decls/vars, nor any number of expando
        /// slots pushed on top, may leave `data` and `blueprint` at
        /// different lengths (§3, §8 Universal invariants).
        #[test]
        fn data_and_blueprint_stay_in_sync_through_expando_growth(
            decls in 0usize..50,
            vars in 0usize..50,
            extra_slots in 0usize..50,
        ) {
            let mut tview = TView::new(decls, vars);
            prop_assert!(tview.arrays_in_sync());
            prop_assert_eq!(tview.data.len(), decls + vars);

            for i in 0..extra_slots {
                let node = TNode::new(NodeIndex::new(i), TNodeType::Element, None, Vec::new());
                tview.push_slot(TData::Node(node), BindingSlot::Empty);
                prop_assert!(tview.arrays_in_sync());
            }

            prop_assert_eq!(tview.data.len(), decls + vars + extra_slots);
        }
    }
}

/// Shared, interior-mutable handle to a `TView`.
///
/// Every `LView` built from the same template holds a clone of the same
/// `Rc`, matching the "one `TView` per many `LView`s" sharing the dual
/// buffer design rests on. A `RefCell` is needed, not a bare `Rc<TView>`,
/// because the first creation pass mutates the shape table (filling in
/// `TNode`s, growing the expando region) through a handle that may already
/// be held by the `LView` under construction; the single-threaded
/// cooperative concurrency model (§5) guarantees there is never a second
/// borrower while that mutation is in progress.
pub type TViewRef = Rc<std::cell::RefCell<TView>>;
