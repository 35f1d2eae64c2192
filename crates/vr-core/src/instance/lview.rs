//! `LView` — the per-instance binding buffer paired with a `TView`.
//!
//! # Why the header is a struct, not array slots
//!
//! The source design packs per-view bookkeeping (host node ref, flags,
//! parent, declaration view, ...) into the first `HEADER_OFFSET` slots of
//! the same flat array that holds binding values, so that `TView.data` and
//! `LView` can be indexed uniformly. That packing buys the original
//! implementation one array instead of two, at the cost of every header
//! read needing an untyped cast. Rust's type system makes the untyped cast
//! the expensive part and the second array free, so [`LViewHeader`] holds
//! the bookkeeping as plain typed fields, and [`LView::slots`] holds only
//! the homogeneous decls/vars/expando content region — the part that
//! actually needs to stay parallel to `TView.data` (§3). Public APIs still
//! speak in `HEADER_OFFSET`-relative [`vr_foundation::SlotIndex`] values, so
//! the two representations agree on what "slot 14" means; see
//! [`crate::shape::consts`].

use std::any::Any;
use std::rc::Rc;

use vr_foundation::{LViewFlags, Result, SlotIndex, ViewHandle, ViewRuntimeError};

use crate::defs::{ComponentDef, Instance};
use crate::shape::consts::{NodeIndex, HEADER_OFFSET};
use crate::shape::tview::TViewRef;

/// A scalar binding value as evaluated by a template's update block.
///
/// `Dynamic` is the escape hatch for host-defined rich values (e.g. a
/// renderer-specific style object) that don't fit the scalar cases; dirty
/// checking on it falls back to `Rc::ptr_eq`-style identity comparison by
/// the interpreter rather than structural equality.
#[derive(Debug, Clone)]
pub enum BindingValue {
    /// A bound value was explicitly set to null/absent.
    Null,
    /// A boolean-valued binding, e.g. a `[disabled]`-style property.
    Bool(bool),
    /// A numeric binding.
    Number(f64),
    /// A text/string binding.
    Text(Rc<str>),
    /// An opaque host-defined value, compared by pointer identity.
    Dynamic(Rc<dyn Any>),
}

impl PartialEq for BindingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Dynamic(a), Self::Dynamic(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One content-region slot in an `LView`.
///
/// Parallel by position to the corresponding [`crate::shape::tview::TData`]
/// entry in the owning `TView`.
///
/// Neither `Debug` nor `Clone` can be derived: `Directive` holds a
/// `Box<dyn Any>` and `NodeRef` holds an `Rc<dyn Any>`, and `dyn Any`
/// implements neither. Both are implemented by hand below; cloning only
/// ever needs to work on a `TView`'s blueprint, which never contains a
/// `Directive` or `NodeRef` entry (those are only ever written into a
/// live `LView`'s own slots during instantiation), so `Directive` panics
/// on clone rather than silently duplicating instance state.
#[derive(Default)]
pub enum BindingSlot {
    /// Not yet written; the state every slot starts in after being copied
    /// from the blueprint.
    #[default]
    Empty,
    /// Sentinel meaning "no value has been produced yet for this binding",
    /// distinct from `Empty`: a binding can legitimately re-observe
    /// `NoChange` on every pass if its source expression is a literal.
    NoChange,
    /// An evaluated binding value.
    Value(BindingValue),
    /// A directive or component instance occupying its def's directive
    /// slot.
    Directive(Instance),
    /// A view container anchored at this slot's node.
    Container(vr_foundation::ContainerHandle),
    /// A native node reference handed back by the renderer.
    NodeRef(Rc<dyn Any>),
    /// A component host node's own slot holds the child view it owns,
    /// rather than a directive instance — the component's instance lives
    /// in the child view's own directive slot instead.
    ComponentView(ViewHandle),
}

impl Clone for BindingSlot {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::NoChange => Self::NoChange,
            Self::Value(v) => Self::Value(v.clone()),
            Self::Directive(_) => panic!("BindingSlot::Directive cannot be cloned; blueprints never hold one"),
            Self::Container(c) => Self::Container(*c),
            Self::NodeRef(rc) => Self::NodeRef(rc.clone()),
            Self::ComponentView(v) => Self::ComponentView(*v),
        }
    }
}

impl std::fmt::Debug for BindingSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::NoChange => write!(f, "NoChange"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Directive(_) => write!(f, "Directive(..)"),
            Self::Container(c) => f.debug_tuple("Container").field(c).finish(),
            Self::NodeRef(_) => write!(f, "NodeRef(..)"),
            Self::ComponentView(v) => f.debug_tuple("ComponentView").field(v).finish(),
        }
    }
}

/// A queued cleanup action, run when the owning view is destroyed
/// (renderer listener teardown, subscription disposal, and similar).
pub type CleanupFn = Box<dyn FnOnce()>;

/// Per-view bookkeeping that would occupy `LView`'s header slots in the
/// packed-array design; see the module doc for why it's a struct here.
pub struct LViewHeader {
    /// The host element/text node this view renders into, if one has been
    /// created yet.
    pub host: Option<Rc<dyn Any>>,
    /// Behavioral flags (§3, `LViewFlags`).
    pub flags: LViewFlags,
    /// Enclosing view, `None` for a root view.
    pub parent: Option<ViewHandle>,
    /// Shared shape table this instance was built from.
    pub tview: TViewRef,
    /// Component instance (for a component's own view) or embedded-view
    /// context, if this view has one.
    pub context: Option<Instance>,
    /// The def this view was instantiated from, `None` for an embedded
    /// view or a root view with no component identity of its own. Lets
    /// the refresh pass call this view's own `update`/hooks without the
    /// caller threading the def through every recursive step.
    pub component_def: Option<Rc<ComponentDef>>,
    /// An embedded view's own refresh-pass instructions, `None` for a
    /// component or root view (those get their update function from
    /// `component_def` instead).
    pub embedded_update: Option<crate::defs::TemplateUpdateFn>,
    /// The view whose template lexically declares this view — relevant
    /// for transplanted views, where `declaration_view != ` the view that
    /// contains the `LContainer` this view is inserted into (§4.11).
    pub declaration_view: Option<ViewHandle>,
    /// Nearest ancestor view that is itself a component's view, used to
    /// resolve content-projection and query boundaries.
    pub declaration_component_view: Option<ViewHandle>,
    /// First child view directly nested in this one (component views, not
    /// container-held embedded views).
    pub child_head: Option<ViewHandle>,
    /// Last child view directly nested in this one.
    pub child_tail: Option<ViewHandle>,
    /// Next sibling in the parent's `child_head..child_tail` chain.
    pub next: Option<ViewHandle>,
    /// Index of this view's host `TNode` within its parent's `TView`,
    /// `None` for a root view with no declaring template.
    pub t_host: Option<NodeIndex>,
    /// The container this view is currently inserted into, for an
    /// embedded view. Lets dirty propagation find its way back to the
    /// container's transplant-refresh bookkeeping without a reverse
    /// lookup table.
    pub container: Option<vr_foundation::ContainerHandle>,
    /// Deferred teardown actions, run once on destroy, in registration
    /// order.
    pub cleanup: Vec<CleanupFn>,
}

impl LViewHeader {
    /// This view's own refresh-pass update function, whichever kind of
    /// view it is.
    #[must_use]
    pub fn update_fn(&self) -> Option<crate::defs::TemplateUpdateFn> {
        self.component_def.as_ref().and_then(|def| def.update).or(self.embedded_update)
    }
}

impl std::fmt::Debug for LViewHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LViewHeader")
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("declaration_view", &self.declaration_view)
            .field("declaration_component_view", &self.declaration_component_view)
            .field("child_head", &self.child_head)
            .field("child_tail", &self.child_tail)
            .field("next", &self.next)
            .field("t_host", &self.t_host)
            .field("container", &self.container)
            .field("cleanup_len", &self.cleanup.len())
            .finish_non_exhaustive()
    }
}

/// One instance of a template: a header plus a content region parallel to
/// its `TView`'s `data`/`blueprint`.
#[derive(Debug)]
pub struct LView {
    /// Per-view bookkeeping.
    pub header: LViewHeader,
    /// Decls/vars/expando content, parallel to `tview.data`.
    pub slots: Vec<BindingSlot>,
}

impl LView {
    /// Build a fresh `LView` from `tview`'s blueprint (§4.2: "copy the
    /// blueprint verbatim into a new instance").
    #[must_use]
    pub fn new(tview: TViewRef, parent: Option<ViewHandle>, t_host: Option<NodeIndex>) -> Self {
        let blueprint = tview.borrow().blueprint.clone();
        Self {
            header: LViewHeader {
                host: None,
                flags: LViewFlags::CREATION_MODE | LViewFlags::ATTACHED | LViewFlags::FIRST_LVIEW_PASS,
                parent,
                tview,
                context: None,
                component_def: None,
                embedded_update: None,
                declaration_view: None,
                declaration_component_view: None,
                child_head: None,
                child_tail: None,
                next: None,
                t_host,
                container: None,
                cleanup: Vec::new(),
            },
            slots: blueprint,
        }
    }

    /// Convert a public (header-relative) slot index into an offset into
    /// `slots`.
    #[inline]
    #[must_use]
    pub fn content_offset(&self, index: SlotIndex) -> usize {
        index.get() - HEADER_OFFSET
    }

    /// Total length this view would report if header slots were still
    /// materialized in the array, for parity with the dual-buffer length
    /// invariant (§3, §8): `HEADER_OFFSET + slots.len()`.
    #[must_use]
    pub fn logical_len(&self) -> usize {
        HEADER_OFFSET + self.slots.len()
    }

    /// Read a content slot.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`]-flavored bounds failure
    /// is not applicable here (this indexes a live `Vec`, not an arena);
    /// out-of-range reads are a programmer error and panic, matching the
    /// runtime's treatment of other invariant violations that can only
    /// arise from a malformed shape table.
    pub fn get(&self, index: SlotIndex) -> &BindingSlot {
        &self.slots[self.content_offset(index)]
    }

    /// Write a content slot.
    pub fn set(&mut self, index: SlotIndex, value: BindingSlot) {
        let offset = self.content_offset(index);
        self.slots[offset] = value;
    }

    /// Read a content slot mutably, e.g. to invoke a directive instance's
    /// host bindings in place.
    pub fn get_mut(&mut self, index: SlotIndex) -> &mut BindingSlot {
        let offset = self.content_offset(index);
        &mut self.slots[offset]
    }

    /// Grow `slots` by one to mirror an expando slot freshly pushed onto
    /// the owning `TView`. Only valid while `tview.first_create_pass` (or
    /// `first_update_pass`, for var-only growth) is still `true`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::IncompleteFirstPass`] if called after
    /// the owning `TView` already left its first pass — growing `slots`
    /// without growing `TView.data`/`blueprint` in lockstep would break
    /// the parallel-array invariant for every other instance.
    pub fn push_slot(&mut self, value: BindingSlot) -> Result<SlotIndex> {
        if !self.header.tview.borrow().first_create_pass && !self.header.tview.borrow().first_update_pass {
            return Err(ViewRuntimeError::IncompleteFirstPass);
        }
        let offset = self.slots.len();
        self.slots.push(value);
        Ok(SlotIndex::new(HEADER_OFFSET + offset))
    }

    /// Whether this view is marked dirty (itself, not transitively).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.header.flags.contains(LViewFlags::DIRTY)
    }

    /// Mark this view dirty.
    pub fn set_dirty(&mut self) {
        self.header.flags.insert(LViewFlags::DIRTY);
    }

    /// Clear the dirty flag, e.g. after a successful refresh pass.
    pub fn clear_dirty(&mut self) {
        self.header.flags.remove(LViewFlags::DIRTY);
    }

    /// Whether this view is still attached to change detection.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.header.flags.contains(LViewFlags::ATTACHED)
    }

    /// Whether this is a transplanted view awaiting a refresh driven by
    /// its insertion container (§4.11).
    #[must_use]
    pub fn needs_transplant_refresh(&self) -> bool {
        self.header.flags.contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW)
    }
}
