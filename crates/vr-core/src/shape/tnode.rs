//! `TNode` — the shape of one logical node within a `TView`.
//!
//! A `TNode` is sealed once initialized: nothing about its position in the
//! shape tree, its directive range, or its alias tables may change for the
//! lifetime of the owning `TView`. The one deliberate exception is the
//! `Placeholder -> concrete` type upgrade for late-bound i18n nodes (§9),
//! modeled here as [`TNode::upgrade_placeholder`] rather than a general
//! setter.

use ahash::AHashMap;
use smallvec::SmallVec;
use vr_foundation::DirectiveIndex;

use super::consts::NodeIndex;

/// The kind of logical node a `TNode` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TNodeType {
    /// A host/native element.
    Element,
    /// A text node.
    Text,
    /// A view container anchor (`ng-template`/`*ngIf`-style host).
    Container,
    /// A grouping node with no native element counterpart (`ng-container`).
    ElementContainer,
    /// A content-projection slot.
    Projection,
    /// An ICU message-format node.
    Icu,
    /// A placeholder reserved for late binding, e.g. during i18n block
    /// construction. Exactly one upgrade to a concrete type is legal.
    Placeholder,
}

bitflags::bitflags! {
    /// Per-node flags computed during directive resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TNodeFlags: u16 {
        /// At least one directive (including a component) matched this node.
        const IS_DIRECTIVE_HOST = 0b0000_0001;
        /// At least one matched directive declares host bindings.
        const HAS_HOST_BINDINGS = 0b0000_0010;
        /// At least one matched directive declares a content query.
        const HAS_CONTENT_QUERY = 0b0000_0100;
        /// `class` is claimed as a directive input on this node.
        const HAS_CLASS_INPUT = 0b0000_1000;
        /// `style` is claimed as a directive input on this node.
        const HAS_STYLE_INPUT = 0b0001_0000;
        /// This node renders content projected from a parent view.
        const IS_PROJECTED = 0b0010_0000;
        /// This node is detached and skipped by traversal.
        const IS_DETACHED = 0b0100_0000;
    }
}

/// A public-name -> `(directive index, private name)` alias table, as built
/// by input/output aliasing (§4.5). A public name may map to more than one
/// directive, e.g. two directives both binding `[label]`.
pub type AliasTable = AHashMap<String, SmallVec<[(DirectiveIndex, String); 2]>>;

/// Shape descriptor for one logical node in a `TView`.
///
/// Sealed after [`crate::directives::resolver::resolve_directives`] runs for
/// this node during the first creation pass; every field below is
/// write-once from the perspective of any later instance.
#[derive(Debug, Clone)]
pub struct TNode {
    /// The node kind. Mutable exactly once, via
    /// [`TNode::upgrade_placeholder`].
    node_type: TNodeType,
    /// This node's own index in `LView`/`TView.data`.
    pub index: NodeIndex,
    /// Parent node index, if any.
    pub parent: Option<NodeIndex>,
    /// First child node index, if any.
    pub child: Option<NodeIndex>,
    /// Next sibling node index, if any.
    pub next: Option<NodeIndex>,
    /// Next node in projection order, distinct from `next` because
    /// projected content is re-parented without being re-linked in the
    /// declaring view's sibling chain.
    pub projection_next: Option<NodeIndex>,

    /// Start of this node's directive range in `LView` (inclusive).
    pub directive_start: DirectiveIndex,
    /// End of this node's directive range in `LView` (exclusive).
    pub directive_end: DirectiveIndex,
    /// Offset within `directive_start..directive_end` of the component def,
    /// if this node is a component host; `None` otherwise.
    pub component_offset: Option<u16>,

    /// Behavioral flags computed during resolution.
    pub flags: TNodeFlags,

    /// Input alias table: public name -> directive/private-name pairs.
    pub inputs: AliasTable,
    /// Output alias table: public name -> directive/private-name pairs.
    pub outputs: AliasTable,
    /// Static attribute values captured as initial inputs, keyed by offset
    /// within the node's directive range. Inline-template nodes are
    /// excluded from this extraction (§4.5).
    pub initial_inputs: Vec<Vec<(String, String)>>,

    /// Static attributes as compiled (tag-level, before directive merge).
    pub attrs: Vec<(String, String)>,
    /// `localRefs` name -> directive-index-within-range mapping
    /// (`directiveStart + offset`, or `None` for the node/component itself).
    pub local_names: Vec<(String, Option<u16>)>,
    /// Merged `hostAttrs` across matched directives, lowest priority first
    /// (component first, §4.4 step 6).
    pub merged_attrs: Vec<(String, String)>,

    /// The tag/element name, when statically known (absent for anonymous
    /// container/placeholder nodes).
    pub name: Option<String>,

    /// i18n-only: explicit insertion order override.
    pub insert_before_index: Option<NodeIndex>,
}

impl TNode {
    /// Create a freshly allocated `TNode`. Sibling/child links are filled
    /// in by the caller as it walks the creation-pass cursor; this
    /// constructor only establishes the node's own identity.
    #[must_use]
    pub fn new(index: NodeIndex, node_type: TNodeType, name: Option<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            node_type,
            index,
            parent: None,
            child: None,
            next: None,
            projection_next: None,
            directive_start: DirectiveIndex::new(0),
            directive_end: DirectiveIndex::new(0),
            component_offset: None,
            flags: TNodeFlags::empty(),
            inputs: AliasTable::new(),
            outputs: AliasTable::new(),
            initial_inputs: Vec::new(),
            attrs,
            local_names: Vec::new(),
            merged_attrs: Vec::new(),
            name,
            insert_before_index: None,
        }
    }

    /// The node's current type.
    #[inline]
    #[must_use]
    pub fn node_type(&self) -> TNodeType {
        self.node_type
    }

    /// One-shot upgrade from `Placeholder` to a concrete type, for
    /// late-bound i18n nodes (§9). Any other transition is rejected: a
    /// `TNode`'s type is otherwise sealed.
    ///
    /// # Panics
    ///
    /// Panics if this node is not currently a `Placeholder`, or if `new_type`
    /// is itself `Placeholder`. Both are programmer errors in compiled
    /// output and have no recovery path at this layer.
    pub fn upgrade_placeholder(&mut self, new_type: TNodeType) {
        assert!(
            matches!(self.node_type, TNodeType::Placeholder),
            "TNode type is sealed once non-Placeholder; attempted re-upgrade at index {:?}",
            self.index
        );
        assert!(
            !matches!(new_type, TNodeType::Placeholder),
            "cannot upgrade a Placeholder TNode into another Placeholder"
        );
        self.node_type = new_type;
    }

    /// Directive range as a `start..end` pair, 0-width if no directives
    /// matched this node.
    #[inline]
    #[must_use]
    pub fn directive_range(&self) -> std::ops::Range<usize> {
        self.directive_start.get()..self.directive_end.get()
    }

    /// Whether this node hosts a component (as opposed to only plain
    /// directives).
    #[inline]
    #[must_use]
    pub fn is_component_host(&self) -> bool {
        self.component_offset.is_some()
    }
}
