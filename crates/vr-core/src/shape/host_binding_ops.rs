//! The host-binding opcode stream and its instruction set.
//!
//! A `TView`'s `host_binding_opcodes` field is a flat `Vec<HostBindingOp>`
//! built once, during the first creation pass, from every matched
//! directive's host-binding function. Rather than the packed-integer
//! encoding the interpreter's source design uses (a negative int means
//! "select element", a positive one packs `directiveIndex`/`bindingRoot`),
//! this is modeled as the tagged sum the spec's own design notes recommend:
//! pattern matching an enum is the idiomatic Rust rendition of what the
//! original encodes as sign-tagged integers, and the compiler checks
//! exhaustiveness for us.

use vr_foundation::{DirectiveIndex, SlotIndex};

use crate::defs::HostBindingsFn;

use super::consts::NodeIndex;

/// A directive's host-binding evaluation function, shared with
/// [`crate::defs::DirectiveDef::host_bindings`]. Called with the
/// directive's own instance and the first binding slot index reserved for
/// it (`bindingRoot`), so the function can write `bindingRoot + k` for its
/// `k`-th binding without knowing its absolute position in `LView`.
pub type HostBindingFn = HostBindingsFn;

/// One instruction in a `TView`'s host-binding opcode stream.
#[derive(Debug, Clone, Copy)]
pub enum HostBindingOp {
    /// Move the interpreter's "current element" cursor to `node`. Every
    /// `InvokeHostBinding` that follows, up to the next `SelectElement`,
    /// evaluates against this node.
    SelectElement(NodeIndex),
    /// Evaluate one directive's host bindings against the currently
    /// selected element.
    InvokeHostBinding {
        /// The directive instance to evaluate.
        directive: DirectiveIndex,
        /// First binding slot reserved for this directive's host bindings.
        binding_root: SlotIndex,
        /// The directive's host-binding function.
        eval: HostBindingFn,
    },
}
