//! The host-binding opcode interpreter (§4.10).
//!
//! Walks a `TView`'s flattened `host_binding_opcodes` stream once per
//! refresh pass, maintaining a "currently selected element" cursor that
//! `SelectElement` opcodes move and `InvokeHostBinding` opcodes read
//! implicitly — a malformed stream that invokes a binding before selecting
//! an element panics via [`HostBindingCursor::current`] rather than
//! silently operating on the wrong node.

use vr_foundation::SlotIndex;

use crate::cursor::HostBindingCursor;
use crate::instance::{BindingSlot, LView};
use crate::shape::host_binding_ops::HostBindingOp;
use crate::shape::tview::TView;

/// Run every opcode in `tview`'s host-binding stream against `lview`.
///
/// Directive instances are looked up in `lview` by converting each
/// `InvokeHostBinding` opcode's directive slot into an [`SlotIndex`]; a
/// slot that doesn't currently hold a directive instance (a malformed
/// opcode stream, or a view mid-destruction) is skipped rather than
/// panicking, since a partially torn-down view legitimately has empty
/// slots where directives used to be.
pub fn run_host_binding_opcodes(tview: &TView, lview: &mut LView) {
    let mut cursor = HostBindingCursor::new();
    for op in &tview.host_binding_opcodes {
        match *op {
            HostBindingOp::SelectElement(node) => cursor.select(node),
            HostBindingOp::InvokeHostBinding {
                directive,
                binding_root,
                eval,
            } => {
                // Validates stream ordering: panics if no SelectElement
                // preceded this opcode.
                let _selected = cursor.current();
                let slot = SlotIndex::new(directive.get());
                if let BindingSlot::Directive(instance) = lview.get_mut(slot) {
                    eval(instance, binding_root);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::Instance;
    use crate::shape::consts::NodeIndex;
    use std::cell::Cell;
    use std::rc::Rc;
    use vr_foundation::DirectiveIndex;

    thread_local! {
        static CALLS: Cell<u32> = Cell::new(0);
    }

    fn recording_eval(_instance: &mut Instance, _binding_root: SlotIndex) {
        CALLS.with(|c| c.set(c.get() + 1));
    }

    #[test]
    fn invoke_runs_only_when_a_directive_instance_is_present() {
        let mut tview = TView::new(1, 0);
        tview
            .host_binding_opcodes
            .push(HostBindingOp::SelectElement(NodeIndex::new(12)));
        tview.host_binding_opcodes.push(HostBindingOp::InvokeHostBinding {
            directive: DirectiveIndex::new(12),
            binding_root: SlotIndex::new(12),
            eval: recording_eval,
        });

        let tview = std::rc::Rc::new(std::cell::RefCell::new(tview));
        let mut lview = LView::new(tview.clone(), None, None);
        lview.set(SlotIndex::new(12), BindingSlot::Directive(Box::new(())));

        CALLS.with(|c| c.set(0));
        run_host_binding_opcodes(&tview.borrow(), &mut lview);
        assert_eq!(CALLS.with(Cell::get), 1);
    }

    #[test]
    #[should_panic(expected = "InvokeHostBinding opcode ran before any SelectElement")]
    fn invoke_without_prior_select_panics() {
        let mut tview = TView::new(1, 0);
        tview.host_binding_opcodes.push(HostBindingOp::InvokeHostBinding {
            directive: DirectiveIndex::new(12),
            binding_root: SlotIndex::new(12),
            eval: recording_eval,
        });
        let tview = Rc::new(std::cell::RefCell::new(tview));
        let mut lview = LView::new(tview.clone(), None, None);
        run_host_binding_opcodes(&tview.borrow(), &mut lview);
    }
}
