//! Lifecycle hook queues attached to a `TView`.
//!
//! Hooks are recorded once, during the first creation pass, as flat queues
//! of `(directive index, hook fn)` pairs in declaration order. The refresh
//! pass walks each queue in order and advances `InitPhaseState` once a
//! queue's init-tagged hooks have all run for a given view (§4.13).

use vr_foundation::DirectiveIndex;

use crate::defs::Instance;

use super::consts::NodeIndex;

/// A directive's hook function, called with the directive instance it's
/// scheduled against. The refresh pass looks the instance up in `LView`
/// by the hook entry's `directive` slot before invoking it, the same way
/// the host-binding interpreter resolves a directive instance before
/// calling its host-binding function (§4.10).
pub type HookFn = fn(&mut Instance);

/// One scheduled hook invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookEntry {
    /// The node the owning directive is attached to, for diagnostics.
    pub node: NodeIndex,
    /// The directive slot this hook runs against.
    pub directive: DirectiveIndex,
    /// The hook function itself.
    pub hook: HookFn,
}

/// The four hook queues a `TView` tracks, matching the four phases of
/// §4.13's init-hook ordering.
#[derive(Debug, Clone, Default)]
pub struct HookQueues {
    /// Runs once, before the first `ngDoCheck`-equivalent, in creation
    /// order.
    pub on_init: Vec<HookEntry>,
    /// Runs on every refresh pass, before init hooks fire (do-check
    /// semantics run unconditionally even once init has completed).
    pub do_check: Vec<HookEntry>,
    /// Runs once, after content children have been checked the first time.
    pub after_content_init: Vec<HookEntry>,
    /// Runs on every refresh pass, after content children are checked.
    pub after_content_checked: Vec<HookEntry>,
    /// Runs once, after a component's own view has been checked the first
    /// time.
    pub after_view_init: Vec<HookEntry>,
    /// Runs on every refresh pass, after the component's own view is
    /// checked.
    pub after_view_checked: Vec<HookEntry>,
    /// Runs exactly once, when the owning `LView` is destroyed, in
    /// registration order (mirrors `LView.cleanup`'s LIFO teardown, but
    /// hooks run in declaration order, not reverse).
    pub destroy: Vec<HookEntry>,
}

impl HookQueues {
    /// Whether every queue is empty, i.e. this `TView` has no lifecycle
    /// hooks to interpret at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_init.is_empty()
            && self.do_check.is_empty()
            && self.after_content_init.is_empty()
            && self.after_content_checked.is_empty()
            && self.after_view_init.is_empty()
            && self.after_view_checked.is_empty()
            && self.destroy.is_empty()
    }
}
