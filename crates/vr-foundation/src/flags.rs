//! LView flag bitset and the init-phase state machine.
//!
//! The runtime's concurrency model is single-threaded cooperative (§5):
//! exactly one traversal frame may be active on a given `LView` at a time,
//! and the host is responsible for keeping parallel work off the tree
//! entirely. Flags are therefore a plain bitset, not an atomic one —
//! there is no concurrent writer to race against.

use bitflags::bitflags;

bitflags! {
    /// Bitset stored in an LView's header slot.
    ///
    /// Serialize/Deserialize, when the `serde` feature is on, come from
    /// `bitflags`'s own `serde` feature rather than a derive here: the
    /// macro-generated struct wraps its bits in a private representation
    /// a plain `#[derive(Serialize)]` can't see into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LViewFlags: u16 {
        /// The view is between construction and the end of its first
        /// creation pass.
        const CREATION_MODE = 0b0000_0000_0001;
        /// The view is attached to change detection (visited by refresh).
        const ATTACHED = 0b0000_0000_0010;
        /// This is the first refresh pass this LView has ever run.
        const FIRST_LVIEW_PASS = 0b0000_0000_0100;
        /// The view has been torn down; refresh is a no-op.
        const DESTROYED = 0b0000_0000_1000;
        /// The view (or a descendant) has pending binding changes.
        const DIRTY = 0b0000_0001_0000;
        /// The view's component policy is CheckAlways (not OnPush).
        const CHECK_ALWAYS = 0b0000_0010_0000;
        /// The view was created with an embedded view injector.
        const HAS_EMBEDDED_VIEW_INJECTOR = 0b0000_0100_0000;
        /// The view is a transplanted view awaiting a refresh driven by
        /// its insertion container rather than its declaration container.
        const REFRESH_TRANSPLANTED_VIEW = 0b0000_1000_0000;

        /// Low bit of the two-bit `InitPhaseState` field.
        const INIT_PHASE_BIT_0 = 0b0001_0000_0000;
        /// High bit of the two-bit `InitPhaseState` field.
        const INIT_PHASE_BIT_1 = 0b0010_0000_0000;
    }
}

const INIT_PHASE_MASK: LViewFlags =
    LViewFlags::from_bits_truncate(LViewFlags::INIT_PHASE_BIT_0.bits() | LViewFlags::INIT_PHASE_BIT_1.bits());

/// The monotonic init-phase state machine carried in an LView's flags.
///
/// Transitions occur exactly once each, in the order declared here, each
/// immediately after the refresh pass runs the corresponding `init+check`
/// hook batch (§4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum InitPhaseState {
    /// `ngOnInit`-equivalent hooks have not yet run.
    #[default]
    OnInitPending = 0,
    /// `ngOnInit`-equivalent hooks ran; content-init hooks have not.
    AfterContentInitPending = 1,
    /// Content-init hooks ran; view-init hooks have not.
    AfterViewInitPending = 2,
    /// All init hooks for this view have run, permanently.
    Completed = 3,
}

impl InitPhaseState {
    /// The state that follows this one, or `Completed` again if already
    /// completed (advancing past `Completed` is a no-op, not a panic).
    #[inline]
    #[must_use]
    pub const fn advance(self) -> Self {
        match self {
            Self::OnInitPending => Self::AfterContentInitPending,
            Self::AfterContentInitPending => Self::AfterViewInitPending,
            Self::AfterViewInitPending | Self::Completed => Self::Completed,
        }
    }

    const fn from_bits(bits: u16) -> Self {
        match bits {
            0 => Self::OnInitPending,
            1 => Self::AfterContentInitPending,
            2 => Self::AfterViewInitPending,
            _ => Self::Completed,
        }
    }

    const fn to_bits(self) -> u16 {
        self as u16
    }
}

impl LViewFlags {
    /// Read the two-bit init-phase field out of this flag set.
    #[inline]
    #[must_use]
    pub const fn init_phase(self) -> InitPhaseState {
        let shifted = (self.bits() & INIT_PHASE_MASK.bits()) >> 8;
        InitPhaseState::from_bits(shifted)
    }

    /// Return a copy of this flag set with the init-phase field replaced.
    #[inline]
    #[must_use]
    pub const fn with_init_phase(self, phase: InitPhaseState) -> Self {
        let cleared = self.bits() & !INIT_PHASE_MASK.bits();
        let set = cleared | (phase.to_bits() << 8);
        Self::from_bits_truncate(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_phase_round_trips_through_flags() {
        let flags = LViewFlags::ATTACHED.with_init_phase(InitPhaseState::AfterContentInitPending);
        assert!(flags.contains(LViewFlags::ATTACHED));
        assert_eq!(flags.init_phase(), InitPhaseState::AfterContentInitPending);
    }

    #[test]
    fn init_phase_advances_in_fixed_order() {
        let mut phase = InitPhaseState::OnInitPending;
        phase = phase.advance();
        assert_eq!(phase, InitPhaseState::AfterContentInitPending);
        phase = phase.advance();
        assert_eq!(phase, InitPhaseState::AfterViewInitPending);
        phase = phase.advance();
        assert_eq!(phase, InitPhaseState::Completed);
        phase = phase.advance();
        assert_eq!(phase, InitPhaseState::Completed);
    }

    #[test]
    fn unrelated_flags_survive_init_phase_mutation() {
        let mut flags = LViewFlags::DIRTY | LViewFlags::CHECK_ALWAYS;
        flags = flags.with_init_phase(InitPhaseState::Completed);
        assert!(flags.contains(LViewFlags::DIRTY));
        assert!(flags.contains(LViewFlags::CHECK_ALWAYS));
        assert_eq!(flags.init_phase(), InitPhaseState::Completed);
    }
}
