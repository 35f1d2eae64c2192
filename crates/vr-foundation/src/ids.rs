//! Type-safe identifiers used across the view runtime.
//!
//! Two families of identifier exist here, matching the two kinds of
//! indirection the runtime relies on:
//!
//! - **Arena handles** ([`ViewHandle`], [`ContainerHandle`]) identify a
//!   long-lived slot in a generational arena (an [`LView`](../vr_core/struct.LView.html)
//!   or [`LContainer`](../vr_core/struct.LContainer.html)). They carry a
//!   generation so a stale handle from a destroyed slot is detected rather
//!   than silently aliasing a reused one.
//! - **Slot offsets** ([`SlotIndex`], [`DirectiveIndex`]) identify a position
//!   within the flat `TView.data` / `LView` arrays. These are plain `usize`
//!   newtypes — zero is a perfectly valid offset once `HEADER_OFFSET` is
//!   subtracted, so there is no niche to exploit here.

use std::num::NonZeroU32;

// ============================================================================
// Generational arena handles
// ============================================================================

/// A handle into a generational arena: a dense index plus the generation of
/// the slot it was issued for.
///
/// Looking a handle up after its slot has been freed and reused returns
/// `None` rather than the new occupant, because the generation no longer
/// matches. See `vr_tree::arena::Arena`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct Handle<Tag> {
    index: u32,
    generation: NonZeroU32,
    _tag: std::marker::PhantomData<fn() -> Tag>,
}

impl<Tag> Handle<Tag> {
    /// Construct a handle from its raw parts. Used only by the arena itself.
    #[inline]
    #[must_use]
    pub const fn from_raw_parts(index: u32, generation: NonZeroU32) -> Self {
        Self {
            index,
            generation,
            _tag: std::marker::PhantomData,
        }
    }

    /// The dense index into the arena's backing storage.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The generation this handle was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> NonZeroU32 {
        self.generation
    }
}

impl<Tag> std::fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({}#{})", self.index, self.generation)
    }
}

/// Marker tag for handles into the LView arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewTag;

/// Marker tag for handles into the LContainer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerTag;

/// Stable reference to an LView instance held in the view arena.
///
/// Declaration views, parent views, and child-container back-references are
/// all expressed as `ViewHandle` rather than owning pointers, per the
/// cyclic view/container graph design note: the graph is reconstructed by
/// index, not by ownership.
pub type ViewHandle = Handle<ViewTag>;

/// Stable reference to an LContainer instance held in the container arena.
pub type ContainerHandle = Handle<ContainerTag>;

// ============================================================================
// Flat-array slot offsets
// ============================================================================

macro_rules! define_slot_index {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        $vis struct $name(usize);

        impl $name {
            /// Construct a slot index from a raw offset.
            #[inline]
            #[must_use]
            pub const fn new(offset: usize) -> Self {
                Self(offset)
            }

            /// The raw offset into the flat array.
            #[inline]
            #[must_use]
            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl std::ops::Add<usize> for $name {
            type Output = $name;
            #[inline]
            fn add(self, rhs: usize) -> $name {
                $name(self.0 + rhs)
            }
        }

        impl std::ops::Sub<usize> for $name {
            type Output = $name;
            #[inline]
            fn sub(self, rhs: usize) -> $name {
                $name(self.0 - rhs)
            }
        }

        impl std::ops::Sub<$name> for $name {
            type Output = usize;
            #[inline]
            fn sub(self, rhs: $name) -> usize {
                self.0 - rhs.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(value: $name) -> usize {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_slot_index! {
    /// Offset into `TView.data` / `LView` shared flat-array index space.
    ///
    /// Covers header slots, node slots, binding slots, and the expando
    /// region uniformly — they are all positions in the same pair of
    /// parallel arrays (§3, Dual-buffer design note).
    pub struct SlotIndex;
}

define_slot_index! {
    /// Offset within the contiguous directive range of a single `TNode`
    /// (`directiveStart..directiveEnd`).
    pub struct DirectiveIndex;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_index_arithmetic() {
        let header = SlotIndex::new(20);
        assert_eq!(header + 3, SlotIndex::new(23));
        assert_eq!((header + 3) - header, 3);
    }

    #[test]
    fn handle_round_trips_raw_parts() {
        let gen = NonZeroU32::new(1).unwrap();
        let h: Handle<ViewTag> = Handle::from_raw_parts(7, gen);
        assert_eq!(h.index(), 7);
        assert_eq!(h.generation(), gen);
    }

    #[test]
    fn handles_of_different_tags_are_distinct_types() {
        let gen = NonZeroU32::new(1).unwrap();
        let _view: ViewHandle = Handle::from_raw_parts(0, gen);
        let _container: ContainerHandle = Handle::from_raw_parts(0, gen);
        // The following would not compile if uncommented:
        // let _: ViewHandle = _container;
    }
}
