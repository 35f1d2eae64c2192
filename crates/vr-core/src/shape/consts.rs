//! Well-known layout constants for the `TView.data` / `LView` index space.
//!
//! Both arrays share one index space (§3, Dual-buffer design note): the
//! first [`HEADER_OFFSET`] slots are reserved for per-view bookkeeping
//! (exposed here as typed fields on [`crate::instance::lview::LViewHeader`]
//! rather than untyped array entries — see that module's doc comment for
//! why), and real node/binding/expando slots start immediately after.

use vr_foundation::SlotIndex;

/// Alias used wherever a `SlotIndex` specifically addresses a node (as
/// opposed to a directive-def slot or a binding slot). Same representation,
/// different name for the common case of a `TNode`'s own position.
pub type NodeIndex = SlotIndex;

/// Number of reserved header slots before decls/vars/expando content begins.
///
/// Kept as a plain constant offset for index arithmetic and for parity with
/// the spec's own indexing language ("index >= `HEADER_OFFSET`"), even
/// though header storage itself lives in typed struct fields rather than in
/// `TView.data`/`LView`'s content `Vec`s.
pub const HEADER_OFFSET: usize = 12;

/// First valid node index in any `TView`/`LView` pair.
#[inline]
#[must_use]
pub const fn first_node_index() -> NodeIndex {
    SlotIndex::new(HEADER_OFFSET)
}
