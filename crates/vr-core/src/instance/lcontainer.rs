//! `LContainer` — a dynamic list of embedded views anchored at one node.
//!
//! Views held in a container may be declared in a different template than
//! the one that inserted them (content projected into a structural
//! directive from a different component, for instance). Such a view is
//! "transplanted": its `LView.header.declaration_view` differs from the
//! view that owns this container. A transplanted view's declaring view
//! never walks down into this container during its own top-down refresh,
//! so the container itself has to drive that view's refresh out of band.
//!
//! Whether a view is transplanted is a permanent fact, fixed at insertion.
//! Whether it currently *needs* an out-of-band refresh is not: it starts
//! out pending (a freshly inserted view has never been refreshed at all),
//! clears once the container's out-of-band walk refreshes it, and is only
//! re-armed if dirty propagation later crosses back into it from its
//! declaring view. `transplanted_views_to_refresh` tracks the pending
//! count, not the `is_transplanted` count, so the out-of-band walk can
//! skip a container entirely once every transplanted view in it is
//! caught up.

use vr_foundation::{ContainerHandle, ViewHandle};

/// One embedded view's position in a container, whether it is a
/// transplanted view, and whether it currently has a pending out-of-band
/// refresh.
#[derive(Debug, Clone, Copy)]
pub struct ContainerEntry {
    /// The embedded view.
    pub view: ViewHandle,
    /// Whether this entry's declaration view differs from the container's
    /// host view. Fixed at insertion; never changes afterward.
    pub is_transplanted: bool,
    /// Whether this entry still needs an out-of-band refresh. Only
    /// meaningful when `is_transplanted` is `true`.
    pending_refresh: bool,
}

/// A host node's embedded-view list.
#[derive(Debug)]
pub struct LContainer {
    /// The view that declares/owns this container (the structural
    /// directive's host view).
    pub host_view: ViewHandle,
    /// Views currently inserted, in display order.
    pub views: Vec<ContainerEntry>,
    /// Count of entries in `views` with `pending_refresh == true`.
    ///
    /// Maintained incrementally by [`Self::insert`], [`Self::remove`],
    /// [`Self::mark_transplant_pending`], and
    /// [`Self::mark_transplant_refreshed`] rather than recomputed by
    /// scanning `views`, so the dirty propagator can check "does this
    /// container need an out-of-band transplant refresh at all" in O(1).
    transplanted_views_to_refresh: usize,
    /// Self-reference, filled in once the container is placed in its
    /// arena; used by the dirty propagator to walk back up from a view to
    /// its container without a separate lookup table.
    pub self_handle: Option<ContainerHandle>,
}

impl LContainer {
    /// Create an empty container owned by `host_view`.
    #[must_use]
    pub fn new(host_view: ViewHandle) -> Self {
        Self {
            host_view,
            views: Vec::new(),
            transplanted_views_to_refresh: 0,
            self_handle: None,
        }
    }

    /// Number of transplanted views currently held that still need an
    /// out-of-band refresh.
    #[must_use]
    pub fn transplanted_views_to_refresh(&self) -> usize {
        self.transplanted_views_to_refresh
    }

    /// Insert `view` at `index`. Marked transplanted, with a refresh
    /// already pending, if its declaration view differs from this
    /// container's host view — a view that has never run a refresh pass
    /// needs one regardless of how it got here.
    pub fn insert(&mut self, index: usize, view: ViewHandle, declaration_view: ViewHandle) {
        let is_transplanted = declaration_view != self.host_view;
        if is_transplanted {
            self.transplanted_views_to_refresh += 1;
        }
        self.views.insert(
            index,
            ContainerEntry {
                view,
                is_transplanted,
                pending_refresh: is_transplanted,
            },
        );
    }

    /// Append `view` at the end of the container.
    pub fn push(&mut self, view: ViewHandle, declaration_view: ViewHandle) {
        let index = self.views.len();
        self.insert(index, view, declaration_view);
    }

    /// Remove and return the view at `index`, decrementing the pending
    /// counter if it still had a refresh owed.
    pub fn remove(&mut self, index: usize) -> ViewHandle {
        let entry = self.views.remove(index);
        if entry.pending_refresh {
            self.transplanted_views_to_refresh = self.transplanted_views_to_refresh.saturating_sub(1);
        }
        entry.view
    }

    /// Mark the transplanted view at `index` as having been refreshed,
    /// decrementing the pending counter without removing it from the
    /// container or forgetting that it is a transplanted view.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not refer to a transplanted entry, since
    /// that would desynchronize the counter from the views it tracks.
    pub fn mark_transplant_refreshed(&mut self, index: usize) {
        assert!(
            self.views[index].is_transplanted,
            "mark_transplant_refreshed called on a non-transplanted entry at index {index}"
        );
        if self.views[index].pending_refresh {
            self.views[index].pending_refresh = false;
            self.transplanted_views_to_refresh = self.transplanted_views_to_refresh.saturating_sub(1);
        }
    }

    /// Re-arm the transplanted view at `index` for another out-of-band
    /// refresh, because dirty propagation crossed back into it from its
    /// declaring view.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not refer to a transplanted entry.
    pub fn mark_transplant_pending(&mut self, index: usize) {
        assert!(
            self.views[index].is_transplanted,
            "mark_transplant_pending called on a non-transplanted entry at index {index}"
        );
        if !self.views[index].pending_refresh {
            self.views[index].pending_refresh = true;
            self.transplanted_views_to_refresh += 1;
        }
    }

    /// Iterate views in display order.
    pub fn iter(&self) -> impl Iterator<Item = ViewHandle> + '_ {
        self.views.iter().map(|e| e.view)
    }

    /// Find `view`'s current position, if it is still held here. Views can
    /// shift position on insert/remove, so callers that need to revisit an
    /// entry by handle (rather than by index taken moments ago) look it up
    /// fresh each time instead of caching an index.
    #[must_use]
    pub fn index_of(&self, view: ViewHandle) -> Option<usize> {
        self.views.iter().position(|e| e.view == view)
    }

    /// Iterate `(index, view)` pairs for entries still pending an
    /// out-of-band refresh.
    pub fn pending_transplants(&self) -> impl Iterator<Item = (usize, ViewHandle)> + '_ {
        self.views
            .iter()
            .enumerate()
            .filter(|(_, e)| e.pending_refresh)
            .map(|(i, e)| (i, e.view))
    }

    /// Number of views currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether the container currently holds no views.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
