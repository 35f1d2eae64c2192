//! The arenas that back every `ViewHandle`/`ContainerHandle` in a running
//! application, plus the handful of operations that need direct arena
//! access rather than going through a single `LView`/`LContainer` in
//! isolation.
//!
//! Per the cyclic view/container graph design note, `LView`s and
//! `LContainer`s reference each other by handle, never by ownership, so
//! something has to own the actual storage: that's this struct.

use vr_foundation::{ContainerHandle, ContainerTag, Result, ViewHandle, ViewRuntimeError, ViewTag};
use vr_tree::Arena;

use crate::instance::{LContainer, LView};

/// Owns every live `LView` and `LContainer` in one application instance.
#[derive(Debug, Default)]
pub struct ViewEngine {
    views: Arena<LView, ViewTag>,
    containers: Arena<LContainer, ContainerTag>,
    /// The application's root view, once created.
    pub root: Option<ViewHandle>,
}

impl ViewEngine {
    /// Create an engine with no views yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly built `LView`, returning its handle.
    pub fn insert_view(&mut self, view: LView) -> ViewHandle {
        self.views.insert(view)
    }

    /// Insert a freshly built `LContainer`, returning its handle. The
    /// container's `self_handle` is back-filled once the handle is known.
    pub fn insert_container(&mut self, mut container: LContainer) -> ContainerHandle {
        let handle = self.containers.insert(LContainer::new(container.host_view));
        container.self_handle = Some(handle);
        *self.containers.get_mut(handle).expect("just inserted") = container;
        handle
    }

    /// Look up a view by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`] if the handle no longer
    /// refers to a live slot.
    pub fn view(&self, handle: ViewHandle) -> Result<&LView> {
        self.views
            .get(handle)
            .ok_or(ViewRuntimeError::StaleHandle { index: handle.index() })
    }

    /// Look up a view mutably by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`] if the handle no longer
    /// refers to a live slot.
    pub fn view_mut(&mut self, handle: ViewHandle) -> Result<&mut LView> {
        self.views
            .get_mut(handle)
            .ok_or(ViewRuntimeError::StaleHandle { index: handle.index() })
    }

    /// Look up a container by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`] if the handle no longer
    /// refers to a live slot.
    pub fn container(&self, handle: ContainerHandle) -> Result<&LContainer> {
        self.containers
            .get(handle)
            .ok_or(ViewRuntimeError::StaleHandle { index: handle.index() })
    }

    /// Look up a container mutably by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`] if the handle no longer
    /// refers to a live slot.
    pub fn container_mut(&mut self, handle: ContainerHandle) -> Result<&mut LContainer> {
        self.containers
            .get_mut(handle)
            .ok_or(ViewRuntimeError::StaleHandle { index: handle.index() })
    }

    /// Destroy a view: runs its cleanup queue, then frees its arena slot,
    /// bumping the slot's generation so stale handles are detected.
    ///
    /// # Errors
    ///
    /// Returns [`ViewRuntimeError::StaleHandle`] if `handle` is already
    /// stale.
    pub fn destroy_view(&mut self, handle: ViewHandle) -> Result<()> {
        let mut view = self
            .views
            .remove(handle)
            .ok_or(ViewRuntimeError::StaleHandle { index: handle.index() })?;
        for cleanup in view.header.cleanup.drain(..) {
            cleanup();
        }
        Ok(())
    }

    /// Number of live views, for diagnostics and tests.
    #[must_use]
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Number of live containers, for diagnostics and tests.
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}
