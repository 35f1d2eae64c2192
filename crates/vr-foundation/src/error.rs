//! Error taxonomy for the view runtime.
//!
//! Mirrors the error taxonomy from the external interface contract: the
//! runtime never recovers from these itself, it only guarantees its own
//! stacks (view frame, selected index, directive index) are popped before
//! the error reaches the caller.

use thiserror::Error;

/// Result alias used throughout the view runtime crates.
pub type Result<T> = std::result::Result<T, ViewRuntimeError>;

/// Errors raised by shape construction, directive resolution, and change
/// detection.
///
/// Variants map directly onto the error taxonomy in the external interface
/// contract; `context` fields carry enough detail for a host to present a
/// useful diagnostic without the runtime itself needing to format one.
#[derive(Error, Debug, Clone)]
#[must_use = "errors should be handled or propagated"]
pub enum ViewRuntimeError {
    /// A `localRefs` entry named an export that no matched directive
    /// provides under `exportAs`.
    #[error("no directive or component exports the name {name:?} on this node")]
    ExportNotFound {
        /// The export name that could not be resolved.
        name: String,
    },

    /// More than one component def matched the same host node.
    #[error("multiple components matched one host element: {first} and {second}")]
    MultipleComponentsForHost {
        /// Type name of the first matching component.
        first: String,
        /// Type name of the second matching component.
        second: String,
    },

    /// A bound property name is not recognized by the element's schema.
    #[error("unknown property {property:?} on element {element_name:?}")]
    UnknownProperty {
        /// The property name that failed to resolve.
        property: String,
        /// The tag/element name the binding targeted.
        element_name: String,
    },

    /// A check-no-changes pass observed a binding slot change value.
    ///
    /// Carries the previous and current value formatted as strings because
    /// the runtime is generic over binding value types at this layer.
    #[error(
        "expression changed after it was checked: property {property:?} on {owner:?} \
         was {previous:?}, is now {current:?}"
    )]
    ExpressionChangedAfterCheck {
        /// The binding's public property name.
        property: String,
        /// Debug description of the owning node.
        owner: String,
        /// The value observed on the first (authoritative) pass.
        previous: String,
        /// The value observed on the check-no-changes pass.
        current: String,
    },

    /// A handle (view or container) no longer refers to a live slot.
    ///
    /// Unlike the other programmer-error categories the compiled output is
    /// trusted not to trigger, a stale handle can arise from ordinary,
    /// correct host code (an event callback firing after its view was
    /// destroyed), so the arena surfaces it as a recoverable `Result`
    /// rather than a `debug_assert!`.
    #[error("stale handle: generation mismatch on slot {index}")]
    StaleHandle {
        /// The arena slot index the handle referred to.
        index: u32,
    },

    /// The first creation pass for a `TView` failed and left it
    /// permanently marked `incomplete_first_pass`.
    #[error("TView is marked incomplete after a failed first creation pass")]
    IncompleteFirstPass,
}
