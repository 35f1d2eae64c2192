//! The instance buffer: `LView` and `LContainer`, the per-instantiation
//! counterparts to the shape table (§3, §4.2, §4.4).

pub mod lcontainer;
pub mod lview;

pub use lcontainer::{ContainerEntry, LContainer};
pub use lview::{BindingSlot, BindingValue, CleanupFn, LView, LViewHeader};
