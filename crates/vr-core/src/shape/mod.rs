//! The shape table: `TView`, `TNode`, and the static tables built once per
//! template (§3, §4.1, §4.3).

pub mod consts;
pub mod hooks;
pub mod host_binding_ops;
pub mod tnode;
pub mod tview;

pub use consts::{NodeIndex, HEADER_OFFSET};
pub use hooks::{HookEntry, HookFn, HookQueues};
pub use host_binding_ops::{HostBindingFn, HostBindingOp};
pub use tnode::{AliasTable, TNode, TNodeFlags, TNodeType};
pub use tview::{TData, TView, TViewRef};
