//! # View Runtime Tree
//!
//! Generic, domain-agnostic tree-storage building blocks shared by the view
//! runtime core: a generational arena ([`arena::Arena`]) and a minimal
//! read-only navigation trait ([`nav::TreeNav`]). Neither type knows
//! anything about `TView`/`LView`/`TNode` — those live in `vr-core`, built
//! on top of what's here, the same separation `flui-tree` draws between
//! tree storage and the `flui-view` element tree itself.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod arena;
pub mod nav;

pub use arena::Arena;
pub use nav::TreeNav;
