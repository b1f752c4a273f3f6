//! Live object tree model hosted by an interactive application.
//!
//! A [`Scene`] is a forest of named [`Node`]s. Each node carries an ordered
//! list of behaviour units ([`Component`]s), always starting with the base
//! spatial facet ([`TRANSFORM`]). Units have a transient [`InstanceId`] that is
//! never reused, while nodes may carry an authored [`StickyTag`] that survives
//! destroy and recreate cycles.
//!
//! The automation bridge never depends on [`Scene`] directly: every query goes
//! through the [`SceneTree`] trait so applications can expose their own tree.
//! The tree is single-threaded by contract; only its owning thread may call
//! into it.

mod description;
mod errors;
mod ids;
mod node;
mod reflect;
mod scene;
mod tree;

pub use description::{ComponentDescription, NodeDescription, SceneDescription};
pub use errors::{ReflectError, SceneError};
pub use ids::{InstanceId, NodeId};
pub use node::{Component, ComponentSpec, Node, Rect, Size, StickyOrigin, StickyTag, TRANSFORM};
pub use reflect::{Accessor, AccessorTable, MemberKind, ReflectionTable};
pub use scene::Scene;
pub use tree::SceneTree;
