//! Element addressing, resolution and queries.
//!
//! Everything here runs on the tree-owning thread while a job is processing.
//! Handles are plain instance ids; they borrow nothing and are re-checked
//! against the live tree on every use.

mod errors;
pub mod id;
mod query;
mod registry;
mod source;
mod strategy;

use hcp_scene::{Component, InstanceId, Node, SceneTree};

pub use errors::ElementError;
pub use query::{
    Attribute, ElementLocation, ElementSize, ReflectKind, attribute, location, reflect, size,
};
pub use registry::{ElementLocator, ElementRegistry, TreeLocator};
pub use source::page_source;
pub use strategy::{FindQuery, Strategy, StrategyParseError, find_all, find_one};

pub(crate) const ELEMENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::element");

/// Reference to a live behaviour unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    instance: InstanceId,
}

impl ElementHandle {
    /// Handle for the unit with `instance`.
    #[must_use]
    pub fn new(instance: InstanceId) -> Self {
        Self { instance }
    }

    /// Instance id of the unit.
    #[must_use]
    pub fn instance(self) -> InstanceId {
        self.instance
    }

    /// Borrows the unit and its node from `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::ElementNotFound`] when the unit was destroyed.
    pub fn unit<'t>(
        self,
        tree: &'t dyn SceneTree,
    ) -> Result<(&'t Node, &'t Component), ElementError> {
        tree.component(self.instance)
            .ok_or_else(|| ElementError::unknown_id(self.instance.to_string()))
    }
}
