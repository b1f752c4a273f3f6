//! State a request borrows while it executes on the tree-owning thread.

use hcp_scene::{ReflectionTable, SceneTree};

use crate::element::{ElementError, ElementHandle, ElementRegistry, TreeLocator};

/// Borrowed view of everything a request may touch.
pub struct ExecutionContext<'a> {
    /// Live tree, read-only.
    pub tree: &'a dyn SceneTree,
    /// Element ids handed out so far.
    pub registry: &'a mut ElementRegistry,
    /// Member tables for `element:reflect`.
    pub reflection: &'a ReflectionTable,
    /// Reject ambiguous single-element searches.
    pub strict_selectors: bool,
}

impl<'a> ExecutionContext<'a> {
    /// Borrows the pump's state for one request.
    pub fn new(
        tree: &'a dyn SceneTree,
        registry: &'a mut ElementRegistry,
        reflection: &'a ReflectionTable,
    ) -> Self {
        Self {
            tree,
            registry,
            reflection,
            strict_selectors: false,
        }
    }

    /// Sets [`strict_selectors`](Self::strict_selectors).
    #[must_use]
    pub fn with_strict_selectors(mut self, strict: bool) -> Self {
        self.strict_selectors = strict;
        self
    }

    /// Resolves an element id through the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::ElementNotFound`] when the id no longer
    /// addresses a live unit.
    pub fn resolve(&mut self, id: &str) -> Result<ElementHandle, ElementError> {
        let locator = TreeLocator::new(self.tree);
        self.registry.resolve(self.tree, &locator, id)
    }
}
