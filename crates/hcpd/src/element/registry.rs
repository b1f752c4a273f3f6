//! Cache of previously resolved element ids.

use std::collections::{HashMap, HashSet};

use hcp_scene::{InstanceId, SceneTree};
use tracing::debug;

use super::errors::ElementError;
use super::id::{component_part, has_component_part, is_durable, object_part};
use super::{ELEMENT_TARGET, ElementHandle};

/// Searches the live tree for an id the registry has not seen.
pub trait ElementLocator {
    /// Resolves `id` without consulting any cache.
    fn locate(&self, id: &str) -> Result<ElementHandle, ElementError>;
}

/// Locator that walks a [`SceneTree`].
///
/// Durable ids are matched against sticky tags; transient ids are parsed as
/// instance ids.
pub struct TreeLocator<'a> {
    tree: &'a dyn SceneTree,
}

impl<'a> TreeLocator<'a> {
    /// Locator over `tree`.
    pub fn new(tree: &'a dyn SceneTree) -> Self {
        Self { tree }
    }

    fn locate_durable(&self, id: &str) -> Result<ElementHandle, ElementError> {
        let sticky_id = object_part(id);
        let component = component_part(id);
        let node = self
            .tree
            .traverse()
            .into_iter()
            .filter_map(|node| self.tree.node(node))
            .find(|node| node.sticky().is_some_and(|tag| tag.id() == sticky_id))
            .ok_or_else(|| ElementError::unknown_id(id))?;
        node.component_of_type(component)
            .map(|unit| ElementHandle::new(unit.instance_id()))
            .ok_or_else(|| ElementError::missing(component, node.name()))
    }

    fn locate_transient(&self, id: &str) -> Result<ElementHandle, ElementError> {
        let instance: InstanceId = object_part(id)
            .parse()
            .map_err(|_| ElementError::unknown_id(id))?;
        let (node, unit) = self
            .tree
            .component(instance)
            .ok_or_else(|| ElementError::unknown_id(id))?;
        if !has_component_part(id) {
            return Ok(ElementHandle::new(unit.instance_id()));
        }
        let component = component_part(id);
        node.component_of_type(component)
            .map(|sibling| ElementHandle::new(sibling.instance_id()))
            .ok_or_else(|| ElementError::missing(component, node.name()))
    }
}

impl ElementLocator for TreeLocator<'_> {
    fn locate(&self, id: &str) -> Result<ElementHandle, ElementError> {
        if is_durable(id) {
            self.locate_durable(id)
        } else {
            self.locate_transient(id)
        }
    }
}

/// Id to handle cache owned by the server session.
///
/// Only the tree-owning thread touches the registry, so it needs no lock.
/// Entries are overwritten on re-registration and evicted when the tree
/// reports that the unit behind them was destroyed.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    entries: HashMap<String, ElementHandle>,
}

impl ElementRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-key lookup. Never searches the tree.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<ElementHandle> {
        self.entries.get(id).copied()
    }

    /// Inserts or replaces the handle cached for `id`.
    pub fn register(&mut self, id: impl Into<String>, handle: ElementHandle) {
        self.entries.insert(id.into(), handle);
    }

    /// Returns the cached handle for `id`, locating and caching it on a miss.
    ///
    /// A cached handle whose unit is no longer live is dropped and the id is
    /// located again.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::ElementNotFound`] when the locator finds
    /// nothing.
    pub fn resolve(
        &mut self,
        tree: &dyn SceneTree,
        locator: &dyn ElementLocator,
        id: &str,
    ) -> Result<ElementHandle, ElementError> {
        if let Some(handle) = self.lookup(id) {
            if tree.component(handle.instance()).is_some() {
                return Ok(handle);
            }
            debug!(target: ELEMENT_TARGET, id, "dropping stale registry entry");
            self.entries.remove(id);
        }
        let handle = locator.locate(id)?;
        self.register(id, handle);
        Ok(handle)
    }

    /// Drops every entry pointing at a destroyed unit.
    ///
    /// Returns the number of entries removed.
    pub fn evict(&mut self, destroyed: &[InstanceId]) -> usize {
        if destroyed.is_empty() {
            return 0;
        }
        let destroyed: HashSet<InstanceId> = destroyed.iter().copied().collect();
        let before = self.entries.len();
        self.entries
            .retain(|_, handle| !destroyed.contains(&handle.instance()));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(target: ELEMENT_TARGET, evicted, "evicted destroyed elements");
        }
        evicted
    }

    /// Number of registered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no id is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use hcp_scene::{Component, ComponentSpec, NodeId, Scene, StickyTag};
    use mockall::mock;
    use rstest::{fixture, rstest};

    use super::*;

    mock! {
        Locator {}
        impl ElementLocator for Locator {
            fn locate(&self, id: &str) -> Result<ElementHandle, ElementError>;
        }
    }

    struct Fixture {
        scene: Scene,
        play: NodeId,
        button: InstanceId,
    }

    #[fixture]
    fn menu() -> Fixture {
        let mut scene = Scene::default();
        let canvas = scene.spawn(None, "Canvas").expect("spawn canvas");
        let play = scene.spawn(Some(canvas), "Play").expect("spawn play");
        let button = scene
            .attach(play, ComponentSpec::new("Button"))
            .expect("attach button");
        scene
            .set_sticky(play, StickyTag::authored("c0ffee"))
            .expect("sticky");
        Fixture {
            scene,
            play,
            button,
        }
    }

    #[rstest]
    fn cache_hit_skips_the_locator(menu: Fixture) {
        let handle = ElementHandle::new(menu.button);
        let mut locator = MockLocator::new();
        locator
            .expect_locate()
            .once()
            .returning(move |_| Ok(handle));
        let mut registry = ElementRegistry::new();

        let first = registry
            .resolve(&menu.scene, &locator, "HCP-c0ffee|Button")
            .expect("first resolve");
        let second = registry
            .resolve(&menu.scene, &locator, "HCP-c0ffee|Button")
            .expect("second resolve");

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn locator_failures_are_not_cached(menu: Fixture) {
        let mut locator = MockLocator::new();
        locator
            .expect_locate()
            .times(2)
            .returning(|id| Err(ElementError::unknown_id(id)));
        let mut registry = ElementRegistry::new();

        for _ in 0..2 {
            let error = registry
                .resolve(&menu.scene, &locator, "999")
                .expect_err("should not resolve");
            assert_eq!(error.kind(), "ElementNotFound");
        }
        assert!(registry.is_empty());
    }

    #[rstest]
    fn register_replaces_existing_entries(menu: Fixture) {
        let transform = menu
            .scene
            .node(menu.play)
            .and_then(|node| node.transform())
            .map(Component::instance_id)
            .expect("transform");
        let mut registry = ElementRegistry::new();
        registry.register("Play", ElementHandle::new(transform));
        registry.register("Play", ElementHandle::new(menu.button));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup("Play"),
            Some(ElementHandle::new(menu.button))
        );
    }

    #[rstest]
    fn tree_locator_resolves_durable_ids(menu: Fixture) {
        let locator = TreeLocator::new(&menu.scene);
        let handle = locator.locate("HCP-c0ffee|Button").expect("locate");
        assert_eq!(handle.instance(), menu.button);
    }

    #[rstest]
    fn tree_locator_resolves_transient_ids(menu: Fixture) {
        let locator = TreeLocator::new(&menu.scene);
        let handle = locator
            .locate(&menu.button.to_string())
            .expect("locate");
        assert_eq!(handle.instance(), menu.button);
    }

    #[rstest]
    fn tree_locator_reports_missing_units(menu: Fixture) {
        let locator = TreeLocator::new(&menu.scene);
        let error = locator.locate("HCP-c0ffee|Slider").expect_err("missing");
        assert_eq!(error, ElementError::missing("Slider", "Play"));
    }

    #[rstest]
    fn eviction_forgets_destroyed_units(mut menu: Fixture) {
        let mut registry = ElementRegistry::new();
        registry.register("HCP-c0ffee|Button", ElementHandle::new(menu.button));
        menu.scene.destroy(menu.play).expect("destroy");

        let destroyed = menu.scene.take_destroyed();
        assert_eq!(registry.evict(&destroyed), 1);
        assert!(registry.lookup("HCP-c0ffee|Button").is_none());
    }

    #[rstest]
    fn stale_entries_are_located_again(mut menu: Fixture) {
        let mut registry = ElementRegistry::new();
        registry.register("HCP-c0ffee|Button", ElementHandle::new(menu.button));
        menu.scene.destroy(menu.play).expect("destroy");
        let play = menu.scene.spawn(None, "Play").expect("respawn");
        let button = menu
            .scene
            .attach(play, ComponentSpec::new("Button"))
            .expect("attach");
        menu.scene
            .set_sticky(play, StickyTag::authored("c0ffee"))
            .expect("sticky");

        let locator = TreeLocator::new(&menu.scene);
        let handle = registry
            .resolve(&menu.scene, &locator, "HCP-c0ffee|Button")
            .expect("resolve");
        assert_eq!(handle.instance(), button);
    }
}
