//! In-memory object tree.

use std::collections::HashMap;

use crate::errors::SceneError;
use crate::ids::{InstanceId, NodeId};
use crate::node::{Component, ComponentSpec, Node, Rect, Size, StickyTag, TRANSFORM};
use crate::tree::SceneTree;

const UNTAGGED: &str = "Untagged";

/// Mutable forest of nodes owned by the application's frame loop.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    owners: HashMap<InstanceId, NodeId>,
    next_node: u64,
    next_instance: i64,
    selected: Option<NodeId>,
    screen: Size,
    destroyed: Vec<InstanceId>,
}

impl Scene {
    /// Empty scene rendered on a screen of `screen` size.
    #[must_use]
    pub fn new(screen: Size) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    /// Creates a node under `parent` (or as a root) with its transform.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `parent` is not live.
    pub fn spawn(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent
            && !self.nodes.contains_key(&parent)
        {
            return Err(SceneError::UnknownNode(parent));
        }
        self.next_node += 1;
        let id = NodeId(self.next_node);
        let transform = self.mint(id, ComponentSpec::new(TRANSFORM).in_namespace("UnityEngine"));
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.into(),
                tag: UNTAGGED.to_owned(),
                parent,
                children: Vec::new(),
                active_self: true,
                bounds: None,
                sticky: None,
                components: vec![transform],
            },
        );
        match parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Attaches a behaviour unit and returns its fresh instance id.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `node` is not live.
    pub fn attach(&mut self, node: NodeId, spec: ComponentSpec) -> Result<InstanceId, SceneError> {
        if !self.nodes.contains_key(&node) {
            return Err(SceneError::UnknownNode(node));
        }
        let component = self.mint(node, spec);
        let instance = component.instance_id();
        self.node_mut(node)?.components.push(component);
        Ok(instance)
    }

    /// Attaches a durable identity tag.
    ///
    /// # Errors
    ///
    /// Fails when the node is unknown or already tagged.
    pub fn set_sticky(&mut self, node: NodeId, tag: StickyTag) -> Result<(), SceneError> {
        let target = self.node_mut(node)?;
        if let Some(existing) = &target.sticky {
            return Err(SceneError::DuplicateSticky {
                name: target.name.clone(),
                existing: existing.id(),
            });
        }
        target.sticky = Some(tag);
        Ok(())
    }

    /// Sets the classification tag.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `node` is not live.
    pub fn set_tag(&mut self, node: NodeId, tag: impl Into<String>) -> Result<(), SceneError> {
        self.node_mut(node)?.tag = tag.into();
        Ok(())
    }

    /// Sets the local active flag.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `node` is not live.
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.active_self = active;
        Ok(())
    }

    /// Records layout output for a node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `node` is not live.
    pub fn set_bounds(&mut self, node: NodeId, bounds: Rect) -> Result<(), SceneError> {
        self.node_mut(node)?.bounds = Some(bounds);
        Ok(())
    }

    /// Moves input selection.
    pub fn select(&mut self, node: Option<NodeId>) {
        self.selected = node.filter(|id| self.nodes.contains_key(id));
    }

    /// Mutable access to a live unit.
    pub fn component_mut(&mut self, instance: InstanceId) -> Option<&mut Component> {
        let owner = *self.owners.get(&instance)?;
        self.nodes
            .get_mut(&owner)?
            .components
            .iter_mut()
            .find(|component| component.instance_id() == instance)
    }

    /// Destroys a node and its subtree.
    ///
    /// Instance ids of every destroyed unit are queued for
    /// [`SceneTree::take_destroyed`].
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] when `node` is not live.
    pub fn destroy(&mut self, node: NodeId) -> Result<(), SceneError> {
        let parent = self
            .nodes
            .get(&node)
            .ok_or(SceneError::UnknownNode(node))?
            .parent;
        match parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.retain(|child| *child != node),
            None => self.roots.retain(|root| *root != node),
        }
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let Some(removed) = self.nodes.remove(&current) else {
                continue;
            };
            if self.selected == Some(current) {
                self.selected = None;
            }
            for component in &removed.components {
                self.owners.remove(&component.instance_id());
                self.destroyed.push(component.instance_id());
            }
            pending.extend(removed.children);
        }
        Ok(())
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the scene holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&node).ok_or(SceneError::UnknownNode(node))
    }

    fn mint(&mut self, owner: NodeId, spec: ComponentSpec) -> Component {
        self.next_instance += 1;
        let instance = InstanceId(self.next_instance);
        self.owners.insert(instance, owner);
        spec.instantiate(instance)
    }
}

impl SceneTree for Scene {
    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn component(&self, instance: InstanceId) -> Option<(&Node, &Component)> {
        let node = self.nodes.get(self.owners.get(&instance)?)?;
        let component = node
            .components
            .iter()
            .find(|component| component.instance_id() == instance)?;
        Some((node, component))
    }

    fn screen_size(&self) -> Size {
        self.screen
    }

    fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    fn take_destroyed(&mut self) -> Vec<InstanceId> {
        std::mem::take(&mut self.destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::default();
        let canvas = scene.spawn(None, "Canvas").expect("canvas");
        let menu = scene.spawn(Some(canvas), "Menu").expect("menu");
        let play = scene.spawn(Some(menu), "Play").expect("play");
        (scene, canvas, menu, play)
    }

    #[test]
    fn every_node_starts_with_a_transform() {
        let (scene, canvas, _, _) = menu();
        let node = scene.node(canvas).expect("canvas is live");
        assert_eq!(node.components().len(), 1);
        assert!(node.transform().is_some());
        assert_eq!(node.tag(), "Untagged");
    }

    #[test]
    fn traversal_is_depth_first_pre_order() {
        let (mut scene, canvas, menu, play) = menu();
        let hud = scene.spawn(None, "Hud").expect("hud");
        assert_eq!(scene.traverse(), vec![canvas, menu, play, hud]);
    }

    #[test]
    fn paths_resolve_absolutely_and_relatively() {
        let (scene, _, menu, play) = menu();
        assert_eq!(scene.path_of(play).as_deref(), Some("/Canvas/Menu/Play"));
        assert_eq!(scene.find_path("/Canvas/Menu/Play"), Some(play));
        assert_eq!(scene.find_path("Menu/Play"), Some(play));
        assert_eq!(scene.find_path("Menu"), Some(menu));
        assert_eq!(scene.find_path("/Menu"), None);
    }

    #[test]
    fn inactive_ancestors_hide_descendants() {
        let (mut scene, canvas, _, play) = menu();
        assert!(scene.is_active_in_hierarchy(play));
        scene.set_active(canvas, false).expect("deactivate");
        assert!(!scene.is_active_in_hierarchy(play));
    }

    #[test]
    fn destroy_queues_subtree_instances_once() {
        let (mut scene, _, menu, play) = menu();
        let button = scene
            .attach(play, ComponentSpec::new("Button"))
            .expect("attach");
        scene.destroy(menu).expect("destroy");
        let destroyed = scene.take_destroyed();
        assert_eq!(destroyed.len(), 3);
        assert!(destroyed.contains(&button));
        assert!(scene.component(button).is_none());
        assert!(scene.take_destroyed().is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn recreated_nodes_receive_fresh_instance_ids() {
        let mut scene = Scene::default();
        let first = scene.spawn(None, "Foo").expect("spawn");
        let first_transform = scene
            .node(first)
            .and_then(Node::transform)
            .map(Component::instance_id)
            .expect("transform");
        scene.destroy(first).expect("destroy");
        let second = scene.spawn(None, "Foo").expect("respawn");
        let second_transform = scene
            .node(second)
            .and_then(Node::transform)
            .map(Component::instance_id)
            .expect("transform");
        assert_ne!(first_transform, second_transform);
    }

    #[test]
    fn second_sticky_tag_is_rejected() {
        let mut scene = Scene::default();
        let node = scene.spawn(None, "Foo").expect("spawn");
        scene
            .set_sticky(node, StickyTag::authored("a-b"))
            .expect("first tag");
        let error = scene
            .set_sticky(node, StickyTag::authored("c-d"))
            .expect_err("second tag");
        assert!(matches!(error, SceneError::DuplicateSticky { .. }));
    }
}
