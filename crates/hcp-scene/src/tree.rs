//! Read access to a live object tree.

use crate::ids::{InstanceId, NodeId};
use crate::node::{Component, Node, Rect, Size};

/// Query surface the automation bridge uses against the application's tree.
///
/// Implementations are owned by a single thread; the bridge only calls these
/// methods from that thread while a job is processing.
pub trait SceneTree {
    /// Root nodes in insertion order.
    fn roots(&self) -> &[NodeId];

    /// Looks up a live node.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Looks up a live behaviour unit together with its owning node.
    fn component(&self, instance: InstanceId) -> Option<(&Node, &Component)>;

    /// Screen dimensions used for visibility checks.
    fn screen_size(&self) -> Size;

    /// Node currently holding input selection, if any.
    fn selected(&self) -> Option<NodeId>;

    /// Drains the instance ids of units destroyed since the previous call.
    fn take_destroyed(&mut self) -> Vec<InstanceId>;

    /// Screen rectangle of a node.
    ///
    /// Nodes without layout bounds report an empty rectangle at the origin.
    fn screen_rect(&self, id: NodeId) -> Rect {
        self.node(id).and_then(Node::bounds).unwrap_or_default()
    }

    /// Every live node in depth-first pre-order, roots first.
    ///
    /// The order is stable for an unchanged tree, so "first match" queries
    /// are reproducible.
    fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children().iter().rev().copied());
        }
        order
    }

    /// Whether the node and all its ancestors are active.
    fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.node(current) {
                Some(node) if node.active_self() => cursor = node.parent(),
                _ => return false,
            }
        }
        true
    }

    /// Slash-separated path from the root, e.g. `/Canvas/Menu/Play`.
    fn path_of(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            segments.push(node.name());
            cursor = node.parent();
        }
        segments.reverse();
        Some(segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        }))
    }

    /// Name-based hierarchical lookup.
    ///
    /// `/a/b` walks from the roots; `a/b` or `b` matches the first node in
    /// traversal order whose trailing path segments equal the request.
    fn find_path(&self, path: &str) -> Option<NodeId> {
        let segments: Vec<&str> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let (first, rest) = segments.split_first()?;
        if path.starts_with('/') {
            let mut current = self
                .roots()
                .iter()
                .copied()
                .find(|id| self.node(*id).is_some_and(|node| node.name() == *first))?;
            for segment in rest {
                let node = self.node(current)?;
                current = node
                    .children()
                    .iter()
                    .copied()
                    .find(|id| self.node(*id).is_some_and(|child| child.name() == *segment))?;
            }
            return Some(current);
        }
        self.traverse()
            .into_iter()
            .find(|id| self.ends_with_segments(*id, &segments))
    }

    #[doc(hidden)]
    fn ends_with_segments(&self, id: NodeId, segments: &[&str]) -> bool {
        let mut cursor = Some(id);
        for segment in segments.iter().rev() {
            let Some(node) = cursor.and_then(|current| self.node(current)) else {
                return false;
            };
            if node.name() != *segment {
                return false;
            }
            cursor = node.parent();
        }
        true
    }
}
