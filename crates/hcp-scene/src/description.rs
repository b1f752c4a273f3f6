//! Serde-loadable scene descriptions.
//!
//! Used by the daemon binary to stand up a headless tree, and by tests that
//! prefer data over builder calls.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::SceneError;
use crate::ids::NodeId;
use crate::node::{ComponentSpec, Rect, Size, StickyTag};
use crate::scene::Scene;
use crate::tree::SceneTree;

/// Top-level scene document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDescription {
    /// Screen the layout bounds are checked against.
    #[serde(default)]
    pub screen: Size,
    /// Top-level nodes in order.
    #[serde(default)]
    pub roots: Vec<NodeDescription>,
    /// Path of the node holding input selection.
    #[serde(default)]
    pub selected: Option<String>,
}

/// One node and its subtree.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    /// Node name, unique among siblings for path lookups.
    pub name: String,
    /// Classification tag; `Untagged` when absent.
    #[serde(default)]
    pub tag: Option<String>,
    /// Local active flag.
    #[serde(default = "active_by_default")]
    pub active: bool,
    /// Screen-space bounds, if laid out.
    #[serde(default)]
    pub bounds: Option<Rect>,
    /// Authored sticky guid.
    #[serde(default)]
    pub sticky: Option<String>,
    /// Units after the implicit transform.
    #[serde(default)]
    pub components: Vec<ComponentDescription>,
    /// Child nodes in order.
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

/// A behaviour unit beyond the implicit transform.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDescription {
    /// Short type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Namespace of the type.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Base types, nearest first.
    #[serde(default)]
    pub ancestry: Vec<String>,
    /// Initial enabled state for toggleable units.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Readable members and their values.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn active_by_default() -> bool {
    true
}

impl SceneDescription {
    /// Decodes a JSON scene document.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Description`] for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds a live scene from the description.
    ///
    /// # Errors
    ///
    /// Fails when a selected path does not exist.
    pub fn build(&self) -> Result<Scene, SceneError> {
        let mut scene = Scene::new(self.screen);
        for root in &self.roots {
            root.spawn_into(&mut scene, None)?;
        }
        if let Some(path) = &self.selected {
            let node = scene
                .find_path(path)
                .ok_or_else(|| SceneError::UnknownSelection(path.clone()))?;
            scene.select(Some(node));
        }
        Ok(scene)
    }
}

impl NodeDescription {
    fn spawn_into(&self, scene: &mut Scene, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let id = scene.spawn(parent, self.name.clone())?;
        if let Some(tag) = &self.tag {
            scene.set_tag(id, tag.clone())?;
        }
        scene.set_active(id, self.active)?;
        if let Some(bounds) = self.bounds {
            scene.set_bounds(id, bounds)?;
        }
        if let Some(guid) = &self.sticky {
            scene.set_sticky(id, StickyTag::authored(guid.clone()))?;
        }
        for component in &self.components {
            scene.attach(id, component.to_spec())?;
        }
        for child in &self.children {
            child.spawn_into(scene, Some(id))?;
        }
        Ok(id)
    }
}

impl ComponentDescription {
    fn to_spec(&self) -> ComponentSpec {
        let mut spec =
            ComponentSpec::new(self.type_name.clone()).with_ancestry(self.ancestry.clone());
        if let Some(namespace) = &self.namespace {
            spec = spec.in_namespace(namespace.clone());
        }
        if let Some(enabled) = self.enabled {
            spec = spec.with_enabled(enabled);
        }
        for (name, value) in &self.fields {
            spec = spec.with_field(name.clone(), value.clone());
        }
        spec
    }
}
