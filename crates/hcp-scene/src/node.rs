//! Nodes, behaviour units, and the geometry they report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{InstanceId, NodeId};

/// Type name of the base spatial facet every node owns.
pub const TRANSFORM: &str = "Transform";

const STICKY_PREFIX: &str = "HCP-";
const UNSAFE_MARKER: &str = "UNSAFE-";

/// Axis-aligned rectangle in screen space with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// Rectangle at (`x`, `y`) with the given extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies entirely within a screen of `size`.
    #[must_use]
    pub fn fits_within(&self, size: Size) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= size.width
            && self.y + self.height <= size.height
    }
}

/// Screen dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Whether a sticky guid was authored ahead of time or minted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyOrigin {
    /// Stored with the authored content; stable across builds.
    Authored,
    /// Generated while running; only stable for the current process.
    Runtime,
}

/// Durable identity tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyTag {
    guid: String,
    origin: StickyOrigin,
}

impl StickyTag {
    /// Tag carrying an authored guid.
    #[must_use]
    pub fn authored(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            origin: StickyOrigin::Authored,
        }
    }

    /// Tag with a freshly generated guid.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            guid: Uuid::new_v4().to_string(),
            origin: StickyOrigin::Runtime,
        }
    }

    /// Durable identifier text.
    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Who assigned the tag.
    #[must_use]
    pub fn origin(&self) -> StickyOrigin {
        self.origin
    }

    /// Rendered durable id, `HCP-<guid>` or `HCP-UNSAFE-<guid>`.
    #[must_use]
    pub fn id(&self) -> String {
        match self.origin {
            StickyOrigin::Authored => format!("{STICKY_PREFIX}{}", self.guid),
            StickyOrigin::Runtime => format!("{STICKY_PREFIX}{UNSAFE_MARKER}{}", self.guid),
        }
    }
}

/// Description of a behaviour unit before it is attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    type_name: String,
    namespace: Option<String>,
    ancestry: Vec<String>,
    enabled: Option<bool>,
    fields: BTreeMap<String, String>,
}

impl ComponentSpec {
    /// Unit of `type_name` with no namespace, ancestry or fields.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            namespace: None,
            ancestry: Vec::new(),
            enabled: None,
            fields: BTreeMap::new(),
        }
    }

    /// Places the type in `namespace`.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Base types the unit can be assigned to, nearest first.
    #[must_use]
    pub fn with_ancestry<I, S>(mut self, ancestry: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestry = ancestry.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the unit as toggleable and sets its initial state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Adds a readable member.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub(crate) fn instantiate(self, instance_id: InstanceId) -> Component {
        Component {
            instance_id,
            type_name: self.type_name,
            namespace: self.namespace,
            ancestry: self.ancestry,
            enabled: self.enabled,
            fields: self.fields,
        }
    }
}

/// Behaviour unit attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    instance_id: InstanceId,
    type_name: String,
    namespace: Option<String>,
    ancestry: Vec<String>,
    enabled: Option<bool>,
    fields: BTreeMap<String, String>,
}

impl Component {
    /// Transient id, unique for the life of the scene.
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Short type name, e.g. `Button`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Namespace of the type, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace-qualified type name, e.g. `UnityEngine.UI.Button`.
    #[must_use]
    pub fn full_type_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.type_name),
            None => self.type_name.clone(),
        }
    }

    /// Whether the unit can stand in for `type_name`.
    ///
    /// Matches the short name, the full name, or any declared base type.
    #[must_use]
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.type_name == type_name
            || self.full_type_name() == type_name
            || self.ancestry.iter().any(|base| base == type_name)
    }

    /// Units without an enabled flag are always enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Value of the readable member `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Sets or replaces a readable member.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Switches a toggleable unit on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = Some(enabled);
    }
}

/// Addressable point in the object tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) tag: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) active_self: bool,
    pub(crate) bounds: Option<Rect>,
    pub(crate) sticky: Option<StickyTag>,
    pub(crate) components: Vec<Component>,
}

impl Node {
    /// Stable handle within the owning scene.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Authored display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification tag; `Untagged` unless set.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parent node; `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local active flag, ignoring ancestors.
    #[must_use]
    pub fn active_self(&self) -> bool {
        self.active_self
    }

    /// Screen-space bounds reported by the layout collaborator, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Durable tag, if the node carries one.
    #[must_use]
    pub fn sticky(&self) -> Option<&StickyTag> {
        self.sticky.as_ref()
    }

    /// Behaviour units in attachment order; the first is the transform.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// First unit assignable to `type_name`.
    #[must_use]
    pub fn component_of_type(&self, type_name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.is_assignable_to(type_name))
    }

    /// The base spatial facet.
    #[must_use]
    pub fn transform(&self) -> Option<&Component> {
        self.component_of_type(TRANSFORM)
    }
}
