//! Search strategies over the live tree.
//!
//! Single-result searches return the first match in traversal order and
//! register the id they hand out, so later element commands hit the
//! registry. Multi-result searches return every match in the same order.

use hcp_scene::{Component, Node, NodeId, SceneTree};
use strum::{Display, EnumString};
use tracing::debug;

use super::errors::ElementError;
use super::id::{
    DEFAULT_COMPONENT, component_part, element_id_for, has_component_part, object_part,
};
use super::registry::{ElementRegistry, TreeLocator};
use super::{ELEMENT_TARGET, ElementHandle};

/// How a selector is matched against the tree.
///
/// Parsing accepts both the canonical names and the WebDriver locator names
/// automation clients send (`id`, `tag name`, `class name`, `xpath`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Strategy {
    /// First node whose display name equals the object part.
    #[strum(to_string = "name")]
    Name,
    /// The node carrying the sticky tag, or the unit with a transient id.
    #[strum(to_string = "durable-id", serialize = "id")]
    DurableId,
    /// First node whose classification tag equals the object part.
    #[strum(to_string = "tag", serialize = "tag name")]
    Tag,
    /// First unit assignable to the named type.
    #[strum(to_string = "type-name", serialize = "class name")]
    TypeName,
    /// Name-based hierarchical lookup.
    #[strum(to_string = "path", serialize = "xpath")]
    Path,
}

/// Error returned when a strategy name is not recognised.
pub type StrategyParseError = strum::ParseError;

/// A search request.
#[derive(Debug, Clone, Copy)]
pub struct FindQuery<'a> {
    /// How `selector` is interpreted.
    pub strategy: Strategy,
    /// Raw selector text.
    pub selector: &'a str,
    /// Restricts `name`, `tag` and `type-name` searches to the descendants of
    /// this element's node.
    pub scope: Option<ElementHandle>,
    /// Fails single-result `name`, `tag` and `type-name` searches that match
    /// more than once instead of returning the first match.
    pub strict: bool,
}

impl<'a> FindQuery<'a> {
    /// Unscoped, non-strict query.
    #[must_use]
    pub fn new(strategy: Strategy, selector: &'a str) -> Self {
        Self {
            strategy,
            selector,
            scope: None,
            strict: false,
        }
    }

    /// Sets [`scope`](Self::scope).
    #[must_use]
    pub fn within(mut self, scope: Option<ElementHandle>) -> Self {
        self.scope = scope;
        self
    }

    /// Sets [`strict`](Self::strict).
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Finds the first matching unit and returns its registered element id.
///
/// # Errors
///
/// - [`ElementError::ElementNotFound`] when nothing matches.
/// - [`ElementError::InvalidSelector`] for an empty object part, or a
///   component part on a `type-name` search.
/// - [`ElementError::AmbiguousSelector`] in strict mode.
pub fn find_one(
    tree: &dyn SceneTree,
    registry: &mut ElementRegistry,
    query: &FindQuery<'_>,
) -> Result<String, ElementError> {
    let selector = query.selector;
    let object = object_part(selector);
    let component = component_part(selector);
    if object.is_empty() {
        return Err(ElementError::invalid_selector(selector, "object part is empty"));
    }

    let handle = match query.strategy {
        Strategy::DurableId => registry.resolve(tree, &TreeLocator::new(tree), selector)?,
        Strategy::Name | Strategy::Tag => {
            let matches = matching_nodes(tree, query, object)?;
            let node = first_match(query, &matches)?
                .ok_or_else(|| ElementError::missing(component, object))?;
            unit_on(node, component, object)?
        }
        Strategy::TypeName => {
            reject_component_part(selector)?;
            let units = assignable_units(tree, query, object)?;
            first_match(query, &units)?
                .map(|unit| ElementHandle::new(unit.instance_id()))
                .ok_or_else(|| ElementError::ElementNotFound {
                    message: format!("no unit assignable to <{object}>"),
                })?
        }
        Strategy::Path => {
            let node = tree
                .find_path(object)
                .and_then(|id| tree.node(id))
                .ok_or_else(|| ElementError::missing(component, object))?;
            unit_on(node, component, object)?
        }
    };

    let (node, unit) = handle.unit(tree)?;
    let id = element_id_for(node, unit);
    debug!(
        target: ELEMENT_TARGET,
        strategy = %query.strategy,
        selector,
        element = %id,
        "element found"
    );
    registry.register(id.clone(), handle);
    Ok(id)
}

/// Finds every matching unit and returns their registered element ids.
///
/// An empty result is not an error.
///
/// # Errors
///
/// - [`ElementError::UnsupportedOperation`] for `durable-id` and `path`.
/// - [`ElementError::InvalidSelector`] when the selector has a component part.
pub fn find_all(
    tree: &dyn SceneTree,
    registry: &mut ElementRegistry,
    query: &FindQuery<'_>,
) -> Result<Vec<String>, ElementError> {
    let selector = query.selector;
    match query.strategy {
        Strategy::DurableId => {
            return Err(ElementError::unsupported(
                "a durable id addresses exactly one element",
            ));
        }
        Strategy::Path => {
            return Err(ElementError::unsupported(
                "path searches cannot return multiple elements",
            ));
        }
        Strategy::Name | Strategy::Tag | Strategy::TypeName => {}
    }
    if has_component_part(selector) {
        return Err(ElementError::invalid_selector(
            selector,
            "multi-element searches cannot select a component",
        ));
    }

    let object = object_part(selector);
    let units: Vec<&Component> = match query.strategy {
        Strategy::TypeName => assignable_units(tree, query, object)?,
        _ => matching_nodes(tree, query, object)?
            .into_iter()
            .filter_map(|node| node.component_of_type(DEFAULT_COMPONENT))
            .collect(),
    };

    let mut ids = Vec::with_capacity(units.len());
    for unit in units {
        let handle = ElementHandle::new(unit.instance_id());
        let (node, unit) = handle.unit(tree)?;
        let id = element_id_for(node, unit);
        registry.register(id.clone(), handle);
        ids.push(id);
    }
    Ok(ids)
}

fn reject_component_part(selector: &str) -> Result<(), ElementError> {
    if has_component_part(selector) {
        return Err(ElementError::invalid_selector(
            selector,
            "type-name searches cannot select a component",
        ));
    }
    Ok(())
}

fn first_match<'t, T>(
    query: &FindQuery<'_>,
    matches: &[&'t T],
) -> Result<Option<&'t T>, ElementError> {
    if query.strict && matches.len() > 1 {
        return Err(ElementError::ambiguous(query.selector, matches.len()));
    }
    Ok(matches.first().copied())
}

fn unit_on(node: &Node, component: &str, object: &str) -> Result<ElementHandle, ElementError> {
    node.component_of_type(component)
        .map(|unit| ElementHandle::new(unit.instance_id()))
        .ok_or_else(|| ElementError::missing(component, object))
}

fn matching_nodes<'t>(
    tree: &'t dyn SceneTree,
    query: &FindQuery<'_>,
    object: &str,
) -> Result<Vec<&'t Node>, ElementError> {
    let by_tag = matches!(query.strategy, Strategy::Tag);
    Ok(candidates(tree, query.scope)?
        .into_iter()
        .filter(|node| {
            if by_tag {
                node.tag() == object
            } else {
                node.name() == object
            }
        })
        .collect())
}

fn assignable_units<'t>(
    tree: &'t dyn SceneTree,
    query: &FindQuery<'_>,
    type_name: &str,
) -> Result<Vec<&'t Component>, ElementError> {
    Ok(candidates(tree, query.scope)?
        .into_iter()
        .filter_map(|node| node.component_of_type(type_name))
        .collect())
}

fn candidates(
    tree: &dyn SceneTree,
    scope: Option<ElementHandle>,
) -> Result<Vec<&Node>, ElementError> {
    let root = match scope {
        Some(handle) => Some(handle.unit(tree)?.0.id()),
        None => None,
    };
    Ok(tree
        .traverse()
        .into_iter()
        .filter(|id| root.is_none_or(|root| is_strict_descendant(tree, *id, root)))
        .filter_map(|id| tree.node(id))
        .collect())
}

fn is_strict_descendant(tree: &dyn SceneTree, id: NodeId, ancestor: NodeId) -> bool {
    let mut cursor = tree.node(id).and_then(Node::parent);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        cursor = tree.node(current).and_then(Node::parent);
    }
    false
}
