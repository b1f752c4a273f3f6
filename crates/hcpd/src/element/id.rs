//! Element identifier grammar.
//!
//! Identifiers come in two addressing modes:
//!
//! - transient: the decimal instance id of a unit, e.g. `42`;
//! - durable: a sticky tag id, optionally qualified with a unit type, e.g.
//!   `HCP-3f2a...` or `HCP-3f2a...|Button`.
//!
//! The grammar functions are total. They never fail; malformed ids simply
//! fail to resolve later.

use hcp_scene::{Component, Node, TRANSFORM};

/// Separates the object part from the component part.
pub const COMPONENT_SEPARATOR: char = '|';

/// Character whose presence marks a durable (guid-based) id.
pub const DURABLE_MARKER: char = '-';

/// Component selected when an id carries no separator.
pub const DEFAULT_COMPONENT: &str = TRANSFORM;

/// Substring before the first separator; the whole id when there is none.
#[must_use]
pub fn object_part(id: &str) -> &str {
    id.split_once(COMPONENT_SEPARATOR)
        .map_or(id, |(object, _)| object)
}

/// Substring after the first separator, with defaults.
///
/// `A|` selects a unit named like the object part; `A` selects
/// [`DEFAULT_COMPONENT`].
#[must_use]
pub fn component_part(id: &str) -> &str {
    match id.split_once(COMPONENT_SEPARATOR) {
        Some((object, "")) => object,
        Some((_, component)) => component,
        None => DEFAULT_COMPONENT,
    }
}

/// Whether `id` carries the durable marker.
#[must_use]
pub fn is_durable(id: &str) -> bool {
    id.contains(DURABLE_MARKER)
}

/// Whether `id` names a component after the separator.
#[must_use]
pub fn has_component_part(id: &str) -> bool {
    id.contains(COMPONENT_SEPARATOR)
}

/// Identifier handed to clients for a unit.
///
/// Units on a sticky node get `<sticky-id>|<TypeName>` so the id survives
/// recreation; everything else gets its transient instance id.
#[must_use]
pub fn element_id_for(node: &Node, component: &Component) -> String {
    match node.sticky() {
        Some(tag) => format!(
            "{}{COMPONENT_SEPARATOR}{}",
            tag.id(),
            component.type_name()
        ),
        None => component.instance_id().to_string(),
    }
}
