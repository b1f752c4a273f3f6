//! Page source snapshot of the live tree.
//!
//! Only nodes carrying at least one interesting unit become XML elements.
//! Children of skipped nodes are still walked and attach to the nearest
//! emitted ancestor.

use std::io;

use hcp_scene::{Component, Node, NodeId, SceneTree};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

const ROOT_ELEMENT: &str = "hierarchy";
const NODE_CLASS: &str = "UnityEngine.GameObject";
const UI_NAMESPACE: &str = "UnityEngine.UI";
const UNINTERESTING_TYPES: [&str; 3] = ["Transform", "RectTransform", "Renderer"];
const CLICKABLE_TYPES: [&str; 3] = ["Button", "InputField", "Toggle"];
const CHECKABLE_TYPES: [&str; 1] = ["Toggle"];

/// Serialises the tree into a `<hierarchy>` XML document.
///
/// # Errors
///
/// Returns an IO error if the XML writer fails.
pub fn page_source(tree: &dyn SceneTree) -> io::Result<String> {
    let mut writer = Writer::new(Vec::new());
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write(&mut writer, Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
    for (index, root) in tree.roots().iter().enumerate() {
        walk(tree, &mut writer, *root, index)?;
    }
    write(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    String::from_utf8(writer.into_inner())
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}

fn walk(
    tree: &dyn SceneTree,
    writer: &mut Writer<Vec<u8>>,
    id: NodeId,
    index: usize,
) -> io::Result<()> {
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    let interests: Vec<&Component> = node
        .components()
        .iter()
        .filter(|unit| is_interesting(unit))
        .collect();

    let element_name = (!interests.is_empty()).then(|| xml_name(node.name()));
    if let Some(name) = &element_name {
        let start = describe(tree, node, &interests, index, name);
        write(writer, Event::Start(start))?;
    }
    for (child_index, child) in node.children().iter().enumerate() {
        walk(tree, writer, *child, child_index)?;
    }
    if let Some(name) = &element_name {
        write(writer, Event::End(BytesEnd::new(name.as_str())))?;
    }
    Ok(())
}

fn describe(
    tree: &dyn SceneTree,
    node: &Node,
    interests: &[&Component],
    index: usize,
    name: &str,
) -> BytesStart<'static> {
    let rect = tree.screen_rect(node.id());
    let bounds = format!(
        "[{},{}][{},{}]",
        rect.x as i32, rect.y as i32, rect.width as i32, rect.height as i32
    );
    let has_any = |types: &[&str]| {
        node.components()
            .iter()
            .any(|unit| is_one_of(unit, types))
    };
    let components = interests
        .iter()
        .map(|unit| unit.type_name())
        .collect::<Vec<_>>()
        .join(",");

    let mut start = BytesStart::new(name.to_owned());
    start.push_attribute(("class", NODE_CLASS));
    start.push_attribute(("package", NODE_CLASS));
    start.push_attribute(("isHCP", "true"));
    start.push_attribute(("name", node.name()));
    start.push_attribute(("path", tree.path_of(node.id()).unwrap_or_default().as_str()));
    start.push_attribute(("index", index.to_string().as_str()));
    start.push_attribute((
        "resource-id",
        node.sticky().map(|tag| tag.id()).unwrap_or_default().as_str(),
    ));
    start.push_attribute(("enabled", flag(node.active_self())));
    start.push_attribute(("displayed", flag(tree.is_active_in_hierarchy(node.id()))));
    start.push_attribute(("bounds", bounds.as_str()));
    start.push_attribute(("clickable", flag(has_any(&CLICKABLE_TYPES[..]))));
    start.push_attribute(("checkable", flag(has_any(&CHECKABLE_TYPES[..]))));
    start.push_attribute(("components", components.as_str()));
    start
}

fn is_interesting(unit: &Component) -> bool {
    let namespace_of_interest = unit.namespace().is_none_or(|ns| ns == UI_NAMESPACE);
    namespace_of_interest && !is_one_of(unit, &UNINTERESTING_TYPES)
}

fn is_one_of(unit: &Component, types: &[&str]) -> bool {
    types.iter().any(|candidate| *candidate == unit.type_name())
}

/// Node names with parentheses and whitespace replaced by `.`.
fn xml_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch == '(' || ch == ')' || ch.is_whitespace() {
                '.'
            } else {
                ch
            }
        })
        .collect()
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> io::Result<()> {
    writer
        .write_event(event)
        .map_err(|error| io::Error::other(error.to_string()))
}
