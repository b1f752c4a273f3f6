//! Attribute, geometry and reflection queries on a resolved element.

use hcp_scene::{ReflectionTable, SceneTree};
use serde::Serialize;
use strum::{Display, EnumString};

use super::ElementHandle;
use super::errors::ElementError;

/// Attributes readable through `element:getAttribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Attribute {
    /// Short type name of the unit.
    Name,
    /// Namespace-qualified type name.
    ClassName,
    /// On screen and active in the hierarchy.
    Displayed,
    /// The unit is switched on.
    Enabled,
    /// The unit's node holds input selection.
    Selected,
}

/// Member category for `element:reflect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReflectKind {
    /// Field or property read.
    Property,
    /// Method taking no arguments.
    Method0,
}

/// Screen position of an element's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementLocation {
    /// Horizontal screen position.
    pub x: i32,
    /// Vertical screen position.
    pub y: i32,
    /// Always zero; kept for WebDriver clients that expect it.
    pub z: i32,
}

/// Screen extent of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Always zero.
    pub depth: i32,
}

/// Reads an attribute as its wire string (`"true"`/`"false"` for flags).
///
/// # Errors
///
/// Returns [`ElementError::ElementNotFound`] when the unit was destroyed.
pub fn attribute(
    tree: &dyn SceneTree,
    handle: ElementHandle,
    attribute: Attribute,
) -> Result<String, ElementError> {
    let (node, unit) = handle.unit(tree)?;
    let value = match attribute {
        Attribute::Name => unit.type_name().to_owned(),
        Attribute::ClassName => unit.full_type_name(),
        Attribute::Displayed => {
            let on_screen = tree.screen_rect(node.id()).fits_within(tree.screen_size());
            (on_screen && tree.is_active_in_hierarchy(node.id())).to_string()
        }
        Attribute::Enabled => unit.is_enabled().to_string(),
        Attribute::Selected => (tree.selected() == Some(node.id())).to_string(),
    };
    Ok(value)
}

/// # Errors
///
/// Returns [`ElementError::ElementNotFound`] when the unit was destroyed.
pub fn location(
    tree: &dyn SceneTree,
    handle: ElementHandle,
) -> Result<ElementLocation, ElementError> {
    let (node, _) = handle.unit(tree)?;
    let rect = tree.screen_rect(node.id());
    Ok(ElementLocation {
        x: truncate(rect.x),
        y: truncate(rect.y),
        z: 0,
    })
}

/// # Errors
///
/// Returns [`ElementError::ElementNotFound`] when the unit was destroyed.
pub fn size(tree: &dyn SceneTree, handle: ElementHandle) -> Result<ElementSize, ElementError> {
    let (node, _) = handle.unit(tree)?;
    let rect = tree.screen_rect(node.id());
    Ok(ElementSize {
        width: truncate(rect.width),
        height: truncate(rect.height),
        depth: 0,
    })
}

/// Reads a whitelisted property or invokes a whitelisted zero-argument
/// method.
///
/// # Errors
///
/// - [`ElementError::ElementNotFound`] when the unit was destroyed.
/// - [`ElementError::UnsupportedOperation`] when the member is not
///   registered for the unit's type.
pub fn reflect(
    tree: &dyn SceneTree,
    reflection: &ReflectionTable,
    handle: ElementHandle,
    kind: ReflectKind,
    member: &str,
) -> Result<String, ElementError> {
    let (node, unit) = handle.unit(tree)?;
    let result = match kind {
        ReflectKind::Property => reflection.read_property(node, unit, member),
        ReflectKind::Method0 => reflection.invoke_method0(node, unit, member),
    };
    result.map_err(|error| ElementError::unsupported(error.to_string()))
}

// Saturating cast; coordinates are truncated towards zero on the wire.
fn truncate(value: f32) -> i32 {
    value as i32
}

#[cfg(test)]
mod tests {
    use hcp_scene::{
        AccessorTable, Component, ComponentSpec, InstanceId, NodeId, Rect, Scene, Size,
    };
    use rstest::{fixture, rstest};

    use super::*;

    struct Screen {
        scene: Scene,
        title: NodeId,
        label: InstanceId,
    }

    #[fixture]
    fn screen() -> Screen {
        let mut scene = Scene::new(Size {
            width: 800.0,
            height: 600.0,
        });
        let canvas = scene.spawn(None, "Canvas").expect("canvas");
        let title = scene.spawn(Some(canvas), "Title").expect("title");
        scene
            .set_bounds(title, Rect::new(10.7, 20.2, 300.9, 40.5))
            .expect("bounds");
        let label = scene
            .attach(
                title,
                ComponentSpec::new("Text")
                    .in_namespace("UnityEngine.UI")
                    .with_enabled(false)
                    .with_field("text", "Main Menu"),
            )
            .expect("label");
        Screen {
            scene,
            title,
            label,
        }
    }

    #[rstest]
    #[case("name", Attribute::Name)]
    #[case("className", Attribute::ClassName)]
    #[case("displayed", Attribute::Displayed)]
    #[case("enabled", Attribute::Enabled)]
    #[case("selected", Attribute::Selected)]
    fn attributes_parse_from_wire_names(#[case] raw: &str, #[case] expected: Attribute) {
        assert_eq!(raw.parse::<Attribute>().expect("parse"), expected);
    }

    #[rstest]
    #[case(Attribute::Name, "Text")]
    #[case(Attribute::ClassName, "UnityEngine.UI.Text")]
    #[case(Attribute::Displayed, "true")]
    #[case(Attribute::Enabled, "false")]
    #[case(Attribute::Selected, "false")]
    fn attributes_describe_the_unit(
        screen: Screen,
        #[case] which: Attribute,
        #[case] expected: &str,
    ) {
        let value = attribute(&screen.scene, ElementHandle::new(screen.label), which)
            .expect("attribute");
        assert_eq!(value, expected);
    }

    #[rstest]
    fn units_without_a_flag_are_enabled(screen: Screen) {
        let transform = screen
            .scene
            .node(screen.title)
            .and_then(|node| node.transform())
            .map(Component::instance_id)
            .expect("transform");
        let value = attribute(&screen.scene, ElementHandle::new(transform), Attribute::Enabled)
            .expect("attribute");
        assert_eq!(value, "true");
    }

    #[rstest]
    fn inactive_ancestors_hide_elements(mut screen: Screen) {
        let canvas = screen.scene.roots().first().copied().expect("canvas");
        screen.scene.set_active(canvas, false).expect("deactivate");
        let value = attribute(&screen.scene, ElementHandle::new(screen.label), Attribute::Displayed)
            .expect("attribute");
        assert_eq!(value, "false");
    }

    #[rstest]
    fn offscreen_elements_are_not_displayed(mut screen: Screen) {
        screen
            .scene
            .set_bounds(screen.title, Rect::new(700.0, 20.0, 300.0, 40.0))
            .expect("bounds");
        let value = attribute(&screen.scene, ElementHandle::new(screen.label), Attribute::Displayed)
            .expect("attribute");
        assert_eq!(value, "false");
    }

    #[rstest]
    fn selection_follows_the_node(mut screen: Screen) {
        screen.scene.select(Some(screen.title));
        let value = attribute(&screen.scene, ElementHandle::new(screen.label), Attribute::Selected)
            .expect("attribute");
        assert_eq!(value, "true");
    }

    #[rstest]
    fn geometry_is_truncated(screen: Screen) {
        let handle = ElementHandle::new(screen.label);
        assert_eq!(
            location(&screen.scene, handle).expect("location"),
            ElementLocation { x: 10, y: 20, z: 0 }
        );
        assert_eq!(
            size(&screen.scene, handle).expect("size"),
            ElementSize {
                width: 300,
                height: 40,
                depth: 0,
            }
        );
    }

    #[rstest]
    fn reflection_uses_registered_members(screen: Screen) {
        let mut reflection = ReflectionTable::new();
        reflection.register("Text", AccessorTable::new().field("text"));
        let handle = ElementHandle::new(screen.label);

        let text = reflect(&screen.scene, &reflection, handle, ReflectKind::Property, "text")
            .expect("property");
        assert_eq!(text, "Main Menu");

        let error = reflect(&screen.scene, &reflection, handle, ReflectKind::Method0, "Destroy")
            .expect_err("not registered");
        assert_eq!(error.kind(), "UnsupportedOperation");
    }

    #[rstest]
    fn destroyed_units_are_not_found(mut screen: Screen) {
        screen.scene.destroy(screen.title).expect("destroy");
        let error = location(&screen.scene, ElementHandle::new(screen.label)).expect_err("gone");
        assert_eq!(error.kind(), "ElementNotFound");
    }
}
