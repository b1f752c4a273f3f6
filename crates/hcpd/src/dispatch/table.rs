//! Action name to request factory registration.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use super::DISPATCH_TARGET;
use super::envelope::ActionEnvelope;
use super::errors::DecodeError;
use super::request::ActionRequest;

/// Builds a typed request from decoded `params`.
pub type RequestFactory = fn(&Value) -> Result<ActionRequest, DecodeError>;

/// Immutable once the session starts; shared with every connection.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    factories: HashMap<&'static str, RequestFactory>,
}

impl DispatchTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with every built-in action registered.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register("find", ActionRequest::find);
        table.register("element:getAttribute", ActionRequest::get_attribute);
        table.register("element:getLocation", ActionRequest::get_location);
        table.register("element:getSize", ActionRequest::get_size);
        table.register("element:reflect", ActionRequest::reflect);
        table.register("source", ActionRequest::source);
        table
    }

    /// Registers `factory` for `action`, replacing any earlier factory.
    pub fn register(&mut self, action: &'static str, factory: RequestFactory) {
        self.factories.insert(action, factory);
    }

    /// Whether `action` is registered.
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.factories.contains_key(action)
    }

    /// Registered action names, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.factories.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Builds the request for an envelope.
    ///
    /// Returns `Ok(None)` for actions with no registered factory; those are
    /// logged and answered with an empty response.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] when the factory rejects the
    /// params.
    pub fn construct(
        &self,
        envelope: &ActionEnvelope,
    ) -> Result<Option<ActionRequest>, DecodeError> {
        let Some(factory) = self.factories.get(envelope.action.as_str()) else {
            warn!(
                target: DISPATCH_TARGET,
                action = %envelope.action,
                "unrecognised action"
            );
            return Ok(None);
        };
        factory(&envelope.params).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn envelope(body: &str) -> ActionEnvelope {
        ActionEnvelope::parse(body.as_bytes()).expect("envelope")
    }

    #[test]
    fn standard_table_registers_built_in_actions() {
        assert_eq!(
            DispatchTable::standard().actions(),
            vec![
                "element:getAttribute",
                "element:getLocation",
                "element:getSize",
                "element:reflect",
                "find",
                "source",
            ]
        );
    }

    #[rstest]
    #[case(r#"{"cmd":"action","action":"source"}"#, "source")]
    #[case(
        r#"{"cmd":"action","action":"element:getSize","params":{"elementId":"12"}}"#,
        "element:getSize"
    )]
    fn routes_registered_actions(#[case] body: &str, #[case] expected: &str) {
        let request = DispatchTable::standard()
            .construct(&envelope(body))
            .expect("decode")
            .expect("registered");
        assert_eq!(request.action(), expected);
    }

    #[test]
    fn unknown_actions_build_nothing() {
        let request = DispatchTable::standard()
            .construct(&envelope(r#"{"cmd":"action","action":"element:tap"}"#))
            .expect("not an error");
        assert!(request.is_none());
    }

    #[test]
    fn empty_table_recognises_nothing() {
        let table = DispatchTable::new();
        assert!(!table.contains("find"));
        assert!(table.actions().is_empty());
    }

    #[test]
    fn registration_replaces_factories() {
        let mut table = DispatchTable::new();
        table.register("find", ActionRequest::source);
        let request = table
            .construct(&envelope(r#"{"cmd":"action","action":"find"}"#))
            .expect("decode")
            .expect("registered");
        assert_eq!(request, ActionRequest::Source);
    }

    #[test]
    fn factory_failures_surface() {
        let error = DispatchTable::standard()
            .construct(&envelope(r#"{"cmd":"action","action":"find","params":{}}"#))
            .expect_err("missing strategy");
        assert_eq!(error.kind(), "DecodeError");
    }
}
