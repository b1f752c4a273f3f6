//! Explicit accessor tables standing in for runtime reflection.
//!
//! Automation clients may read named properties or invoke zero-argument
//! methods on a behaviour unit, but only members registered here are
//! reachable. Every unit type shares a small common table; applications add
//! per-type tables for the members they choose to expose.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::errors::ReflectError;
use crate::node::{Component, Node};

/// Reads a value from a unit. Returning `None` means the value is absent.
pub type Accessor = Box<dyn Fn(&Node, &Component) -> Option<String> + Send + Sync>;

/// Member category addressed by a reflection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Named property read.
    Property,
    /// Zero-argument method call.
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Property => "property",
            Self::Method => "method",
        })
    }
}

/// Properties and methods exposed by one unit type.
#[derive(Default)]
pub struct AccessorTable {
    properties: BTreeMap<String, Accessor>,
    methods: BTreeMap<String, Accessor>,
}

impl AccessorTable {
    /// Table with no accessors registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property reader.
    #[must_use]
    pub fn property<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Node, &Component) -> Option<String> + Send + Sync + 'static,
    {
        self.properties.insert(name.into(), Box::new(accessor));
        self
    }

    /// Exposes a field of the unit's field bag as a property.
    #[must_use]
    pub fn field(self, name: &str) -> Self {
        let key = name.to_owned();
        self.property(name, move |_, component| {
            component.field(&key).map(str::to_owned)
        })
    }

    /// Registers a zero-argument method.
    #[must_use]
    pub fn method0<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Node, &Component) -> Option<String> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Box::new(accessor));
        self
    }

    fn lookup(&self, kind: MemberKind, name: &str) -> Option<&Accessor> {
        match kind {
            MemberKind::Property => self.properties.get(name),
            MemberKind::Method => self.methods.get(name),
        }
    }
}

impl fmt::Debug for AccessorTable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AccessorTable")
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Whitelist of reflectable members, keyed by unit type name.
#[derive(Debug)]
pub struct ReflectionTable {
    common: AccessorTable,
    by_type: HashMap<String, AccessorTable>,
}

impl Default for ReflectionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectionTable {
    /// Table holding only the members every unit exposes.
    #[must_use]
    pub fn new() -> Self {
        let common = AccessorTable::new()
            .property("name", |_, component| Some(component.type_name().to_owned()))
            .property("fullName", |_, component| Some(component.full_type_name()))
            .property("enabled", |_, component| {
                Some(component.is_enabled().to_string())
            })
            .property("instanceId", |_, component| {
                Some(component.instance_id().to_string())
            })
            .property("nodeName", |node, _| Some(node.name().to_owned()))
            .method0("ToString", |node, component| {
                Some(format!("{} ({})", node.name(), component.full_type_name()))
            })
            .method0("GetInstanceID", |_, component| {
                Some(component.instance_id().to_string())
            });
        Self {
            common,
            by_type: HashMap::new(),
        }
    }

    /// Adds or replaces the accessor table for `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, table: AccessorTable) {
        self.by_type.insert(type_name.into(), table);
    }

    /// Reads a registered property.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError`] when neither the type table nor the common
    /// table exposes the property.
    pub fn read_property(
        &self,
        node: &Node,
        component: &Component,
        name: &str,
    ) -> Result<String, ReflectError> {
        self.call(MemberKind::Property, node, component, name)
    }

    /// Invokes a registered zero-argument method.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError`] when the method is not registered.
    pub fn invoke_method0(
        &self,
        node: &Node,
        component: &Component,
        name: &str,
    ) -> Result<String, ReflectError> {
        self.call(MemberKind::Method, node, component, name)
    }

    fn call(
        &self,
        kind: MemberKind,
        node: &Node,
        component: &Component,
        name: &str,
    ) -> Result<String, ReflectError> {
        let accessor = self
            .by_type
            .get(component.type_name())
            .and_then(|table| table.lookup(kind, name))
            .or_else(|| self.common.lookup(kind, name))
            .ok_or_else(|| ReflectError {
                kind,
                type_name: component.type_name().to_owned(),
                member: name.to_owned(),
            })?;
        // Absent values render as the empty string, mirroring a null property.
        Ok(accessor(node, component).unwrap_or_default())
    }
}
