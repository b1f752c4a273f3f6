//! Typed action requests and their execution.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::context::ExecutionContext;
use super::errors::{ActionError, DecodeError};
use super::response::JobResponse;
use crate::element::{self, Attribute, FindQuery, ReflectKind, Strategy};

/// Every request the bridge can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Search for one or more elements.
    Find(FindRequest),
    /// Read one attribute of an element.
    GetAttribute {
        element_id: String,
        attribute: Attribute,
    },
    /// Screen position of an element.
    GetLocation {
        element_id: String,
    },
    /// Screen extent of an element.
    GetSize {
        element_id: String,
    },
    /// Read a property or call a no-argument method by name.
    Reflect {
        element_id: String,
        member: String,
        kind: ReflectKind,
    },
    /// Structural dump of the whole tree.
    Source,
}

/// Parameters of a `find` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRequest {
    /// How `selector` is interpreted.
    pub strategy: Strategy,
    /// Selector text, interpreted per strategy.
    pub selector: String,
    /// Element id whose node bounds the search.
    pub context: Option<String>,
    /// Return every match instead of the first.
    pub multiple: bool,
}

#[derive(Deserialize)]
struct FindParams {
    strategy: String,
    selector: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    multiple: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementParams {
    element_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeParams {
    element_id: String,
    attribute: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReflectParams {
    element_id: String,
    name: String,
    attribute: String,
}

impl ActionRequest {
    /// Wire name of the action.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Find(_) => "find",
            Self::GetAttribute { .. } => "element:getAttribute",
            Self::GetLocation { .. } => "element:getLocation",
            Self::GetSize { .. } => "element:getSize",
            Self::Reflect { .. } => "element:reflect",
            Self::Source => "source",
        }
    }

    /// Decodes `find` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] when a field is missing or the
    /// strategy is unknown.
    pub fn find(params: &Value) -> Result<Self, DecodeError> {
        let raw: FindParams = decode_params("find", params)?;
        let strategy = raw.strategy.parse::<Strategy>().map_err(|_| {
            DecodeError::invalid_params("find", format!("unknown strategy '{}'", raw.strategy))
        })?;
        Ok(Self::Find(FindRequest {
            strategy,
            selector: raw.selector,
            context: raw.context.filter(|context| !context.is_empty()),
            multiple: raw.multiple,
        }))
    }

    /// Decodes `element:getAttribute` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] when a field is missing or the
    /// attribute is unknown.
    pub fn get_attribute(params: &Value) -> Result<Self, DecodeError> {
        const ACTION: &str = "element:getAttribute";
        let raw: AttributeParams = decode_params(ACTION, params)?;
        let attribute = raw.attribute.parse::<Attribute>().map_err(|_| {
            DecodeError::invalid_params(ACTION, format!("unknown attribute '{}'", raw.attribute))
        })?;
        Ok(Self::GetAttribute {
            element_id: raw.element_id,
            attribute,
        })
    }

    /// Decodes `element:getLocation` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] without an `elementId`.
    pub fn get_location(params: &Value) -> Result<Self, DecodeError> {
        let raw: ElementParams = decode_params("element:getLocation", params)?;
        Ok(Self::GetLocation {
            element_id: raw.element_id,
        })
    }

    /// Decodes `element:getSize` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] without an `elementId`.
    pub fn get_size(params: &Value) -> Result<Self, DecodeError> {
        let raw: ElementParams = decode_params("element:getSize", params)?;
        Ok(Self::GetSize {
            element_id: raw.element_id,
        })
    }

    /// Decodes `element:reflect` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidParams`] when a field is missing or the
    /// member kind is unknown.
    pub fn reflect(params: &Value) -> Result<Self, DecodeError> {
        const ACTION: &str = "element:reflect";
        let raw: ReflectParams = decode_params(ACTION, params)?;
        let kind = raw.attribute.parse::<ReflectKind>().map_err(|_| {
            DecodeError::invalid_params(ACTION, format!("unknown member kind '{}'", raw.attribute))
        })?;
        Ok(Self::Reflect {
            element_id: raw.element_id,
            member: raw.name,
            kind,
        })
    }

    /// `source` ignores its params.
    pub fn source(_params: &Value) -> Result<Self, DecodeError> {
        Ok(Self::Source)
    }

    /// Runs the request against the live tree.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when resolution or the query fails; the job
    /// pump turns it into an error payload.
    pub fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<JobResponse, ActionError> {
        match self {
            Self::Find(request) => request.execute(context),
            Self::GetAttribute {
                element_id,
                attribute,
            } => {
                let handle = context.resolve(element_id)?;
                let value = element::attribute(context.tree, handle, *attribute)?;
                Ok(JobResponse::Text(value))
            }
            Self::GetLocation { element_id } => {
                let handle = context.resolve(element_id)?;
                let location = element::location(context.tree, handle)?;
                Ok(structured(&location))
            }
            Self::GetSize { element_id } => {
                let handle = context.resolve(element_id)?;
                let size = element::size(context.tree, handle)?;
                Ok(structured(&size))
            }
            Self::Reflect {
                element_id,
                member,
                kind,
            } => {
                let handle = context.resolve(element_id)?;
                let value =
                    element::reflect(context.tree, context.reflection, handle, *kind, member)?;
                Ok(JobResponse::Text(value))
            }
            Self::Source => Ok(JobResponse::Text(element::page_source(context.tree)?)),
        }
    }
}

impl FindRequest {
    fn execute(&self, context: &mut ExecutionContext<'_>) -> Result<JobResponse, ActionError> {
        let scope = self
            .context
            .as_deref()
            .map(|id| context.resolve(id))
            .transpose()?;
        let query = FindQuery::new(self.strategy, &self.selector)
            .within(scope)
            .strict(context.strict_selectors);
        if self.multiple {
            let ids = element::find_all(context.tree, context.registry, &query)?;
            Ok(JobResponse::elements(ids))
        } else {
            let id = element::find_one(context.tree, context.registry, &query)?;
            Ok(JobResponse::element(id))
        }
    }
}

fn decode_params<T: DeserializeOwned>(action: &str, params: &Value) -> Result<T, DecodeError> {
    T::deserialize(params).map_err(|error| DecodeError::invalid_params(action, error.to_string()))
}

// Location and size are plain integer structs and always serialise.
fn structured(value: &impl serde::Serialize) -> JobResponse {
    JobResponse::from_serialize(value)
        .unwrap_or_else(|error| JobResponse::error("InternalError", error.to_string()))
}
