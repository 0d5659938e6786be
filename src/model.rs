// Provider-agnostic schema for scraped Luna services. No document handles here:
// once built, a `Service` is self-contained input for the emission engine.

use std::sync::Arc;

use serde::Serialize;

/// Primitive kinds as they appear in the docs' type columns.
///
/// `Parent` marks a direct self-reference (cycle break), `Never` means
/// "endpoint takes no parameters", `Any` is the fallback for shapes we
/// could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    String,
    Number,
    Never,
    Parent,
    Any,
}

impl ScalarType {
    /// TypeScript spelling. `Parent` has no spelling of its own; the
    /// emitter substitutes the enclosing interface name.
    pub fn dts_name(self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Never => "never",
            ScalarType::Parent => "parent",
            ScalarType::Any => "any",
        }
    }

    /// Exact match against the (lowercased, stripped) type-column text.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "boolean" => Some(ScalarType::Boolean),
            "string" => Some(ScalarType::String),
            "number" => Some(ScalarType::Number),
            "never" => Some(ScalarType::Never),
            "any" => Some(ScalarType::Any),
            _ => None,
        }
    }
}

/// Either a scalar or a named object shape. Literal types are shared:
/// the extraction cache hands out the same `Arc` for the same derived name.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Type {
    Scalar(ScalarType),
    Literal(Arc<LiteralType>),
}

impl Type {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Scalar(_))
    }
}

/// One row of a shape table.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(rename = "type")]
    pub ty: Type,
    pub array: bool,
    pub required: bool,
}

/// A named object shape with ordered properties (order drives emitted
/// field order).
#[derive(Debug, Clone, Serialize)]
pub struct LiteralType {
    pub name: String,
    pub properties: Vec<Property>,
}

/// One row of an "error reference" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointError {
    pub code: String,
    pub message: String,
}

/// One callable/subscribable operation of a service.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub name: String,
    /// `Scalar(Never)` when the docs have no Parameters section.
    pub parameters: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_return: Option<Arc<LiteralType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_return: Option<Arc<LiteralType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<EndpointError>>,
}

/// Documentation dialect the service page was scraped from; partitions
/// the emitted namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Lg,
    Ose,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Lg => "lg",
            Group::Ose => "ose",
        }
    }
}

/// One documented API surface (one page).
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub uri: String,
    pub title: String,
    pub group: Group,
    pub endpoints: Vec<Endpoint>,
}
