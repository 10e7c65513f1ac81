use crate::error::{Error, Result};
use openapiv3::{ReferenceOr, Schema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Closed description of a schema as far as the generator cares about it.
///
/// A node is either a `Reference` to a named component schema or an inline
/// definition. Sibling keys next to `$ref` are ignored, as OpenAPI 3.0 does.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Reference(String),
    Scalar(Scalar),
    Array(Option<Box<SchemaNode>>),
    Object(ObjectNode),
    /// `allOf` / `anyOf` / `oneOf`; emitted as opaque raw JSON.
    Combinator(Combinator),
    /// No `type`, no `properties`, no `items`.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub format: Option<String>,
    pub enumeration: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    /// Keyed by property name; iteration is always in sorted order.
    pub properties: BTreeMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
}

impl Combinator {
    pub fn keyword(self) -> &'static str {
        match self {
            Combinator::AllOf => "allOf",
            Combinator::AnyOf => "anyOf",
            Combinator::OneOf => "oneOf",
        }
    }
}

impl ObjectNode {
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

impl SchemaNode {
    pub fn from_openapi(schema: &ReferenceOr<Schema>) -> Result<Self> {
        Self::from_value(&serde_json::to_value(schema)?)
    }

    pub fn from_boxed(schema: &ReferenceOr<Box<Schema>>) -> Result<Self> {
        Self::from_value(&serde_json::to_value(schema)?)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::Schema(format!("schema must be an object, got {value}")))?;

        if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| Error::Schema(format!("$ref must be a string, got {reference}")))?;
            return Ok(SchemaNode::Reference(reference_name(reference)?.to_string()));
        }

        for combinator in [Combinator::AllOf, Combinator::AnyOf, Combinator::OneOf] {
            if map.contains_key(combinator.keyword()) {
                return Ok(SchemaNode::Combinator(combinator));
            }
        }

        match map.get("type") {
            None if map.contains_key("properties") => Ok(SchemaNode::Object(parse_object(map)?)),
            None if map.contains_key("items") => parse_array(map),
            None => Ok(SchemaNode::Any),
            Some(Value::String(ty)) => match ty.as_str() {
                "string" => Ok(parse_scalar(ScalarKind::String, map)),
                "integer" => Ok(parse_scalar(ScalarKind::Integer, map)),
                "number" => Ok(parse_scalar(ScalarKind::Number, map)),
                "boolean" => Ok(parse_scalar(ScalarKind::Boolean, map)),
                "array" => parse_array(map),
                "object" => Ok(SchemaNode::Object(parse_object(map)?)),
                other => Err(Error::Type(format!("unknown schema type {other:?}"))),
            },
            Some(other) => Err(Error::Type(format!("unsupported schema type declaration {other}"))),
        }
    }

    /// First declared enum value, used as the JSON:API `type` discriminator.
    pub fn first_enum_value(&self) -> Option<&str> {
        match self {
            SchemaNode::Scalar(scalar) => scalar.enumeration.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Name of the component schema a `$ref` points at.
pub fn reference_name(reference: &str) -> Result<&str> {
    reference
        .strip_prefix(SCHEMA_REF_PREFIX)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Schema(format!("unsupported schema reference {reference:?}")))
}

fn parse_scalar(kind: ScalarKind, map: &Map<String, Value>) -> SchemaNode {
    let format = map
        .get("format")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    let enumeration = map
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    SchemaNode::Scalar(Scalar {
        kind,
        format,
        enumeration,
    })
}

fn parse_array(map: &Map<String, Value>) -> Result<SchemaNode> {
    let items = match map.get("items") {
        Some(items) => Some(Box::new(SchemaNode::from_value(items)?)),
        None => None,
    };
    Ok(SchemaNode::Array(items))
}

fn parse_object(map: &Map<String, Value>) -> Result<ObjectNode> {
    let mut properties = BTreeMap::new();
    if let Some(props) = map.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            let node = SchemaNode::from_value(prop).map_err(|err| match err {
                Error::Schema(msg) => Error::Schema(format!("property {name:?}: {msg}")),
                Error::Type(msg) => Error::Type(format!("property {name:?}: {msg}")),
                other => other,
            })?;
            properties.insert(name.clone(), node);
        }
    }

    let required = map
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();

    Ok(ObjectNode {
        properties,
        required,
        description: map.get("description").and_then(Value::as_str).map(String::from),
    })
}
