//! TypeBuilder: turns schema nodes into Go type declarations.

use crate::error::{Error, Result};
use crate::generators::golang::ast::{Decl, Field, GoType, Section, SourceFile};
use crate::generators::golang::naming::{go_name, NameSet};
use crate::parsers::{Document, ObjectNode, Scalar, ScalarKind, SchemaNode};
use crate::registry::TypeRegistry;
use std::cell::RefCell;
use std::collections::BTreeMap;

pub const TIME: GoType = GoType::Qualified {
    import: "time",
    name: "Time",
};
pub const DECIMAL: GoType = GoType::Qualified {
    import: "github.com/shopspring/decimal",
    name: "Decimal",
};
pub const RAW_MESSAGE: GoType = GoType::Qualified {
    import: "encoding/json",
    name: "RawMessage",
};

/// A Go type plus what the field using it has to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltType {
    pub ty: GoType,
    /// govalidator rules derived from `format` and `enum`
    pub validators: Vec<String>,
    /// marshaled as ISO 8601 by jsonapi
    pub iso8601: bool,
}

impl BuiltType {
    fn plain(ty: GoType) -> Self {
        Self {
            ty,
            validators: Vec::new(),
            iso8601: false,
        }
    }

    /// Value of the `valid` struct tag for a field of this type.
    pub fn valid_tag(&self, required: bool) -> String {
        let mut rules = self.validators.clone();
        rules.push(if required { "required" } else { "optional" }.to_string());
        rules.join(",")
    }
}

/// `{ "data": ... }` wrapper of a JSON:API document.
enum Envelope<'n> {
    Single(&'n str),
    Many(&'n SchemaNode),
    Inline(&'n ObjectNode),
}

fn envelope(obj: &ObjectNode) -> Option<Envelope<'_>> {
    match obj.property("data")? {
        SchemaNode::Reference(name) => Some(Envelope::Single(name)),
        SchemaNode::Array(Some(items)) => Some(Envelope::Many(items)),
        SchemaNode::Object(data) => Some(Envelope::Inline(data)),
        _ => None,
    }
}

fn is_resource(obj: &ObjectNode) -> bool {
    obj.properties.contains_key("id")
        && obj.properties.contains_key("type")
        && (obj.properties.contains_key("attributes") || obj.properties.contains_key("relationships"))
}

pub struct TypeBuilder<'a> {
    document: &'a Document,
    /// component schema key -> Go type name
    names: BTreeMap<String, String>,
    /// resolved component references
    resolved: RefCell<BTreeMap<String, BuiltType>>,
}

impl<'a> TypeBuilder<'a> {
    pub fn new(document: &'a Document) -> Self {
        let mut taken = NameSet::new();
        let names = document
            .schemas()
            .keys()
            .map(|key| (key.clone(), taken.unique(&go_name(key))))
            .collect();
        Self {
            document,
            names,
            resolved: RefCell::new(BTreeMap::new()),
        }
    }

    /// Go name of a component schema.
    pub fn type_name(&self, key: &str) -> String {
        self.names.get(key).cloned().unwrap_or_else(|| go_name(key))
    }

    /// Declare every component schema, in sorted order.
    pub fn build_types(&self, registry: &mut TypeRegistry, file: &mut SourceFile) -> Result<()> {
        for name in self.names.values() {
            registry.reserve(name);
        }
        for (key, node) in self.document.schemas() {
            self.declare_component(key, node, registry, file)?;
        }
        Ok(())
    }

    /// Type of a value described by `node`; inline objects are declared
    /// under a name derived from `prefix`.
    pub fn build_type(
        &self,
        prefix: &str,
        node: &SchemaNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<BuiltType> {
        match node {
            SchemaNode::Reference(key) => self.resolve_reference(key, &mut Vec::new(), registry, file),
            SchemaNode::Scalar(scalar) => Ok(scalar_type(scalar)),
            SchemaNode::Array(items) => {
                let item = self.array_item_type(prefix, items.as_deref(), registry, file)?;
                Ok(BuiltType::plain(item.slice()))
            }
            SchemaNode::Object(obj) => match envelope(obj) {
                Some(env) => {
                    let ty = self.resolve_envelope(prefix, env, false, &mut Vec::new(), registry, file)?;
                    Ok(BuiltType::plain(ty))
                }
                None => {
                    let name = registry.fresh(prefix);
                    self.emit_object(&name, obj, registry, file)?;
                    Ok(BuiltType::plain(GoType::Named(name).pointer()))
                }
            },
            SchemaNode::Combinator(combinator) => {
                tracing::warn!(
                    type_name = prefix,
                    combinator = combinator.keyword(),
                    "unsupported schema combinator, falling back to raw JSON"
                );
                Ok(BuiltType::plain(RAW_MESSAGE))
            }
            SchemaNode::Any => Ok(BuiltType::plain(GoType::Any)),
        }
    }

    fn declare_component(
        &self,
        key: &str,
        node: &SchemaNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<()> {
        // envelopes resolve to the wrapped type instead of a declaration
        if let SchemaNode::Object(obj) = node {
            if envelope(obj).is_some() {
                self.resolve_reference(key, &mut Vec::new(), registry, file)?;
                return Ok(());
            }
        }
        let name = self.type_name(key);
        if !registry.register(&name) {
            return Ok(());
        }
        self.emit_declaration(&name, node, registry, file)
    }

    fn emit_declaration(
        &self,
        name: &str,
        node: &SchemaNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<()> {
        let ty = match node {
            SchemaNode::Object(obj) => return self.emit_object(name, obj, registry, file),
            SchemaNode::Array(items) => self
                .array_item_type(name, items.as_deref(), registry, file)?
                .slice(),
            SchemaNode::Scalar(scalar) => scalar_type(scalar).ty,
            SchemaNode::Reference(key) => self
                .resolve_reference(key, &mut Vec::new(), registry, file)?
                .ty
                .without_pointer(),
            SchemaNode::Combinator(combinator) => {
                tracing::warn!(
                    type_name = name,
                    combinator = combinator.keyword(),
                    "unsupported schema combinator, falling back to raw JSON"
                );
                RAW_MESSAGE
            }
            SchemaNode::Any => GoType::Any,
        };
        file.push(
            Section::Types,
            Decl::TypeDef {
                name: name.to_string(),
                doc: vec![format!("// {name} ...")],
                ty,
            },
        );
        Ok(())
    }

    fn resolve_reference(
        &self,
        key: &str,
        trail: &mut Vec<String>,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<BuiltType> {
        if let Some(built) = self.resolved.borrow().get(key) {
            return Ok(built.clone());
        }
        if trail.iter().any(|t| t == key) {
            return Err(Error::Schema(format!(
                "JSON:API document {key:?} wraps itself ({})",
                trail.join(" -> ")
            )));
        }
        trail.push(key.to_string());

        let node = self.document.schema(key)?;
        let name = self.type_name(key);
        let built = match node {
            SchemaNode::Object(obj) => match envelope(obj) {
                Some(env) => BuiltType::plain(self.resolve_envelope(&name, env, true, trail, registry, file)?),
                None => {
                    if registry.register(&name) {
                        self.emit_object(&name, obj, registry, file)?;
                    }
                    BuiltType::plain(GoType::Named(name).pointer())
                }
            },
            other => {
                if registry.register(&name) {
                    self.emit_declaration(&name, other, registry, file)?;
                }
                let validators = match other {
                    SchemaNode::Scalar(scalar) => scalar_type(scalar).validators,
                    _ => Vec::new(),
                };
                BuiltType {
                    ty: GoType::Named(name),
                    validators,
                    iso8601: false,
                }
            }
        };

        trail.pop();
        self.resolved.borrow_mut().insert(key.to_string(), built.clone());
        Ok(built)
    }

    /// `named` envelopes (component schemas) declare inline data under their
    /// own name, anonymous ones under a fresh name derived from `prefix`.
    fn resolve_envelope(
        &self,
        prefix: &str,
        env: Envelope<'_>,
        named: bool,
        trail: &mut Vec<String>,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<GoType> {
        match env {
            Envelope::Single(key) => Ok(self.resolve_reference(key, trail, registry, file)?.ty),
            Envelope::Many(SchemaNode::Reference(key)) => {
                Ok(self.resolve_reference(key, trail, registry, file)?.ty.slice())
            }
            Envelope::Many(items) => {
                let item = self.build_type(&format!("{prefix}Item"), items, registry, file)?;
                Ok(item.ty.slice())
            }
            Envelope::Inline(data) => {
                let name = if named {
                    if registry.register(prefix) {
                        self.emit_object(prefix, data, registry, file)?;
                    }
                    prefix.to_string()
                } else {
                    let name = registry.fresh(prefix);
                    self.emit_object(&name, data, registry, file)?;
                    name
                };
                Ok(GoType::Named(name).pointer())
            }
        }
    }

    fn array_item_type(
        &self,
        prefix: &str,
        items: Option<&SchemaNode>,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<GoType> {
        match items {
            Some(items) => Ok(self.build_type(&format!("{prefix}Item"), items, registry, file)?.ty),
            None => Ok(GoType::Any),
        }
    }

    fn emit_object(
        &self,
        name: &str,
        obj: &ObjectNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<()> {
        if is_resource(obj) {
            self.emit_resource(name, obj, registry, file)
        } else {
            self.emit_struct(name, obj, registry, file)
        }
    }

    fn emit_struct(
        &self,
        name: &str,
        obj: &ObjectNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<()> {
        let mut names = NameSet::new();
        let mut fields = Vec::new();
        for (key, prop) in &obj.properties {
            let field_name = names.unique(&go_name(key));
            let built = self.build_type(&format!("{name}{field_name}"), prop, registry, file)?;
            let required = obj.is_required(key);
            let json = if required {
                key.clone()
            } else {
                format!("{key},omitempty")
            };
            fields.push(
                Field::new(field_name, built.ty.clone())
                    .tag("json", json)
                    .tag("valid", built.valid_tag(required)),
            );
        }

        let doc = match &obj.description {
            Some(description) => doc_lines(name, description),
            None => vec![format!("// {name} ...")],
        };
        file.push(
            Section::Types,
            Decl::Struct {
                name: name.to_string(),
                doc,
                fields,
            },
        );
        Ok(())
    }

    fn emit_resource(
        &self,
        name: &str,
        obj: &ObjectNode,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<()> {
        let resource_type = match obj.property("type").and_then(SchemaNode::first_enum_value) {
            Some(value) => value.to_string(),
            None => {
                let fallback = name.to_ascii_lowercase();
                tracing::warn!(
                    type_name = name,
                    fallback = %fallback,
                    "resource has no type enum, deriving JSON:API type from the name"
                );
                fallback
            }
        };

        let mut names = NameSet::new();
        let mut fields = Vec::new();

        let id = match obj.property("id") {
            Some(node) => self.build_type(&format!("{name}ID"), node, registry, file)?,
            None => BuiltType::plain(GoType::Builtin("string")),
        };
        fields.push(
            Field::new(names.unique("ID"), GoType::Builtin("string"))
                .tag("jsonapi", format!("primary,{resource_type},omitempty"))
                .tag("valid", id.valid_tag(obj.is_required("id"))),
        );

        if let Some(attributes) = obj.property("attributes") {
            let attributes = self.resolve_object(attributes, "attributes", name)?;
            for (key, attribute) in &attributes.properties {
                let field_name = names.unique(&go_name(key));
                let built = self.build_type(&format!("{name}{field_name}"), attribute, registry, file)?;
                let required = attributes.is_required(key);

                let mut jsonapi = format!("attr,{key}");
                if built.iso8601 {
                    jsonapi.push_str(",iso8601");
                }
                let mut json = key.clone();
                if !required {
                    jsonapi.push_str(",omitempty");
                    json.push_str(",omitempty");
                }
                fields.push(
                    Field::new(field_name, built.ty.clone())
                        .tag("jsonapi", jsonapi)
                        .tag("json", json)
                        .tag("valid", built.valid_tag(required)),
                );
            }
        }

        if let Some(relationships) = obj.property("relationships") {
            let relationships = self.resolve_object(relationships, "relationships", name)?;
            for (key, relationship) in &relationships.properties {
                let field_name = names.unique(&go_name(key));
                let ty = self.relationship_type(name, key, relationship)?;
                let required = relationships.is_required(key);
                fields.push(
                    Field::new(field_name, ty)
                        .tag("jsonapi", format!("relation,{key},omitempty"))
                        .tag("valid", if required { "required" } else { "optional" }),
                );
            }
        }

        file.push(
            Section::Types,
            Decl::Struct {
                name: name.to_string(),
                doc: vec![format!(
                    "// {name} is a JSON:API resource of type {resource_type:?}"
                )],
                fields,
            },
        );
        Ok(())
    }

    /// `*Target` for to-one and `[]*Target` for to-many relationships, where
    /// `Target` is named after the `type` enum of the linkage object.
    fn relationship_type(&self, owner: &str, key: &str, relationship: &SchemaNode) -> Result<GoType> {
        let relationship = self.resolve_object(relationship, key, owner)?;
        let (linkage, many) = match relationship.property("data") {
            Some(SchemaNode::Array(Some(items))) => (items.as_ref(), true),
            Some(data) => (data, false),
            None => {
                return Err(Error::Schema(format!(
                    "relationship {key:?} of {owner} has no data property"
                )))
            }
        };
        let linkage = self.resolve_object(linkage, key, owner)?;
        let target = linkage
            .property("type")
            .and_then(SchemaNode::first_enum_value)
            .ok_or_else(|| {
                Error::Schema(format!(
                    "relationship {key:?} of {owner} does not declare its resource type as enum"
                ))
            })?;

        let ty = GoType::Named(go_name(target)).pointer();
        Ok(if many { ty.slice() } else { ty })
    }

    fn resolve_object<'n>(&'n self, node: &'n SchemaNode, what: &str, owner: &str) -> Result<&'n ObjectNode> {
        let resolved = match node {
            SchemaNode::Reference(key) => self.document.schema(key)?,
            other => other,
        };
        match resolved {
            SchemaNode::Object(obj) => Ok(obj),
            _ => Err(Error::Schema(format!("{what} of {owner} must be an object"))),
        }
    }
}

fn scalar_type(scalar: &Scalar) -> BuiltType {
    let mut validators = Vec::new();
    let mut iso8601 = false;
    let format = scalar.format.as_deref();

    let ty = match scalar.kind {
        ScalarKind::String => match format {
            Some("uuid") => {
                validators.push("uuid".to_string());
                GoType::Builtin("string")
            }
            Some("date-time") => {
                validators.push("rfc3339".to_string());
                iso8601 = true;
                TIME
            }
            Some("date") => {
                validators.push("date".to_string());
                GoType::Builtin("string")
            }
            Some("email") => {
                validators.push("email".to_string());
                GoType::Builtin("string")
            }
            Some("uri") | Some("url") => {
                validators.push("url".to_string());
                GoType::Builtin("string")
            }
            Some("decimal") => DECIMAL,
            _ => GoType::Builtin("string"),
        },
        ScalarKind::Integer => match format {
            Some("int32") => GoType::Builtin("int32"),
            _ => GoType::Builtin("int64"),
        },
        ScalarKind::Number => match format {
            Some("float") => GoType::Builtin("float32"),
            Some("decimal") => DECIMAL,
            _ => GoType::Builtin("float64"),
        },
        ScalarKind::Boolean => GoType::Builtin("bool"),
    };

    if !scalar.enumeration.is_empty() {
        if let Some(value) = scalar.enumeration.iter().find(|v| v.contains(['"', '`', '\\'])) {
            tracing::warn!(value = %value, "enum value needs escaping inside a struct tag");
        }
        validators.push(format!("in({})", scalar.enumeration.join("|")));
    }

    BuiltType {
        ty,
        validators,
        iso8601,
    }
}

fn doc_lines(name: &str, description: &str) -> Vec<String> {
    let mut lines: Vec<String> = description
        .lines()
        .map(|line| format!("// {}", line.trim_end()).trim_end().to_string())
        .collect();
    match lines.first_mut() {
        Some(first) => *first = format!("// {name} {}", first.trim_start_matches("// ")),
        None => lines.push(format!("// {name} ...")),
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(schemas: serde_json::Value) -> Document {
        let api = serde_json::from_value(json!({
            "openapi": "3.0.3",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": schemas}
        }))
        .unwrap();
        Document::new(api).unwrap()
    }

    fn field<'f>(file: &'f SourceFile, type_name: &str, field: &str) -> &'f Field {
        file.decls(Section::Types)
            .iter()
            .find_map(|decl| match decl {
                Decl::Struct { name, fields, .. } if name == type_name => {
                    fields.iter().find(|f| f.name == field)
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("{type_name}.{field} not declared"))
    }

    fn article_schemas() -> serde_json::Value {
        json!({
            "Article": {
                "type": "object",
                "required": ["id", "type"],
                "properties": {
                    "id": {"type": "string", "format": "uuid"},
                    "type": {"type": "string", "enum": ["article"]},
                    "attributes": {
                        "type": "object",
                        "required": ["title"],
                        "properties": {
                            "title": {"type": "string"},
                            "published_at": {"type": "string", "format": "date-time"},
                            "state": {"type": "string", "enum": ["draft", "live"]}
                        }
                    },
                    "relationships": {
                        "type": "object",
                        "properties": {
                            "author": {
                                "type": "object",
                                "properties": {
                                    "data": {
                                        "type": "object",
                                        "properties": {
                                            "id": {"type": "string"},
                                            "type": {"type": "string", "enum": ["person"]}
                                        }
                                    }
                                }
                            },
                            "tags": {
                                "type": "object",
                                "properties": {
                                    "data": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "id": {"type": "string"},
                                                "type": {"type": "string", "enum": ["tag"]}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "ArticleDocument": {
                "type": "object",
                "properties": {"data": {"$ref": "#/components/schemas/Article"}}
            },
            "ArticleList": {
                "type": "object",
                "properties": {
                    "data": {"type": "array", "items": {"$ref": "#/components/schemas/Article"}}
                }
            }
        })
    }

    #[test]
    fn test_resource_fields() {
        let doc = document(article_schemas());
        let builder = TypeBuilder::new(&doc);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new("api");
        builder.build_types(&mut registry, &mut file).unwrap();

        let id = field(&file, "Article", "ID");
        assert_eq!(id.tag_string().unwrap(), "`jsonapi:\"primary,article,omitempty\" valid:\"uuid,required\"`");

        let title = field(&file, "Article", "Title");
        assert_eq!(title.ty, GoType::Builtin("string"));
        assert_eq!(
            title.tag_string().unwrap(),
            "`jsonapi:\"attr,title\" json:\"title\" valid:\"required\"`"
        );

        let published = field(&file, "Article", "PublishedAt");
        assert_eq!(published.ty, TIME);
        assert_eq!(
            published.tag_string().unwrap(),
            "`jsonapi:\"attr,published_at,iso8601,omitempty\" json:\"published_at,omitempty\" valid:\"rfc3339,optional\"`"
        );

        let state = field(&file, "Article", "State");
        assert!(state.tag_string().unwrap().contains("valid:\"in(draft|live),optional\""));

        assert_eq!(field(&file, "Article", "Author").ty.to_string(), "*Person");
        assert_eq!(field(&file, "Article", "Tags").ty.to_string(), "[]*Tag");
    }

    #[test]
    fn test_envelopes_unwrap_to_referenced_type() {
        let doc = document(article_schemas());
        let builder = TypeBuilder::new(&doc);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new("api");

        let single = builder
            .build_type("X", &SchemaNode::Reference("ArticleDocument".into()), &mut registry, &mut file)
            .unwrap();
        assert_eq!(single.ty.to_string(), "*Article");

        let many = builder
            .build_type("X", &SchemaNode::Reference("ArticleList".into()), &mut registry, &mut file)
            .unwrap();
        assert_eq!(many.ty.to_string(), "[]*Article");

        assert_eq!(file.count("ArticleDocument"), 0);
        assert_eq!(file.count("ArticleList"), 0);
        assert_eq!(file.count("Article"), 1);
    }

    #[test]
    fn test_inline_array_envelope_generates_item_type() {
        let doc = document(json!({}));
        let builder = TypeBuilder::new(&doc);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new("api");

        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "type": {"type": "string", "enum": ["tag"]},
                            "attributes": {"type": "object", "properties": {"label": {"type": "string"}}}
                        }
                    }
                }
            }
        }))
        .unwrap();
        let built = builder.build_type("GetTagsOK", &node, &mut registry, &mut file).unwrap();
        assert_eq!(built.ty.to_string(), "[]*GetTagsOKItem");
        assert_eq!(field(&file, "GetTagsOKItem", "Label").ty, GoType::Builtin("string"));
    }

    #[test]
    fn test_same_type_requested_twice_is_declared_once() {
        let doc = document(article_schemas());
        let builder = TypeBuilder::new(&doc);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new("api");

        let node = SchemaNode::Reference("Article".into());
        builder.build_type("A", &node, &mut registry, &mut file).unwrap();
        builder.build_type("B", &node, &mut registry, &mut file).unwrap();
        builder.build_types(&mut registry, &mut file).unwrap();
        assert_eq!(file.count("Article"), 1);
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let doc = document(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                }
            }
        }));
        let builder = TypeBuilder::new(&doc);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new("api");
        builder.build_types(&mut registry, &mut file).unwrap();
        assert_eq!(field(&file, "Node", "Children").ty.to_string(), "[]*Node");
        assert_eq!(file.count("Node"), 1);
    }

    #[test]
    fn test_self_wrapping_envelope_is_schema_error() {
        let doc = document(json!({
            "Loop": {"type": "object", "properties": {"data": {"$ref": "#/components/schemas/Loop"}}}
        }));
        let builder = TypeBuilder::new(&doc);
        let err = builder
            .build_types(&mut TypeRegistry::new(), &mut SourceFile::new("api"))
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_combinator_degrades_to_raw_json() {
        let doc = document(json!({
            "Mixed": {
                "type": "object",
                "properties": {"payload": {"oneOf": [{"type": "string"}, {"type": "integer"}]}}
            }
        }));
        let builder = TypeBuilder::new(&doc);
        let mut file = SourceFile::new("api");
        builder.build_types(&mut TypeRegistry::new(), &mut file).unwrap();
        assert_eq!(field(&file, "Mixed", "Payload").ty, RAW_MESSAGE);
        assert!(file.imports().contains("encoding/json"));
    }

    #[test]
    fn test_unresolved_reference() {
        let doc = document(json!({}));
        let builder = TypeBuilder::new(&doc);
        let err = builder
            .build_type(
                "X",
                &SchemaNode::Reference("Missing".into()),
                &mut TypeRegistry::new(),
                &mut SourceFile::new("api"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_inline_type_does_not_steal_component_name() {
        let doc = document(json!({
            "Article": {
                "type": "object",
                "properties": {"meta": {"type": "object", "properties": {"a": {"type": "string"}}}}
            },
            "ArticleMeta": {"type": "object", "properties": {"b": {"type": "integer"}}}
        }));
        let builder = TypeBuilder::new(&doc);
        let mut file = SourceFile::new("api");
        builder.build_types(&mut TypeRegistry::new(), &mut file).unwrap();
        assert_eq!(field(&file, "Article", "Meta").ty.to_string(), "*ArticleMeta2");
        assert_eq!(field(&file, "ArticleMeta", "B").ty, GoType::Builtin("int64"));
    }

    #[test]
    fn test_scalar_mapping() {
        let uuid = scalar_type(&Scalar {
            kind: ScalarKind::String,
            format: Some("uuid".into()),
            enumeration: vec![],
        });
        assert_eq!(uuid.ty, GoType::Builtin("string"));
        assert_eq!(uuid.valid_tag(false), "uuid,optional");

        let int = scalar_type(&Scalar {
            kind: ScalarKind::Integer,
            format: Some("int32".into()),
            enumeration: vec!["1".into(), "2".into()],
        });
        assert_eq!(int.ty, GoType::Builtin("int32"));
        assert_eq!(int.valid_tag(true), "in(1|2),required");
    }
}
