use super::schema_node::SchemaNode;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use openapiv3::{OpenAPI, Operation, Parameter, PathItem, ReferenceOr, RequestBody, Response, SecurityScheme};
use std::collections::BTreeMap;

/// How many `$ref` hops are followed before a reference is considered cyclic.
const MAX_REFERENCE_DEPTH: usize = 16;

/// A parsed OpenAPI document with its component schemas converted to
/// [`SchemaNode`]s and helpers to resolve component references.
#[derive(Debug, Clone)]
pub struct Document {
    api: OpenAPI,
    schemas: BTreeMap<String, SchemaNode>,
}

/// One operation of the document together with its location.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    pub method: &'static str,
    pub path: &'a str,
    pub operation: &'a Operation,
    pub path_parameters: &'a [ReferenceOr<Parameter>],
}

impl Document {
    pub fn new(api: OpenAPI) -> Result<Self> {
        let mut schemas = BTreeMap::new();
        if let Some(components) = &api.components {
            for (name, schema) in &components.schemas {
                let node = SchemaNode::from_openapi(schema).map_err(|err| match err {
                    Error::Schema(msg) => Error::Schema(format!("schema {name:?}: {msg}")),
                    Error::Type(msg) => Error::Type(format!("schema {name:?}: {msg}")),
                    other => other,
                })?;
                schemas.insert(name.clone(), node);
            }
        }
        Ok(Self { api, schemas })
    }

    pub fn api(&self) -> &OpenAPI {
        &self.api
    }

    pub fn title(&self) -> &str {
        &self.api.info.title
    }

    pub fn description(&self) -> Option<&str> {
        self.api.info.description.as_deref()
    }

    /// Component schemas in sorted name order.
    pub fn schemas(&self) -> &BTreeMap<String, SchemaNode> {
        &self.schemas
    }

    pub fn schema(&self, name: &str) -> Result<&SchemaNode> {
        self.schemas
            .get(name)
            .ok_or_else(|| Error::Schema(format!("unresolved schema reference {name:?}")))
    }

    /// All operations, paths in sorted order and methods in a fixed order per path.
    pub fn operations(&self) -> Result<Vec<OperationRef<'_>>> {
        let mut paths: Vec<_> = self.api.paths.paths.iter().collect();
        paths.sort_by(|a, b| a.0.cmp(b.0));

        let mut operations = Vec::new();
        for (path, item) in paths {
            let item = match item {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { reference } => {
                    return Err(Error::Schema(format!(
                        "path {path} uses reference {reference:?}, unsupported"
                    )))
                }
            };
            for (method, operation) in path_item_operations(item) {
                operations.push(OperationRef {
                    method,
                    path,
                    operation,
                    path_parameters: &item.parameters,
                });
            }
        }
        Ok(operations)
    }

    pub fn resolve_parameter<'a>(&'a self, parameter: &'a ReferenceOr<Parameter>) -> Result<&'a Parameter> {
        let table = self.api.components.as_ref().map(|c| &c.parameters);
        resolve(parameter, "#/components/parameters/", table)
    }

    pub fn resolve_request_body<'a>(&'a self, body: &'a ReferenceOr<RequestBody>) -> Result<&'a RequestBody> {
        let table = self.api.components.as_ref().map(|c| &c.request_bodies);
        resolve(body, "#/components/requestBodies/", table)
    }

    pub fn resolve_response<'a>(&'a self, response: &'a ReferenceOr<Response>) -> Result<&'a Response> {
        let table = self.api.components.as_ref().map(|c| &c.responses);
        resolve(response, "#/components/responses/", table)
    }

    /// Declared security schemes in sorted name order.
    pub fn security_schemes(&self) -> Result<BTreeMap<String, &SecurityScheme>> {
        let mut schemes = BTreeMap::new();
        if let Some(components) = &self.api.components {
            for (name, scheme) in &components.security_schemes {
                let scheme = resolve(
                    scheme,
                    "#/components/securitySchemes/",
                    Some(&components.security_schemes),
                )?;
                schemes.insert(name.clone(), scheme);
            }
        }
        Ok(schemes)
    }

    /// Distinct URL path prefixes of the declared servers, in declaration order.
    /// A document without servers is served from the root.
    pub fn server_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = Vec::new();
        for server in &self.api.servers {
            let prefix = server_path(&server.url);
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }
        if prefixes.is_empty() {
            prefixes.push("/".to_string());
        }
        prefixes
    }
}

fn path_item_operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &Operation)> {
    [
        ("DELETE", item.delete.as_ref()),
        ("GET", item.get.as_ref()),
        ("HEAD", item.head.as_ref()),
        ("OPTIONS", item.options.as_ref()),
        ("PATCH", item.patch.as_ref()),
        ("POST", item.post.as_ref()),
        ("PUT", item.put.as_ref()),
        ("TRACE", item.trace.as_ref()),
    ]
    .into_iter()
    .filter_map(|(method, op)| op.map(|o| (method, o)))
}

fn resolve<'a, T>(
    item: &'a ReferenceOr<T>,
    prefix: &str,
    table: Option<&'a IndexMap<String, ReferenceOr<T>>>,
) -> Result<&'a T> {
    let mut current = item;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            ReferenceOr::Item(item) => return Ok(item),
            ReferenceOr::Reference { reference } => {
                current = reference
                    .strip_prefix(prefix)
                    .and_then(|name| table?.get(name))
                    .ok_or_else(|| Error::Schema(format!("unresolved reference {reference:?}")))?;
            }
        }
    }
    Err(Error::Schema(format!(
        "reference chain under {prefix} exceeds {MAX_REFERENCE_DEPTH} hops"
    )))
}

/// Path component of a server URL, without trailing slash; `/` for the root.
fn server_path(raw: &str) -> String {
    let path = match url::Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        // relative URLs and templated hosts
        Err(_) => match raw.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| rest[i..].to_string()).unwrap_or_default(),
            None => raw.to_string(),
        },
    };
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
