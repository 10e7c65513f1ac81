//! HandlerEmitter: per route response writer, request type and the
//! `http.Handler` dispatching into the service interface.

use super::ast::{Block, Decl, Field, FuncDecl, GoType, InterfaceItem, Section, SourceFile};
use super::naming::{go_name, go_quote, NameSet};
use super::security::{SecurityEmitter, BACKEND_INTERFACE};
use super::{RuntimePackages, CONTEXT, HTTP, MUX, OPENTRACING};
use crate::error::Result;
use crate::operation_processor::Route;
use crate::parsers::{Document, Scalar, ScalarKind, SchemaNode};
use crate::registry::TypeRegistry;
use crate::schema_processor::TypeBuilder;
use indexmap::IndexMap;
use openapiv3::{MediaType, Operation, Parameter, ParameterSchemaOrContent, Response, Responses, StatusCode};
use std::collections::BTreeMap;
use std::mem::discriminant;

pub const SERVICE_INTERFACE: &str = "Service";

/// Status codes the runtime answers itself; they never get a writer method.
pub const BLACKLISTED_CODES: [u16; 5] = [401, 406, 415, 422, 500];

const JSON_MEDIA_TYPES: [&str; 2] = ["application/vnd.api+json", "application/json"];

const RESPONSE_WRITER: GoType = GoType::Qualified {
    import: HTTP,
    name: "ResponseWriter",
};
const HTTP_REQUEST: GoType = GoType::Qualified {
    import: HTTP,
    name: "Request",
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResponseKind {
    Error,
    Data(GoType),
    Empty,
}

#[derive(Debug)]
struct ResponseMethod {
    code: u16,
    name: String,
    kind: ResponseKind,
}

impl ResponseMethod {
    fn signature(&self) -> String {
        match &self.kind {
            ResponseKind::Error => format!("{}(err error)", self.name),
            ResponseKind::Data(ty) => format!("{}(data {ty})", self.name),
            ResponseKind::Empty => format!("{}()", self.name),
        }
    }

    fn doc(&self) -> String {
        let what = match self.kind {
            ResponseKind::Error => "jsonapi error",
            ResponseKind::Data(_) => "jsonapi marshaled data",
            ResponseKind::Empty => "empty response",
        };
        format!("// {} responds with {what} (HTTP code {})", self.name, self.code)
    }
}

/// A scanned request parameter.
struct RequestParam {
    field: String,
    name: String,
    location: &'static str,
    input: String,
}

pub struct HandlerEmitter<'a> {
    document: &'a Document,
    types: &'a TypeBuilder<'a>,
    security: &'a SecurityEmitter,
    packages: &'a RuntimePackages,
}

impl<'a> HandlerEmitter<'a> {
    pub fn new(
        document: &'a Document,
        types: &'a TypeBuilder<'a>,
        security: &'a SecurityEmitter,
        packages: &'a RuntimePackages,
    ) -> Self {
        Self {
            document,
            types,
            security,
            packages,
        }
    }

    /// Parameter list shared by every handler constructor and the router.
    pub fn handler_params(&self) -> String {
        if self.security.has_schemes() {
            format!("service {SERVICE_INTERFACE}, authBackend {BACKEND_INTERFACE}")
        } else {
            format!("service {SERVICE_INTERFACE}")
        }
    }

    /// Arguments matching [`handler_params`](Self::handler_params).
    pub fn handler_args(&self) -> &'static str {
        if self.security.has_schemes() {
            "service, authBackend"
        } else {
            "service"
        }
    }

    pub fn build_handler(&self, route: &Route<'_>, registry: &mut TypeRegistry, file: &mut SourceFile) -> Result<()> {
        self.build_response_writer(route, registry, file)?;
        let (params, content) = self.build_request(route, registry, file)?;
        let authorization = self.security.build_authorization(route.operation)?;

        file.import(HTTP);
        file.import(&self.packages.runtime);
        file.import(&self.packages.errors);
        file.import(OPENTRACING);

        let mut body = Block::new();
        body.open("return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {");
        body.line(format!("defer errors.HandleRequest({}, w, r)", go_quote(&route.handler)));
        body.blank();

        if let Some(authorization) = authorization {
            body.append(&authorization).blank();
        }

        body.line("// Trace the service function handler execution")
            .line(format!(
                "span, ctx := opentracing.StartSpanFromContext(r.Context(), {})",
                go_quote(&route.handler)
            ))
            .line("defer span.Finish()")
            .blank();

        body.line("// Setup context, response writer and request type")
            .open(format!("writer := {}{{", route.response_type_impl))
            .line("ResponseWriter: w,")
            .close("}")
            .open(format!("request := {}{{", route.request_type))
            .line("Request: r.WithContext(ctx),")
            .close("}")
            .blank();

        body.line("// Scan and validate incoming request parameters");
        if !params.is_empty() {
            if params.iter().any(|p| p.location == "runtime.ScanInPath") {
                file.import(MUX);
                body.line("vars := mux.Vars(r)");
            }
            body.open("if !runtime.ScanParameters(w, r,");
            for param in &params {
                body.line(format!(
                    "&runtime.ScanParameter{{Data: &request.{}, Location: {}, Input: {}, Name: {}}},",
                    param.field,
                    param.location,
                    param.input,
                    go_quote(&param.name)
                ));
            }
            body.reopen(") {").line("return").close("}");
        }
        body.open("if !runtime.ValidateParameters(w, r, &request) {")
            .line("return")
            .close("}")
            .blank();

        if let Some(content) = content {
            let unmarshal = if content.is_slice() { "UnmarshalMany" } else { "Unmarshal" };
            body.line("// Unmarshal the service request body")
                .open(format!("if !runtime.{unmarshal}(w, r, &request.Content) {{"))
                .line("return")
                .close("}")
                .blank();
        }

        body.line("// Invoke service that implements the business logic")
            .line(format!("err := service.{}(ctx, &writer, &request)", route.service_func))
            .open("if err != nil {")
            .line("runtime.HandleError(err, w, r)")
            .close("}");
        body.close("})");

        let mut doc = vec![
            format!(
                "// {} handles request/response marshaling and validation for",
                route.handler
            ),
            format!("//  {} {}", route.method, route.pattern),
        ];
        if route.operation.deprecated {
            doc.push("//".to_string());
            doc.push(format!("// Deprecated: {} is deprecated", route.pattern));
        }

        file.push(
            Section::Handlers,
            Decl::Func(FuncDecl {
                doc,
                receiver: None,
                name: route.handler.clone(),
                params: self.handler_params(),
                results: "http.Handler".to_string(),
                body,
            }),
        );
        Ok(())
    }

    /// The service contract, one method per route.
    pub fn build_service(&self, routes: &[Route<'_>], file: &mut SourceFile) {
        file.import(CONTEXT);
        let items = routes
            .iter()
            .map(|route| {
                let summary = route
                    .operation
                    .summary
                    .as_deref()
                    .or(route.operation.description.as_deref())
                    .and_then(|s| s.lines().next())
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                InterfaceItem::Method {
                    doc: summary.map(|s| format!("// {} {s}", route.service_func)),
                    signature: format!(
                        "{}(context.Context, {}, *{}) error",
                        route.service_func, route.response_type, route.request_type
                    ),
                }
            })
            .collect();
        file.push(
            Section::Service,
            Decl::Interface {
                name: SERVICE_INTERFACE.to_string(),
                doc: vec![format!("// {SERVICE_INTERFACE} interface for all handlers")],
                items,
            },
        );
    }

    fn build_response_writer(&self, route: &Route<'_>, registry: &mut TypeRegistry, file: &mut SourceFile) -> Result<()> {
        let mut methods = Vec::new();
        // names of the embedded http.ResponseWriter
        let mut names = NameSet::new();
        for taken in ["Header", "Write", "WriteHeader"] {
            names.unique(taken);
        }

        for (code, response) in self.responses(route)? {
            if BLACKLISTED_CODES.contains(&code) {
                tracing::debug!(code, operation = %route.service_func, "status code is handled by the runtime");
                continue;
            }
            let reason = http::StatusCode::from_u16(code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .map(go_name)
                .unwrap_or_else(|| format!("Status{code}"));
            let name = names.unique(&reason);

            let kind = if code >= 400 {
                ResponseKind::Error
            } else {
                match json_schema(&response.content, route, code)? {
                    Some(node) => {
                        let prefix = format!("{}{}", route.service_func, name);
                        let built = self.types.build_type(&prefix, &node, registry, file)?;
                        file.import_type(&built.ty);
                        ResponseKind::Data(built.ty)
                    }
                    None => ResponseKind::Empty,
                }
            };
            methods.push(ResponseMethod { code, name, kind });
        }

        let mut items = vec![InterfaceItem::Embedded(RESPONSE_WRITER)];
        items.extend(methods.iter().map(|m| InterfaceItem::Method {
            doc: Some(m.doc()),
            signature: m.signature(),
        }));
        file.push(
            Section::Handlers,
            Decl::Interface {
                name: route.response_type.clone(),
                doc: vec![
                    format!(
                        "// {} is a standard http.ResponseWriter extended with methods",
                        route.response_type
                    ),
                    "// to generate the respective responses easily".to_string(),
                ],
                items,
            },
        );
        file.push(
            Section::Handlers,
            Decl::Struct {
                name: route.response_type_impl.clone(),
                doc: Vec::new(),
                fields: vec![Field::embedded(RESPONSE_WRITER)],
            },
        );

        for method in &methods {
            let mut body = Block::new();
            match &method.kind {
                ResponseKind::Error => {
                    body.line(format!("runtime.WriteError(w, {}, err)", method.code));
                }
                ResponseKind::Data(_) => {
                    body.line(format!("runtime.Marshal(w, data, {})", method.code));
                }
                ResponseKind::Empty => {
                    body.line(format!(
                        "w.Header().Set(\"Content-Type\", {})",
                        go_quote(JSON_MEDIA_TYPES[0])
                    ))
                    .line(format!("w.WriteHeader({})", method.code));
                }
            }
            let params = match &method.kind {
                ResponseKind::Error => "err error".to_string(),
                ResponseKind::Data(ty) => format!("data {ty}"),
                ResponseKind::Empty => String::new(),
            };
            file.push(
                Section::Handlers,
                Decl::Func(FuncDecl {
                    doc: vec![method.doc()],
                    receiver: Some(format!("w *{}", route.response_type_impl)),
                    name: method.name.clone(),
                    params,
                    results: String::new(),
                    body,
                }),
            );
        }
        Ok(())
    }

    /// Numeric status codes in ascending order.
    fn responses<'r>(&'r self, route: &Route<'r>) -> Result<BTreeMap<u16, &'r Response>> {
        let responses: &'r Responses = &route.operation.responses;
        if responses.default.is_some() {
            tracing::warn!(operation = %route.service_func, "default response is not supported, skipped");
        }
        let mut sorted = BTreeMap::new();
        for (status, response) in &responses.responses {
            match status {
                StatusCode::Code(code) => {
                    sorted.insert(*code, self.document.resolve_response(response)?);
                }
                StatusCode::Range(range) => {
                    tracing::warn!(
                        operation = %route.service_func,
                        range = %format!("{range}XX"),
                        "status code ranges are not supported, skipped"
                    );
                }
            }
        }
        Ok(sorted)
    }

    /// Request struct; returns the scanned parameters and the body type.
    fn build_request(
        &self,
        route: &Route<'_>,
        registry: &mut TypeRegistry,
        file: &mut SourceFile,
    ) -> Result<(Vec<RequestParam>, Option<GoType>)> {
        let mut fields = vec![Field::new("Request", HTTP_REQUEST.pointer()).tag("valid", "-")];
        let mut names = NameSet::new();
        names.unique("Request");
        names.unique("Content");

        let content = match &route.operation.request_body {
            Some(body) => {
                let body = self.document.resolve_request_body(body)?;
                match json_media(&body.content) {
                    Some(media) => match &media.schema {
                        Some(schema) => {
                            let node = SchemaNode::from_openapi(schema)?;
                            let prefix = format!("{}Content", route.service_func);
                            let built = self.types.build_type(&prefix, &node, registry, file)?;
                            Some(built.ty.without_pointer())
                        }
                        None => None,
                    },
                    None => {
                        tracing::warn!(
                            operation = %route.service_func,
                            "request body without JSON:API content is not unmarshaled"
                        );
                        None
                    }
                }
            }
            None => None,
        };
        if let Some(ty) = &content {
            fields.push(Field::new("Content", ty.clone()));
        }

        let mut params = Vec::new();
        for parameter in self.parameters(route)? {
            let data = parameter.parameter_data_ref();
            let (location, input) = match parameter {
                Parameter::Path { .. } => ("runtime.ScanInPath", format!("vars[{}]", go_quote(&data.name))),
                Parameter::Query { .. } => (
                    "runtime.ScanInQuery",
                    format!("r.URL.Query().Get({})", go_quote(&data.name)),
                ),
                Parameter::Header { .. } => ("runtime.ScanInHeader", format!("r.Header.Get({})", go_quote(&data.name))),
                Parameter::Cookie { .. } => {
                    tracing::warn!(
                        operation = %route.service_func,
                        parameter = %data.name,
                        "cookie parameters are not scanned, skipped"
                    );
                    continue;
                }
            };

            let field = names.unique(&format!("Param{}", go_name(&data.name)));
            let node = match &data.format {
                ParameterSchemaOrContent::Schema(schema) => SchemaNode::from_openapi(schema)?,
                ParameterSchemaOrContent::Content(_) => {
                    tracing::warn!(
                        operation = %route.service_func,
                        parameter = %data.name,
                        "parameter content is not supported, scanned as string"
                    );
                    SchemaNode::Scalar(Scalar {
                        kind: ScalarKind::String,
                        format: None,
                        enumeration: Vec::new(),
                    })
                }
            };
            let prefix = format!("{}{}", route.service_func, field);
            let built = self.types.build_type(&prefix, &node, registry, file)?;
            let required = data.required || matches!(parameter, Parameter::Path { .. });
            fields.push(Field::new(field.clone(), built.ty.clone()).tag("valid", built.valid_tag(required)));

            params.push(RequestParam {
                field,
                name: data.name.clone(),
                location,
                input,
            });
        }

        file.push(
            Section::Handlers,
            Decl::Struct {
                name: route.request_type.clone(),
                doc: vec![
                    format!("// {} is a standard http.Request extended with the", route.request_type),
                    "// un-marshaled content object".to_string(),
                ],
                fields,
            },
        );
        Ok((params, content))
    }

    /// Path level parameters overridden by operation parameters with the
    /// same name and location.
    fn parameters<'r>(&'r self, route: &Route<'r>) -> Result<Vec<&'r Parameter>> {
        let operation: &'r Operation = route.operation;
        let mut merged: Vec<&'r Parameter> = Vec::new();
        for parameter in route.path_parameters {
            merged.push(self.document.resolve_parameter(parameter)?);
        }
        for parameter in &operation.parameters {
            let parameter = self.document.resolve_parameter(parameter)?;
            let name = &parameter.parameter_data_ref().name;
            merged.retain(|p| !(discriminant(*p) == discriminant(parameter) && &p.parameter_data_ref().name == name));
            merged.push(parameter);
        }
        Ok(merged)
    }
}

fn json_media(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    JSON_MEDIA_TYPES.iter().find_map(|media| content.get(*media))
}

/// Schema of the JSON body of a response, `None` for bodyless responses.
fn json_schema(content: &IndexMap<String, MediaType>, route: &Route<'_>, code: u16) -> Result<Option<SchemaNode>> {
    if content.is_empty() {
        return Ok(None);
    }
    let Some(media) = json_media(content) else {
        tracing::warn!(
            operation = %route.service_func,
            code,
            "response has no JSON:API content, treated as bodyless"
        );
        return Ok(None);
    };
    media.schema.as_ref().map(SchemaNode::from_openapi).transpose()
}
