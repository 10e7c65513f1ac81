//! SecurityEmitter: configuration values for the declared security schemes,
//! the `AuthorizationBackend` contract and per-operation authorization code.

use super::ast::{Block, Decl, InterfaceItem, Section, SourceFile};
use super::naming::{go_name, go_quote};
use super::{RuntimePackages, CONTEXT, HTTP};
use crate::error::{Error, Result};
use crate::parsers::Document;
use openapiv3::{Operation, SecurityRequirement};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const BACKEND_INTERFACE: &str = "AuthorizationBackend";

/// A security scheme as declared under `components.securitySchemes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub bearer_format: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub flows: BTreeMap<String, FlowConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfig {
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    OAuth2,
    ApiKey,
}

impl SchemeKind {
    /// Number of tokens a security requirement must list for this kind.
    fn expected_tokens(self) -> usize {
        match self {
            SchemeKind::OAuth2 => 1,
            SchemeKind::ApiKey => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheme {
    /// Go identifier suffix, e.g. `OAuth2` in `AuthorizeOAuth2`.
    pub ident: String,
    pub kind: SchemeKind,
    pub config: SecurityConfig,
}

impl Scheme {
    fn config_var(&self) -> String {
        format!("cfg{}", self.ident)
    }
}

pub struct SecurityEmitter {
    schemes: BTreeMap<String, Scheme>,
    /// document level requirements, used by operations without their own
    global: Option<Vec<SecurityRequirement>>,
    packages: RuntimePackages,
    require_backend: bool,
}

impl SecurityEmitter {
    /// Parse every declared scheme. Anything but `oauth2` and `apiKey` is rejected.
    pub fn new(document: &Document, packages: RuntimePackages, require_backend: bool) -> Result<Self> {
        let mut schemes = BTreeMap::new();
        for (name, scheme) in document.security_schemes()? {
            let config: SecurityConfig = serde_json::from_value(serde_json::to_value(scheme)?)?;
            let kind = match config.kind.as_str() {
                "oauth2" => SchemeKind::OAuth2,
                "apiKey" => SchemeKind::ApiKey,
                other => {
                    return Err(Error::Security(format!(
                        "security scheme {name:?} has unsupported type {other:?}"
                    )))
                }
            };
            schemes.insert(
                name.clone(),
                Scheme {
                    ident: go_name(&name),
                    kind,
                    config,
                },
            );
        }
        Ok(Self {
            schemes,
            global: document.api().security.clone(),
            packages,
            require_backend,
        })
    }

    pub fn has_schemes(&self) -> bool {
        !self.schemes.is_empty()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &Scheme> {
        self.schemes.values()
    }

    /// Import path of the config package of `kind`.
    fn config_package(&self, kind: SchemeKind) -> &str {
        match kind {
            SchemeKind::OAuth2 => &self.packages.oauth2,
            SchemeKind::ApiKey => &self.packages.apikey,
        }
    }

    fn config_type(kind: SchemeKind) -> &'static str {
        match kind {
            SchemeKind::OAuth2 => "*oauth2.Config",
            SchemeKind::ApiKey => "*apikey.Config",
        }
    }

    /// Emit one config value per scheme and the backend interface.
    pub fn build_security_config(&self, file: &mut SourceFile) -> Result<()> {
        if self.schemes.is_empty() {
            return Ok(());
        }

        let mut items = Vec::new();
        for (name, scheme) in &self.schemes {
            file.import(self.config_package(scheme.kind));
            file.push(
                Section::Security,
                Decl::Var {
                    name: scheme.config_var(),
                    doc: Vec::new(),
                    value: config_value(name, scheme),
                },
            );

            let ident = &scheme.ident;
            let authorize = match scheme.kind {
                SchemeKind::OAuth2 => {
                    format!("Authorize{ident}(r *http.Request, w http.ResponseWriter, scope string) (context.Context, bool)")
                }
                SchemeKind::ApiKey => {
                    format!("Authorize{ident}(r *http.Request, w http.ResponseWriter) (context.Context, bool)")
                }
            };
            items.push(InterfaceItem::Method {
                doc: None,
                signature: authorize,
            });
            items.push(InterfaceItem::Method {
                doc: None,
                signature: format!("CanAuthorize{ident}(r *http.Request) bool"),
            });
            items.push(InterfaceItem::Method {
                doc: None,
                signature: format!(
                    "Init{ident}({} {})",
                    scheme.config_var(),
                    Self::config_type(scheme.kind)
                ),
            });
        }

        file.import(HTTP);
        file.import(CONTEXT);
        file.push(
            Section::Security,
            Decl::Interface {
                name: BACKEND_INTERFACE.to_string(),
                doc: vec![format!(
                    "// {BACKEND_INTERFACE} needs to be implemented by the backend to authorize requests"
                )],
                items,
            },
        );
        Ok(())
    }

    /// Authorization code for the handler of `operation`, `None` when the
    /// operation is not secured.
    pub fn build_authorization(&self, operation: &Operation) -> Result<Option<Block>> {
        let requirements = match operation.security.as_ref().or(self.global.as_ref()) {
            Some(requirements) => requirements,
            None => return Ok(None),
        };
        let alternatives: Vec<&SecurityRequirement> = requirements.iter().filter(|r| !r.is_empty()).collect();
        if alternatives.is_empty() {
            return Ok(None);
        }

        let mut checks = Block::new();
        checks.line("var ok bool").line("var ctx context.Context");

        if let [requirement] = alternatives.as_slice() {
            checks.append(&self.authorize(operation, requirement)?);
        } else {
            for (i, requirement) in alternatives.iter().enumerate() {
                let probe = self
                    .resolve(operation, requirement)?
                    .iter()
                    .map(|(scheme, _)| format!("authBackend.CanAuthorize{}(r)", scheme.ident))
                    .collect::<Vec<_>>()
                    .join(" && ");
                if i == 0 {
                    checks.open(format!("if {probe} {{"));
                } else {
                    checks.reopen(format!("}} else if {probe} {{"));
                }
                checks.append(&self.authorize(operation, requirement)?);
            }
            checks
                .reopen("} else {")
                .line("http.Error(w, \"Authorization Error\", http.StatusUnauthorized)")
                .line("return")
                .close("}");
        }

        if self.require_backend {
            return Ok(Some(checks));
        }
        let mut guarded = Block::new();
        guarded.open("if authBackend != nil {").append(&checks).close("}");
        Ok(Some(guarded))
    }

    /// Backend initialization calls for the router.
    pub fn build_init(&self) -> Block {
        let mut calls = Block::new();
        for scheme in self.schemes.values() {
            calls.line(format!(
                "authBackend.Init{}({})",
                scheme.ident,
                scheme.config_var()
            ));
        }
        if self.require_backend || calls.is_empty() {
            return calls;
        }
        let mut guarded = Block::new();
        guarded.open("if authBackend != nil {").append(&calls).close("}");
        guarded
    }

    fn resolve<'s, 'r>(
        &'s self,
        operation: &Operation,
        requirement: &'r SecurityRequirement,
    ) -> Result<Vec<(&'s Scheme, &'r [String])>> {
        let mut resolved = Vec::new();
        for (name, tokens) in requirement {
            let scheme = self.schemes.get(name).ok_or_else(|| {
                Error::Security(format!(
                    "operation {} references undeclared security scheme {name:?}",
                    operation_label(operation)
                ))
            })?;
            let expected = scheme.kind.expected_tokens();
            if tokens.len() != expected {
                return Err(Error::Security(format!(
                    "operation {} lists {} scope(s) for {} scheme {name:?}, expected {expected}",
                    operation_label(operation),
                    tokens.len(),
                    scheme.config.kind,
                )));
            }
            resolved.push((scheme, tokens.as_slice()));
        }
        Ok(resolved)
    }

    fn authorize(&self, operation: &Operation, requirement: &SecurityRequirement) -> Result<Block> {
        let mut block = Block::new();
        for (scheme, tokens) in self.resolve(operation, requirement)? {
            let call = match (scheme.kind, tokens) {
                (SchemeKind::OAuth2, [scope]) => format!(
                    "ctx, ok = authBackend.Authorize{}(r, w, {})",
                    scheme.ident,
                    go_quote(scope)
                ),
                _ => format!("ctx, ok = authBackend.Authorize{}(r, w)", scheme.ident),
            };
            block
                .line(call)
                .open("if !ok {")
                .line("return")
                .close("}")
                .line("r = r.WithContext(ctx)");
        }
        Ok(block)
    }
}

fn operation_label(operation: &Operation) -> String {
    operation
        .operation_id
        .clone()
        .unwrap_or_else(|| "without operationId".to_string())
}

fn config_value(name: &str, scheme: &Scheme) -> Block {
    let config = &scheme.config;
    let mut value = Block::new();
    match scheme.kind {
        SchemeKind::OAuth2 => {
            value.open("&oauth2.Config{");
            if let Some(description) = &config.description {
                value.line(format!("Description: {},", go_quote(description)));
            }
            for (flow_name, flow) in &config.flows {
                value.open(format!("{}: &oauth2.Flow{{", go_name(flow_name)));
                let urls = [
                    ("AuthorizationURL", &flow.authorization_url),
                    ("TokenURL", &flow.token_url),
                    ("RefreshURL", &flow.refresh_url),
                ];
                for (field, url) in urls {
                    if let Some(url) = url {
                        value.line(format!("{field}: {},", go_quote(url)));
                    }
                }
                value.open("Scopes: map[string]string{");
                for (scope, description) in &flow.scopes {
                    value.line(format!("{}: {},", go_quote(scope), go_quote(description)));
                }
                value.close("},");
                value.close("},");
            }
            value.close("}");
        }
        SchemeKind::ApiKey => {
            value.open("&apikey.Config{");
            if let Some(description) = &config.description {
                value.line(format!("Description: {},", go_quote(description)));
            }
            value.line(format!("In: {},", go_quote(config.location.as_deref().unwrap_or("header"))));
            value.line(format!("Name: {},", go_quote(config.name.as_deref().unwrap_or(name))));
            value.close("}");
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapiv3::OpenAPI;
    use serde_json::json;

    fn document(schemes: serde_json::Value) -> Document {
        let api: OpenAPI = serde_json::from_value(json!({
            "openapi": "3.0.0",
            "info": { "title": "Test", "version": "1.0" },
            "paths": {},
            "components": { "securitySchemes": schemes }
        }))
        .unwrap();
        Document::new(api).unwrap()
    }

    fn oauth2() -> serde_json::Value {
        json!({
            "OAuth2": {
                "type": "oauth2",
                "flows": {
                    "authorizationCode": {
                        "authorizationUrl": "https://auth.example.com/authorize",
                        "tokenUrl": "https://auth.example.com/token",
                        "scopes": { "articles:read": "read articles" }
                    }
                }
            },
            "ApiKey": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
        })
    }

    fn operation(security: serde_json::Value) -> Operation {
        serde_json::from_value(json!({ "responses": {}, "security": security })).unwrap()
    }

    fn render(block: &Block) -> Vec<String> {
        block
            .lines()
            .map(|(depth, text)| format!("{}{}", "\t".repeat(depth), text))
            .collect()
    }

    #[test]
    fn test_oauth2_single_scope() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), false).unwrap();
        let block = emitter
            .build_authorization(&operation(json!([{ "OAuth2": ["articles:read"] }])))
            .unwrap()
            .unwrap();
        assert_eq!(
            render(&block),
            vec![
                "if authBackend != nil {",
                "\tvar ok bool",
                "\tvar ctx context.Context",
                "\tctx, ok = authBackend.AuthorizeOAuth2(r, w, \"articles:read\")",
                "\tif !ok {",
                "\t\treturn",
                "\t}",
                "\tr = r.WithContext(ctx)",
                "}",
            ]
        );
    }

    #[test]
    fn test_oauth2_scope_arity() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), false).unwrap();
        for scopes in [json!([]), json!(["a", "b"])] {
            let err = emitter
                .build_authorization(&operation(json!([{ "OAuth2": scopes }])))
                .unwrap_err();
            assert!(matches!(err, Error::Security(_)), "{err}");
        }
    }

    #[test]
    fn test_api_key_rejects_tokens() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), true).unwrap();
        let err = emitter
            .build_authorization(&operation(json!([{ "ApiKey": ["x"] }])))
            .unwrap_err();
        assert!(matches!(err, Error::Security(_)));

        let block = emitter
            .build_authorization(&operation(json!([{ "ApiKey": [] }])))
            .unwrap()
            .unwrap();
        assert!(render(&block).contains(&"ctx, ok = authBackend.AuthorizeAPIKey(r, w)".to_string()));
    }

    #[test]
    fn test_alternatives_probe_backend() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), true).unwrap();
        let block = emitter
            .build_authorization(&operation(json!([
                { "OAuth2": ["articles:read"] },
                { "ApiKey": [] }
            ])))
            .unwrap()
            .unwrap();
        let lines = render(&block);
        assert!(lines.contains(&"if authBackend.CanAuthorizeOAuth2(r) {".to_string()));
        assert!(lines.contains(&"} else if authBackend.CanAuthorizeAPIKey(r) {".to_string()));
        assert!(lines.contains(&"\thttp.Error(w, \"Authorization Error\", http.StatusUnauthorized)".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("}"));
    }

    #[test]
    fn test_unsecured_operation() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), false).unwrap();
        let op: Operation = serde_json::from_value(json!({ "responses": {} })).unwrap();
        assert!(emitter.build_authorization(&op).unwrap().is_none());
    }

    #[test]
    fn test_unsupported_scheme() {
        let doc = document(json!({
            "Basic": { "type": "http", "scheme": "basic" }
        }));
        let err = SecurityEmitter::new(&doc, RuntimePackages::default(), false).err().unwrap();
        assert!(matches!(err, Error::Security(_)));
    }

    #[test]
    fn test_undeclared_scheme() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), false).unwrap();
        let err = emitter
            .build_authorization(&operation(json!([{ "Missing": [] }])))
            .unwrap_err();
        assert!(matches!(err, Error::Security(_)));
    }

    #[test]
    fn test_security_config() {
        let emitter = SecurityEmitter::new(&document(oauth2()), RuntimePackages::default(), false).unwrap();
        let mut file = SourceFile::new("api");
        emitter.build_security_config(&mut file).unwrap();
        assert_eq!(file.count("cfgOAuth2"), 1);
        assert_eq!(file.count("cfgAPIKey"), 1);
        assert_eq!(file.count(BACKEND_INTERFACE), 1);
        assert!(file.imports().contains("github.com/pace/bricks/http/oauth2"));
        assert!(file.imports().contains("github.com/pace/bricks/http/security/apikey"));

        let oauth = file
            .decls(Section::Security)
            .iter()
            .find(|d| d.name() == "cfgOAuth2")
            .unwrap();
        let Decl::Var { value, .. } = oauth else {
            panic!("expected var")
        };
        let lines = render(value);
        assert_eq!(lines[1], "\tAuthorizationCode: &oauth2.Flow{");
        assert!(lines.contains(&"\t\t\t\"articles:read\": \"read articles\",".to_string()));
    }
}
