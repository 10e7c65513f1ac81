use jsonapi_gen::{build_schema, build_source, Error, Generator, GeneratorOptions};
use openapiv3::OpenAPI;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture() -> String {
    format!("{}/tests/fixtures/articles.yaml", env!("CARGO_MANIFEST_DIR"))
}

fn golden() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/articles.go.golden")
}

fn generate_fixture() -> String {
    build_source(&fixture(), None, "articles").expect("fixture generates")
}

fn api(value: serde_json::Value) -> OpenAPI {
    serde_json::from_value(value).expect("valid OpenAPI document")
}

fn line_of(source: &str, needle: &str) -> usize {
    source
        .lines()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("{needle:?} not found in generated source"))
}

#[test]
fn test_generation_is_deterministic() {
    let first = generate_fixture();
    let second = generate_fixture();
    assert_eq!(first, second);
}

#[test]
fn test_fixture_matches_golden_file() {
    let source = generate_fixture();
    let path = golden();

    if std::env::var("UPDATE_GOLDEN").is_ok_and(|v| v == "1") {
        fs::write(&path, &source).expect("write golden file");
    }

    let expected = fs::read_to_string(&path).unwrap_or_else(|err| {
        panic!(
            "cannot read {}: {err}; rerun with UPDATE_GOLDEN=1 to create it",
            path.display()
        )
    });
    assert_eq!(source, expected, "generated source differs from {}", path.display());
}

#[test]
fn test_fixture_declarations() {
    let source = generate_fixture();

    assert!(source.starts_with("// Code generated by jsonapi-gen, DO NOT EDIT.\n"));
    assert!(source.contains("package articles\n"));

    // component types, declared once, envelope elided
    assert_eq!(source.matches("type Article struct {").count(), 1);
    assert!(!source.contains("type ArticleDocument"));
    assert!(source.contains(r#"`jsonapi:"primary,article,omitempty" valid:"uuid,required"`"#));
    assert!(source.contains(r#"jsonapi:"attr,publishedAt,iso8601,omitempty""#));
    assert!(source.contains(r#"valid:"in(draft|published),optional""#));
    assert!(source.contains("[]*Article"));

    // response writers
    assert!(source.contains("OK(data []*Article)"));
    assert!(source.contains("Created(data *Article)"));
    assert!(source.contains("BadRequest(err error)"));
    assert!(source.contains("NotFound(err error)"));
    assert!(source.contains("NoContent()"));
    assert!(source.contains("runtime.WriteError(w, 404, err)"));
    assert!(source.contains("w.WriteHeader(204)"));

    // request types and scanning
    assert!(source.contains("Content Article"));
    assert!(source.contains("runtime.Unmarshal(w, r, &request.Content)"));
    assert!(source.contains("vars := mux.Vars(r)"));
    assert!(source.contains(
        r#"&runtime.ScanParameter{Data: &request.ParamID, Location: runtime.ScanInPath, Input: vars["id"], Name: "id"},"#
    ));
    assert!(source.contains("ParamPageSize"));

    // authorization
    assert!(source.contains("var cfgOAuth2 = &oauth2.Config{"));
    assert!(source.contains(r#"ctx, ok = authBackend.AuthorizeOAuth2(r, w, "articles:read")"#));
    assert!(source.contains(r#"ctx, ok = authBackend.AuthorizeOAuth2(r, w, "articles:write")"#));
    assert!(source.contains("if authBackend != nil {"));
    assert!(source.contains("InitOAuth2(cfgOAuth2 *oauth2.Config)"));

    // service contract
    assert!(source.contains(
        "GetArticle(context.Context, GetArticleResponseWriter, *GetArticleRequest) error"
    ));
    assert!(source.contains("// Router implements: Articles API"));
    assert!(source.contains("// Package articles implements the \"Articles API\" API\n//\n// Manage"));
}

#[test]
fn test_blacklisted_status_codes_have_no_writer_method() {
    let source = generate_fixture();
    for method in [
        "Unauthorized(",
        "NotAcceptable(",
        "UnsupportedMediaType(",
        "UnprocessableEntity(",
        "InternalServerError(",
    ] {
        assert!(!source.contains(method), "{method} must not be generated");
    }
}

#[test]
fn test_router_registers_specific_routes_first() {
    let source = generate_fixture();
    assert!(source.contains(r#"s1 := router.PathPrefix("/beta").Subrouter()"#));

    let by_id = line_of(&source, r#"s1.Methods("DELETE").Path("/articles/{id}")"#);
    let get_by_id = line_of(&source, r#"s1.Methods("GET").Path("/articles/{id}")"#);
    let filtered = line_of(
        &source,
        r#"s1.Methods("GET").Path("/articles").Queries("filter[status]", "published")"#,
    );
    let list = line_of(&source, r#".Handler(ListArticlesHandler(service, authBackend)).Name("ListArticles")"#);
    let create = line_of(&source, r#"s1.Methods("POST").Path("/articles")"#);

    assert!(by_id < get_by_id);
    assert!(get_by_id < filtered);
    assert!(filtered < list);
    assert!(list < create);
}

#[test]
fn test_output_file_written_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("articles").join("api.go");

    let source = build_source(&fixture(), Some(&output), "").unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(source, written);
    // package derived from the output directory
    assert!(written.contains("package articles\n"));
}

#[test]
fn test_nothing_written_on_security_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("api.go");

    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Broken", "version": "1" },
        "paths": {
            "/things": {
                "get": {
                    "operationId": "listThings",
                    "security": [{ "OAuth2": ["a", "b"] }],
                    "responses": { "204": { "description": "ok" } }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "OAuth2": {
                    "type": "oauth2",
                    "flows": { "implicit": { "authorizationUrl": "https://auth/authorize", "scopes": {} } }
                }
            }
        }
    }));

    let err = build_schema(doc, Some(&output), "api").unwrap_err();
    assert!(matches!(err, Error::Security(_)), "{err}");
    assert!(!output.exists());
}

#[test]
fn test_unknown_scalar_type_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("api.go");

    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Broken", "version": "1" },
        "paths": {},
        "components": { "schemas": { "Upload": { "type": "file" } } }
    }));

    let err = build_schema(doc, Some(&output), "api").unwrap_err();
    assert!(matches!(err, Error::Type(_)), "{err}");
    assert!(!output.exists());
}

#[test]
fn test_unknown_type_in_response_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("api.go");

    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Broken", "version": "1" },
        "paths": {
            "/events": {
                "get": {
                    "operationId": "listEvents",
                    "responses": {
                        "200": {
                            "description": "events",
                            "content": {
                                "application/vnd.api+json": { "schema": { "type": "timestamp" } }
                            }
                        }
                    }
                }
            }
        }
    }));

    let err = build_schema(doc, Some(&output), "api").unwrap_err();
    assert!(matches!(err, Error::Type(_)), "{err}");
    assert!(!output.exists());
}

#[test]
fn test_combinators_degrade_to_raw_json() {
    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Pets", "version": "1" },
        "paths": {},
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "properties": {
                        "kind": { "oneOf": [{ "type": "string" }, { "type": "integer" }] }
                    }
                }
            }
        }
    }));

    let source = build_schema(doc, None, "pets").unwrap();
    assert!(source.contains("\"encoding/json\""));
    assert!(source.contains("json.RawMessage"));
}

#[test]
fn test_required_auth_backend_skips_nil_check() {
    let generator = Generator::new(GeneratorOptions {
        package_name: Some("articles".to_string()),
        require_auth_backend: true,
        ..Default::default()
    });
    let source = generator.build_source(&fixture(), None).unwrap();
    assert!(!source.contains("if authBackend != nil {"));
    assert!(source.contains("\tauthBackend.InitOAuth2(cfgOAuth2)\n"));
}

#[test]
fn test_custom_runtime_module() {
    let generator = Generator::new(GeneratorOptions {
        package_name: Some("articles".to_string()),
        runtime_module: "example.com/kit".to_string(),
        ..Default::default()
    });
    let source = generator.build_source(&fixture(), None).unwrap();
    assert!(source.contains("\"example.com/kit/http/jsonapi/runtime\""));
    assert!(!source.contains("github.com/pace/bricks"));
}

#[test]
fn test_document_without_security() {
    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Open", "version": "1" },
        "paths": {
            "/ping": {
                "get": { "responses": { "204": { "description": "pong" } } }
            }
        }
    }));

    let source = build_schema(doc, None, "open").unwrap();
    assert!(source.contains("func GetPingHandler(service Service) http.Handler {"));
    assert!(source.contains("func Router(service Service) *mux.Router {"));
    assert!(source.contains(r#"router.Methods("GET").Path("/ping").Handler(GetPingHandler(service)).Name("GetPing")"#));
    assert!(!source.contains("AuthorizationBackend"));
}

#[test]
fn test_package_doc_keeps_title_verbatim() {
    let doc = api(json!({
        "openapi": "3.0.0",
        "info": {
            "title": "The \"Quoted\" API",
            "description": "First line.\nSecond line.",
            "version": "1"
        },
        "paths": {}
    }));

    let source = build_schema(doc, None, "quoted").unwrap();
    assert!(source.contains(
        "// Package quoted implements the \"The \"Quoted\" API\" API\n//\n// First line.\n// Second line.\npackage quoted\n"
    ));
}

#[test]
fn test_enum_values_escaped_in_struct_tags() {
    let doc = api(json!({
        "openapi": "3.0.0",
        "info": { "title": "Quotes", "version": "1" },
        "paths": {},
        "components": {
            "schemas": {
                "Quote": {
                    "type": "object",
                    "properties": {
                        "mark": { "type": "string", "enum": ["\"", "`"] }
                    }
                }
            }
        }
    }));

    let source = build_schema(doc, None, "quotes").unwrap();
    assert!(source.contains(r#"valid:"in(\"|\x60),optional"`"#), "{source}");
}
