//! Generates Go JSON:API services from OpenAPI 3.0 documents.
//!
//! One run reads one document and produces one Go source file holding the
//! schema types, the `Service` interface, a response writer, request type and
//! validating `http.Handler` per operation, and a gorilla/mux `Router`.
//!
//! ```rust,ignore
//! let source = jsonapi_gen::build_source("openapi.yaml", Some(Path::new("api/api.go")), "api")?;
//! ```

pub mod error;
pub mod generators;
pub mod operation_processor;
pub mod parsers;
pub mod registry;
pub mod schema_processor;

pub use error::{Error, Result};

use generators::golang::naming::comment_lines;
use generators::golang::{router, HandlerEmitter, RuntimePackages, SecurityEmitter, SourceFile, SourceWriter};
use openapiv3::OpenAPI;
use operation_processor::{sort_by_specificity, RouteBuilder};
use parsers::{load_openapi, Document};
use registry::TypeRegistry;
use schema_processor::TypeBuilder;
use std::fs;
use std::path::Path;

const FALLBACK_PACKAGE: &str = "api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Go package clause; derived from the output directory when unset.
    pub package_name: Option<String>,
    /// Module providing the runtime, errors, oauth2 and apikey packages.
    pub runtime_module: String,
    /// Call the authorization backend unconditionally instead of behind a
    /// nil check.
    pub require_auth_backend: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            package_name: None,
            runtime_module: generators::golang::DEFAULT_RUNTIME_MODULE.to_string(),
            require_auth_backend: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Load the document behind `source` (path or `http` URI) and generate.
    pub fn build_source(&self, source: &str, output_path: Option<&Path>) -> Result<String> {
        let api = load_openapi(source)?;
        self.build_schema(api, output_path)
    }

    /// Generate from an already parsed document. `output_path` is written
    /// only when generation succeeded.
    pub fn build_schema(&self, api: OpenAPI, output_path: Option<&Path>) -> Result<String> {
        let document = Document::new(api)?;
        let package = self.package_name(output_path);
        let source = self.generate(&document, &package)?;

        if let Some(path) = output_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &source)?;
            tracing::debug!(path = %path.display(), bytes = source.len(), "wrote generated source");
        }
        Ok(source)
    }

    pub fn generate(&self, document: &Document, package: &str) -> Result<String> {
        let packages = RuntimePackages::new(&self.options.runtime_module);
        let mut registry = TypeRegistry::new();
        let mut file = SourceFile::new(package);
        file.doc
            .push(format!("// Package {package} implements the \"{}\" API", document.title()));
        if let Some(description) = document.description() {
            file.doc.push("//".to_string());
            file.doc.extend(comment_lines(description));
        }

        let types = TypeBuilder::new(document);
        types.build_types(&mut registry, &mut file)?;

        let mut routes = RouteBuilder::new().build_routes(document, &mut registry)?;

        let security = SecurityEmitter::new(document, packages.clone(), self.options.require_auth_backend)?;
        security.build_security_config(&mut file)?;

        let handlers = HandlerEmitter::new(document, &types, &security, &packages);
        for route in &routes {
            handlers.build_handler(route, &mut registry, &mut file)?;
        }
        handlers.build_service(&routes, &mut file);

        sort_by_specificity(&mut routes);
        router::build_router(document, &routes, &handlers, &security, &mut file);

        tracing::debug!(routes = routes.len(), types = registry.len(), "declarations built");
        SourceWriter::new().emit(&file)
    }

    fn package_name(&self, output_path: Option<&Path>) -> String {
        if let Some(name) = self.options.package_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        output_path
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .map(|name| {
                name.chars()
                    .filter(char::is_ascii_alphanumeric)
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .filter(|name| name.starts_with(|c: char| c.is_ascii_lowercase()))
            .unwrap_or_else(|| FALLBACK_PACKAGE.to_string())
    }
}

/// Generate from `source` with default options; an empty `package_name`
/// derives the package from `output_path`.
pub fn build_source(source: &str, output_path: Option<&Path>, package_name: &str) -> Result<String> {
    generator(package_name).build_source(source, output_path)
}

/// Like [`build_source`] for an already parsed document.
pub fn build_schema(api: OpenAPI, output_path: Option<&Path>, package_name: &str) -> Result<String> {
    generator(package_name).build_schema(api, output_path)
}

fn generator(package_name: &str) -> Generator {
    Generator::new(GeneratorOptions {
        package_name: Some(package_name.to_string()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_package_name() {
        let generator = Generator::default();
        assert_eq!(
            generator.package_name(Some(&PathBuf::from("services/article-api/api.go"))),
            "articleapi"
        );
        assert_eq!(generator.package_name(Some(&PathBuf::from("api.go"))), "api");
        assert_eq!(generator.package_name(None), "api");

        let generator = Generator::new(GeneratorOptions {
            package_name: Some("articles".to_string()),
            ..Default::default()
        });
        assert_eq!(generator.package_name(None), "articles");
    }
}
