pub mod openapi_parser;
pub mod schema_node;

use crate::error::{Error, Result};
use openapiv3::OpenAPI;
use std::fs;
use std::path::{Path, PathBuf};

pub use openapi_parser::{Document, OperationRef};
pub use schema_node::{Combinator, ObjectNode, Scalar, ScalarKind, SchemaNode};

/// Where an OpenAPI document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Http(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl Source {
    /// `http`-prefixed strings are fetched, everything else is a local path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http") {
            Source::Http(source.to_string())
        } else {
            Source::File(PathBuf::from(source))
        }
    }

    /// Detect the format from the extension, falling back to YAML which is
    /// also able to read JSON documents.
    pub fn format(&self) -> SourceFormat {
        let name = match self {
            Source::Http(uri) => uri.split(['?', '#']).next().unwrap_or(uri).to_string(),
            Source::File(path) => path.to_string_lossy().into_owned(),
        };
        if Path::new(&name).extension().and_then(|s| s.to_str()) == Some("json") {
            SourceFormat::Json
        } else {
            SourceFormat::Yaml
        }
    }

    /// Read the raw document. Remote fetches are neither retried nor bounded.
    pub fn read(&self) -> Result<String> {
        match self {
            Source::Http(uri) => {
                let response = reqwest::blocking::get(uri)?.error_for_status()?;
                Ok(response.text()?)
            }
            Source::File(path) => {
                if !path.exists() {
                    return Err(Error::Schema(format!("input file not found: {}", path.display())));
                }
                Ok(fs::read_to_string(path)?)
            }
        }
    }
}

/// SchemaLoader: read and parse the document behind `source`.
pub fn load_openapi(source: &str) -> Result<OpenAPI> {
    let source = Source::parse(source);
    let content = source.read()?;
    parse_openapi(&content, source.format())
}

pub fn parse_openapi(content: &str, format: SourceFormat) -> Result<OpenAPI> {
    let openapi = match format {
        SourceFormat::Json => serde_json::from_str(content)?,
        SourceFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(openapi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_detection() {
        assert_eq!(
            Source::parse("https://example.com/api.json"),
            Source::Http("https://example.com/api.json".to_string())
        );
        assert_eq!(Source::parse("./api.yaml"), Source::File(PathBuf::from("./api.yaml")));
        assert_eq!(Source::parse("https://example.com/api.json?v=1").format(), SourceFormat::Json);
        assert_eq!(Source::parse("api.yml").format(), SourceFormat::Yaml);
    }

    #[test]
    fn test_missing_file() {
        let err = load_openapi("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_yaml_reads_json() {
        let doc = parse_openapi(
            r#"{"openapi": "3.0.3", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
            SourceFormat::Yaml,
        )
        .unwrap();
        assert_eq!(doc.info.title, "t");
    }
}
