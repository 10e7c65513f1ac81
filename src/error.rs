use thiserror::Error;

/// Everything that can abort a generation run.
///
/// The first four variants are raised by the builders themselves; the rest
/// wrap failures of the collaborators used to read the document and render
/// the output file. Any error aborts the whole run and nothing is written.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed document or a reference that does not resolve.
    #[error("schema error: {0}")]
    Schema(String),
    /// Unrecognized primitive `type` string.
    #[error("type error: {0}")]
    Type(String),
    /// Inconsistent route data.
    #[error("route error: {0}")]
    Route(String),
    /// Unsupported security scheme or scope/token count mismatch.
    #[error("security error: {0}")]
    Security(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to fetch document: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to render source file: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
