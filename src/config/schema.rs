use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    pub version: String,

    #[serde(default)]
    pub input: Option<InputConfig>,

    /// Go file to generate.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Go package clause, derived from the output directory when unset.
    #[serde(default)]
    pub package: Option<String>,

    #[serde(default)]
    pub options: GenerationOptions,

    #[serde(default)]
    pub hooks: HooksConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InputConfig {
    /// Local path or `http(s)` URI of the OpenAPI document.
    pub source: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    #[serde(rename = "runtimeModule", default = "default_runtime_module")]
    pub runtime_module: String,

    #[serde(rename = "requireAuthBackend", default)]
    pub require_auth_backend: bool,
}

fn default_runtime_module() -> String {
    jsonapi_gen::generators::golang::DEFAULT_RUNTIME_MODULE.to_string()
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            runtime_module: default_runtime_module(),
            require_auth_backend: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct HooksConfig {
    #[serde(rename = "beforeGenerate", default)]
    pub before_generate: Vec<String>,

    #[serde(rename = "afterGenerate", default)]
    pub after_generate: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            input: None,
            output: Some(PathBuf::from("generated/api.go")),
            package: None,
            options: GenerationOptions::default(),
            hooks: HooksConfig::default(),
        }
    }
}
