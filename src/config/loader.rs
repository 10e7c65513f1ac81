use super::schema::{Config, InputConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./.config/jsonapi-gen.yaml";

/// Load configuration from file or return default
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config_path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    } else if custom_path.is_some() {
        anyhow::bail!("Config file not found: {:?}", config_path);
    } else {
        Ok(Config::default())
    }
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub spec: Option<String>,
    pub output: Option<PathBuf>,
    pub package: Option<String>,
    pub require_auth_backend: bool,
}

/// Merge config with CLI arguments (CLI takes precedence)
pub fn merge_with_cli_args(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(source) = cli.spec {
        config.input = Some(InputConfig { source });
    }

    if let Some(output_path) = cli.output {
        config.output = Some(output_path);
    }

    if let Some(package) = cli.package {
        config.package = Some(package);
    }

    // the flag can only switch the requirement on
    if cli.require_auth_backend {
        config.options.require_auth_backend = true;
    }

    config
}
