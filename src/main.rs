use anyhow::{Context, Result};
use clap::Parser;
use jsonapi_gen::{Generator, GeneratorOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_config, merge_with_cli_args, CliOverrides};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path or http(s) URI of the OpenAPI specification (YAML or JSON)
    #[arg(short, long)]
    spec: Option<String>,

    /// Go source file to generate
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Go package name (defaults to the output directory name)
    #[arg(short, long)]
    package: Option<String>,

    /// Path to config file (overrides default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Call the authorization backend without a nil check
    #[arg(long)]
    require_auth_backend: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref())?;
    let merged_config = merge_with_cli_args(
        config,
        CliOverrides {
            spec: args.spec,
            output: args.output,
            package: args.package,
            require_auth_backend: args.require_auth_backend,
        },
    );

    // Validate we have input
    let input_config = merged_config
        .input
        .ok_or_else(|| anyhow::anyhow!("No input source specified. Use --spec or configure input in config file"))?;

    let output_path = merged_config
        .output
        .unwrap_or_else(|| PathBuf::from("generated/api.go"));

    // Execute before hooks
    for hook in &merged_config.hooks.before_generate {
        println!("🎣 Running before hook: {}", hook);
        execute_hook(hook)?;
    }

    println!("📖 Reading input from: {}", input_config.source);

    let generator = Generator::new(GeneratorOptions {
        package_name: merged_config.package,
        runtime_module: merged_config.options.runtime_module,
        require_auth_backend: merged_config.options.require_auth_backend,
    });

    println!("🔧 Generating Go sources...");
    let source = generator
        .build_source(&input_config.source, Some(&output_path))
        .with_context(|| format!("Failed to generate from {}", input_config.source))?;

    println!("✅ Generated: {:?} ({} bytes)", output_path, source.len());

    // Execute after hooks
    for hook in &merged_config.hooks.after_generate {
        println!("🎣 Running after hook: {}", hook);
        execute_hook(hook)?;
    }

    println!("🎉 Successfully generated {:?}!", output_path);

    Ok(())
}

fn execute_hook(command: &str) -> Result<()> {
    use std::process::Command;

    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    }
    .with_context(|| format!("Failed to spawn hook: {}", command))?;

    if !output.status.success() {
        anyhow::bail!(
            "Hook failed: {}\nStderr: {}",
            command,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}
